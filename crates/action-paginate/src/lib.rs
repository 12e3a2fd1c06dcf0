//! Paginated search - find a table row across pages
//!
//! The search inspects the current page first and only then advances the
//! pager. Three bounds make the loop finite:
//! - the last page (next control absent or disabled) ends with `NotFound`
//! - `max_page_hops` caps the pages inspected
//! - `NO_PROGRESS_LIMIT` consecutive advances that leave the row-set
//!   signature unchanged end with `NoProgress`

pub mod filters;
pub mod search;
pub mod types;

pub use filters::*;
pub use search::*;
pub use types::*;
