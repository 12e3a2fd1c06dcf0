use crate::model::{ActionPolicy, EnginePolicy, ReadinessPolicy, ResolvePolicy, SearchPolicy};

pub fn default_policy() -> EnginePolicy {
    EnginePolicy {
        resolve: ResolvePolicy {
            timeout_ms: 10_000,
            poll_interval_ms: 100,
        },
        readiness: ReadinessPolicy {
            timeout_ms: 10_000,
            poll_interval_ms: 100,
        },
        search: SearchPolicy {
            max_page_hops: 5,
            rerender_timeout_ms: 8_000,
            poll_interval_ms: 100,
        },
        action: ActionPolicy {
            stale_retries: 2,
            resolve_timeout_ms: 10_000,
            post_condition_timeout_ms: 5_000,
            poll_interval_ms: 100,
            scroll_into_view: true,
        },
        provenance: Default::default(),
    }
}
