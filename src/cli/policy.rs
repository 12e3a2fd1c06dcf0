use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sureclick::{EnginePolicy, PolicySource};

use super::output::{render_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct PolicyArgs {
    /// Also list which layer (builtin, file, env) set each field
    #[arg(long)]
    pub sources: bool,
}

/// Structured `--sources` document
#[derive(Serialize)]
struct SourcedPolicy<'a> {
    policy: &'a EnginePolicy,
    sources: &'a BTreeMap<String, PolicySource>,
}

pub fn cmd_policy(args: PolicyArgs, policy: &EnginePolicy, output: OutputFormat) -> Result<()> {
    print!("{}", render_policy(policy, output, args.sources)?);
    Ok(())
}

/// Effective policy as text. Human output is YAML with provenance as
/// trailing comments; json/yaml carry it in a `sources` map.
pub fn render_policy(policy: &EnginePolicy, output: OutputFormat, sources: bool) -> Result<String> {
    let structured = if sources {
        render_structured(
            &SourcedPolicy {
                policy,
                sources: &policy.provenance,
            },
            output,
        )?
    } else {
        render_structured(policy, output)?
    };

    let mut text = match structured {
        Some(text) => text,
        None => {
            let mut text = serde_yaml::to_string(policy)?;
            if sources {
                text.push_str("# sources\n");
                for (path, source) in &policy.provenance {
                    text.push_str(&format!("# {}: {:?}\n", path, source));
                }
            }
            text
        }
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}
