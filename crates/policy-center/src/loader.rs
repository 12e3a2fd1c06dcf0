use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::defaults::default_policy;
use crate::errors::PolicyError;
use crate::model::{EnginePolicy, PolicySource};

const ENV_PREFIX: &str = "SURECLICK_POLICY__";
const ENV_JSON: &str = "SURECLICK_POLICY_OVERRIDE_JSON";

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
        }
    }
}

/// Defaults, then `path` (when it exists), then the environment.
pub fn load_policy(path: Option<&Path>) -> Result<EnginePolicy, PolicyError> {
    let mut options = LoadOptions {
        include_env: true,
        ..Default::default()
    };
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    load_policy_with_options(&options)
}

pub fn load_policy_with_options(options: &LoadOptions) -> Result<EnginePolicy, PolicyError> {
    let mut policy = default_policy();
    bootstrap_builtin_provenance(&mut policy)?;

    for path in &options.paths {
        if path.exists() {
            let overlays = overlays_from_file(path)?;
            debug!(path = %path.display(), count = overlays.len(), "applying policy file");
            apply_overlays(&mut policy, overlays)?;
        } else {
            debug!(path = %path.display(), "policy file not found; skipping");
        }
    }

    if options.include_env {
        let overlays = overlays_from_env()?;
        apply_overlays(&mut policy, overlays)?;
    }

    policy.validate()?;
    Ok(policy)
}

struct PolicyOverlay {
    path: String,
    value: Value,
    source: PolicySource,
}

fn apply_overlays(policy: &mut EnginePolicy, overlays: Vec<PolicyOverlay>) -> Result<(), PolicyError> {
    for overlay in overlays {
        policy.apply(&overlay.path, &overlay.value, overlay.source)?;
    }
    Ok(())
}

fn overlays_from_file(path: &Path) -> Result<Vec<PolicyOverlay>, PolicyError> {
    let origin = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|err| PolicyError::malformed(&origin, err))?;
    let tree = serde_json::to_value(document).map_err(|err| PolicyError::malformed(&origin, err))?;
    Ok(flatten_value(tree, None, PolicySource::File))
}

fn overlays_from_env() -> Result<Vec<PolicyOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    let mut vars: Vec<(String, String)> = env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect();
    vars.sort();
    for (key, raw) in vars {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(".");
        if path.is_empty() {
            continue;
        }
        overlays.push(PolicyOverlay {
            path,
            value: parse_env_value(&raw),
            source: PolicySource::Env,
        });
    }

    if let Ok(raw_json) = env::var(ENV_JSON) {
        if !raw_json.trim().is_empty() {
            let tree: Value = serde_json::from_str(&raw_json)
                .map_err(|err| PolicyError::malformed(ENV_JSON, err))?;
            overlays.extend(flatten_value(tree, None, PolicySource::Env));
        }
    }

    Ok(overlays)
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    Value::String(raw.to_string())
}

fn flatten_value(value: Value, prefix: Option<String>, source: PolicySource) -> Vec<PolicyOverlay> {
    match value {
        Value::Object(map) => {
            let mut result = Vec::new();
            for (key, value) in map {
                let key_segment = key.trim().to_ascii_lowercase();
                let next_prefix = match &prefix {
                    Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, key_segment),
                    _ => key_segment,
                };
                result.extend(flatten_value(value, Some(next_prefix), source));
            }
            result
        }
        other => match prefix {
            Some(path) => vec![PolicyOverlay {
                path,
                value: other,
                source,
            }],
            None => Vec::new(),
        },
    }
}

fn bootstrap_builtin_provenance(policy: &mut EnginePolicy) -> Result<(), PolicyError> {
    let value =
        serde_json::to_value(&*policy).map_err(|err| PolicyError::malformed("defaults", err))?;
    for overlay in flatten_value(value, None, PolicySource::Builtin) {
        policy.set_provenance(&overlay.path, overlay.source);
    }
    Ok(())
}
