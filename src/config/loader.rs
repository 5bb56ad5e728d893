use anyhow::{Context, Result};
use schemars::{Schema, schema_for};
use serde_valid::Validate;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::error::ConfigError;
use super::models::{BannerConfig, LayoutWidth, TrackingCategory};

/// Load a banner configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<BannerConfig> {
    let cfg: BannerConfig =
        serde_json::from_str(s).context("Failed to parse JSON config string into BannerConfig")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load a banner configuration from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<BannerConfig> {
    let cfg: BannerConfig =
        serde_json::from_reader(reader).context("Failed to parse JSON config from reader")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load a banner configuration from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<BannerConfig> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open config file {}", path_ref.display()))?;
    let cfg = load_from_reader(file)
        .with_context(|| format!("Invalid banner config in {}", path_ref.display()))?;
    debug!(target: "bannergen::config", "Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Load a banner configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<BannerConfig> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let cfg: BannerConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    validate_config(&cfg)
        .with_context(|| format!("Invalid banner config in {}", path_ref.display()))?;
    debug!(target: "bannergen::config", "Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Generate the JSON Schema for `BannerConfig`.
pub fn generate_schema() -> Schema {
    schema_for!(BannerConfig)
}

/// Write the JSON Schema for `BannerConfig` to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Check field constraints and cross-field rules.
///
/// Hard errors are returned as `ConfigError`. Conditions the generator degrades
/// around (GA without a measurement id, a required privacy policy without URL)
/// are only logged.
pub fn validate_config(cfg: &BannerConfig) -> Result<(), ConfigError> {
    cfg.validate()
        .map_err(|errors| ConfigError::Constraints(errors.to_string()))?;

    if cfg.layout.width == LayoutWidth::Custom && cfg.layout.custom_width.unwrap_or(0) == 0 {
        return Err(ConfigError::MissingCustomWidth);
    }

    for category in TrackingCategory::ALL.iter().copied() {
        let mut seen = BTreeSet::new();
        let mut keys: BTreeMap<String, &str> = BTreeMap::new();
        for (index, script) in cfg.scripts.list(category).iter().enumerate() {
            if script.id.trim().is_empty() {
                return Err(ConfigError::EmptyScriptId { category, index });
            }
            if !seen.insert(script.id.as_str()) {
                return Err(ConfigError::DuplicateScriptId {
                    category,
                    id: script.id.clone(),
                });
            }
            if script.category != category {
                return Err(ConfigError::CategoryMismatch {
                    id: script.id.clone(),
                    list: category,
                    declared: script.category,
                });
            }
            let mut script_keys = vec![script.cache_key(category)];
            if script.has_body_code() {
                script_keys.push(script.body_cache_key(category));
            }
            for key in script_keys {
                if let Some(first) = keys.get(&key) {
                    return Err(ConfigError::CacheKeyCollision {
                        category,
                        first: (*first).to_string(),
                        second: script.id.clone(),
                        key,
                    });
                }
                keys.insert(key, script.id.as_str());
            }
        }
    }

    let ga = &cfg.integrations.google_analytics;
    if ga.enabled && ga.measurement_id.trim().is_empty() {
        warn!(
            target: "bannergen::config",
            "Google Analytics is enabled without a measurement id; GA code will be stubbed out"
        );
    }

    let policy = &cfg.branding.privacy_policy;
    if policy.required && policy.url.trim().is_empty() {
        warn!(
            target: "bannergen::config",
            "Privacy policy is marked required but has no URL; the link will be omitted"
        );
    }

    Ok(())
}
