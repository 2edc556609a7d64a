use std::fs;
use tracing::debug;

use viability_core::EngineConfig;

/// Load engine settings from a YAML (or JSON) file. Missing keys keep their
/// defaults; no file means all defaults.
pub fn load(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let canonical = super::file::resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    if contents.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    let config: EngineConfig = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse config '{}': {}", canonical.display(), e))?;

    debug!(path = %canonical.display(), "engine config loaded");
    Ok(config)
}
