//! Loading the plugin configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use metadata_simplifier::PluginConfig;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "msimplify.json";

/// Read and validate a config file in the plugin JSON format.
pub fn load(path: &Path) -> anyhow::Result<PluginConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    PluginConfig::from_json(&content).with_context(|| format!("invalid config {}", path.display()))
}

/// The explicit config if one was passed, else `msimplify.json` in `cwd`
/// if present, else the defaults.
pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<(PluginConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load(path)?, Some(path.to_path_buf())));
    }
    let fallback = cwd.join(DEFAULT_CONFIG_FILE);
    if fallback.is_file() {
        return Ok((load(&fallback)?, Some(fallback)));
    }
    Ok((PluginConfig::default(), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_simplifier::Config;

    #[test]
    fn should_load_plugin_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{"stripMetadata": true}"#).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.base.strip_metadata, Some(true));
    }

    #[test]
    fn should_name_the_file_on_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let message = format!("{:#}", load(&path).unwrap_err());
        assert!(message.contains("broken.json"), "{message}");
    }

    #[test]
    fn should_reject_bad_override_globs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globs.json");
        fs::write(
            &path,
            r#"{"overrides": [{"files": ["src/[abc"], "config": {"stripMetadata": true}}]}"#,
        )
        .unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn should_pick_up_default_file_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), r#"{"collapseEmptyDecorations": false}"#).unwrap();

        let (config, source) = resolve(None, dir.path()).unwrap();
        assert_eq!(config.base.collapse_empty_decorations, Some(false));
        assert_eq!(source, Some(dir.path().join(DEFAULT_CONFIG_FILE)));
    }

    #[test]
    fn should_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, source) = resolve(None, dir.path()).unwrap();
        assert_eq!(config.resolve(None), Config::default());
        assert!(source.is_none());
    }

    #[test]
    fn should_fail_on_missing_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(resolve(Some(&missing), dir.path()).is_err());
    }
}
