//! Engine configuration.
//!
//! The JSON shape is camelCase. A base [`Config`] is flattened into
//! [`PluginConfig`] next to an ordered list of per-file [`OverrideRule`]s:
//!
//! ```json
//! {
//!   "knownSafeDecorators": [{ "decorator": "@nestjs/graphql#ResolveField" }],
//!   "overrides": [
//!     { "files": ["**/*.model.*"], "config": { "simplifyDesignTypeTypeofs": true } }
//!   ]
//! }
//! ```

use std::borrow::Cow;

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::error::SimplifyError;
use crate::model::{DecoratorIdentity, MetadataKind, MetadataKinds};

/// Placeholder type names used when the configuration does not list any.
pub const DEFAULT_PLACEHOLDER_TYPES: &[&str] = &["Object"];

/// A decorator that is known not to read some (or all) design metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeDecorator {
    /// `"Name"`, `"module#Name"` or `"module#*"`.
    pub decorator: String,
    /// Kinds the decorator ignores. Absent means all three.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores: Option<Vec<MetadataKind>>,
}

impl SafeDecorator {
    pub fn new(decorator: impl Into<String>) -> Self {
        Self {
            decorator: decorator.into(),
            ignores: None,
        }
    }

    pub fn ignoring(decorator: impl Into<String>, kinds: &[MetadataKind]) -> Self {
        Self {
            decorator: decorator.into(),
            ignores: Some(kinds.to_vec()),
        }
    }

    fn matches(&self, module: Option<&str>, name: &str) -> bool {
        match self.decorator.split_once('#') {
            Some((pattern_module, pattern_name)) => {
                module == Some(pattern_module) && (pattern_name == "*" || pattern_name == name)
            }
            None => self.decorator == name,
        }
    }

    fn ignored_kinds(&self) -> MetadataKinds {
        match &self.ignores {
            Some(kinds) => kinds.iter().copied().collect(),
            None => MetadataKinds::all(),
        }
    }
}

/// Extra spellings for the three helpers, on top of the well-known names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelperNames {
    #[serde(default)]
    pub decorate: Vec<String>,
    #[serde(default)]
    pub param: Vec<String>,
    #[serde(default)]
    pub metadata: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Decorators whose presence does not block metadata removal.
    pub known_safe_decorators: Option<Vec<SafeDecorator>>,
    /// Type names that carry no information (default: `Object`).
    pub placeholder_types: Option<Vec<String>>,
    pub helper_names: Option<HelperNames>,
    /// Remove a decoration statement whose list ends up empty (default: true).
    pub collapse_empty_decorations: Option<bool>,
    /// Drop every design metadata entry regardless of analysis (default: false).
    pub strip_metadata: Option<bool>,
    /// `Dec(() => String)` -> `Dec(String)` (default: false).
    pub unwrap_decorator_arrows: Option<bool>,
    /// `{ type: () => String }` -> `{ type: String }` in decorator options (default: false).
    pub unwrap_type_arrows: Option<bool>,
    /// Typeof guard conditionals in `design:paramtypes` -> `Object` (default: false).
    pub simplify_metadata_typeofs: Option<bool>,
    /// Typeof guard conditionals in `design:type` -> `Object` (default: false).
    pub simplify_design_type_typeofs: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            known_safe_decorators: Some(Vec::new()),
            placeholder_types: Some(
                DEFAULT_PLACEHOLDER_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            helper_names: Some(HelperNames::default()),
            collapse_empty_decorations: Some(true),
            strip_metadata: Some(false),
            unwrap_decorator_arrows: Some(false),
            unwrap_type_arrows: Some(false),
            simplify_metadata_typeofs: Some(false),
            simplify_design_type_typeofs: Some(false),
        }
    }
}

impl Config {
    /// A config with every field unset, for use as an override.
    pub fn empty() -> Self {
        Self {
            known_safe_decorators: None,
            placeholder_types: None,
            helper_names: None,
            collapse_empty_decorations: None,
            strip_metadata: None,
            unwrap_decorator_arrows: None,
            unwrap_type_arrows: None,
            simplify_metadata_typeofs: None,
            simplify_design_type_typeofs: None,
        }
    }

    /// Merge an override on top of self. `Some` values in the override win,
    /// `None` inherits from self.
    pub fn merge_override(&self, over: &Config) -> Config {
        Config {
            known_safe_decorators: over
                .known_safe_decorators
                .clone()
                .or_else(|| self.known_safe_decorators.clone()),
            placeholder_types: over
                .placeholder_types
                .clone()
                .or_else(|| self.placeholder_types.clone()),
            helper_names: over
                .helper_names
                .clone()
                .or_else(|| self.helper_names.clone()),
            collapse_empty_decorations: over
                .collapse_empty_decorations
                .or(self.collapse_empty_decorations),
            strip_metadata: over.strip_metadata.or(self.strip_metadata),
            unwrap_decorator_arrows: over
                .unwrap_decorator_arrows
                .or(self.unwrap_decorator_arrows),
            unwrap_type_arrows: over.unwrap_type_arrows.or(self.unwrap_type_arrows),
            simplify_metadata_typeofs: over
                .simplify_metadata_typeofs
                .or(self.simplify_metadata_typeofs),
            simplify_design_type_typeofs: over
                .simplify_design_type_typeofs
                .or(self.simplify_design_type_typeofs),
        }
    }

    /// Resolve unset fields to their defaults.
    pub fn options(&self) -> Options {
        Options {
            known_safe: self.known_safe_decorators.clone().unwrap_or_default(),
            placeholder_types: self.placeholder_types.clone().unwrap_or_else(|| {
                DEFAULT_PLACEHOLDER_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }),
            helper_names: self.helper_names.clone().unwrap_or_default(),
            collapse_empty_decorations: self.collapse_empty_decorations.unwrap_or(true),
            strip_metadata: self.strip_metadata.unwrap_or(false),
            unwrap_decorator_arrows: self.unwrap_decorator_arrows.unwrap_or(false),
            unwrap_type_arrows: self.unwrap_type_arrows.unwrap_or(false),
            simplify_metadata_typeofs: self.simplify_metadata_typeofs.unwrap_or(false),
            simplify_design_type_typeofs: self.simplify_design_type_typeofs.unwrap_or(false),
        }
    }
}

/// A [`Config`] with every field resolved, as consumed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub known_safe: Vec<SafeDecorator>,
    pub placeholder_types: Vec<String>,
    pub helper_names: HelperNames,
    pub collapse_empty_decorations: bool,
    pub strip_metadata: bool,
    pub unwrap_decorator_arrows: bool,
    pub unwrap_type_arrows: bool,
    pub simplify_metadata_typeofs: bool,
    pub simplify_design_type_typeofs: bool,
}

impl Default for Options {
    fn default() -> Self {
        Config::default().options()
    }
}

impl Options {
    /// The metadata kinds a decorator is known to ignore.
    pub fn ignored_kinds(&self, identity: &DecoratorIdentity) -> MetadataKinds {
        match identity {
            DecoratorIdentity::MetadataHelper => MetadataKinds::all(),
            DecoratorIdentity::Unresolved => MetadataKinds::empty(),
            DecoratorIdentity::Named { module, name } => self
                .known_safe
                .iter()
                .filter(|safe| safe.matches(module.as_deref(), name))
                .fold(MetadataKinds::empty(), |acc, safe| acc | safe.ignored_kinds()),
        }
    }

    pub fn is_placeholder(&self, name: &str) -> bool {
        self.placeholder_types.iter().any(|p| p == name)
    }
}

/// Top-level config shape: base options plus per-file overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(flatten)]
    pub base: Config,

    /// Applied in order; later rules win.
    #[serde(default)]
    pub overrides: Vec<OverrideRule>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            base: Config::default(),
            overrides: Vec::new(),
        }
    }
}

impl PluginConfig {
    pub fn from_json(json: &str) -> Result<Self, SimplifyError> {
        let config: PluginConfig =
            serde_json::from_str(json).map_err(|e| SimplifyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every override glob compiles.
    pub fn validate(&self) -> Result<(), SimplifyError> {
        for rule in &self.overrides {
            for pattern in &rule.files {
                Glob::new(pattern)
                    .map_err(|e| SimplifyError::Config(format!("bad glob `{pattern}`: {e}")))?;
            }
        }
        Ok(())
    }

    /// Resolve the final config for a file by applying all matching overrides.
    pub fn resolve(&self, filename: Option<&str>) -> Config {
        let mut config = self.base.clone();

        let filename = match filename {
            Some(f) if !f.is_empty() => f,
            _ => return config,
        };

        for rule in &self.overrides {
            if rule.matches(filename) {
                config = config.merge_override(&rule.config);
            }
        }

        config
    }
}

/// Glob patterns plus the config to apply when one of them matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRule {
    pub files: Vec<String>,
    pub config: Config,
}

impl OverrideRule {
    pub fn matches(&self, filename: &str) -> bool {
        let normalized: Cow<str> = if filename.contains('\\') {
            Cow::Owned(filename.replace('\\', "/"))
        } else {
            Cow::Borrowed(filename)
        };

        self.files
            .iter()
            .filter_map(|pattern| compile(pattern))
            .any(|matcher| matcher.is_match(normalized.as_ref()))
    }
}

fn compile(pattern: &str) -> Option<GlobMatcher> {
    match Glob::new(pattern) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(err) => {
            tracing::warn!(pattern, %err, "ignoring invalid override glob");
            None
        }
    }
}
