//! Configuration Tests
//!
//! Override resolution, merge precedence, glob matching and the JSON shape.

use metadata_simplifier::model::MetadataKind;
use metadata_simplifier::{Config, OverrideRule, PluginConfig, SafeDecorator, SimplifyError};
use pretty_assertions::assert_eq;

const MODEL: &str = "/src/models/venue.model.ts";

fn with_design_typeofs(enabled: bool) -> PluginConfig {
    PluginConfig {
        base: Config {
            simplify_design_type_typeofs: Some(enabled),
            ..Config::default()
        },
        overrides: Vec::new(),
    }
}

fn rule(patterns: &[&str], config: Config) -> OverrideRule {
    OverrideRule {
        files: patterns.iter().map(|p| p.to_string()).collect(),
        config,
    }
}

fn design_typeofs(enabled: bool) -> Config {
    Config {
        simplify_design_type_typeofs: Some(enabled),
        ..Config::empty()
    }
}

mod resolution {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn should_return_base_without_overrides() {
        let pc = with_design_typeofs(false);
        assert_eq!(pc.resolve(Some(MODEL)), pc.base);
    }

    #[test]
    fn should_merge_matching_override() {
        let mut pc = with_design_typeofs(false);
        pc.overrides.push(rule(&["**/*.model.*"], design_typeofs(true)));

        let resolved = pc.resolve(Some(MODEL));
        assert_eq!(resolved.simplify_design_type_typeofs, Some(true));
        assert_eq!(resolved.collapse_empty_decorations, Some(true));
        assert_eq!(resolved.placeholder_types, Some(vec!["Object".to_string()]));
    }

    #[test]
    fn should_use_base_without_filename() {
        let mut pc = with_design_typeofs(false);
        pc.overrides.push(rule(&["**/*"], design_typeofs(true)));
        assert_eq!(pc.resolve(None).simplify_design_type_typeofs, Some(false));
        assert_eq!(pc.resolve(Some("")).simplify_design_type_typeofs, Some(false));
    }

    #[test]
    fn should_ignore_non_matching_files() {
        let mut pc = with_design_typeofs(false);
        pc.overrides.push(rule(&["**/*.model.*"], design_typeofs(true)));
        let resolved = pc.resolve(Some("/src/services/venue.service.ts"));
        assert_eq!(resolved.simplify_design_type_typeofs, Some(false));
    }
}

mod precedence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn should_let_later_override_win() {
        let mut pc = with_design_typeofs(false);
        pc.overrides.push(rule(&["**/*.model.*"], design_typeofs(true)));
        pc.overrides.push(rule(&["**/venue.model.*"], design_typeofs(false)));
        assert_eq!(pc.resolve(Some(MODEL)).simplify_design_type_typeofs, Some(false));
    }

    #[test]
    fn should_let_explicit_false_beat_base_true() {
        let mut pc = PluginConfig {
            base: Config {
                simplify_metadata_typeofs: Some(true),
                ..Config::default()
            },
            overrides: Vec::new(),
        };
        pc.overrides.push(rule(
            &["**/special.*"],
            Config {
                simplify_metadata_typeofs: Some(false),
                ..Config::empty()
            },
        ));
        let resolved = pc.resolve(Some("/src/special.ts"));
        assert_eq!(resolved.simplify_metadata_typeofs, Some(false));
    }

    #[test]
    fn should_apply_only_matching_rules() {
        let mut pc = with_design_typeofs(false);
        pc.overrides.push(rule(&["**/models/**"], design_typeofs(true)));
        pc.overrides.push(rule(
            &["**/services/**"],
            Config {
                strip_metadata: Some(true),
                ..Config::empty()
            },
        ));
        let resolved = pc.resolve(Some(MODEL));
        assert_eq!(resolved.simplify_design_type_typeofs, Some(true));
        assert_eq!(resolved.strip_metadata, Some(false));
    }

    #[test]
    fn should_stack_rules_touching_different_fields() {
        let mut pc = with_design_typeofs(false);
        pc.overrides.push(rule(&["**/models/**"], design_typeofs(true)));
        pc.overrides.push(rule(
            &["**/models/**"],
            Config {
                strip_metadata: Some(true),
                ..Config::empty()
            },
        ));
        let resolved = pc.resolve(Some(MODEL));
        assert_eq!(resolved.simplify_design_type_typeofs, Some(true));
        assert_eq!(resolved.strip_metadata, Some(true));
    }

    #[test]
    fn should_treat_empty_override_as_noop() {
        let mut pc = with_design_typeofs(true);
        pc.overrides.push(rule(&["**/*"], Config::empty()));
        assert_eq!(pc.resolve(Some("/src/anything.ts")), pc.base);
    }

    #[test]
    fn should_replace_lists_instead_of_appending() {
        let mut pc = PluginConfig {
            base: Config {
                known_safe_decorators: Some(vec![SafeDecorator::new("Get")]),
                ..Config::default()
            },
            overrides: Vec::new(),
        };
        pc.overrides.push(rule(
            &["**/*.model.*"],
            Config {
                known_safe_decorators: Some(vec![SafeDecorator::new("Prop")]),
                ..Config::empty()
            },
        ));
        let resolved = pc.resolve(Some(MODEL));
        assert_eq!(resolved.known_safe_decorators, Some(vec![SafeDecorator::new("Prop")]));
    }

    #[test]
    fn should_resolve_default_plugin_config_to_default_config() {
        assert_eq!(PluginConfig::default().resolve(Some("/src/anything.ts")), Config::default());
    }
}

mod globs {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn should_normalize_windows_separators() {
        let mut pc = with_design_typeofs(false);
        pc.overrides.push(rule(&["**/*.model.*"], design_typeofs(true)));
        let resolved = pc.resolve(Some("src\\models\\venue.model.ts"));
        assert_eq!(resolved.simplify_design_type_typeofs, Some(true));
    }

    #[test]
    fn should_match_any_of_several_patterns() {
        let mut pc = with_design_typeofs(false);
        pc.overrides
            .push(rule(&["**/venue.model*", "**/user.model*"], design_typeofs(true)));
        let enabled = |file| pc.resolve(Some(file)).simplify_design_type_typeofs;
        assert_eq!(enabled("/src/models/venue.model.ts"), Some(true));
        assert_eq!(enabled("/src/models/user.model.ts"), Some(true));
        assert_eq!(enabled("/src/models/item.model.ts"), Some(false));
    }

    #[test]
    fn should_expand_braces() {
        let mut pc = with_design_typeofs(false);
        pc.overrides
            .push(rule(&["**/*.{model,schema}.*"], design_typeofs(true)));
        let enabled = |file| pc.resolve(Some(file)).simplify_design_type_typeofs;
        assert_eq!(enabled("/src/venue.model.ts"), Some(true));
        assert_eq!(enabled("/src/venue.schema.ts"), Some(true));
        assert_eq!(enabled("/src/venue.service.ts"), Some(false));
    }

    #[test]
    fn should_match_absolute_paths() {
        let mut pc = with_design_typeofs(false);
        pc.overrides.push(rule(&["**/venue.model*"], design_typeofs(true)));
        let resolved = pc.resolve(Some("/home/user/project/src/models/venue.model.ts"));
        assert_eq!(resolved.simplify_design_type_typeofs, Some(true));
    }

    #[test]
    fn should_skip_invalid_patterns_when_resolving() {
        let mut pc = with_design_typeofs(false);
        pc.overrides
            .push(rule(&["src/[abc", "**/*.model.*"], design_typeofs(true)));
        assert_eq!(pc.resolve(Some(MODEL)).simplify_design_type_typeofs, Some(true));
        assert!(matches!(pc.validate(), Err(SimplifyError::Config(_))));
    }
}

mod json {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn should_accept_config_without_overrides() {
        let pc = PluginConfig::from_json(r#"{"simplifyDesignTypeTypeofs": true}"#).unwrap();
        assert_eq!(pc.base.simplify_design_type_typeofs, Some(true));
        assert!(pc.overrides.is_empty());
    }

    #[test]
    fn should_leave_unset_fields_empty() {
        let pc = PluginConfig::from_json("{}").unwrap();
        assert!(pc.overrides.is_empty());
        assert_eq!(pc.base, Config::empty());
        assert_eq!(pc.base.options(), Config::default().options());
    }

    #[test]
    fn should_read_full_config() {
        let json = r#"{
            "knownSafeDecorators": [
                { "decorator": "@nestjs/graphql#*" },
                { "decorator": "Get", "ignores": ["returntype"] }
            ],
            "placeholderTypes": ["Object", "Any"],
            "helperNames": { "decorate": ["applyDecorators"] },
            "collapseEmptyDecorations": false,
            "simplifyDesignTypeTypeofs": false,
            "overrides": [
                {
                    "files": ["**/venue.model*", "**/user.model*"],
                    "config": { "simplifyDesignTypeTypeofs": true }
                }
            ]
        }"#;
        let pc = PluginConfig::from_json(json).unwrap();

        assert_eq!(
            pc.base.known_safe_decorators,
            Some(vec![
                SafeDecorator::new("@nestjs/graphql#*"),
                SafeDecorator::ignoring("Get", &[MetadataKind::ReturnType]),
            ])
        );
        let options = pc.base.options();
        assert_eq!(options.placeholder_types, vec!["Object", "Any"]);
        assert_eq!(options.helper_names.decorate, vec!["applyDecorators"]);
        assert!(options.helper_names.param.is_empty());
        assert!(!options.collapse_empty_decorations);

        assert_eq!(
            pc.resolve(Some("/src/models/venue.model.ts")).simplify_design_type_typeofs,
            Some(true)
        );
        assert_eq!(
            pc.resolve(Some("/src/models/item.model.ts")).simplify_design_type_typeofs,
            Some(false)
        );
    }

    #[test]
    fn should_reject_malformed_json() {
        let err = PluginConfig::from_json(r#"{"stripMetadata": "yes"}"#).unwrap_err();
        assert!(matches!(err, SimplifyError::Config(_)));
    }

    #[test]
    fn should_reject_unknown_metadata_kinds() {
        let json = r#"{"knownSafeDecorators": [{ "decorator": "Get", "ignores": ["design:type"] }]}"#;
        assert!(PluginConfig::from_json(json).is_err());
    }
}
