//! Fixture Tests
//!
//! Every directory under `test/fixture/` holds an `input.js`, the expected
//! `output.js` and optionally a `config.json` in the plugin config format.

use std::fs;
use std::path::{Path, PathBuf};

use metadata_simplifier::{PluginConfig, Simplifier};
use pretty_assertions::assert_eq;

fn fixture_inputs() -> Vec<PathBuf> {
    let pattern = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test/fixture/*/input.js")
        .to_string_lossy()
        .into_owned();
    let mut inputs: Vec<PathBuf> = glob::glob(&pattern)
        .expect("valid fixture pattern")
        .filter_map(|entry| entry.ok())
        .collect();
    inputs.sort();
    inputs
}

fn simplifier_for(dir: &Path) -> Simplifier {
    let config_path = dir.join("config.json");
    if !config_path.exists() {
        return Simplifier::default();
    }
    let json = fs::read_to_string(&config_path).expect("readable config.json");
    let config = PluginConfig::from_json(&json)
        .unwrap_or_else(|e| panic!("{}: {e}", config_path.display()));
    Simplifier::new(config)
}

#[test]
fn should_have_fixtures() {
    assert!(fixture_inputs().len() >= 8);
}

#[test]
fn should_match_expected_output_for_every_fixture() {
    for input_path in fixture_inputs() {
        let dir = input_path.parent().expect("fixture directory");
        let name = dir.file_name().unwrap().to_string_lossy();

        let input = fs::read_to_string(&input_path).unwrap();
        let expected = fs::read_to_string(dir.join("output.js"))
            .unwrap_or_else(|_| panic!("fixture {name} has no output.js"));

        let simplifier = simplifier_for(dir);
        let actual = simplifier
            .run_file(&input, Some(&input_path.to_string_lossy()))
            .unwrap_or_else(|e| panic!("fixture {name} failed: {e}"));

        assert_eq!(actual.code, expected, "fixture {name}");
        assert!(actual.report.rolled_back.is_empty(), "fixture {name} rolled back a site");
    }
}

#[test]
fn should_reach_a_fixed_point_on_every_fixture() {
    for input_path in fixture_inputs() {
        let dir = input_path.parent().unwrap();
        let name = dir.file_name().unwrap().to_string_lossy();
        let expected = fs::read_to_string(dir.join("output.js")).unwrap();

        let again = simplifier_for(dir)
            .run_file(&expected, Some(&input_path.to_string_lossy()))
            .unwrap();
        assert_eq!(again.code, expected, "fixture {name} is not idempotent");
    }
}
