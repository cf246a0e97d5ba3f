#![deny(clippy::all)]

use metadata_simplifier::{PluginConfig, Simplifier, SimplifyError};
use napi::{Error, Result, Status};
use napi_derive::napi;

fn to_napi(e: SimplifyError) -> Error {
    Error::new(Status::GenericFailure, e.to_string())
}

/// An unreadable or invalid config string means the defaults.
fn plugin_config(config_json: Option<&str>) -> PluginConfig {
    config_json
        .filter(|json| !json.trim().is_empty())
        .and_then(|json| PluginConfig::from_json(json).ok())
        .unwrap_or_default()
}

/// Counts from one run, as seen from JavaScript.
#[napi(object)]
pub struct SimplifyOutput {
    pub code: String,
    pub changed: bool,
    pub sites: u32,
    pub entries_dropped: u32,
    pub entries_rewritten: u32,
    pub sites_collapsed: u32,
    pub opaque_sites: u32,
    pub rolled_back: u32,
}

#[napi]
pub struct MetadataSimplifier {
    inner: Simplifier,
}

#[napi]
impl MetadataSimplifier {
    /// `configJson` is the plugin config as a JSON string.
    #[napi(constructor)]
    pub fn new(config_json: Option<String>) -> Self {
        MetadataSimplifier {
            inner: Simplifier::new(plugin_config(config_json.as_deref())),
        }
    }

    #[napi]
    pub fn simplify(&self, source: String, filename: Option<String>) -> Result<String> {
        self.inner
            .run_file(&source, filename.as_deref())
            .map(|out| out.code)
            .map_err(to_napi)
    }

    #[napi]
    pub fn simplify_with_report(&self, source: String, filename: Option<String>) -> Result<SimplifyOutput> {
        let out = self
            .inner
            .run_file(&source, filename.as_deref())
            .map_err(to_napi)?;
        let report = out.report;
        Ok(SimplifyOutput {
            changed: out.code != source,
            code: out.code,
            sites: report.sites as u32,
            entries_dropped: report.entries_dropped as u32,
            entries_rewritten: report.entries_rewritten as u32,
            sites_collapsed: report.sites_collapsed as u32,
            opaque_sites: report.opaque.len() as u32,
            rolled_back: report.rolled_back.len() as u32,
        })
    }
}

/// One-shot entry point for bundler loaders.
#[napi]
pub fn simplify(source: String, filename: Option<String>, config_json: Option<String>) -> Result<String> {
    MetadataSimplifier::new(config_json).simplify(source, filename)
}
