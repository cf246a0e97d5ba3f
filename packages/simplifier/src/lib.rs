#![deny(clippy::all)]

/**
 * Decorator Metadata Simplifier
 *
 * Rewrites the decorator call sequences a TypeScript compiler emits
 * (`_ts_decorate([...], C.prototype, "m", null)` with `design:*` metadata
 * calls inside) into an equivalent, smaller form.
 */

// Pipeline, leaf-first
pub mod bindings;
pub mod classifier;
pub mod analyzer;
pub mod planner;
pub mod rewriter;

// Shared pieces
pub mod config;
mod error;
pub mod model;
pub mod normalize;
mod report;
pub mod syntax;

// Re-exports
pub use config::{Config, HelperNames, OverrideRule, PluginConfig, SafeDecorator};
pub use error::{RewriteConflict, SimplifyError};
pub use report::SimplifyReport;

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;
use smallvec::{smallvec, SmallVec};

use crate::bindings::UnitIndex;
use crate::model::{DecoratedMember, Site};
use crate::planner::{EditOp, EditPlan, ListLayout};
use crate::rewriter::{Emitter, Rewriter};

pub type Result<T> = std::result::Result<T, SimplifyError>;

/// Output of one [`Simplifier::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simplified {
    pub code: String,
    pub report: SimplifyReport,
}

/// Simplify one unit with the default configuration.
pub fn simplify(source: &str) -> Result<String> {
    Simplifier::default().run(source).map(|out| out.code)
}

/// Simplify one unit with an explicit base configuration.
pub fn simplify_with_config(source: &str, config: &Config) -> Result<String> {
    Simplifier::from_config(config.clone())
        .run(source)
        .map(|out| out.code)
}

/// The engine, configured once and reusable across units and threads.
#[derive(Debug, Clone, Default)]
pub struct Simplifier {
    config: PluginConfig,
}

impl Simplifier {
    pub fn new(config: PluginConfig) -> Self {
        Self { config }
    }

    /// A simplifier without per-file overrides.
    pub fn from_config(config: Config) -> Self {
        Self::new(PluginConfig {
            base: config,
            overrides: Vec::new(),
        })
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn run(&self, source: &str) -> Result<Simplified> {
        self.run_file(source, None)
    }

    /// Simplify one unit. The filename selects override rules and the
    /// source type (`.ts`, `.mjs`, `.cjs`, ...); it is never read.
    pub fn run_file(&self, source: &str, filename: Option<&str>) -> Result<Simplified> {
        let options = self.config.resolve(filename).options();

        let allocator = Allocator::default();
        let (program, source_type) = parse(&allocator, source, filename)?;

        let index = UnitIndex::build(&program, &options.helper_names);
        let sites = classifier::classify(&program, source, &index, &options);

        let rewriter = Rewriter {
            source,
            source_type,
            index: &index,
            options: &options,
        };
        let (code, report) = rewrite_sites(&rewriter, &sites, |member| {
            let verdicts = analyzer::analyze(member, &options);
            planner::plan(member, &verdicts, &options)
        });
        tracing::debug!(filename = filename.unwrap_or("<input>"), %report, "simplified unit");

        Ok(Simplified { code, report })
    }
}

/// Plan, check and emit every site of a unit. A site whose edits fail
/// validation is recorded as rolled back and emitted as it was.
fn rewrite_sites(
    rewriter: &Rewriter<'_>,
    sites: &[Site],
    plan_site: impl Fn(&DecoratedMember) -> EditPlan,
) -> (String, SimplifyReport) {
    let mut emitter = Emitter::default();
    let mut report = SimplifyReport {
        sites: sites.len(),
        ..SimplifyReport::default()
    };

    for site in sites {
        let member = match site {
            Site::Member(member) => member,
            Site::Opaque { span, reason } => {
                report.opaque.push((span.start, *reason));
                continue;
            }
        };

        let plan = plan_site(member);
        if plan.is_noop() {
            continue;
        }

        let edits = match rewriter.site_edits(member, &plan) {
            Ok(edits) => edits,
            Err(conflict) => {
                tracing::warn!(site = %member.label(), %conflict, "rolling back site rewrite");
                report.rolled_back.push((member.site.start, conflict));
                continue;
            }
        };
        if !emitter.push(edits) {
            tracing::debug!(site = %member.label(), "site lies inside a rewritten site, skipping");
            continue;
        }

        for op in &plan.ops {
            if let EditOp::Drop { kind, .. } = op {
                tracing::debug!(site = %member.label(), %kind, "dropping metadata entry");
            }
        }
        report.entries_dropped += plan.dropped();
        report.entries_rewritten += plan.rewritten();
        if plan.layout == ListLayout::Collapse {
            report.sites_collapsed += 1;
        }
    }

    let code = if emitter.is_empty() {
        rewriter.source.to_string()
    } else {
        emitter.finish(rewriter.source)
    };
    (code, report)
}

/// Parse as the filename suggests, or as a module when there is none. Plain
/// JavaScript that fails as a module gets a second chance as a script.
fn parse<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    filename: Option<&str>,
) -> Result<(Program<'a>, SourceType)> {
    let primary = filename
        .and_then(|f| SourceType::from_path(f).ok())
        .unwrap_or_else(|| SourceType::default().with_module(true));
    let mut candidates: SmallVec<[SourceType; 2]> = smallvec![primary];
    if primary.is_module() && !primary.is_typescript() {
        candidates.push(primary.with_module(false));
    }

    let mut first_error = None;
    for source_type in candidates {
        let ret = Parser::new(allocator, source, source_type).parse();
        if ret.errors.is_empty() && !ret.panicked {
            return Ok((ret.program, source_type));
        }
        if first_error.is_none() {
            first_error = Some(match ret.errors.first() {
                Some(error) => {
                    let offset = error
                        .labels
                        .as_ref()
                        .and_then(|labels| labels.first())
                        .map_or(0, |label| label.offset() as u32);
                    SimplifyError::parse(error.to_string(), offset)
                }
                None => SimplifyError::parse("parser gave up", 0),
            });
        }
    }
    Err(first_error.unwrap_or_else(|| SimplifyError::parse("parser gave up", 0)))
}
