use anyhow::Result;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::ast::js_ast::JsAst;
use crate::config::Config;
use crate::thread_pool;
use crate::transform::transform_module;

#[derive(Debug, Clone)]
pub struct Source {
    pub path: String,
    pub content: String,
}

impl Source {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Printed outputs of one module, one per enabled policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformedSource {
    pub kept_exports: Option<String>,
    pub exports_removed: Option<String>,
    pub side_effects_removed: Option<String>,
    pub removed_calls: usize,
}

#[derive(Debug)]
pub struct ModuleOutcome {
    pub path: String,
    pub result: Result<TransformedSource>,
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{} of {total} modules failed:\n{}", .failures.len(), describe(.failures))]
    ModulesFailed {
        total: usize,
        /// `(path, message)` of each failed module.
        failures: Vec<(String, String)>,
    },
}

fn describe(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(path, message)| format!("  {}: {}", path, message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses, transforms and prints every source in parallel. A module that
/// fails only fails its own outcome; outcomes keep the input order.
pub fn transform_sources(sources: &[Source], config: &Config) -> Vec<ModuleOutcome> {
    let outcomes = thread_pool::install(|| {
        sources
            .par_iter()
            .map(|source| ModuleOutcome {
                path: source.path.clone(),
                result: transform_source(&source.path, &source.content, config),
            })
            .collect::<Vec<_>>()
    });

    let failed = outcomes
        .iter()
        .filter(|outcome| outcome.result.is_err())
        .count();
    info!(
        "transformed {} modules, {} failed",
        outcomes.len() - failed,
        failed
    );
    outcomes
}

pub fn transform_source(path: &str, content: &str, config: &Config) -> Result<TransformedSource> {
    let ast = JsAst::new(path, content)?;
    let output = transform_module(&ast.ast, config)?;

    let kept_exports = match &output.kept_exports {
        Some(module) => Some(ast.generate_module(module)?),
        None => None,
    };
    let exports_removed = match &output.exports_removed {
        Some(module) => Some(ast.generate_module(module)?),
        None => None,
    };
    let (side_effects_removed, removed_calls) = match &output.side_effects_removed {
        Some(removed) => (Some(ast.generate_module(&removed.module)?), removed.count),
        None => (None, 0),
    };
    Ok(TransformedSource {
        kept_exports,
        exports_removed,
        side_effects_removed,
        removed_calls,
    })
}

/// Turns a batch into a single result, reporting every failed module.
pub fn collect_outcomes(
    outcomes: Vec<ModuleOutcome>,
) -> Result<Vec<(String, TransformedSource)>, BatchError> {
    let total = outcomes.len();
    let mut transformed = vec![];
    let mut failures = vec![];
    for ModuleOutcome { path, result } in outcomes {
        match result {
            Ok(source) => transformed.push((path, source)),
            Err(err) => {
                warn!("failed to transform {}: {}", path, err);
                failures.push((path, format!("{:#}", err)));
            }
        }
    }
    if failures.is_empty() {
        Ok(transformed)
    } else {
        Err(BatchError::ModulesFailed { total, failures })
    }
}
