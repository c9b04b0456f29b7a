use swc_core::ecma::ast::Module;

use crate::config::Config;
use crate::error::ShakeError;
use crate::tree_shaking::{keep_exports, remove_exports};
use crate::visitors::remove_side_effect::remove_side_effects;

#[derive(Debug, Clone)]
pub struct RemovedSideEffects {
    pub module: Module,
    /// Number of call statements removed.
    pub count: usize,
}

/// One output per configured policy; `None` when the policy is disabled.
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    pub kept_exports: Option<Module>,
    pub exports_removed: Option<Module>,
    pub side_effects_removed: Option<RemovedSideEffects>,
}

/// Runs every policy of `config` against `module`. Each policy works on its
/// own clone with its own scope graph, so `module` is left untouched and the
/// outputs never see each other's edits.
pub fn transform_module(module: &Module, config: &Config) -> Result<TransformOutput, ShakeError> {
    let kept_exports = match &config.keep_exports {
        Some(roots) => {
            let mut module = module.clone();
            keep_exports(&mut module, roots)?;
            Some(module)
        }
        None => None,
    };

    let exports_removed = match &config.remove_exports {
        Some(names) => {
            let mut module = module.clone();
            remove_exports(&mut module, names)?;
            Some(module)
        }
        None => None,
    };

    let side_effects_removed = match &config.remove_side_effects {
        Some(targets) => {
            let mut module = module.clone();
            let count = remove_side_effects(&mut module, targets)?;
            Some(RemovedSideEffects { module, count })
        }
        None => None,
    };

    Ok(TransformOutput {
        kept_exports,
        exports_removed,
        side_effects_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::transform_module;
    use crate::ast::tests::TestUtils;
    use crate::config::{Config, RemovalTargets, RootSet};

    const CODE: &str = r#"
import { useEffect } from "react";
export function App() {
  useEffect(() => {});
  return null;
}
export const unused = 1;
"#;

    #[test]
    fn test_policies_run_on_separate_copies() {
        let test_utils = TestUtils::gen_js_ast(CODE);
        let config = Config {
            keep_exports: Some(RootSet::new(["App"])),
            remove_exports: Some(RootSet::new(["App"])),
            remove_side_effects: Some(RemovalTargets::default()),
        };
        let output = transform_module(&test_utils.ast.ast, &config).unwrap();

        let kept = test_utils
            .ast
            .generate_module(&output.kept_exports.unwrap())
            .unwrap();
        assert_eq!(
            kept,
            TestUtils::normalize(
                r#"
import { useEffect } from "react";
export function App() {
  useEffect(() => {});
  return null;
}
"#
            )
        );

        assert_eq!(
            test_utils
                .ast
                .generate_module(&output.exports_removed.unwrap())
                .unwrap(),
            TestUtils::normalize(
                r#"
import { useEffect } from "react";
export const unused = 1;
"#
            )
        );

        let removed = output.side_effects_removed.unwrap();
        assert_eq!(removed.count, 1);
        assert_eq!(
            test_utils.ast.generate_module(&removed.module).unwrap(),
            TestUtils::normalize(
                r#"
import { useEffect } from "react";
export function App() {
  return null;
}
export const unused = 1;
"#
            )
        );

        assert_eq!(test_utils.js_ast_to_code(), TestUtils::normalize(CODE));
    }

    #[test]
    fn test_disabled_policies() {
        let test_utils = TestUtils::gen_js_ast(CODE);
        let output = transform_module(&test_utils.ast.ast, &Config::default()).unwrap();
        assert!(output.kept_exports.is_none());
        assert!(output.exports_removed.is_none());
        assert!(output.side_effects_removed.is_none());
    }
}
