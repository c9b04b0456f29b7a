use swc_core::common::Spanned;
use swc_core::ecma::ast::{Ident, ObjectPatProp, Pat};

use crate::error::ShakeError;

/// Drops the dead leaves of a declaration pattern in place and returns
/// whether anything is left to declare.
///
/// Dead array elements become holes so that later elements keep their index;
/// holes at the end are trimmed. An object pattern keeps its remaining
/// properties in order, and keeps all of them while its rest element lives.
pub(super) fn shrink_pat<F>(pat: &mut Pat, is_live: &F) -> Result<bool, ShakeError>
where
    F: Fn(&Ident) -> bool,
{
    let keep = match pat {
        Pat::Ident(binding) => is_live(&binding.id),
        // const [a = 1] = b;
        Pat::Assign(assign) => shrink_pat(&mut assign.left, is_live)?,
        // const [a, , b, ...rest] = c;
        Pat::Array(array) => {
            for elem in array.elems.iter_mut() {
                if let Some(pat) = elem {
                    if !shrink_pat(pat, is_live)? {
                        *elem = None;
                    }
                }
            }
            while matches!(array.elems.last(), Some(None)) {
                array.elems.pop();
            }
            !array.elems.is_empty()
        }
        Pat::Rest(rest) => shrink_pat(&mut rest.arg, is_live)?,
        // const { a, b: { c }, d = 1, ...rest } = e;
        Pat::Object(object) => {
            let rest_is_live = match object.props.last_mut() {
                Some(ObjectPatProp::Rest(rest)) => shrink_pat(&mut rest.arg, is_live)?,
                _ => false,
            };
            // every sibling key decides what the rest object leaves out
            if rest_is_live {
                return Ok(true);
            }
            let mut props = Vec::with_capacity(object.props.len());
            for mut prop in object.props.drain(..) {
                let keep = match &mut prop {
                    ObjectPatProp::KeyValue(kv) => shrink_pat(&mut kv.value, is_live)?,
                    ObjectPatProp::Assign(assign) => is_live(&assign.key.id),
                    ObjectPatProp::Rest(_) => false,
                };
                if keep {
                    props.push(prop);
                }
            }
            object.props = props;
            !object.props.is_empty()
        }
        Pat::Expr(expr) => {
            return Err(ShakeError::unsupported(
                "expression in declaration pattern",
                expr.span(),
            ))
        }
        Pat::Invalid(invalid) => {
            return Err(ShakeError::unsupported("invalid pattern", invalid.span))
        }
    };
    Ok(keep)
}

#[cfg(test)]
mod tests {
    use swc_core::ecma::ast::{Decl, ModuleItem, Stmt};

    use super::shrink_pat;
    use crate::ast::tests::TestUtils;

    fn shrink(code: &str, live: &[&str]) -> String {
        let mut test_utils = TestUtils::gen_js_ast(code);
        let is_live = |ident: &swc_core::ecma::ast::Ident| live.contains(&&*ident.sym);
        for item in test_utils.ast.ast.body.iter_mut() {
            if let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) = item {
                var.decls
                    .retain_mut(|decl| shrink_pat(&mut decl.name, &is_live).unwrap());
            }
        }
        test_utils.js_ast_to_code()
    }

    #[test]
    fn test_trailing_elements_are_trimmed() {
        assert_eq!(
            shrink("const [a, b, c, ...rest] = x;", &["a", "b"]),
            TestUtils::normalize("const [a, b] = x;")
        );
    }

    #[test]
    fn test_interior_elements_become_holes() {
        assert_eq!(
            shrink("const [a, b, c, ...rest] = x;", &["a", "rest"]),
            TestUtils::normalize("const [a, , , ...rest] = x;")
        );
        assert_eq!(
            shrink("const [a, [b, c] = d, e] = x;", &["c", "e"]),
            TestUtils::normalize("const [, [, c] = d, e] = x;")
        );
    }

    #[test]
    fn test_object_properties_keep_order() {
        assert_eq!(
            shrink("const { a, b: { c }, d = 1, e: f } = x;", &["f", "a"]),
            TestUtils::normalize("const { a, e: f } = x;")
        );
    }

    #[test]
    fn test_live_object_rest_keeps_siblings() {
        assert_eq!(
            shrink("const { a: {}, b: [], c, ...rest } = x;", &["rest"]),
            TestUtils::normalize("const { a: {}, b: [], c, ...rest } = x;")
        );
        assert_eq!(
            shrink("const { a: {}, c, ...rest } = x;", &["c"]),
            TestUtils::normalize("const { c } = x;")
        );
    }

    #[test]
    fn test_dead_declarators_are_removed() {
        assert_eq!(
            shrink("const a = 1, { b } = x, [c] = y;", &["c"]),
            TestUtils::normalize("const [c] = y;")
        );
    }
}
