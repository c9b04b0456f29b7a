use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use swc_core::common::comments::SingleThreadedComments;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceMap, Spanned};
use swc_core::ecma::ast::{EsVersion, Module};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config as JsCodegenConfig, Emitter};
use swc_core::ecma::parser::error::SyntaxError;
use swc_core::ecma::parser::{parse_file_as_module, EsSyntax, Syntax, TsSyntax};

use crate::ast::error;

/// A parsed module together with the source map and comments needed to
/// print it, or any module derived from it, back to code.
pub struct JsAst {
    pub ast: Module,
    pub path: String,
    cm: Lrc<SourceMap>,
    comments: SingleThreadedComments,
}

impl fmt::Debug for JsAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsAst({})", self.path)
    }
}

impl JsAst {
    pub fn new(path: &str, content: impl Into<String>) -> Result<Self> {
        let cm: Lrc<SourceMap> = Default::default();
        let comments = SingleThreadedComments::default();
        let fm = cm.new_source_file(FileName::Custom(path.to_string()).into(), content.into());

        let extname = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("js");
        // Type annotations parse but carry no scope references; the export
        // sweep keeps imports that kept types name.
        let syntax = if extname == "ts" || extname == "tsx" {
            Syntax::Typescript(TsSyntax {
                tsx: extname == "tsx",
                decorators: true,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: true,
                decorators: true,
                decorators_before_export: true,
                explicit_resource_management: true,
                ..Default::default()
            })
        };

        let mut ast_errors = vec![];
        let ast = parse_file_as_module(
            &fm,
            syntax,
            EsVersion::EsNext,
            Some(&comments),
            &mut ast_errors,
        );
        // ignore with syntax error in strict mode
        ast_errors.retain(|error| !matches!(error.kind(), SyntaxError::WithInStrict));
        let ast = match ast {
            Ok(ast) if ast_errors.is_empty() => ast,
            ast => {
                if let Err(err) = ast {
                    ast_errors.push(err);
                }
                let messages = ast_errors
                    .iter()
                    .map(|err| {
                        let loc = cm.lookup_char_pos(err.span().lo);
                        format!(
                            "{}:{}:{}: {}",
                            path,
                            loc.line,
                            loc.col_display + 1,
                            err.kind().msg()
                        )
                    })
                    .collect::<Vec<String>>();
                return Err(anyhow!(error::ParseError::JsParseError {
                    messages: messages.join("\n")
                }));
            }
        };

        Ok(JsAst {
            ast,
            path: path.to_string(),
            cm,
            comments,
        })
    }

    pub fn generate(&self) -> Result<String> {
        self.generate_module(&self.ast)
    }

    /// Prints `module` with the source map and comments of this file.
    /// `module` is expected to be derived from `self.ast`, so that its spans
    /// still point into this file.
    pub fn generate_module(&self, module: &Module) -> Result<String> {
        // the emitter takes comments out of the store while printing
        let comments = self.fork_comments();
        let mut buf = vec![];
        {
            let mut emitter = Emitter {
                cfg: JsCodegenConfig::default().with_target(EsVersion::EsNext),
                cm: self.cm.clone(),
                comments: Some(&comments),
                wr: JsWriter::new(self.cm.clone(), "\n", &mut buf, None),
            };
            emitter.emit_module(module).map_err(|err| {
                anyhow!(error::GenerateError::JsGenerateError {
                    message: err.to_string()
                })
            })?;
        }
        let code = String::from_utf8(buf)?;
        Ok(code)
    }

    fn fork_comments(&self) -> SingleThreadedComments {
        let (leading, trailing) = self.comments.borrow_all();
        SingleThreadedComments::from_leading_and_trailing(
            Rc::new(RefCell::new(leading.clone())),
            Rc::new(RefCell::new(trailing.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::JsAst;
    use crate::ast::error::ParseError;

    #[test]
    fn test_generate_keeps_comments() {
        let ast = JsAst::new("a.js", "// hello\nconst a = 1;").unwrap();
        let first = ast.generate().unwrap();
        assert!(first.contains("// hello"));
        assert_eq!(ast.generate().unwrap(), first);
    }

    #[test]
    fn test_parse_jsx_and_ts() {
        assert!(JsAst::new("a.jsx", "const a = <div>{b}</div>;").is_ok());
        assert!(JsAst::new("a.ts", "const a: number = 1;").is_ok());
        assert!(JsAst::new("a.tsx", "const a: number = <A />;").is_ok());
    }

    #[test]
    fn test_parse_error_has_position() {
        let err = JsAst::new("bad.js", "const a = ;").unwrap_err();
        let err = err.downcast::<ParseError>().unwrap();
        let ParseError::JsParseError { messages } = err;
        assert!(messages.starts_with("bad.js:1:"));
    }
}
