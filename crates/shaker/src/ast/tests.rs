use super::js_ast::JsAst;

pub struct TestUtils {
    pub ast: JsAst,
}

impl TestUtils {
    pub fn new(file: &str, content: &str) -> TestUtils {
        let ast = JsAst::new(file, content).unwrap();
        TestUtils { ast }
    }

    pub fn gen_js_ast(content: &str) -> TestUtils {
        TestUtils::new("test.js", content)
    }

    pub fn js_ast_to_code(&self) -> String {
        self.ast.generate().unwrap()
    }

    /// Expected code printed by the same printer, so assertions do not
    /// depend on the formatting of the literal in the test.
    pub fn normalize(code: &str) -> String {
        TestUtils::gen_js_ast(code).js_ast_to_code()
    }
}
