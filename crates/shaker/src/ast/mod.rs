pub mod error;
pub mod js_ast;
#[cfg(test)]
pub mod tests;
