mod ast;
mod eval;
mod validate;


pub use ast::*;
pub use eval::evaluate;
pub(crate) use validate::validate;
