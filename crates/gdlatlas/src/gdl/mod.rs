//! GDL syntax: arena tree and KIF reader

mod ast;
mod parser;

pub use ast::{GdlTree, Node, NodeId, NodeKind};
pub use parser::{parse_gdl, parse_term_sexpr, SExpr};

pub(crate) use parser::lower_term;
