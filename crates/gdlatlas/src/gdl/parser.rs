//! KIF reader for GDL game descriptions
//!
//! Parses the s-expression surface syntax into a [`GdlTree`]. Variables are
//! renamed apart here: each top-level clause gets a scope counter, and every
//! variable atom is suffixed with it, so `?x` in two different clauses never
//! aliases during domain construction.

use super::ast::{GdlTree, NodeId, NodeKind};
use crate::error::{Result, TranslationError};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::map,
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};

/// An s-expression as read from the source text, before lowering into the
/// tree arena. Also the exchange format for re-parsing candidate values
/// during grounding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

/// Skip whitespace and `;` line comments.
fn ws(input: &str) -> IResult<&str, ()> {
    let mut rest = input.trim_start();
    while let Some(comment) = rest.strip_prefix(';') {
        match comment.find('\n') {
            Some(i) => rest = comment[i + 1..].trim_start(),
            None => rest = "",
        }
    }
    Ok((rest, ()))
}

fn atom(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != '(' && c != ')' && c != ';')(input)
}

fn expr(input: &str) -> IResult<&str, SExpr> {
    let (input, _) = ws(input)?;
    alt((list, map(atom, |a: &str| SExpr::Atom(a.to_string()))))(input)
}

fn list(input: &str) -> IResult<&str, SExpr> {
    let (input, items) = delimited(char('('), many0(expr), preceded(ws, char(')')))(input)?;
    Ok((input, SExpr::List(items)))
}

/// Parse a whole GDL program into a tree.
pub fn parse_gdl(input: &str) -> Result<GdlTree> {
    let mut tree = GdlTree::new();
    let mut rest = input;
    let mut scope = 0usize;
    loop {
        let (r, _) = ws(rest).map_err(|e| TranslationError::Parse(format!("{:?}", e)))?;
        if r.is_empty() {
            break;
        }
        let (r, sexpr) = expr(r).map_err(|e| {
            TranslationError::Parse(format!("at clause {}: {:?}", scope, e))
        })?;
        lower_clause(&mut tree, &sexpr, scope)?;
        scope += 1;
        rest = r;
    }
    Ok(tree)
}

/// Parse a single term, as used when grafting a candidate value back into a
/// clause during grounding.
pub fn parse_term_sexpr(input: &str) -> Result<SExpr> {
    let (rest, sexpr) =
        expr(input).map_err(|e| TranslationError::Parse(format!("in term: {:?}", e)))?;
    let (rest, _) = ws(rest).map_err(|e| TranslationError::Parse(format!("{:?}", e)))?;
    if !rest.is_empty() {
        return Err(TranslationError::Parse(format!(
            "trailing input after term: {:?}",
            rest
        )));
    }
    Ok(sexpr)
}

fn lower_clause(tree: &mut GdlTree, sexpr: &SExpr, scope: usize) -> Result<NodeId> {
    let root = tree.root();
    if let SExpr::List(items) = sexpr {
        if let Some(SExpr::Atom(functor)) = items.first() {
            if functor == "<=" {
                if items.len() < 2 {
                    return Err(TranslationError::Parse("rule without a head".to_string()));
                }
                let rule = tree.push(NodeKind::Rule, "<=", root);
                for item in &items[1..] {
                    lower_term(tree, item, scope, rule)?;
                }
                return Ok(rule);
            }
        }
    }
    lower_term(tree, sexpr, scope, root)
}

/// Lower an s-expression into the arena as a term under `parent`.
pub(crate) fn lower_term(
    tree: &mut GdlTree,
    sexpr: &SExpr,
    scope: usize,
    parent: NodeId,
) -> Result<NodeId> {
    match sexpr {
        SExpr::Atom(a) if a.starts_with('?') => {
            Ok(tree.push(NodeKind::Variable, &format!("{}#{}", a, scope), parent))
        }
        SExpr::Atom(a) => Ok(tree.push(NodeKind::Constant, a, parent)),
        SExpr::List(items) => {
            let functor = match items.first() {
                Some(SExpr::Atom(f)) => f.clone(),
                _ => {
                    return Err(TranslationError::Parse(
                        "compound term must start with a symbol".to_string(),
                    ))
                }
            };
            let node = tree.push(NodeKind::Formula, &functor, parent);
            for item in &items[1..] {
                lower_term(tree, item, scope, node)?;
            }
            Ok(node)
        }
    }
}
