//! Variable elimination by substitution over computed domains
//!
//! Each clause is instantiated once per assignment of its variables to
//! candidate constants. Candidates come from the domain graph: a variable
//! occurring at several positions accumulates the union of all those
//! positions' domains. That union is deliberately permissive; the rule-set
//! simplifier discards instances that turn out unsatisfiable.
//!
//! Substitution happens structurally: the clause subtree is copied per
//! assignment and each variable node is replaced by the re-parsed candidate
//! term. A candidate that fails to re-parse skips only the clause instance
//! that needed it and is reported as a warning, never silently dropped.

use crate::domain::{DomainGraph, DomainValue};
use crate::error::TranslationWarning;
use crate::gdl::{lower_term, parse_term_sexpr, GdlTree, NodeId, NodeKind, SExpr};
use indexmap::{IndexMap, IndexSet};

/// Output of a grounding pass.
#[derive(Debug)]
pub struct GroundingResult {
    /// The fully ground program.
    pub tree: GdlTree,
    /// Number of clause instances produced by substitution (clauses that
    /// were already ground pass through and are not counted).
    pub instances: usize,
    /// Clauses or candidates that had to be skipped.
    pub warnings: Vec<TranslationWarning>,
}

/// Ground every clause of `tree` against the domains in `domains`.
pub fn ground(tree: &GdlTree, domains: &DomainGraph) -> GroundingResult {
    let mut out = GdlTree::new();
    let mut warnings = Vec::new();
    let mut instances = 0usize;

    for &clause in tree.top_level() {
        let variables = tree.variables_in(clause);
        if variables.is_empty() {
            copy_ground(tree, clause, &mut out);
            continue;
        }
        instances += instantiate(tree, clause, &variables, domains, &mut out, &mut warnings);
    }

    GroundingResult {
        tree: out,
        instances,
        warnings,
    }
}

/// Instantiate one clause over all assignments of its variables. Returns
/// the number of instances emitted.
fn instantiate(
    tree: &GdlTree,
    clause: NodeId,
    variables: &[NodeId],
    domains: &DomainGraph,
    out: &mut GdlTree,
    warnings: &mut Vec<TranslationWarning>,
) -> usize {
    // Union candidate values per variable name, in first-occurrence order.
    let mut candidates: IndexMap<String, IndexSet<String>> = IndexMap::new();
    for &var in variables {
        let Some(parent) = tree.parent(var) else {
            continue;
        };
        let name = tree.node(var).atom.clone();
        let slot = candidates.entry(name).or_default();
        let parent_atom = &tree.node(parent).atom;
        let pos = tree.position(var);
        for value in domains.domain(parent_atom, pos) {
            match value {
                DomainValue::Constant(c) => {
                    slot.insert(c);
                }
                DomainValue::Compound { name, arity } => {
                    for instance in domains.ground_instances(&name, arity) {
                        slot.insert(instance);
                    }
                }
            }
        }
    }

    for (name, values) in &candidates {
        if values.is_empty() {
            warnings.push(TranslationWarning::EmptyDomain {
                clause: tree.render(clause),
                variable: name.clone(),
            });
            return 0;
        }
    }

    // Re-parse each candidate once per clause; a candidate that does not
    // read back as a term is dropped here with a warning and excluded from
    // the assignments below.
    let mut templates: IndexMap<String, SExpr> = IndexMap::new();
    let mut usable: Vec<(String, Vec<String>)> = Vec::with_capacity(candidates.len());
    for (name, values) in &candidates {
        let mut kept = Vec::with_capacity(values.len());
        for value in values {
            match parse_term_sexpr(value) {
                Ok(sexpr) => {
                    templates.insert(value.clone(), sexpr);
                    kept.push(value.clone());
                }
                Err(e) => warnings.push(TranslationWarning::RegroundFailure {
                    clause: tree.render(clause),
                    detail: format!("candidate {}: {}", value, e),
                }),
            }
        }
        if kept.is_empty() {
            warnings.push(TranslationWarning::EmptyDomain {
                clause: tree.render(clause),
                variable: name.clone(),
            });
            return 0;
        }
        usable.push((name.clone(), kept));
    }

    // Enumerate assignments: first variable outermost, so earlier
    // candidates of earlier variables come first in the output.
    let mut emitted = 0usize;
    let mut odometer = vec![0usize; usable.len()];
    let root = out.root();
    loop {
        let mut binding: IndexMap<&str, &SExpr> = IndexMap::new();
        for (slot, &i) in odometer.iter().enumerate() {
            let (name, values) = &usable[slot];
            binding.insert(name.as_str(), &templates[&values[i]]);
        }
        match copy_substituting(tree, clause, &binding, out, root) {
            Ok(()) => emitted += 1,
            Err(detail) => warnings.push(TranslationWarning::RegroundFailure {
                clause: tree.render(clause),
                detail,
            }),
        }

        let mut slot = usable.len();
        loop {
            if slot == 0 {
                return emitted;
            }
            slot -= 1;
            odometer[slot] += 1;
            if odometer[slot] < usable[slot].1.len() {
                break;
            }
            odometer[slot] = 0;
        }
    }
}

/// Copy a variable-free clause into the output tree unchanged.
fn copy_ground(src: &GdlTree, id: NodeId, out: &mut GdlTree) {
    let empty = IndexMap::new();
    let root = out.root();
    // no variables, so substitution can't fail
    let _ = copy_substituting(src, id, &empty, out, root);
}

fn copy_substituting(
    src: &GdlTree,
    id: NodeId,
    binding: &IndexMap<&str, &SExpr>,
    out: &mut GdlTree,
    parent: NodeId,
) -> Result<(), String> {
    let node = src.node(id);
    if node.kind == NodeKind::Variable {
        let Some(&template) = binding.get(node.atom.as_str()) else {
            return Err(format!("unbound variable {}", node.atom));
        };
        lower_term(out, template, 0, parent).map_err(|e| e.to_string())?;
        return Ok(());
    }
    let copied = out.push(node.kind, &node.atom, parent);
    for &child in src.children(id) {
        copy_substituting(src, child, binding, out, copied)?;
    }
    Ok(())
}
