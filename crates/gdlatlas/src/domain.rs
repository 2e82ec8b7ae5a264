//! Constant-domain graph for argument positions
//!
//! For every predicate/function argument position the graph records where
//! its values may come from: other positions that share a variable with it,
//! and the constants or compound terms written there directly. Asking for
//! the domain of a position walks that graph and collects every constant
//! reachable from it.
//!
//! The graph is built once per grounding pass and is read-only afterwards.
//! Queries recompute their answer each time; cyclic edges contribute
//! nothing on the recursive visit, so domains under true cycles are
//! under-approximated rather than looping.

use crate::gdl::{GdlTree, NodeId, NodeKind};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Index of a vertex within the graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(usize);

/// What a vertex stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// A bare constant value.
    Constant,
    /// One argument position of a predicate or function.
    ArgPos,
    /// A compound term site (function or formula application).
    Site,
}

/// A vertex: a name plus the position/arity that identifies it.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub name: String,
    pub pos: usize,
    pub kind: VertexKind,
    pub arity: usize,
}

impl Vertex {
    /// Label used in DOT output and debugging: `name[pos]` for constants
    /// and argument positions, `name/arity` for compound sites.
    pub fn label(&self) -> String {
        match self.kind {
            VertexKind::Site => format!("{}/{}", self.name, self.arity),
            _ => format!("{}[{}]", self.name, self.pos),
        }
    }
}

/// One element of a computed domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomainValue {
    /// A plain constant.
    Constant(String),
    /// A compound term site; stands for every ground instance of that
    /// function reachable through its own argument domains.
    Compound { name: String, arity: usize },
}

/// The domain graph over all argument positions of a program.
#[derive(Debug, Default)]
pub struct DomainGraph {
    vertices: Vec<Vertex>,
    lookup: HashMap<(String, usize, VertexKind), VertexId>,
    edges: IndexMap<VertexId, IndexSet<VertexId>>,
}

impl DomainGraph {
    /// Build the graph from an ungrounded program in one pass.
    pub fn build(tree: &GdlTree) -> Self {
        let mut graph = DomainGraph::default();
        let mut var_map: HashMap<String, VertexId> = HashMap::new();
        for &clause in tree.top_level() {
            match tree.node(clause).kind {
                NodeKind::Rule => {
                    for &part in tree.children(clause) {
                        graph.visit(tree, part, &mut var_map);
                    }
                }
                _ => graph.visit(tree, clause, &mut var_map),
            }
        }

        // Ground fluents and actions are exactly those declared reachable
        // via base/input.
        let base1 = graph.arg_vertex("base", 1);
        let true1 = graph.arg_vertex("true", 1);
        graph.add_edge(base1, true1);
        let input1 = graph.arg_vertex("input", 1);
        let does1 = graph.arg_vertex("does", 1);
        graph.add_edge(input1, does1);
        let input2 = graph.arg_vertex("input", 2);
        let does2 = graph.arg_vertex("does", 2);
        graph.add_edge(input2, does2);

        graph
    }

    fn visit(&mut self, tree: &GdlTree, id: NodeId, var_map: &mut HashMap<String, VertexId>) {
        let node = tree.node(id);
        if node.kind != NodeKind::Formula {
            return;
        }
        // Negation is transparent: the wrapped relation is registered, the
        // `not` itself is not a site.
        if node.atom == "not" {
            for &child in tree.children(id) {
                self.visit(tree, child, var_map);
            }
            return;
        }

        let args = tree.children(id);
        self.site_vertex(&node.atom, args.len());
        for (i, &arg) in args.iter().enumerate() {
            let pos = i + 1;
            let slot = self.arg_vertex(&node.atom, pos);
            let arg_node = tree.node(arg);
            match arg_node.kind {
                NodeKind::Variable => match var_map.get(&arg_node.atom) {
                    // Later occurrences link back to the first, merging the
                    // domains of all positions that share the variable.
                    Some(&first) => self.add_edge(first, slot),
                    None => {
                        var_map.insert(arg_node.atom.clone(), slot);
                    }
                },
                NodeKind::Constant => {
                    let value = self.constant_vertex(&arg_node.atom);
                    self.add_edge(slot, value);
                }
                NodeKind::Formula => {
                    let site = self.site_vertex(&arg_node.atom, tree.children(arg).len());
                    self.add_edge(slot, site);
                    self.visit(tree, arg, var_map);
                }
                NodeKind::Root | NodeKind::Rule => {}
            }
        }
    }

    /// Get or create the vertex for a bare constant.
    pub fn constant_vertex(&mut self, name: &str) -> VertexId {
        self.ensure(name, 0, VertexKind::Constant, 0)
    }

    /// Get or create the vertex for argument position `pos` of `name`.
    pub fn arg_vertex(&mut self, name: &str, pos: usize) -> VertexId {
        self.ensure(name, pos, VertexKind::ArgPos, 0)
    }

    /// Get or create the vertex for the compound site `name/arity`.
    pub fn site_vertex(&mut self, name: &str, arity: usize) -> VertexId {
        self.ensure(name, arity, VertexKind::Site, arity)
    }

    fn ensure(&mut self, name: &str, pos: usize, kind: VertexKind, arity: usize) -> VertexId {
        let key = (name.to_string(), pos, kind);
        if let Some(&id) = self.lookup.get(&key) {
            return id;
        }
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex {
            name: name.to_string(),
            pos,
            kind,
            arity,
        });
        self.lookup.insert(key, id);
        id
    }

    pub fn add_edge(&mut self, from: VertexId, to: VertexId) {
        self.edges.entry(from).or_default().insert(to);
    }

    /// The outgoing neighbours of an argument position. Unknown positions
    /// are not an error and yield nothing.
    pub fn neighbours(&self, name: &str, pos: usize) -> Vec<&Vertex> {
        let key = (name.to_string(), pos, VertexKind::ArgPos);
        match self.lookup.get(&key).and_then(|id| self.edges.get(id)) {
            Some(targets) => targets.iter().map(|t| &self.vertices[t.0]).collect(),
            None => Vec::new(),
        }
    }

    /// The set of values that could ever appear at argument position `pos`
    /// of `name`. Unknown positions yield the empty set.
    pub fn domain(&self, name: &str, pos: usize) -> IndexSet<DomainValue> {
        let mut out = IndexSet::new();
        let key = (name.to_string(), pos, VertexKind::ArgPos);
        if let Some(&start) = self.lookup.get(&key) {
            let mut visiting = IndexSet::new();
            visiting.insert(start);
            self.collect(start, &mut visiting, &mut out);
        }
        out
    }

    fn collect(
        &self,
        vertex: VertexId,
        visiting: &mut IndexSet<VertexId>,
        out: &mut IndexSet<DomainValue>,
    ) {
        let Some(targets) = self.edges.get(&vertex) else {
            return;
        };
        for &target in targets {
            let t = &self.vertices[target.0];
            // distinct constrains values, it never supplies them
            if t.name == "distinct" {
                continue;
            }
            match t.kind {
                VertexKind::Constant => {
                    out.insert(DomainValue::Constant(t.name.clone()));
                }
                VertexKind::Site => {
                    out.insert(DomainValue::Compound {
                        name: t.name.clone(),
                        arity: t.arity,
                    });
                }
                VertexKind::ArgPos => {
                    if visiting.insert(target) {
                        self.collect(target, visiting, out);
                        visiting.swap_remove(&target);
                    }
                }
            }
        }
    }

    /// Every ground rendering of the compound site `name/arity`, built from
    /// the cross product of its argument domains. Empty when any argument
    /// has an empty domain or the site recurses into itself.
    pub fn ground_instances(&self, name: &str, arity: usize) -> Vec<String> {
        let mut visiting = IndexSet::new();
        self.instances_guarded(name, arity, &mut visiting)
    }

    fn instances_guarded(
        &self,
        name: &str,
        arity: usize,
        visiting: &mut IndexSet<(String, usize)>,
    ) -> Vec<String> {
        let key = (name.to_string(), arity);
        if !visiting.insert(key.clone()) {
            return Vec::new();
        }

        let mut per_arg: Vec<Vec<String>> = Vec::with_capacity(arity);
        for pos in 1..=arity {
            let mut values = Vec::new();
            for value in self.domain(name, pos) {
                match value {
                    DomainValue::Constant(c) => values.push(c),
                    DomainValue::Compound { name: inner, arity: inner_arity } => {
                        values.extend(self.instances_guarded(&inner, inner_arity, visiting));
                    }
                }
            }
            if values.is_empty() {
                visiting.swap_remove(&key);
                return Vec::new();
            }
            per_arg.push(values);
        }
        visiting.swap_remove(&key);

        let mut out = Vec::new();
        let mut odometer = vec![0usize; arity];
        loop {
            let mut rendered = format!("({}", name);
            for (pos, &i) in odometer.iter().enumerate() {
                rendered.push(' ');
                rendered.push_str(&per_arg[pos][i]);
            }
            rendered.push(')');
            out.push(rendered);

            // advance, rightmost argument fastest
            let mut slot = arity;
            loop {
                if slot == 0 {
                    return out;
                }
                slot -= 1;
                odometer[slot] += 1;
                if odometer[slot] < per_arg[slot].len() {
                    break;
                }
                odometer[slot] = 0;
            }
        }
    }

    /// Export the graph for debugging visualization.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("strict digraph {\n");
        for vertex in &self.vertices {
            let label = vertex.label();
            out.push_str(&format!("  \"{}\" [label=\"{}\"];\n", label, label));
        }
        for (from, targets) in &self.edges {
            let from_label = self.vertices[from.0].label();
            for to in targets {
                out.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    from_label,
                    self.vertices[to.0].label()
                ));
            }
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdl::parse_gdl;

    fn constants(domain: &IndexSet<DomainValue>) -> Vec<String> {
        domain
            .iter()
            .filter_map(|v| match v {
                DomainValue::Constant(c) => Some(c.clone()),
                DomainValue::Compound { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_transitive_domain_collection() {
        let mut g = DomainGraph::default();
        let thing1 = g.arg_vertex("thing", 1);
        let thing2 = g.arg_vertex("thing", 2);
        g.arg_vertex("thing", 3);
        let stuff1 = g.arg_vertex("stuff", 1);
        let stuff3 = g.arg_vertex("stuff", 3);
        let thing_value = g.constant_vertex("thing");
        let const1 = g.constant_vertex("const1");
        let const2 = g.constant_vertex("const2");
        let function = g.site_vertex("function", 2);

        g.add_edge(thing2, thing_value);
        g.add_edge(stuff3, stuff1);
        g.add_edge(thing1, stuff3);
        g.add_edge(stuff3, const1);
        g.add_edge(stuff3, const2);
        g.add_edge(thing1, function);

        let stuff_domain = g.domain("stuff", 3);
        assert_eq!(stuff_domain.len(), 2);
        assert_eq!(constants(&stuff_domain), vec!["const1", "const2"]);

        // transitive closure through stuff plus the function site
        let thing_domain = g.domain("thing", 1);
        assert_eq!(thing_domain.len(), 3);
        assert!(thing_domain.contains(&DomainValue::Compound {
            name: "function".to_string(),
            arity: 2
        }));
    }

    #[test]
    fn test_cycle_contributes_nothing() {
        let mut g = DomainGraph::default();
        let a = g.arg_vertex("a", 1);
        let b = g.arg_vertex("b", 1);
        let c = g.constant_vertex("c");
        g.add_edge(a, b);
        g.add_edge(b, a);
        g.add_edge(b, c);

        // the back edge into the in-progress vertex is skipped
        assert_eq!(constants(&g.domain("a", 1)), vec!["c"]);
        assert_eq!(constants(&g.domain("b", 1)), vec!["c"]);
    }

    #[test]
    fn test_unknown_position_is_empty_not_error() {
        let g = DomainGraph::default();
        assert!(g.domain("nothing", 1).is_empty());
        assert!(g.neighbours("nothing", 1).is_empty());
    }

    #[test]
    fn test_build_links_shared_variables() {
        let tree = parse_gdl(
            "(succ 1 2) (succ 2 3) (<= (next (step ?y)) (true (step ?x)) (succ ?x ?y))",
        )
        .unwrap();
        let g = DomainGraph::build(&tree);
        // step[1] collects the base constants written at succ positions
        // through the shared ?x/?y variables
        let d = g.domain("step", 1);
        let cs = constants(&d);
        assert!(cs.contains(&"1".to_string()));
        assert!(cs.contains(&"3".to_string()));
    }

    #[test]
    fn test_base_feeds_state_positions() {
        let tree = parse_gdl("(base (win red))").unwrap();
        let g = DomainGraph::build(&tree);
        let d = g.domain("base", 1);
        assert!(d.contains(&DomainValue::Compound {
            name: "win".to_string(),
            arity: 1
        }));
        // the structural base -> true edge is present even though `true`
        // never appears in the source
        assert!(!g.neighbours("base", 1).is_empty());
    }

    #[test]
    fn test_distinct_is_never_expanded() {
        // distinct constrains values during grounding; it must not feed
        // any domain, whether reached as a slot or as a site
        let mut g = DomainGraph::default();
        let p1 = g.arg_vertex("p", 1);
        let distinct1 = g.arg_vertex("distinct", 1);
        let c = g.constant_vertex("c");
        g.add_edge(p1, distinct1);
        g.add_edge(distinct1, c);
        assert!(g.domain("p", 1).is_empty());

        let mut g2 = DomainGraph::default();
        let q1 = g2.arg_vertex("q", 1);
        let site = g2.site_vertex("distinct", 2);
        g2.add_edge(q1, site);
        assert!(g2.domain("q", 1).is_empty());
    }

    #[test]
    fn test_ground_instances_cross_product() {
        let tree = parse_gdl("(base (cell 1 x)) (base (cell 2 o))").unwrap();
        let g = DomainGraph::build(&tree);
        let instances = g.ground_instances("cell", 2);
        assert_eq!(
            instances,
            vec!["(cell 1 x)", "(cell 1 o)", "(cell 2 x)", "(cell 2 o)"]
        );
    }

    #[test]
    fn test_dot_export_shape() {
        let mut g = DomainGraph::default();
        let a = g.arg_vertex("a", 1);
        let c = g.constant_vertex("c");
        g.add_edge(a, c);
        let dot = g.to_dot();
        assert!(dot.starts_with("strict digraph {"));
        assert!(dot.contains("\"a[1]\" [label=\"a[1]\"];"));
        assert!(dot.contains("\"a[1]\" -> \"c[0]\";"));
        assert!(dot.ends_with("}\n"));
    }
}
