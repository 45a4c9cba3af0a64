//! The definition graph: which symbol's equation reads which other symbols.
use crate::ast::{called_functions, referenced_names, MathNode};
use crate::model::{LocalParameter, Model};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Edges run from an equation's target to every symbol its math reads, including
/// the free symbols of any function definitions it calls. Kinetic-law local
/// parameters are bound inside their law and do not produce edges.
#[derive(Debug, Clone, Default)]
pub struct DefinitionGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
    cyclic: HashSet<String>,
}

impl DefinitionGraph {
    pub fn from_model(model: &Model) -> Self {
        let mut this = Self::default();
        for (target, math, locals) in model.equations() {
            let from = this.node(target);
            for name in dependencies_of(model, math, locals) {
                let to = this.node(&name);
                this.graph.update_edge(from, to, ());
            }
        }
        this.cyclic = this.cycles().into_iter().flatten().collect();
        this
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.indices.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.indices.insert(id.to_string(), idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether `id` sits on a circular chain of definitions.
    pub fn is_cyclic(&self, id: &str) -> bool {
        self.cyclic.contains(id)
    }

    /// The symbols `id`'s equation reads directly, sorted.
    pub fn dependencies(&self, id: &str) -> Vec<String> {
        let Some(&idx) = self.indices.get(id) else {
            return Vec::new();
        };
        let mut deps: Vec<String> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].clone())
            .collect();
        deps.sort();
        deps
    }

    /// Every circular definition as a sorted list of its members.
    ///
    /// Strongly connected components with more than one member, plus self-references.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut members: Vec<String> = scc.into_iter().map(|n| self.graph[n].clone()).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }
}

/// Free symbols of `math`, following calls into function definitions.
///
/// `locals` shadow model symbols in `math` itself but not in called function bodies.
fn dependencies_of(model: &Model, math: &MathNode, locals: &[LocalParameter]) -> BTreeSet<String> {
    let mut names = referenced_names(math);
    names.retain(|name| !locals.iter().any(|p| &p.id == name));
    let mut pending: Vec<String> = called_functions(math).into_iter().collect();
    let mut seen = HashSet::new();
    while let Some(name) = pending.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(definition) = model.function_definition(&name) {
            names.extend(referenced_names(&definition.math));
            pending.extend(called_functions(&definition.math));
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(json: &str) -> Model {
        Model::from_json_str(json).unwrap()
    }

    #[test]
    fn test_two_rule_cycle() {
        let m = model(
            r#"{
            "parameters": [{"id": "A"}, {"id": "B"}, {"id": "C", "value": 1}],
            "assignment_rules": [
                {"variable": "A", "math": {"kind": "name", "id": "B"}},
                {"variable": "B", "math": {"kind": "arithmetic", "op": "plus", "args": [
                    {"kind": "name", "id": "A"}, {"kind": "name", "id": "C"}]}}
            ]
        }"#,
        );
        let graph = DefinitionGraph::from_model(&m);
        assert_eq!(graph.cycles(), vec![vec!["A".to_string(), "B".to_string()]]);
        assert!(graph.is_cyclic("A"));
        assert!(!graph.is_cyclic("C"));
        assert_eq!(graph.dependencies("B"), vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_self_reference() {
        let m = model(
            r#"{
            "species": [{"id": "S"}],
            "initial_assignments": [{"symbol": "S", "math": {"kind": "arithmetic", "op": "plus", "args": [
                {"kind": "name", "id": "S"}, {"kind": "integer", "value": 1}]}}]
        }"#,
        );
        let graph = DefinitionGraph::from_model(&m);
        assert_eq!(graph.cycles(), vec![vec!["S".to_string()]]);
    }

    #[test]
    fn test_cycle_through_function_and_kinetic_laws() {
        let m = model(
            r#"{
            "reactions": [
                {"id": "R1", "kinetic_law": {"math": {"kind": "call", "name": "f", "args": []}}},
                {"id": "R2", "kinetic_law": {"math": {"kind": "name", "id": "R1"}}}
            ],
            "function_definitions": [
                {"id": "f", "math": {"kind": "lambda", "params": [], "body": {"kind": "name", "id": "R2"}}}
            ]
        }"#,
        );
        let graph = DefinitionGraph::from_model(&m);
        assert!(graph.is_cyclic("R1"));
        assert!(graph.is_cyclic("R2"));
    }

    #[test]
    fn test_local_parameter_does_not_link_to_global() {
        let m = model(
            r#"{
            "species": [{"id": "S", "value": 4}],
            "parameters": [{"id": "k"}],
            "assignment_rules": [{"variable": "k", "math": {"kind": "name", "id": "R1"}}],
            "reactions": [{"id": "R1", "kinetic_law": {
                "math": {"kind": "arithmetic", "op": "times", "args": [
                    {"kind": "name", "id": "k"}, {"kind": "name", "id": "S"}]},
                "local_parameters": [{"id": "k", "value": 2}]
            }}]
        }"#,
        );
        let graph = DefinitionGraph::from_model(&m);
        assert!(graph.cycles().is_empty());
        assert!(!graph.is_cyclic("R1"));
        assert_eq!(graph.dependencies("R1"), vec!["S".to_string()]);
        assert_eq!(graph.dependencies("k"), vec!["R1".to_string()]);
    }

    #[test]
    fn test_acyclic_chain() {
        let m = model(
            r#"{
            "parameters": [{"id": "x"}, {"id": "y"}, {"id": "z", "value": 2}],
            "assignment_rules": [
                {"variable": "x", "math": {"kind": "name", "id": "y"}},
                {"variable": "y", "math": {"kind": "name", "id": "z"}}
            ]
        }"#,
        );
        let graph = DefinitionGraph::from_model(&m);
        assert!(graph.cycles().is_empty());
        assert_eq!(graph.len(), 3);
    }
}
