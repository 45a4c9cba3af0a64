//! Read-only traversals over `MathNode` trees.
use super::node::MathNode;
use std::collections::BTreeSet;

/// Collects every free symbol the expression reads (names and rate-of targets).
///
/// Lambda parameters are bound inside their body and are not reported.
pub fn referenced_names(node: &MathNode) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut bound: Vec<&str> = Vec::new();
    collect(node, &mut bound, &mut names);
    names
}

fn collect<'a>(node: &'a MathNode, bound: &mut Vec<&'a str>, out: &mut BTreeSet<String>) {
    match node {
        MathNode::Name { id } => {
            if !bound.contains(&id.as_str()) {
                out.insert(id.clone());
            }
        }
        MathNode::RateOf { target } => {
            out.insert(target.clone());
        }
        MathNode::Lambda { params, body } => {
            let mark = bound.len();
            bound.extend(params.iter().map(String::as_str));
            collect(body, bound, out);
            bound.truncate(mark);
        }
        other => {
            for child in other.children() {
                collect(child, bound, out);
            }
        }
    }
}

/// Names of the model function definitions the expression applies.
pub fn called_functions(node: &MathNode) -> BTreeSet<String> {
    let mut calls = BTreeSet::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if let MathNode::Call { name, .. } = current {
            calls.insert(name.clone());
        }
        stack.extend(current.children());
    }
    calls
}
