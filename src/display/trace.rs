//! Per-node unit audit of an expression tree.
use super::formula::to_infix;
use crate::ast::MathNode;
use crate::compiler::DimensionalAnalyzer;
use crate::config::EngineOptions;
use crate::model::Model;
use std::fmt::Write;

/// Renders every sub-expression of `root` with the value and unit the engine derives for it.
///
/// Each subtree is compiled on its own, so a failure deep in the tree is shown on
/// the node where it happens and its ancestors report the propagated error.
pub fn format_unit_trace(model: Option<&Model>, options: EngineOptions, root: &MathNode) -> String {
    let mut tracer = Tracer {
        engine: DimensionalAnalyzer::new(model, options),
        output: String::new(),
    };
    let _ = writeln!(tracer.output, "AUDIT TRACE for '{}':", to_infix(root));
    let _ = writeln!(tracer.output, "--------------------------------------------------");
    tracer.trace_node(root, 1, "");
    tracer.output
}

struct Tracer<'m> {
    engine: DimensionalAnalyzer<'m>,
    output: String,
}

impl<'m> Tracer<'m> {
    fn trace_node(&mut self, node: &MathNode, level: usize, prefix: &str) {
        let outcome = match self.engine.compile(node) {
            Ok(value) if value.has_invalid_units() => format!("{} !! invalid", value),
            Ok(value) => value.to_string(),
            Err(e) => format!("!! {}", e),
        };
        let children = node.children();
        let label = if children.is_empty() {
            to_infix(node)
        } else {
            node.tag()
        };
        let _ = writeln!(self.output, "{}[L{}] {} => {}", prefix, level, label, outcome);

        let stem = build_child_stem(prefix);
        for (i, child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`--" } else { "|--" };
            self.trace_node(child, level + 1, &format!("{}{}", stem, connector));
        }
    }
}

fn build_child_stem(prefix: &str) -> String {
    prefix.replace("`--", "   ").replace("|--", "|  ")
}
