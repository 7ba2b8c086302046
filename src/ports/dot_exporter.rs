//! Call Graph DOT Exporter
//!
//! Exports the deduplicated call graph as Graphviz DOT, styled by callee class.

use crate::domain::classify::{classify, CalleeClass};
use crate::domain::identity::IdentityTable;
use crate::error::Result;
use crate::ports::{OutputExporter, RenderInput};

pub struct DotExporter;

impl DotExporter {
    /// Convert the call graph to a DOT string.
    pub fn to_dot(input: RenderInput<'_>) -> String {
        let model = input.model;
        let root = input.trace.is_root_found().then_some(input.trace.root.as_str());
        let mut ids = IdentityTable::new();
        let mut lines = Vec::new();

        lines.push("digraph CallGraph {".to_string());
        lines.push("    rankdir=LR;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=12];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10];".to_string());
        lines.push(String::new());

        for node in model.nodes() {
            let (shape, fill, style) = if Some(node.as_str()) == root {
                ("box", "#a6e3a1", "filled,rounded")
            } else {
                Self::node_style(classify(node))
            };
            lines.push(format!(
                "    {} [label=\"{}\", shape={}, style=\"{}\", fillcolor=\"{}\"];",
                ids.identifier(node),
                Self::escape_label(node),
                shape,
                style,
                fill
            ));
        }

        lines.push(String::new());

        for (caller, callees) in model.call_graph() {
            for callee in callees {
                let style = match classify(callee) {
                    CalleeClass::Indirect => " [style=dashed]",
                    _ => "",
                };
                lines.push(format!(
                    "    {} -> {}{};",
                    ids.identifier(caller),
                    ids.identifier(callee),
                    style
                ));
            }
        }

        lines.push("}".to_string());
        lines.join("\n") + "\n"
    }

    fn node_style(class: CalleeClass) -> (&'static str, &'static str, &'static str) {
        match class {
            CalleeClass::User => ("box", "#89b4fa", "filled"),              // Blue
            CalleeClass::SystemLeaf => ("box", "#6c7086", "filled,dashed"), // Gray
            CalleeClass::Indirect => ("diamond", "#f9e2af", "filled"),     // Yellow
        }
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

impl OutputExporter for DotExporter {
    fn render(&self, input: RenderInput<'_>) -> Result<String> {
        Ok(Self::to_dot(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::callgraph::CallModel;
    use crate::domain::events::FrontEndEvent;
    use crate::domain::options::AnalyzerOptions;
    use crate::domain::sequence::synthesize;

    #[test]
    fn test_to_dot() {
        let events = vec![
            FrontEndEvent::call("main", "foo"),
            FrontEndEvent::call("main", "foo"),
            FrontEndEvent::call("main", "printf"),
            FrontEndEvent::indirect_call("foo", None),
        ];
        let opts = AnalyzerOptions {
            include_stdlib_leaves: true,
            ..Default::default()
        };
        let model = CallModel::from_events(&events, &opts);
        let trace = synthesize(&model, "main", 5);

        let dot = DotExporter::to_dot(RenderInput { model: &model, trace: &trace });
        assert!(dot.contains("digraph CallGraph"));
        assert!(dot.contains("main [label=\"main\", shape=box, style=\"filled,rounded\""));
        assert!(dot.contains("printf [label=\"printf\", shape=box, style=\"filled,dashed\""));
        assert!(dot.contains("_indirect_ [label=\"(indirect)\", shape=diamond"));
        assert_eq!(dot.matches("main -> foo;").count(), 1);
        assert!(dot.contains("foo -> _indirect_ [style=dashed];"));
    }
}
