//! PlantUML Sequence Exporter
//!
//! Renders a sequence trace as a PlantUML sequence diagram. Every node of the
//! model is declared as a participant; identifiers come from a fresh
//! [`IdentityTable`] per render.

use crate::domain::identity::IdentityTable;
use crate::domain::sequence::{MessageKind, TraceEvent};
use crate::error::Result;
use crate::ports::{OutputExporter, RenderInput};

pub struct PumlSequenceExporter;

impl PumlSequenceExporter {
    pub fn to_puml(input: RenderInput<'_>) -> String {
        let trace = input.trace;
        let mut ids = IdentityTable::new();
        let mut lines = Vec::new();

        lines.push("@startuml".to_string());
        lines.push("hide footbox".to_string());
        lines.push("skinparam sequenceMessageAlign center".to_string());
        lines.push(format!(
            "title callseq sequence (root: {}, depth: {})",
            trace.root, trace.max_depth
        ));
        lines.push(String::new());

        for node in input.model.nodes() {
            lines.push(format!(
                "participant \"{}\" as {}",
                Self::escape(node),
                ids.identifier(node)
            ));
        }
        lines.push(String::new());

        if !trace.is_root_found() {
            lines.push(format!("' root not found: {}", trace.root));
            lines.push("@enduml".to_string());
            return lines.join("\n") + "\n";
        }

        for event in &trace.events {
            let line = match event {
                TraceEvent::Enter { node } => format!("activate {}", ids.identifier(node)),
                TraceEvent::Leave { node } => format!("deactivate {}", ids.identifier(node)),
                TraceEvent::Message { from, to, kind } => {
                    let (arrow, text) = match kind {
                        MessageKind::DirectCall => ("->", "call"),
                        MessageKind::IndirectCall => ("..>", "indirect call"),
                    };
                    format!("{} {} {} : {}", ids.identifier(from), arrow, ids.identifier(to), text)
                }
            };
            lines.push(line);
        }

        lines.push("@enduml".to_string());
        lines.join("\n") + "\n"
    }

    fn escape(name: &str) -> String {
        name.replace('"', "'")
    }
}

impl OutputExporter for PumlSequenceExporter {
    fn render(&self, input: RenderInput<'_>) -> Result<String> {
        Ok(Self::to_puml(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::callgraph::CallModel;
    use crate::domain::events::FrontEndEvent;
    use crate::domain::options::AnalyzerOptions;
    use crate::domain::sequence::synthesize;

    fn sample_model() -> CallModel {
        let events = vec![
            FrontEndEvent::declare("main", Some("main.c")),
            FrontEndEvent::call("main", "helper"),
            FrontEndEvent::indirect_call("main", None),
            FrontEndEvent::call("helper", "leaf"),
        ];
        CallModel::from_events(&events, &AnalyzerOptions::default())
    }

    #[test]
    fn test_to_puml() {
        let model = sample_model();
        let trace = synthesize(&model, "main", 5);
        let puml = PumlSequenceExporter::to_puml(RenderInput { model: &model, trace: &trace });

        assert!(puml.starts_with("@startuml\nhide footbox\n"));
        assert!(puml.contains("title callseq sequence (root: main, depth: 5)"));
        assert!(puml.contains("participant \"(indirect)\" as _indirect_"));
        assert!(puml.contains("participant \"main\" as main"));
        assert!(puml.contains("main -> helper : call"));
        assert!(puml.contains("main ..> _indirect_ : indirect call"));
        assert!(puml.contains("activate helper\nhelper -> leaf : call"));
        assert!(puml.trim_end().ends_with("deactivate main\n@enduml"));
    }

    #[test]
    fn test_root_not_found_comment() {
        let model = sample_model();
        let trace = synthesize(&model, "missing", 5);
        let puml = PumlSequenceExporter::to_puml(RenderInput { model: &model, trace: &trace });

        assert!(puml.contains("' root not found: missing\n@enduml"));
        assert!(!puml.contains("activate"));
    }
}
