//! JSON exporter: `{"callGraph": {...}, "sequence": {...}}`.

use crate::api::dto::GraphExport;
use crate::error::Result;
use crate::ports::{OutputExporter, RenderInput};

pub struct JsonExporter;

impl OutputExporter for JsonExporter {
    fn render(&self, input: RenderInput<'_>) -> Result<String> {
        let doc = GraphExport::new(input.model, Some(input.trace));
        let mut out = serde_json::to_string_pretty(&doc)?;
        out.push('\n');
        Ok(out)
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
    fn test_call_graph_is_sorted_and_deduplicated() {
        let events = vec![
            FrontEndEvent::call("main", "zeta"),
            FrontEndEvent::call("main", "alpha"),
            FrontEndEvent::call("main", "zeta"),
        ];
        let model = CallModel::from_events(&events, &AnalyzerOptions::default());
        let trace = synthesize(&model, "main", 2);

        let json = JsonExporter.render(RenderInput { model: &model, trace: &trace }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["callGraph"]["main"], serde_json::json!(["alpha", "zeta"]));
        assert_eq!(value["callGraph"]["zeta"], serde_json::json!([]));
        assert_eq!(value["sequence"]["root"], "main");
        assert_eq!(value["sequence"]["rootFound"], true);
        assert_eq!(value["sequence"]["events"][1]["type"], "message");
        assert_eq!(value["sequence"]["events"][1]["kind"], "direct_call");
    }
}
