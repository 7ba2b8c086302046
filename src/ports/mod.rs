use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::callgraph::CallModel;
use crate::domain::events::FrontEndEvent;
use crate::domain::sequence::SequenceTrace;
use crate::error::Result;

pub mod dot_exporter;
pub mod json_exporter;
pub mod puml_exporter;

pub use dot_exporter::DotExporter;
pub use json_exporter::JsonExporter;
pub use puml_exporter::PumlSequenceExporter;

/// Turns one source file into front-end events.
pub trait FrontEnd: Send + Sync {
    fn extract(&self, path: &str, source: &str) -> Result<Vec<FrontEndEvent>>;
}

/// Finished artifacts of one analysis run, handed to renderers.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub model: &'a CallModel,
    pub trace: &'a SequenceTrace,
}

pub trait OutputExporter {
    fn render(&self, input: RenderInput<'_>) -> Result<String>;

    fn export(&self, input: RenderInput<'_>, path: &Path) -> Result<()> {
        std::fs::write(path, self.render(input)?)?;
        Ok(())
    }
}

/// Output formats selectable on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitFormat {
    /// Call graph and sequence trace as JSON
    #[default]
    Json,
    /// PlantUML sequence diagram
    Puml,
    /// Graphviz call graph
    Dot,
    /// JSON followed by PlantUML
    Both,
}

impl EmitFormat {
    /// Renderers for this format, in output order.
    pub fn exporters(self) -> Vec<Box<dyn OutputExporter>> {
        match self {
            EmitFormat::Json => vec![Box::new(JsonExporter)],
            EmitFormat::Puml => vec![Box::new(PumlSequenceExporter)],
            EmitFormat::Dot => vec![Box::new(DotExporter)],
            EmitFormat::Both => vec![Box::new(JsonExporter), Box::new(PumlSequenceExporter)],
        }
    }

    /// Render every exporter of this format, separated by a blank line.
    pub fn render(self, input: RenderInput<'_>) -> Result<String> {
        let parts = self
            .exporters()
            .iter()
            .map(|e| e.render(input))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join("\n"))
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            EmitFormat::Json => "json",
            EmitFormat::Puml => "puml",
            EmitFormat::Dot => "dot",
            EmitFormat::Both => "txt",
        }
    }
}
