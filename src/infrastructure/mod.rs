// Infrastructure implementations for callseq: front ends, input discovery,
// the options file and thread pool setup.

pub mod concurrency;
pub mod config;
pub mod event_reader;
pub mod source_loader;
pub mod syn_frontend;

pub use event_reader::EventStreamFrontEnd;
pub use source_loader::{SourceFile, SourceLoader};
pub use syn_frontend::SynFrontEnd;

use crate::domain::source_kind::SourceKind;
use crate::ports::FrontEnd;

/// Front end that reads inputs of `kind`.
pub fn front_end_for(kind: SourceKind) -> &'static dyn FrontEnd {
    match kind {
        SourceKind::Rust => &SynFrontEnd,
        SourceKind::EventStream => &EventStreamFrontEnd,
    }
}
