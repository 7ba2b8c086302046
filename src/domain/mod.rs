// Domain model for callseq: classification, graph building, sequence
// synthesis, identifiers and the persistence port.

pub mod callgraph;
pub mod classify;
pub mod events;
pub mod identity;
pub mod options;
pub mod sequence;
pub mod source_kind;
pub mod store;
