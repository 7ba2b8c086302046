use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::callgraph::CallModel;
use crate::domain::sequence::{SequenceTrace, TraceEvent, TraceStatus};

/// JSON document written by the `json` emitter.
#[derive(Debug, Serialize)]
pub struct GraphExport<'a> {
    #[serde(rename = "callGraph")]
    pub call_graph: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<TraceDto<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TraceDto<'a> {
    pub root: &'a str,
    #[serde(rename = "maxDepth")]
    pub max_depth: usize,
    #[serde(rename = "rootFound")]
    pub root_found: bool,
    pub events: &'a [TraceEvent],
}

impl<'a> From<&'a SequenceTrace> for TraceDto<'a> {
    fn from(trace: &'a SequenceTrace) -> Self {
        TraceDto {
            root: &trace.root,
            max_depth: trace.max_depth,
            root_found: trace.status == TraceStatus::Complete,
            events: &trace.events,
        }
    }
}

impl<'a> GraphExport<'a> {
    pub fn new(model: &CallModel, trace: Option<&'a SequenceTrace>) -> Self {
        Self {
            call_graph: model.graph_export(),
            sequence: trace.map(TraceDto::from),
        }
    }
}
