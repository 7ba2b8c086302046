//! Sequence Trace Synthesis
//!
//! Walks the per-caller call order from a root and flattens it into a linear
//! trace of messages, bracketed by enter/leave markers for every descent.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::domain::callgraph::CallModel;
use crate::domain::classify::{classify, CalleeClass};

/// Root used when nothing else is available. Never present in an empty model.
pub const DEFAULT_ROOT: &str = "main";

/// Kind of a trace message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    DirectCall,
    IndirectCall,
}

/// One entry of a sequence trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Activation of `node` begins
    Enter { node: String },
    /// `from` calls `to`
    Message {
        from: String,
        to: String,
        kind: MessageKind,
    },
    /// Activation of `node` ends
    Leave { node: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Complete,
    RootNotFound,
}

/// Result of sequence synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceTrace {
    /// Resolved root, or the requested one when it was not found
    pub root: String,
    /// Depth budget after clamping
    pub max_depth: usize,
    pub status: TraceStatus,
    pub events: Vec<TraceEvent>,
}

impl SequenceTrace {
    pub fn is_root_found(&self) -> bool {
        self.status == TraceStatus::Complete
    }

    /// Messages only, without activation markers.
    pub fn messages(&self) -> impl Iterator<Item = (&str, &str, MessageKind)> {
        self.events.iter().filter_map(|e| match e {
            TraceEvent::Message { from, to, kind } => Some((from.as_str(), to.as_str(), *kind)),
            _ => None,
        })
    }
}

/// Pick the trace root: the explicit one, else `main`, else the first node.
pub fn pick_root(model: &CallModel, explicit: Option<&str>) -> String {
    if let Some(root) = explicit.filter(|r| !r.is_empty()) {
        return root.to_string();
    }
    if model.contains(DEFAULT_ROOT) {
        return DEFAULT_ROOT.to_string();
    }
    model
        .nodes()
        .iter()
        .next()
        .cloned()
        .unwrap_or_else(|| DEFAULT_ROOT.to_string())
}

struct Frame<'m> {
    node: &'m str,
    calls: &'m [String],
    next: usize,
    budget: usize,
}

/// Expand `root` depth-first over the call order.
///
/// Every call-order entry of an expanded node yields one message. A callee is
/// descended into only if it is user code, was itself observed as a caller, is
/// not already on the active path, and depth budget remains.
pub fn synthesize(model: &CallModel, root: &str, max_depth: usize) -> SequenceTrace {
    let max_depth = max_depth.max(1);

    if !model.contains(root) {
        debug!(root, "sequence root not found");
        return SequenceTrace {
            root: root.to_string(),
            max_depth,
            status: TraceStatus::RootNotFound,
            events: Vec::new(),
        };
    }

    let mut events = vec![TraceEvent::Enter {
        node: root.to_string(),
    }];
    let mut on_path: HashSet<&str> = HashSet::new();
    on_path.insert(root);

    let mut stack = vec![Frame {
        node: root,
        calls: model.calls_in_order(root).unwrap_or(&[]),
        next: 0,
        budget: max_depth,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.next >= frame.calls.len() {
            let node = frame.node;
            stack.pop();
            on_path.remove(node);
            events.push(TraceEvent::Leave {
                node: node.to_string(),
            });
            continue;
        }

        let calls = frame.calls;
        let callee = calls[frame.next].as_str();
        frame.next += 1;
        let caller = frame.node;
        let budget = frame.budget;

        let class = classify(callee);
        events.push(TraceEvent::Message {
            from: caller.to_string(),
            to: callee.to_string(),
            kind: if class == CalleeClass::Indirect {
                MessageKind::IndirectCall
            } else {
                MessageKind::DirectCall
            },
        });

        if budget <= 1 || !class.is_expandable() || on_path.contains(callee) {
            continue;
        }
        if let Some(callee_calls) = model.calls_in_order(callee) {
            on_path.insert(callee);
            events.push(TraceEvent::Enter {
                node: callee.to_string(),
            });
            stack.push(Frame {
                node: callee,
                calls: callee_calls,
                next: 0,
                budget: budget - 1,
            });
        }
    }

    SequenceTrace {
        root: root.to_string(),
        max_depth,
        status: TraceStatus::Complete,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::callgraph::{Callee, GraphBuilder};
    use crate::domain::options::AnalyzerOptions;

    fn model_from(calls: &[(&str, &str)]) -> CallModel {
        let mut b = GraphBuilder::new(&AnalyzerOptions::default());
        for (caller, callee) in calls {
            b.observe_call(caller, Callee::Direct(callee));
        }
        b.finish()
    }

    fn msgs(trace: &SequenceTrace) -> Vec<(String, String)> {
        trace
            .messages()
            .map(|(f, t, _)| (f.to_string(), t.to_string()))
            .collect()
    }

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let model = model_from(&[("A", "B"), ("B", "A")]);
        let trace = synthesize(&model, "A", 5);

        assert!(trace.is_root_found());
        assert_eq!(msgs(&trace), vec![pair("A", "B"), pair("B", "A")]);
    }

    #[test]
    fn test_self_recursion_emits_message_once() {
        let model = model_from(&[("loop", "loop")]);
        let trace = synthesize(&model, "loop", 10);
        assert_eq!(msgs(&trace), vec![pair("loop", "loop")]);
        assert_eq!(trace.events.len(), 3);
    }

    #[test]
    fn test_depth_zero_behaves_like_one() {
        let model = model_from(&[("main", "a"), ("a", "b"), ("main", "c")]);
        let zero = synthesize(&model, "main", 0);
        let one = synthesize(&model, "main", 1);

        assert_eq!(zero, one);
        assert_eq!(one.max_depth, 1);
        assert_eq!(msgs(&one), vec![pair("main", "a"), pair("main", "c")]);
        assert_eq!(
            one.events.first(),
            Some(&TraceEvent::Enter { node: "main".to_string() })
        );
        assert_eq!(
            one.events.last(),
            Some(&TraceEvent::Leave { node: "main".to_string() })
        );
        assert_eq!(one.events.len(), 4);
    }

    #[test]
    fn test_expansion_follows_call_order() {
        let model = model_from(&[("main", "b"), ("b", "x"), ("main", "a"), ("a", "y")]);
        let trace = synthesize(&model, "main", 3);
        assert_eq!(
            msgs(&trace),
            vec![pair("main", "b"), pair("b", "x"), pair("main", "a"), pair("a", "y")]
        );
    }

    #[test]
    fn test_guard_is_path_local() {
        let model = model_from(&[("main", "a"), ("main", "b"), ("a", "shared"), ("b", "shared"), ("shared", "leaf")]);
        let trace = synthesize(&model, "main", 5);
        let leaf_hits = msgs(&trace).iter().filter(|(_, t)| t == "leaf").count();
        assert_eq!(leaf_hits, 2);
    }

    #[test]
    fn test_indirect_and_system_nodes_are_leaves() {
        let opts = AnalyzerOptions {
            include_stdlib_leaves: true,
            ..Default::default()
        };
        let mut b = GraphBuilder::new(&opts);
        b.observe_call("main", Callee::Unresolved(None));
        b.observe_call("main", Callee::Direct("malloc"));
        // Even if a system name shows up as a caller it is not expanded.
        b.observe_call("malloc", Callee::Direct("inner"));
        let model = b.finish();

        let trace = synthesize(&model, "main", 5);
        let kinds: Vec<_> = trace.messages().map(|(_, to, k)| (to.to_string(), k)).collect();
        assert_eq!(
            kinds,
            vec![
                ("(indirect)".to_string(), MessageKind::IndirectCall),
                ("malloc".to_string(), MessageKind::DirectCall),
            ]
        );
        assert!(!trace
            .events
            .iter()
            .any(|e| matches!(e, TraceEvent::Enter { node } if node == "malloc")));
    }

    #[test]
    fn test_root_not_found() {
        let model = model_from(&[("main", "a")]);
        let trace = synthesize(&model, "nonexistent", 5);
        assert_eq!(trace.status, TraceStatus::RootNotFound);
        assert_eq!(trace.root, "nonexistent");
        assert!(trace.events.is_empty());
    }

    #[test]
    fn test_pick_root() {
        let empty = CallModel::default();
        assert_eq!(pick_root(&empty, None), "main");
        assert!(!synthesize(&empty, &pick_root(&empty, None), 5).is_root_found());

        let model = model_from(&[("zeta", "beta")]);
        assert_eq!(pick_root(&model, None), "beta");
        assert_eq!(pick_root(&model, Some("zeta")), "zeta");
        assert_eq!(pick_root(&model, Some("")), "beta");

        let with_main = model_from(&[("alpha", "x"), ("main", "alpha")]);
        assert_eq!(pick_root(&with_main, None), "main");
    }
}
