//! Call graph structures for callseq.
//!
//! `GraphBuilder` folds front-end observations into a `CallModel`: the node set,
//! the deduplicated caller -> callee graph, and the per-caller call order that
//! drives sequence synthesis.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::trace;

use crate::domain::classify::{classify, indirect_label, CalleeClass};
use crate::domain::events::{foreign_functions, CalleeExpr, FrontEndEvent};
use crate::domain::options::AnalyzerOptions;

/// Final state of one analysis run. Read-only once ingestion is done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallModel {
    nodes: BTreeSet<String>,
    call_graph: BTreeMap<String, BTreeSet<String>>,
    call_order: BTreeMap<String, Vec<String>>,
}

impl CallModel {
    pub fn nodes(&self) -> &BTreeSet<String> {
        &self.nodes
    }

    pub fn call_graph(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.call_graph
    }

    pub fn call_order(&self) -> &BTreeMap<String, Vec<String>> {
        &self.call_order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct callees of `caller`, in lexicographic order.
    pub fn callees(&self, caller: &str) -> Option<&BTreeSet<String>> {
        self.call_graph.get(caller)
    }

    /// Callees of `caller` in call-site order, duplicates included.
    pub fn calls_in_order(&self, caller: &str) -> Option<&[String]> {
        self.call_order.get(caller).map(Vec::as_slice)
    }

    pub fn edge_count(&self) -> usize {
        self.call_graph.values().map(BTreeSet::len).sum()
    }

    /// Caller -> sorted distinct callees, ready for serialization.
    pub fn graph_export(&self) -> BTreeMap<String, Vec<String>> {
        self.call_graph
            .iter()
            .map(|(caller, callees)| (caller.clone(), callees.iter().cloned().collect()))
            .collect()
    }

    /// Build a model from a translation unit's events.
    ///
    /// Callers declared only as non-user code are excluded up front, so the
    /// result does not depend on where their declarations appear.
    pub fn from_events(events: &[FrontEndEvent], options: &AnalyzerOptions) -> Self {
        let mut builder = GraphBuilder::new(options);
        builder.exclude_callers(foreign_functions(events));
        for event in events {
            builder.apply(event);
        }
        builder.finish()
    }
}

/// Target of an observed call.
#[derive(Debug, Clone, Copy)]
pub enum Callee<'a> {
    /// Resolved to a named declaration
    Direct(&'a str),
    /// Function pointer, unresolved dispatch, ...
    Unresolved(Option<&'a CalleeExpr>),
}

/// What `observe_call` did with an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Edge and order entry recorded for this callee node
    Recorded { callee: String, class: CalleeClass },
    /// System callee discarded because stdlib leaves are off
    DroppedSystem,
    /// Empty caller or callee name
    DroppedEmpty,
}

/// Folds observations into a [`CallModel`]. One builder per translation unit.
#[derive(Debug)]
pub struct GraphBuilder {
    include_stdlib_leaves: bool,
    indirect_label_with_hint: bool,
    model: CallModel,
    // Callers whose calls are not recorded.
    excluded: HashSet<String>,
}

impl GraphBuilder {
    pub fn new(options: &AnalyzerOptions) -> Self {
        Self {
            include_stdlib_leaves: options.include_stdlib_leaves,
            indirect_label_with_hint: options.indirect_label_with_hint,
            model: CallModel::default(),
            excluded: HashSet::new(),
        }
    }

    fn ensure_node(&mut self, name: &str) {
        if self.model.nodes.contains(name) {
            return;
        }
        self.model.nodes.insert(name.to_string());
        self.model.call_graph.entry(name.to_string()).or_default();
        self.model.call_order.entry(name.to_string()).or_default();
    }

    /// Register a function node. Idempotent.
    pub fn observe_function(&mut self, name: &str) {
        if name.is_empty() {
            trace!("dropping declaration with empty name");
            return;
        }
        self.ensure_node(name);
    }

    /// Record one call site of `caller`.
    pub fn observe_call(&mut self, caller: &str, callee: Callee<'_>) -> CallOutcome {
        if caller.is_empty() {
            trace!("dropping call with empty caller");
            return CallOutcome::DroppedEmpty;
        }

        let label = match callee {
            Callee::Direct("") => {
                trace!(caller, "dropping call with empty callee");
                return CallOutcome::DroppedEmpty;
            }
            Callee::Direct(name) => name.to_string(),
            Callee::Unresolved(expr) => self.indirect_label_for(expr),
        };

        self.ensure_node(caller);

        let class = classify(&label);
        if class == CalleeClass::SystemLeaf && !self.include_stdlib_leaves {
            trace!(caller, callee = %label, "dropping stdlib call");
            return CallOutcome::DroppedSystem;
        }

        self.ensure_node(&label);
        if let Some(callees) = self.model.call_graph.get_mut(caller) {
            callees.insert(label.clone());
        }
        if let Some(order) = self.model.call_order.get_mut(caller) {
            order.push(label.clone());
        }

        CallOutcome::Recorded {
            callee: label,
            class,
        }
    }

    fn indirect_label_for(&self, expr: Option<&CalleeExpr>) -> String {
        if !self.indirect_label_with_hint {
            return indirect_label(None);
        }
        indirect_label(expr.and_then(CalleeExpr::hint))
    }

    /// Ignore every call made from `callers`.
    pub fn exclude_callers<I, S>(&mut self, callers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(callers.into_iter().map(Into::into));
    }

    /// Apply a front-end event.
    ///
    /// Declarations from non-user code never create nodes. Calls from
    /// excluded callers are dropped.
    pub fn apply(&mut self, event: &FrontEndEvent) {
        match event {
            FrontEndEvent::DeclareFunction {
                name, is_user_code, ..
            } => {
                if *is_user_code {
                    self.observe_function(name);
                } else {
                    trace!(name = %name, "ignoring non-user declaration");
                }
            }
            FrontEndEvent::CallSite {
                caller,
                callee,
                callee_expr,
                ..
            } => {
                if self.excluded.contains(caller) {
                    trace!(caller = %caller, "ignoring call from non-user code");
                    return;
                }
                let target = match callee.as_deref() {
                    Some(name) => Callee::Direct(name),
                    None => Callee::Unresolved(callee_expr.as_ref()),
                };
                self.observe_call(caller, target);
            }
        }
    }

    pub fn model(&self) -> &CallModel {
        &self.model
    }

    pub fn finish(self) -> CallModel {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> GraphBuilder {
        GraphBuilder::new(&AnalyzerOptions::default())
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_observe_function_is_idempotent() {
        let mut once = builder();
        once.observe_function("main");

        let mut twice = builder();
        twice.observe_function("main");
        twice.observe_function("main");

        assert_eq!(once.model(), twice.model());
        assert_eq!(twice.model().nodes().len(), 1);
        assert_eq!(twice.model().calls_in_order("main"), Some(&[][..]));
    }

    #[test]
    fn test_order_kept_graph_deduplicated() {
        let mut b = builder();
        b.observe_call("caller", Callee::Direct("a"));
        b.observe_call("caller", Callee::Direct("b"));
        b.observe_call("caller", Callee::Direct("a"));

        let model = b.finish();
        assert_eq!(
            model.calls_in_order("caller").unwrap(),
            &["a".to_string(), "b".to_string(), "a".to_string()]
        );
        assert_eq!(model.callees("caller").unwrap(), &set(&["a", "b"]));
        assert_eq!(model.edge_count(), 2);
    }

    #[test]
    fn test_stdlib_dropped_when_leaves_off() {
        let mut b = builder();
        let outcome = b.observe_call("main", Callee::Direct("malloc"));
        assert_eq!(outcome, CallOutcome::DroppedSystem);

        let model = b.finish();
        assert!(model.contains("main"));
        assert!(!model.contains("malloc"));
        assert!(model.callees("main").unwrap().is_empty());
        assert!(model.calls_in_order("main").unwrap().is_empty());
        assert!(model.call_order().get("malloc").is_none());
    }

    #[test]
    fn test_stdlib_recorded_once_when_leaves_on() {
        let opts = AnalyzerOptions {
            include_stdlib_leaves: true,
            ..Default::default()
        };
        let mut b = GraphBuilder::new(&opts);
        b.observe_call("main", Callee::Direct("printf"));
        b.observe_call("main", Callee::Direct("printf"));

        let model = b.finish();
        assert_eq!(model.nodes().iter().filter(|n| *n == "printf").count(), 1);
        assert_eq!(model.callees("main").unwrap(), &set(&["printf"]));
        assert_eq!(model.calls_in_order("main").unwrap().len(), 2);
    }

    #[test]
    fn test_indirect_labels_plain_and_hinted() {
        let fp = CalleeExpr::Reference("fp".to_string());

        let mut plain = builder();
        plain.observe_call("main", Callee::Unresolved(Some(&fp)));
        assert!(plain.model().contains("(indirect)"));

        let opts = AnalyzerOptions {
            indirect_label_with_hint: true,
            ..Default::default()
        };
        let mut hinted = GraphBuilder::new(&opts);
        hinted.observe_call("main", Callee::Unresolved(Some(&fp)));
        hinted.observe_call("main", Callee::Unresolved(None));
        let deref_field = CalleeExpr::Deref(Box::new(CalleeExpr::Other));
        hinted.observe_call("main", Callee::Unresolved(Some(&deref_field)));

        let model = hinted.finish();
        assert_eq!(
            model.calls_in_order("main").unwrap(),
            &[
                "(indirect:fp)".to_string(),
                "(indirect)".to_string(),
                "(indirect)".to_string()
            ]
        );
    }

    #[test]
    fn test_empty_names_dropped() {
        let mut b = builder();
        assert_eq!(b.observe_call("", Callee::Direct("x")), CallOutcome::DroppedEmpty);
        assert_eq!(b.observe_call("main", Callee::Direct("")), CallOutcome::DroppedEmpty);
        b.observe_function("");
        assert!(b.model().is_empty());
    }

    #[test]
    fn test_non_user_declarations_are_ignored() {
        let events = vec![
            FrontEndEvent::DeclareFunction {
                name: "inline_helper".to_string(),
                source_file: Some("util.h".to_string()),
                is_user_code: false,
            },
            FrontEndEvent::call("inline_helper", "other"),
            FrontEndEvent::declare("main", Some("main.c")),
            FrontEndEvent::call("main", "inline_helper"),
        ];
        let model = CallModel::from_events(&events, &AnalyzerOptions::default());

        assert!(!model.contains("other"));
        assert_eq!(model.callees("main").unwrap(), &set(&["inline_helper"]));
        assert!(model.calls_in_order("inline_helper").unwrap().is_empty());
    }

    #[test]
    fn test_non_user_caller_ignored_after_being_called() {
        let events = vec![
            FrontEndEvent::declare("main", Some("a.c")),
            FrontEndEvent::call("main", "hdr"),
            FrontEndEvent::DeclareFunction {
                name: "hdr".to_string(),
                source_file: Some("x.h".to_string()),
                is_user_code: false,
            },
            FrontEndEvent::call("hdr", "other"),
        ];
        let model = CallModel::from_events(&events, &AnalyzerOptions::default());

        assert!(!model.contains("other"));
        assert_eq!(model.callees("main").unwrap(), &set(&["hdr"]));
        assert!(model.callees("hdr").unwrap().is_empty());
    }

    #[test]
    fn test_builds_are_deterministic() {
        let events = vec![
            FrontEndEvent::call("main", "zeta"),
            FrontEndEvent::call("main", "alpha"),
            FrontEndEvent::indirect_call("alpha", None),
            FrontEndEvent::call("main", "zeta"),
        ];
        let first = CallModel::from_events(&events, &AnalyzerOptions::default());
        let second = CallModel::from_events(&events, &AnalyzerOptions::default());
        assert_eq!(first, second);

        let export = first.graph_export();
        assert_eq!(export["main"], vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
