//! Front-end events.
//!
//! A front end (the `syn` based one in this crate, or any external tool writing
//! JSON lines) describes a translation unit as an ordered stream of these events.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Shape of a callee expression that could not be resolved to a declaration.
///
/// Only a direct reference and a dereference of one carry a usable hint;
/// anything richer collapses to `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CalleeExpr {
    /// `fp()`
    Reference(String),
    /// `(*fp)()`
    Deref(Box<CalleeExpr>),
    /// Field access, call result, closure, ...
    Other,
}

impl CalleeExpr {
    /// Hint token naming the called variable, if the expression has one.
    ///
    /// `Other` yields the generic `expr`; a dereference of anything but a plain
    /// reference yields nothing.
    pub fn hint(&self) -> Option<&str> {
        match self {
            CalleeExpr::Reference(name) => Some(name.as_str()),
            CalleeExpr::Deref(inner) => match inner.as_ref() {
                CalleeExpr::Reference(name) => Some(name.as_str()),
                _ => None,
            },
            CalleeExpr::Other => Some("expr"),
        }
        .filter(|h| !h.is_empty())
    }
}

/// One observation emitted by a front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FrontEndEvent {
    /// A function with a body was declared.
    DeclareFunction {
        name: String,
        #[serde(default)]
        source_file: Option<String>,
        #[serde(default = "default_true")]
        is_user_code: bool,
    },
    /// A call expression inside `caller`'s body.
    CallSite {
        caller: String,
        /// Resolved callee name, `None` for unresolved targets
        #[serde(default)]
        callee: Option<String>,
        #[serde(default)]
        callee_expr: Option<CalleeExpr>,
        #[serde(default)]
        line: Option<usize>,
    },
}

fn default_true() -> bool {
    true
}

impl FrontEndEvent {
    pub fn declare(name: impl Into<String>, source_file: Option<&str>) -> Self {
        FrontEndEvent::DeclareFunction {
            name: name.into(),
            source_file: source_file.map(str::to_string),
            is_user_code: true,
        }
    }

    pub fn call(caller: impl Into<String>, callee: impl Into<String>) -> Self {
        FrontEndEvent::CallSite {
            caller: caller.into(),
            callee: Some(callee.into()),
            callee_expr: None,
            line: None,
        }
    }

    pub fn indirect_call(caller: impl Into<String>, expr: Option<CalleeExpr>) -> Self {
        FrontEndEvent::CallSite {
            caller: caller.into(),
            callee: None,
            callee_expr: expr,
            line: None,
        }
    }
}

/// All events of one translation unit, in emission order.
#[derive(Debug, Clone, Default)]
pub struct TranslationUnit {
    pub path: String,
    pub events: Vec<FrontEndEvent>,
}

impl TranslationUnit {
    pub fn new(path: impl Into<String>, events: Vec<FrontEndEvent>) -> Self {
        Self {
            path: path.into(),
            events,
        }
    }
}

/// Names declared only as non-user code in `events`.
///
/// Any user declaration of a name clears it, wherever it appears in the
/// stream. Calls made from these names are not part of the model.
pub fn foreign_functions(events: &[FrontEndEvent]) -> HashSet<&str> {
    let mut foreign = HashSet::new();
    let mut user = HashSet::new();
    for event in events {
        if let FrontEndEvent::DeclareFunction {
            name, is_user_code, ..
        } = event
        {
            if *is_user_code {
                user.insert(name.as_str());
            } else {
                foreign.insert(name.as_str());
            }
        }
    }
    foreign.retain(|name| !user.contains(name));
    foreign
}
