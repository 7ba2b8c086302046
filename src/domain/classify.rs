//! Callee Classification
//!
//! Maps a node name to user code, a system/stdlib leaf, or an indirect-call label.
//! The classification is a pure function of the name and is never stored.

/// Marker every synthesized indirect-call label starts with.
pub const INDIRECT_MARKER: &str = "(indirect";

/// Label used when no hint is available for an indirect call.
pub const INDIRECT_LABEL: &str = "(indirect)";

/// Toolchain, runtime and builtin prefixes (case-sensitive).
const SYSTEM_PREFIXES: &[&str] = &[
    "__",
    "_mingw",
    "__builtin",
    "__imp_",
    "_chkstk",
    "__security",
    "__acrt",
];

/// Well-known C standard library symbols treated as leaves.
const STDLIB_NAMES: &[&str] = &[
    "printf", "fprintf", "sprintf", "snprintf", "puts", "putchar",
    "malloc", "calloc", "realloc", "free",
    "memcpy", "memset", "memcmp", "strlen", "strcpy", "strncpy",
    "strcmp", "strncmp", "strcat", "strncat",
    "fopen", "fclose", "fread", "fwrite", "fflush",
    "exit", "abort", "assert",
];

/// Classification of a call-graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalleeClass {
    /// A function from the analyzed code base
    User,
    /// Toolchain/runtime/stdlib symbol, never expanded
    SystemLeaf,
    /// Synthesized label for a call without a resolvable target
    Indirect,
}

impl CalleeClass {
    /// Whether a node of this class may be expanded during sequence synthesis.
    pub fn is_expandable(self) -> bool {
        matches!(self, CalleeClass::User)
    }
}

/// Classify a node by its name.
pub fn classify(name: &str) -> CalleeClass {
    if is_indirect_label(name) {
        CalleeClass::Indirect
    } else if is_system_name(name) {
        CalleeClass::SystemLeaf
    } else {
        CalleeClass::User
    }
}

pub fn is_indirect_label(name: &str) -> bool {
    name.starts_with(INDIRECT_MARKER)
}

/// Whether the name belongs to the static system/stdlib table.
pub fn is_system_name(name: &str) -> bool {
    SYSTEM_PREFIXES.iter().any(|p| name.starts_with(p)) || STDLIB_NAMES.contains(&name)
}

/// Build an indirect-call label, with the hint suffix when one is given.
pub fn indirect_label(hint: Option<&str>) -> String {
    match hint {
        Some(h) if !h.is_empty() => format!("{}:{})", INDIRECT_MARKER, h),
        _ => INDIRECT_LABEL.to_string(),
    }
}

/// Extract the hint token from an indirect label, e.g. `fp` from `(indirect:fp)`.
pub fn indirect_hint(label: &str) -> Option<&str> {
    label
        .strip_prefix(INDIRECT_MARKER)?
        .strip_prefix(':')?
        .strip_suffix(')')
        .filter(|h| !h.is_empty())
}
