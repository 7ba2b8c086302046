use std::collections::HashMap;
use std::sync::Mutex;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sled::Db;
use tracing::debug;

use crate::domain::callgraph::{Callee, CallModel, GraphBuilder};
use crate::domain::classify::{is_indirect_label, INDIRECT_LABEL};
use crate::domain::options::AnalyzerOptions;
use crate::error::Result;

/// A persisted function declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Unique per declaration, see [`function_id`]
    pub id: String,
    pub name: String,
    pub source_file: String,
}

/// A persisted call site. Callees without a declaration use their name as id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub caller_id: String,
    pub callee_id: String,
    pub line: Option<usize>,
}

/// Everything a store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredModel {
    pub functions: Vec<FunctionRecord>,
    /// In insertion order
    pub calls: Vec<CallRecord>,
}

/// Identifier of a declared function: `<file>::<name>`.
pub fn function_id(source_file: &str, name: &str) -> String {
    format!("{}::{}", source_file, name)
}

impl StoredModel {
    /// Rebuild a call model by replaying stored calls under `options`.
    ///
    /// Ids map back to display names, so same-named functions from different
    /// files collapse into one node.
    pub fn replay(&self, options: &AnalyzerOptions) -> CallModel {
        let names: HashMap<&str, &str> = self
            .functions
            .iter()
            .map(|f| (f.id.as_str(), f.name.as_str()))
            .collect();
        let name_of = |id: &str| -> String {
            let name = names.get(id).copied().unwrap_or(id);
            if is_indirect_label(name) && !options.indirect_label_with_hint {
                INDIRECT_LABEL.to_string()
            } else {
                name.to_string()
            }
        };

        let mut builder = GraphBuilder::new(options);
        for function in &self.functions {
            builder.observe_function(&function.name);
        }
        for call in &self.calls {
            let callee = name_of(&call.callee_id);
            builder.observe_call(&name_of(&call.caller_id), Callee::Direct(&callee));
        }

        debug!(
            functions = self.functions.len(),
            calls = self.calls.len(),
            "replayed stored model"
        );
        builder.finish()
    }
}

/// Persistence backend for indexed functions and calls.
/// Implementations must be thread-safe (Send + Sync).
pub trait CallStore: Send + Sync {
    /// Insert functions; an id already present is left untouched.
    fn insert_functions(&self, functions: &[FunctionRecord]) -> Result<()>;
    /// Append calls. No deduplication.
    fn insert_calls(&self, calls: &[CallRecord]) -> Result<()>;
    fn load_all(&self) -> Result<StoredModel>;
}

// ============================================================================
// MemoryCallStore - in-process storage using DashMap
// ============================================================================

#[derive(Default)]
pub struct MemoryCallStore {
    functions: DashMap<String, FunctionRecord>,
    calls: Mutex<Vec<CallRecord>>,
}

impl CallStore for MemoryCallStore {
    fn insert_functions(&self, functions: &[FunctionRecord]) -> Result<()> {
        for f in functions {
            self.functions.entry(f.id.clone()).or_insert_with(|| f.clone());
        }
        Ok(())
    }

    fn insert_calls(&self, calls: &[CallRecord]) -> Result<()> {
        let mut stored = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        stored.extend_from_slice(calls);
        Ok(())
    }

    fn load_all(&self) -> Result<StoredModel> {
        let mut functions: Vec<FunctionRecord> =
            self.functions.iter().map(|r| r.value().clone()).collect();
        functions.sort_by(|a, b| a.id.cmp(&b.id));

        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone();
        Ok(StoredModel { functions, calls })
    }
}

// ============================================================================
// DiskCallStore - persistent storage using sled
// ============================================================================

pub struct DiskCallStore {
    db: Db,
    functions_tree: sled::Tree,
    calls_tree: sled::Tree,
}

impl DiskCallStore {
    pub fn open(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        let functions_tree = db.open_tree("functions")?;
        let calls_tree = db.open_tree("calls")?;

        Ok(Self {
            db,
            functions_tree,
            calls_tree,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl CallStore for DiskCallStore {
    fn insert_functions(&self, functions: &[FunctionRecord]) -> Result<()> {
        for f in functions {
            let bytes = bincode::serialize(f)?;
            // Insert-or-ignore keyed by id.
            let _ = self
                .functions_tree
                .compare_and_swap(f.id.as_bytes(), None as Option<&[u8]>, Some(bytes))?;
        }
        Ok(())
    }

    fn insert_calls(&self, calls: &[CallRecord]) -> Result<()> {
        for c in calls {
            // Monotonic big-endian keys keep sled's iteration in insertion order.
            let key = self.db.generate_id()?.to_be_bytes();
            self.calls_tree.insert(key, bincode::serialize(c)?)?;
        }
        Ok(())
    }

    fn load_all(&self) -> Result<StoredModel> {
        let mut model = StoredModel::default();
        for entry in self.functions_tree.iter() {
            let (_, bytes) = entry?;
            model.functions.push(bincode::deserialize(&bytes)?);
        }
        for entry in self.calls_tree.iter() {
            let (_, bytes) = entry?;
            model.calls.push(bincode::deserialize(&bytes)?);
        }
        Ok(model)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
