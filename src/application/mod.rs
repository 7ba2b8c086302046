// Use cases: analyze translation units, index them into a store, and render
// diagrams back out of a store.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::callgraph::CallModel;
use crate::domain::classify::indirect_label;
use crate::domain::events::{foreign_functions, CalleeExpr, FrontEndEvent, TranslationUnit};
use crate::domain::identity::IdentityTable;
use crate::domain::options::AnalyzerOptions;
use crate::domain::sequence::{pick_root, synthesize, SequenceTrace};
use crate::domain::store::{function_id, CallRecord, CallStore, FunctionRecord};
use crate::error::Result;
use crate::infrastructure::SourceFile;
use crate::ports::{EmitFormat, RenderInput};

/// Graph and trace of one translation unit (or of a whole store).
#[derive(Debug, Clone)]
pub struct UnitAnalysis {
    pub path: String,
    pub model: CallModel,
    pub trace: SequenceTrace,
}

impl UnitAnalysis {
    pub fn from_model(path: impl Into<String>, model: CallModel, options: &AnalyzerOptions) -> Self {
        let root = pick_root(&model, options.root());
        let trace = synthesize(&model, &root, options.effective_depth());
        if !trace.is_root_found() {
            info!(root = %trace.root, "sequence root not found");
        }
        Self {
            path: path.into(),
            model,
            trace,
        }
    }

    pub fn from_unit(unit: &TranslationUnit, options: &AnalyzerOptions) -> Self {
        let model = CallModel::from_events(&unit.events, options);
        debug!(
            path = %unit.path,
            nodes = model.nodes().len(),
            edges = model.edge_count(),
            "built call model"
        );
        Self::from_model(unit.path.clone(), model, options)
    }

    pub fn render_input(&self) -> RenderInput<'_> {
        RenderInput {
            model: &self.model,
            trace: &self.trace,
        }
    }

    pub fn render(&self, format: EmitFormat) -> Result<String> {
        format.render(self.render_input())
    }
}

/// A file skipped because it could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct AnalysisReport {
    /// In input order
    pub units: Vec<UnitAnalysis>,
    pub failures: Vec<FileFailure>,
}

impl AnalysisReport {
    /// One output file name per unit, in unit order.
    ///
    /// Names come from a single [`IdentityTable`], so paths that sanitize to
    /// the same base (`a-b.rs`, `a_b.rs`) still get distinct files.
    pub fn output_file_names(&self, format: EmitFormat) -> Vec<String> {
        let mut ids = IdentityTable::new();
        self.units
            .iter()
            .map(|unit| format!("{}.{}", ids.identifier(&unit.path), format.file_extension()))
            .collect()
    }
}

/// Line printed before each unit when several units share stdout.
pub fn unit_header(path: &str) -> String {
    format!("==> {} <==", path)
}

fn load_all(files: &[SourceFile]) -> Vec<std::result::Result<TranslationUnit, FileFailure>> {
    files
        .par_iter()
        .map(|file| {
            file.load().map_err(|e| {
                warn!(path = %file.path.display(), error = %e, "skipping file");
                FileFailure {
                    path: file.path.display().to_string(),
                    error: e.to_string(),
                }
            })
        })
        .collect()
}

/// Analyze each input file as an independent translation unit.
pub struct AnalyzeUsecase<'a> {
    pub options: &'a AnalyzerOptions,
}

impl<'a> AnalyzeUsecase<'a> {
    pub fn run(&self, files: &[SourceFile]) -> AnalysisReport {
        let mut report = AnalysisReport::default();
        let analyzed: Vec<_> = load_all(files)
            .into_par_iter()
            .map(|loaded| loaded.map(|unit| UnitAnalysis::from_unit(&unit, self.options)))
            .collect();

        for result in analyzed {
            match result {
                Ok(unit) => report.units.push(unit),
                Err(failure) => report.failures.push(failure),
            }
        }
        report
    }

    pub fn run_units(&self, units: &[TranslationUnit]) -> Vec<UnitAnalysis> {
        units
            .par_iter()
            .map(|unit| UnitAnalysis::from_unit(unit, self.options))
            .collect()
    }
}

/// Store records for one translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitRecords {
    pub functions: Vec<FunctionRecord>,
    pub calls: Vec<CallRecord>,
}

impl UnitRecords {
    /// Project a unit's events onto store records.
    ///
    /// Declared user functions are keyed `<file>::<name>`; callees without a
    /// declaration in this unit are keyed by name. Stdlib calls are kept and
    /// indirect labels always carry their hint; both are filtered on replay.
    pub fn from_unit(unit: &TranslationUnit) -> Self {
        let mut records = UnitRecords::default();
        let mut ids: HashMap<&str, String> = HashMap::new();
        let foreign = foreign_functions(&unit.events);

        for event in &unit.events {
            if let FrontEndEvent::DeclareFunction {
                name,
                source_file,
                is_user_code,
            } = event
            {
                if name.is_empty() || !*is_user_code || ids.contains_key(name.as_str()) {
                    continue;
                }
                let file = source_file.as_deref().unwrap_or(&unit.path);
                let id = function_id(file, name);
                records.functions.push(FunctionRecord {
                    id: id.clone(),
                    name: name.clone(),
                    source_file: file.to_string(),
                });
                ids.insert(name, id);
            }
        }

        let id_of = |name: &str| ids.get(name).cloned().unwrap_or_else(|| name.to_string());

        for event in &unit.events {
            if let FrontEndEvent::CallSite {
                caller,
                callee,
                callee_expr,
                line,
            } = event
            {
                if caller.is_empty() || foreign.contains(caller.as_str()) {
                    continue;
                }
                let callee_id = match callee.as_deref() {
                    Some("") => continue,
                    Some(name) => id_of(name),
                    None => indirect_label(callee_expr.as_ref().and_then(CalleeExpr::hint)),
                };
                records.calls.push(CallRecord {
                    caller_id: id_of(caller),
                    callee_id,
                    line: *line,
                });
            }
        }

        records
    }
}

/// Per-file outcome of an index run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub path: String,
    pub functions: usize,
    pub calls: usize,
}

#[derive(Debug, Default)]
pub struct IndexReport {
    pub indexed: Vec<IndexedFile>,
    pub failures: Vec<FileFailure>,
}

/// Run the front ends over the inputs and persist the results.
pub struct IndexUsecase<'a> {
    pub store: &'a dyn CallStore,
}

impl<'a> IndexUsecase<'a> {
    /// Front-end failures are recorded per file; store failures abort the run.
    pub fn run(&self, files: &[SourceFile]) -> Result<IndexReport> {
        let mut report = IndexReport::default();

        for loaded in load_all(files) {
            match loaded {
                Ok(unit) => report.indexed.push(self.persist(&unit)?),
                Err(failure) => report.failures.push(failure),
            }
        }
        Ok(report)
    }

    pub fn persist(&self, unit: &TranslationUnit) -> Result<IndexedFile> {
        let records = UnitRecords::from_unit(unit);
        self.store.insert_functions(&records.functions)?;
        self.store.insert_calls(&records.calls)?;

        info!(
            path = %unit.path,
            functions = records.functions.len(),
            calls = records.calls.len(),
            "indexed translation unit"
        );
        Ok(IndexedFile {
            path: unit.path.clone(),
            functions: records.functions.len(),
            calls: records.calls.len(),
        })
    }
}

/// Rebuild the model from a store and synthesize its trace.
pub struct RenderUsecase<'a> {
    pub store: &'a dyn CallStore,
    pub options: &'a AnalyzerOptions,
}

impl<'a> RenderUsecase<'a> {
    pub fn run(&self, label: &str) -> Result<UnitAnalysis> {
        let stored = self.store.load_all()?;
        let model = stored.replay(self.options);
        Ok(UnitAnalysis::from_model(label, model, self.options))
    }
}
