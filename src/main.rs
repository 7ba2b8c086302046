// Command-line entry point for callseq.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use callseq::application::{unit_header, AnalyzeUsecase, FileFailure, IndexUsecase, RenderUsecase};
use callseq::domain::options::AnalyzerOptions;
use callseq::domain::store::DiskCallStore;
use callseq::infrastructure::concurrency::init_thread_pool;
use callseq::infrastructure::config::ConfigFile;
use callseq::infrastructure::event_reader::write_events;
use callseq::infrastructure::SourceLoader;
use callseq::ports::EmitFormat;

/// callseq - call graphs and bounded call-sequence traces
#[derive(Parser, Debug)]
#[command(name = "callseq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build call graphs and sequence diagrams from source or front-end events", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze each input as its own translation unit and emit diagrams
    Analyze {
        /// Input files or folders (.rs, .jsonl, .events)
        #[arg(value_name = "PATH", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory, one file per translation unit (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (0 = automatic)
        #[arg(long)]
        threads: Option<usize>,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },

    /// Run the front ends and persist functions and calls into a store
    Index {
        /// Store directory
        #[arg(long, value_name = "DIR")]
        db: PathBuf,

        #[arg(value_name = "PATH", required = true)]
        inputs: Vec<PathBuf>,

        /// Worker threads (0 = automatic)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Emit diagrams for everything held in a store
    Render {
        /// Store directory
        #[arg(long, value_name = "DIR")]
        db: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },

    /// Print the front-end events of one input as JSON lines
    Events {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IndirectLabel {
    /// `(indirect)`
    Plain,
    /// `(indirect:<var>)`
    Var,
}

/// Analyzer flags. Each one overrides the options file.
#[derive(Args, Debug)]
struct AnalyzerArgs {
    /// TOML options file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format [default: json]
    #[arg(long, value_enum)]
    emit: Option<EmitFormat>,

    /// Keep stdlib/system callees as leaf nodes
    #[arg(long = "stdlib-leaf", value_enum)]
    stdlib_leaf: Option<Switch>,

    /// Label form for unresolved calls
    #[arg(long = "indirect-label", value_enum)]
    indirect_label: Option<IndirectLabel>,

    /// Sequence expansion depth (values below 1 mean 1)
    #[arg(long = "seq-depth", allow_hyphen_values = true)]
    seq_depth: Option<i64>,

    /// Sequence root (default: main, else the first node)
    #[arg(long = "seq-root")]
    seq_root: Option<String>,
}

/// Options file merged with command-line overrides.
struct Settings {
    options: AnalyzerOptions,
    emit: EmitFormat,
    /// From the options file; `analyze --threads` overrides it
    threads: usize,
}

impl AnalyzerArgs {
    fn settings(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ConfigFile::default(),
        };

        let mut options = file.analyzer;
        if let Some(switch) = self.stdlib_leaf {
            options.include_stdlib_leaves = switch == Switch::On;
        }
        if let Some(label) = self.indirect_label {
            options.indirect_label_with_hint = label == IndirectLabel::Var;
        }
        if let Some(depth) = self.seq_depth {
            options.sequence_max_depth = depth;
        }
        if let Some(root) = &self.seq_root {
            options.sequence_root = Some(root.clone());
        }

        Ok(Settings {
            options,
            emit: self.emit.or(file.emit).unwrap_or_default(),
            threads: file.threads,
        })
    }
}

/// Default filter directive when `RUST_LOG` is unset.
fn log_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize logging implementation. `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(verbose)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn report_failures(failures: &[FileFailure]) {
    for failure in failures {
        eprintln!("[FAIL] {}: {}", failure.path, failure.error);
    }
}

fn cmd_analyze(
    inputs: &[PathBuf],
    output: Option<&Path>,
    threads: Option<usize>,
    analyzer: &AnalyzerArgs,
) -> Result<()> {
    let settings = analyzer.settings()?;
    init_thread_pool(threads.unwrap_or(settings.threads))?;

    let files = SourceLoader::collect(inputs)?;
    if files.is_empty() {
        bail!("No analyzable inputs found");
    }

    let report = AnalyzeUsecase {
        options: &settings.options,
    }
    .run(&files);
    report_failures(&report.failures);

    match output {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output folder {}", dir.display()))?;
            let names = report.output_file_names(settings.emit);
            for (unit, name) in report.units.iter().zip(&names) {
                let target = dir.join(name);
                fs::write(&target, unit.render(settings.emit)?)
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                info!(path = %target.display(), "wrote output");
            }
        }
        None => {
            let several = report.units.len() > 1;
            for unit in &report.units {
                if several {
                    println!("{}", unit_header(&unit.path));
                }
                print!("{}", unit.render(settings.emit)?);
            }
        }
    }

    if report.units.is_empty() {
        bail!("All {} input(s) failed", report.failures.len());
    }
    Ok(())
}

fn cmd_index(db: &Path, inputs: &[PathBuf], threads: usize) -> Result<()> {
    init_thread_pool(threads)?;
    let files = SourceLoader::collect(inputs)?;

    let store = DiskCallStore::open(&db.to_string_lossy())
        .with_context(|| format!("Failed to open store {}", db.display()))?;
    let report = IndexUsecase { store: &store }.run(&files)?;
    store.flush()?;

    for file in &report.indexed {
        println!(
            "[OK] {} (functions={}, calls={})",
            file.path, file.functions, file.calls
        );
    }
    report_failures(&report.failures);
    println!(
        "Indexed {} file(s), {} failed",
        report.indexed.len(),
        report.failures.len()
    );
    Ok(())
}

fn cmd_render(db: &Path, output: Option<&Path>, analyzer: &AnalyzerArgs) -> Result<()> {
    let settings = analyzer.settings()?;
    if !db.exists() {
        bail!("Store {} does not exist; run `callseq index` first", db.display());
    }

    let store = DiskCallStore::open(&db.to_string_lossy())
        .with_context(|| format!("Failed to open store {}", db.display()))?;
    let unit = RenderUsecase {
        store: &store,
        options: &settings.options,
    }
    .run(&db.display().to_string())?;

    let text = unit.render(settings.emit)?;
    match output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", text),
    }
    Ok(())
}

fn cmd_events(input: &Path) -> Result<()> {
    let files = SourceLoader::collect(&[input.to_path_buf()])?;
    for file in &files {
        let unit = file
            .load()
            .with_context(|| format!("Failed to read {}", file.path.display()))?;
        print!("{}", write_events(&unit.events)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Analyze {
            inputs,
            output,
            threads,
            analyzer,
        } => cmd_analyze(inputs, output.as_deref(), *threads, analyzer),
        Commands::Index {
            db,
            inputs,
            threads,
        } => cmd_index(db, inputs, threads.unwrap_or(0)),
        Commands::Render {
            db,
            output,
            analyzer,
        } => cmd_render(db, output.as_deref(), analyzer),
        Commands::Events { input } => cmd_events(input),
    }
}
