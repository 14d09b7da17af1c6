use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lp_app::{AppError, AppResult, Session, query};
use lp_math::{Operation, OperatorKind};
use lp_store::{Delimiter, DelimitedTextLoader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lp-cli")]
#[command(about = "logplot CLI - Derived signals and plot layouts for tabular logs", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    loader: LoaderArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoaderArgs {
    /// Cell separator: auto, ws (whitespace) or a single character
    #[arg(long, global = true, default_value = "auto")]
    delimiter: String,
    /// Name of the time column (defaults to the first column)
    #[arg(long, global = true)]
    time_column: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the variables of one or more log files
    Inspect {
        /// Log files to open
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Evaluate an expression over variables of a log file
    Eval {
        /// Log file to open
        file: PathBuf,
        /// Expression over x0, x1, ...
        expression: String,
        /// Variables bound to x0, x1, ... in order
        #[arg(short, long, value_delimiter = ',', required = true)]
        inputs: Vec<String>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a math operator and optionally save the result as a layout
    Derive {
        /// Log file to open
        file: PathBuf,
        /// Name of the derived signal
        name: String,
        /// Operator tag (e.g., math_filter, math_diff, math_running_window)
        #[arg(long)]
        op: String,
        /// Operator parameters as JSON (e.g., '{"order":2,"type":"low","cutoff":5}')
        #[arg(long)]
        details: Option<String>,
        /// Input variables, in operator order
        #[arg(short, long, value_delimiter = ',', required = true)]
        inputs: Vec<String>,
        /// Save a layout with the derived trace to this path (.yaml or .json)
        #[arg(long)]
        layout: Option<PathBuf>,
    },
    /// Rebuild every trace of a layout against the given log files
    Reproduce {
        /// Layout file (.yaml, .yml or .json)
        layout: PathBuf,
        /// Log files to open first
        #[arg(short, long)]
        source: Vec<PathBuf>,
    },
    /// Validate layout file syntax and structure
    Validate {
        /// Layout file (.yaml, .yml or .json)
        layout: PathBuf,
    },
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let loader = build_loader(&cli.loader)?;
    tracing::debug!(delimiter = %cli.loader.delimiter, "loader configured");

    match cli.command {
        Commands::Inspect { files } => cmd_inspect(&loader, &files),
        Commands::Eval {
            file,
            expression,
            inputs,
            output,
        } => cmd_eval(&loader, &file, &expression, &inputs, output.as_deref()),
        Commands::Derive {
            file,
            name,
            op,
            details,
            inputs,
            layout,
        } => cmd_derive(
            &loader,
            &file,
            &name,
            &op,
            details.as_deref(),
            &inputs,
            layout.as_deref(),
        ),
        Commands::Reproduce { layout, source } => cmd_reproduce(&loader, &layout, &source),
        Commands::Validate { layout } => cmd_validate(&layout),
    }
}

fn build_loader(args: &LoaderArgs) -> AppResult<DelimitedTextLoader> {
    let delimiter = match args.delimiter.as_str() {
        "auto" => Delimiter::Auto,
        "ws" | "whitespace" => Delimiter::Whitespace,
        "tab" | "\\t" => Delimiter::Char('\t'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Delimiter::Char(c),
                _ => {
                    return Err(AppError::InvalidInput(format!(
                        "delimiter must be auto, ws, tab or one character, got '{other}'"
                    )));
                }
            }
        }
    };
    let mut loader = DelimitedTextLoader::new().with_delimiter(delimiter);
    if let Some(column) = &args.time_column {
        loader = loader.with_time_column(column.clone());
    }
    Ok(loader)
}

/// Source id the loader assigns to `path`.
fn source_id_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open_all(session: &mut Session<'_>, loader: &DelimitedTextLoader, files: &[PathBuf]) -> AppResult<()> {
    for file in files {
        session.open_file(file, loader)?;
    }
    Ok(())
}

fn cmd_inspect(loader: &DelimitedTextLoader, files: &[PathBuf]) -> AppResult<()> {
    let mut session = Session::new();
    open_all(&mut session, loader, files)?;

    for summary in query::list_sources(session.store()) {
        println!("{}", summary.source_id);
        println!("  Samples: {}", summary.sample_count);
        if let Some((t0, t1)) = summary.time_range {
            println!("  Time range: {:.3} - {:.3} s (avg dt {:.6} s)", t0, t1, summary.avg_dt);
        }
        let model = session.store().model(&summary.source_id)?;
        println!("  Variables:");
        for name in model.variable_names() {
            let signal = model.get(name)?;
            let info = query::signal_summary(&signal);
            let kind = if info.is_integer { "int" } else { "float" };
            match info.value_range {
                Some((lo, hi)) => println!("    {:<24} {:<5} [{}, {}]", name, kind, lo, hi),
                None => println!("    {:<24} {:<5} (no finite values)", name, kind),
            }
        }
    }
    Ok(())
}

fn cmd_eval(
    loader: &DelimitedTextLoader,
    file: &Path,
    expression: &str,
    inputs: &[String],
    output: Option<&Path>,
) -> AppResult<()> {
    let mut session = Session::new();
    session.open_file(file, loader)?;
    let source_id = source_id_of(file);
    let pairs: Vec<(&str, &str)> = inputs
        .iter()
        .map(|name| (source_id.as_str(), name.as_str()))
        .collect();
    let signal = session.derive(expression, Operation::expr(expression), &pairs)?;

    let mut csv = String::from("time_s,value\n");
    for (t, v) in signal.time().iter().zip(signal.data().as_f64().iter()) {
        csv.push_str(&format!("{},{}\n", t, v));
    }
    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Wrote {} samples to {}", signal.len(), path.display());
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_derive(
    loader: &DelimitedTextLoader,
    file: &Path,
    name: &str,
    op: &str,
    details: Option<&str>,
    inputs: &[String],
    layout: Option<&Path>,
) -> AppResult<()> {
    let kind = OperatorKind::from_source_type(op)
        .ok_or_else(|| AppError::InvalidInput(format!("unknown operator '{op}'")))?;
    let details = details
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(|e| AppError::InvalidInput(format!("invalid --details JSON: {e}")))?;
    let operation = Operation::from_details(kind, details.as_ref())?;

    let mut session = Session::new();
    session.open_file(file, loader)?;
    let source_id = source_id_of(file);
    let pairs: Vec<(&str, &str)> = inputs
        .iter()
        .map(|input| (source_id.as_str(), input.as_str()))
        .collect();
    let signal = session.derive(name, operation, &pairs)?;

    let summary = query::signal_summary(&signal);
    println!("✓ Derived '{}' in {}", summary.name, summary.source_id);
    println!("  Samples: {}", summary.sample_count);
    if let Some((lo, hi)) = summary.value_range {
        println!("  Range: [{}, {}]", lo, hi);
    }
    if let Some(provenance) = &summary.provenance {
        println!("  Spec: {}", provenance);
    }

    if let Some(path) = layout {
        for input in inputs {
            session.add_trace(0, 0, &source_id, input)?;
        }
        session.add_trace(0, 1, &source_id, signal.name())?;
        session.save_layout(path)?;
        println!("✓ Layout saved to {}", path.display());
    }
    Ok(())
}

fn cmd_reproduce(loader: &DelimitedTextLoader, layout: &Path, sources: &[PathBuf]) -> AppResult<()> {
    let mut session = Session::new();
    open_all(&mut session, loader, sources)?;
    let warnings = session.load_layout(layout)?;

    let plot = session.layout();
    for (tab_index, tab) in plot.tabs.iter().enumerate() {
        println!("Tab {}: {}", tab_index, tab.name);
        for (subplot_index, subplot) in tab.subplots.iter().enumerate() {
            println!("  Subplot {}", subplot_index);
            for trace in &subplot.traces {
                let summary = query::signal_summary(&trace.signal);
                println!(
                    "    {} ({} samples, {})",
                    trace.label(),
                    summary.sample_count,
                    summary.source_id
                );
            }
        }
    }
    println!(
        "Operator invocations: {}",
        session.reproducer().operator_invocations()
    );

    if warnings.is_empty() {
        println!("✓ Reproduced {} traces", plot.trace_count());
    } else {
        println!(
            "✓ Reproduced {} traces, skipped {}:",
            plot.trace_count(),
            warnings.len()
        );
        for warning in &warnings {
            println!("  ✗ {}", warning);
        }
    }
    Ok(())
}

fn cmd_validate(layout: &Path) -> AppResult<()> {
    println!("Validating layout: {}", layout.display());
    let def = lp_layout::load(layout)?;
    println!(
        "✓ Layout is valid ({} tabs, {} traces)",
        def.tabs.len(),
        def.trace_count()
    );
    Ok(())
}
