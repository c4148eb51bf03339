//! Command-line front end for spring-solver.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use spring_io::{
    ModelFile, ResultsDocument, load_model, preset_file, save_model, write_construction_steps,
    write_report,
};
use spring_solver::{AnalysisPipeline, assembly_steps, presets};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Direct solver for 1-D spring, bar and conduction networks
#[derive(Parser)]
#[command(name = "spring-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Solve 1-D spring, bar and conduction networks", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a model file or a built-in preset
    Solve {
        /// Model file (JSON)
        path: Option<PathBuf>,

        /// Solve a built-in preset instead of a file
        #[arg(long, conflicts_with = "path")]
        preset: Option<String>,

        /// Print the results document as JSON instead of the text report
        #[arg(long)]
        json: bool,

        /// Print the element-by-element construction of K before the report
        #[arg(long, conflicts_with = "json")]
        steps: bool,

        /// Decimal places in the text report (defaults to the model file's setting)
        #[arg(long)]
        decimal_places: Option<usize>,
    },
    /// List the built-in presets
    Presets,
    /// Write a built-in preset as a model file
    ExportPreset {
        name: String,
        out: PathBuf,
    },
}

fn solve(
    path: Option<PathBuf>,
    preset: Option<String>,
    json: bool,
    steps: bool,
    decimal_places: Option<usize>,
) -> anyhow::Result<()> {
    let file: ModelFile = match (path, preset) {
        (Some(path), _) => {
            load_model(&path).with_context(|| format!("reading {}", path.display()))?
        }
        (None, Some(name)) => preset_file(&name)?,
        (None, None) => bail!("give a model file or --preset <name>"),
    };

    let (model, config) = file.resolve()?;
    tracing::info!(
        nodes = model.num_nodes,
        elements = model.elements.len(),
        multiplier = config.global_multiplier,
        "solving"
    );
    let results = AnalysisPipeline::new(config).run(&model)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &ResultsDocument::from(&results))?;
        writeln!(out)?;
    } else {
        let places = decimal_places.unwrap_or(file.decimal_places);
        if steps {
            let construction = assembly_steps(model.num_nodes, &model.elements)?;
            write_construction_steps(&mut out, &model, &construction, places)?;
            writeln!(out)?;
        }
        write_report(&mut out, &model, &results, places)?;
    }
    Ok(())
}

fn list_presets() {
    for preset in presets::all() {
        println!("{:<14} {}", preset.name, preset.description);
    }
}

fn export_preset(name: &str, out: &Path) -> anyhow::Result<()> {
    let file = preset_file(name)?;
    save_model(out, &file).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(preset = name, path = %out.display(), "preset exported");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Solve {
            path,
            preset,
            json,
            steps,
            decimal_places,
        } => solve(path, preset, json, steps, decimal_places),
        Commands::Presets => {
            list_presets();
            Ok(())
        }
        Commands::ExportPreset { name, out } => export_preset(&name, &out),
    }
}
