//! Stackup Exporter CLI - KiCAD PCB stackup to JSON and HTML from the command line.

mod host;

use clap::{Args, Parser, Subcommand};
use stackup_exporter::{
    run_plugin, ExportOptions, ExportReport, PluginOutcome, StackupExporter,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::host::TerminalHost;

#[derive(Parser)]
#[command(name = "stackup-exporter")]
#[command(about = "Export KiCAD PCB stackup information to JSON and HTML", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the .kicad_pcb file
    #[arg(value_name = "INPUT", required = true)]
    input: Option<PathBuf>,

    /// JSON output path or directory (default: <input>_stackup.json); the
    /// HTML report is written next to it
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    export: ExportArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the board currently open in KiCAD (plugin entry point)
    Plugin {
        /// Board file the host has open
        #[arg(long, value_name = "FILE", env = "KICAD_BOARD_FILE")]
        board: Option<PathBuf>,

        /// Save location; skips the interactive prompt
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Regenerate the HTML report from an exported stackup JSON file
    Render {
        /// Stackup JSON written by a previous export
        #[arg(value_name = "JSON")]
        json: PathBuf,

        /// HTML output path (default: same name with .html)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        export: ExportArgs,
    },
}

#[derive(Args, Clone, Default)]
struct ExportArgs {
    /// Title for the HTML report (default: board file name)
    #[arg(long)]
    title: Option<String>,

    /// Leave the export timestamp out of the documents
    #[arg(long)]
    no_timestamp: bool,
}

impl ExportArgs {
    fn options(&self) -> ExportOptions {
        ExportOptions {
            timestamp: !self.no_timestamp,
            title: self.title.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let exit_code = match cli.command {
        Some(Commands::Plugin {
            board,
            output,
            export,
        }) => handle_plugin(board, output, &export.options()),
        Some(Commands::Render {
            json,
            output,
            export,
        }) => handle_render(&json, output.as_deref(), &export.options()),
        None => match cli.input {
            Some(input) => handle_convert(&input, cli.output.as_deref(), &cli.export.options()),
            None => {
                eprintln!("Error: missing input file");
                1
            }
        },
    };

    process::exit(exit_code);
}

/// Log to stderr so stdout stays clean; `RUST_LOG` overrides the `warn` default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_convert(input: &Path, output: Option<&Path>, options: &ExportOptions) -> i32 {
    println!("Parsing stackup from: {}", input.display());

    match StackupExporter::export_file(input, output, options) {
        Ok(report) => {
            print_report(&report);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_plugin(board: Option<PathBuf>, output: Option<PathBuf>, options: &ExportOptions) -> i32 {
    let host = TerminalHost::new(board, output);

    match run_plugin(&host, options) {
        Ok(PluginOutcome::Exported(_)) | Ok(PluginOutcome::Cancelled) => 0,
        // Already reported through the host.
        Ok(PluginOutcome::NoBoard) | Err(_) => 1,
    }
}

fn handle_render(json: &Path, output: Option<&Path>, options: &ExportOptions) -> i32 {
    match StackupExporter::render_json_file(json, output, options) {
        Ok(html) => {
            println!("HTML visualization generated: {}", html.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn print_report(report: &ExportReport) {
    println!("Stackup exported to: {}", report.paths.json.display());
    println!("HTML visualization generated: {}", report.paths.html.display());

    let doc = &report.document;
    if doc.is_empty() {
        eprintln!("Warning: No stackup information found in PCB file!");
        eprintln!("Define the physical stackup in KiCAD: File > Board Setup > Physical Stackup");
        return;
    }

    println!("\nFound {} layers:", report.layer_count());
    for layer in &doc.layers {
        let layer_type = if layer.layer_type.is_empty() {
            "unknown"
        } else {
            layer.layer_type.as_str()
        };
        if layer.thickness.is_zero() {
            println!("  - {}: {}", layer.name, layer_type);
        } else {
            println!("  - {}: {} ({}mm)", layer.name, layer_type, layer.thickness.mm);
        }
    }
}
