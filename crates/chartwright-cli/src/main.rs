//! Chartwright CLI - generate Helm charts from plain Kubernetes manifests

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use commands::generate::GenerateOptions;

#[derive(Parser)]
#[command(name = "chartwright")]
#[command(author = "Chartwright Contributors")]
#[command(version)]
#[command(about = "Generate Helm charts from plain Kubernetes manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a chart from manifest files
    Generate {
        /// Manifest files to read (`-` for stdin)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Chart name, used in helper references
        #[arg(short = 'n', long, env = "CHARTWRIGHT_CHART_NAME")]
        chart_name: String,

        /// Output chart directory
        #[arg(short, long, env = "CHARTWRIGHT_OUTPUT")]
        output: PathBuf,

        /// Name prefix shared by all resources (detected when omitted)
        #[arg(long, env = "CHARTWRIGHT_PREFIX")]
        prefix: Option<String>,

        /// Keep metadata.namespace in generated templates
        #[arg(long, env = "CHARTWRIGHT_PRESERVE_NAMESPACE")]
        preserve_namespace: bool,

        /// Overwrite an existing output directory, replacing its templates
        #[arg(long)]
        force: bool,

        /// Show what would be generated without writing files
        #[arg(long)]
        dry_run: bool,

        /// Render generated templates with the default values
        #[arg(long)]
        preview: bool,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Generate {
            inputs,
            chart_name,
            output,
            prefix,
            preserve_namespace,
            force,
            dry_run,
            preview,
        } => commands::generate::run(&GenerateOptions {
            inputs: &inputs,
            chart_name: &chart_name,
            output: &output,
            prefix: prefix.as_deref(),
            preserve_namespace,
            force,
            dry_run,
            preview,
        }),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
