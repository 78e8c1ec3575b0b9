mod commands;
mod progress;

use clap::{Args, Parser, Subcommand};
use infradoc_config::Settings;
use infradoc_core::{DocumentKind, Language};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "infradoc")]
#[command(
    about = "Collect OCI infrastructure inventories and turn them into documents",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Scope of a collection
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Region name (e.g. sa-saopaulo-1)
    #[arg(short, long)]
    pub region: String,
    /// Document kind: new_host, full_infra or kubernetes
    #[arg(short, long)]
    pub kind: DocumentKind,
    /// Compartment OCID
    #[arg(short, long)]
    pub compartment: String,
    /// Instance OCID (repeatable, required for new_host)
    #[arg(short, long = "instance")]
    pub instances: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available regions
    Regions,
    /// List the compartment tree of a region
    Compartments {
        /// Region name
        region: String,
        /// Show only names containing this text (and their parents)
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// List running and stopped instances of a compartment
    Instances {
        /// Region name
        region: String,
        /// Compartment OCID
        compartment: String,
        /// Show only names containing this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Run a collection task and write the resolved snapshot as JSON
    Collect {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a collection task and generate the document
    Export {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Person responsible for the document
        #[arg(long)]
        responsible: String,
        /// Document language (pt, en); defaults to the saved preference
        #[arg(long)]
        lang: Option<Language>,
        /// Architecture drawing to embed (repeatable)
        #[arg(long)]
        architecture: Vec<PathBuf>,
        /// Antivirus screenshot to embed (repeatable)
        #[arg(long)]
        antivirus: Vec<PathBuf>,
        /// Directory to write the document to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Show or save the preferred document language
    Lang {
        /// Language code to save (pt, en)
        code: Option<String>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("infradoc {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = Settings::load()?;
    tracing::debug!("Using inventory service at {}", settings.api_url);

    match cli.command {
        Commands::Regions => commands::options::handle_regions(&settings).await?,
        Commands::Compartments { region, filter } => {
            commands::options::handle_compartments(&settings, &region, filter.as_deref()).await?
        }
        Commands::Instances {
            region,
            compartment,
            filter,
        } => {
            commands::options::handle_instances(&settings, &region, &compartment, filter.as_deref())
                .await?
        }
        Commands::Collect { scope, output } => {
            commands::collect::handle(&settings, &scope, output.as_deref()).await?
        }
        Commands::Export {
            scope,
            responsible,
            lang,
            architecture,
            antivirus,
            output_dir,
        } => {
            let request = commands::export::ExportArgs {
                responsible,
                language: lang,
                architecture,
                antivirus,
                output_dir,
            };
            commands::export::handle(&settings, &scope, request).await?
        }
        Commands::Lang { code } => commands::lang::handle(&settings, code.as_deref())?,
        Commands::Version => {}
    }

    Ok(())
}
