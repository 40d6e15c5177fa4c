use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

mod config;
use config::FetchOptions;

mod downloader;
use downloader::{StatusLog, fetch_all, plan};
use error::DownloadError;

mod error;
mod logging;
mod utils;

#[derive(Parser)]
#[command(name = "offline-fetch")]
#[command(about = "Fetches the package resources of an offline installer bundle")]
#[command(version)]
struct Cli {
    #[arg(short, long, global = true, help = "Debug logging on stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Locations {
    #[arg(short, long, env = "OFFLINE_FETCH_MANIFEST", help = "Manifest of resource URLs")]
    manifest: PathBuf,
    #[arg(short, long, env = "OFFLINE_FETCH_DEST", help = "Directory to download into")]
    dest: PathBuf,
    #[arg(
        short,
        long,
        env = "OFFLINE_FETCH_LOCAL",
        help = "Directory of packages already available (defaults to --dest)"
    )]
    local: Option<PathBuf>,
}

impl Locations {
    fn local_dir(&self) -> &Path {
        self.local.as_deref().unwrap_or(&self.dest)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Download every manifest entry that is not available locally
    Fetch {
        #[command(flatten)]
        locations: Locations,
        #[command(flatten)]
        options: FetchOptions,
    },
    /// Show what `fetch` would download
    Plan {
        #[command(flatten)]
        locations: Locations,
        #[arg(long, help = "Print the plan as JSON")]
        json: bool,
    },
}

async fn run(command: Commands) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match command {
        Commands::Fetch { locations, options } => {
            let fetcher = options.build_fetcher()?;
            fetch_all(
                &locations.manifest,
                &locations.dest,
                locations.local_dir(),
                options.concurrency,
                fetcher,
                Arc::new(StatusLog::stdout()),
            )
            .await?;
        }
        Commands::Plan { locations, json } => {
            let items = plan(&locations.manifest, &locations.dest, locations.local_dir())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    println!("{} -> {}", item.url, item.destination.display());
                }
                println!("{} download(s) planned", items.len());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let Some(command) = cli.command else {
        println!("Use --help for available commands");
        return ExitCode::SUCCESS;
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "offline-fetch failed");
            eprintln!("Error: {err}");
            if let Some(DownloadError::Batch(batch)) = err.downcast_ref::<DownloadError>() {
                for failure in batch.failures.errors() {
                    eprintln!("  failed: {failure}");
                }
            }
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
