//! Shoebox CLI: ingest photos from disk and inspect their metadata.
//!
//! Settings come from the environment and a `.env` file (see
//! `IngestConfig::from_env`): DATABASE_URL, ASSETS_DIR, GENERATED_DIR and
//! friends. ENVIRONMENT=production switches logs to JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use shoebox_cli::{init_tracing, IngestReport, InspectReport};
use shoebox_core::IngestConfig;
use shoebox_ingest::{AssetIngestor, UploadFile, UploadTarget};

#[derive(Parser)]
#[command(name = "shoebox", about = "Shoebox photo library tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest files, each as its own photo
    Ingest {
        /// Owning user id
        #[arg(long)]
        owner: i64,
        /// Also add every photo to this album
        #[arg(long)]
        album: Option<i64>,
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the capture metadata of a file without storing it
    Inspect {
        /// Path to the file
        file: PathBuf,
    },
    /// Album operations
    Album {
        #[command(subcommand)]
        sub: AlbumCommands,
    },
}

#[derive(Subcommand)]
enum AlbumCommands {
    /// Create a new album
    Create {
        /// Owning user id
        #[arg(long)]
        owner: i64,
        /// Album name
        name: String,
        /// URL slug, unique across albums
        #[arg(long)]
        slug: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = IngestConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.is_production());

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            owner,
            album,
            files,
        } => {
            let ingestor = AssetIngestor::from_config(config).await?;
            let target = album.map_or(UploadTarget::Library, UploadTarget::Album);

            let mut failed = 0usize;
            for path in &files {
                let result = match UploadFile::from_path(path).await {
                    Ok(file) => ingestor.upload(Some(owner), target, file).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(outcome) => {
                        if let Some(report) =
                            IngestReport::new(path.display().to_string(), outcome)
                        {
                            print_json(&report)?;
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::error!(file = %path.display(), error = %e, "Ingest failed");
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{} of {} files failed to ingest", failed, files.len());
            }
        }
        Commands::Inspect { file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            print_json(&InspectReport::from_bytes(&filename, &data))?;
        }
        Commands::Album { sub } => match sub {
            AlbumCommands::Create { owner, name, slug } => {
                let ingestor = AssetIngestor::from_config(config).await?;
                let album = ingestor.albums().create(owner, &name, &slug).await?;
                print_json(&album)?;
            }
        },
    }

    Ok(())
}
