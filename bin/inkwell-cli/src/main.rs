//! Inkwell CLI - signed attachment uploads from the command line
//!
//! Storage settings come from `--config` (TOML) and `AWS_*` environment
//! variables.

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::Utc;
use clap::{Parser, Subcommand};
use inkwell_auth::SigningTime;
use inkwell_client::{FileUpload, UploadClient};
use inkwell_common::{ObjectKey, StorageConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "inkwell-cli")]
#[command(about = "Inkwell attachment upload tool")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML); AWS_* environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an object key for a user's file
    Key {
        /// Owner of the file
        #[arg(short, long)]
        user_id: String,
        /// Original file name
        #[arg(short, long)]
        file_name: String,
    },
    /// Sign a PUT without sending it and print the URL and headers
    Sign {
        /// Object key to upload to
        #[arg(short, long)]
        key: String,
        /// File whose contents form the body
        #[arg(short, long)]
        file: PathBuf,
        /// Content type of the body
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
        /// Signing time as YYYYMMDDTHHMMSSZ (defaults to now)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Upload a file and print its metadata record
    Upload {
        /// Owner of the file
        #[arg(short, long)]
        user_id: String,
        /// File to upload
        #[arg(short, long)]
        file: PathBuf,
        /// Content type of the file
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Commands::Key { user_id, file_name } => {
            let key = ObjectKey::generate(&user_id, &file_name, Utc::now())?;
            println!("{key}");
        }
        Commands::Sign {
            key,
            file,
            content_type,
            timestamp,
        } => {
            let client = connect(args.config.as_deref())?;
            let key = ObjectKey::new(key)?;
            let body = read_file(&file).await?;
            let time = match timestamp {
                Some(ts) => SigningTime::parse(&ts)?,
                None => SigningTime::now(),
            };

            let prepared = client.prepare(&key, &content_type, &body, &time)?;
            let mut headers = serde_json::json!({
                "Content-Type": prepared.headers.content_type,
                "x-amz-date": prepared.headers.amz_date,
                "Authorization": prepared.headers.authorization,
            });
            if let Some(token) = prepared.headers.security_token {
                headers["x-amz-security-token"] = serde_json::Value::String(token);
            }
            let output = serde_json::json!({
                "method": "PUT",
                "url": prepared.url,
                "headers": headers,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Upload {
            user_id,
            file,
            content_type,
        } => {
            let client = connect(args.config.as_deref())?;
            let body = read_file(&file).await?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("not a file name: {}", file.display()))?
                .to_string();

            info!("Uploading {} ({} bytes)", file.display(), body.len());
            let record = client
                .upload(FileUpload {
                    user_id,
                    file_name,
                    content_type,
                    body,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

fn connect(config_path: Option<&Path>) -> Result<UploadClient> {
    let config = StorageConfig::load(config_path).context("failed to load storage config")?;
    info!("Bucket: {} ({})", config.bucket, config.region);
    Ok(UploadClient::new(config)?)
}

async fn read_file(path: &Path) -> Result<Bytes> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Bytes::from(data))
}
