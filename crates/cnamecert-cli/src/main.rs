//! cnamecert - rotate TLS certificates bound to OSS bucket custom domains

mod config;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use cnamecert_oss::{Credentials, OssClient, OssConfig};
use cnamecert_rotate::{rotate_domain, ControlPlane, RotationOutcome};

use config::{CredentialsConfig, DomainEntry, RotationConfig};

/// Rotate TLS certificates bound to OSS bucket custom domains
#[derive(Parser, Debug)]
#[command(name = "cnamecert")]
#[command(about = "Rotate TLS certificates bound to OSS bucket custom domains", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "cnamecert.yml", env = "CNAMECERT_CONFIG")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rotate certificates for every configured domain
    Rotate,
    /// Show current custom-domain bindings for every configured bucket
    List,
    /// Write a template configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&cli.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tokio::select! {
        result = run(&cli) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, exiting");
            Ok(())
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Init => init_config(&cli.config),
        Commands::Rotate => {
            let config = RotationConfig::load(&cli.config)?;
            rotate_all(&config).await
        }
        Commands::List => {
            let config = RotationConfig::load(&cli.config)?;
            list_all(&config).await
        }
    }
}

/// Process every configured entry sequentially; the first fatal failure
/// stops the run
async fn rotate_all(config: &RotationConfig) -> Result<()> {
    for entry in &config.domains {
        info!(
            domain = %entry.domain,
            bucket = %entry.bucket,
            "processing domain entry"
        );

        let client = client_for(entry, &config.credentials)?;
        let (private_key, certificate) = entry.read_material()?;

        let outcome = rotate_domain(&client, &entry.domain, &private_key, &certificate, Utc::now())
            .await
            .with_context(|| format!("Rotation failed for domain '{}'", entry.domain))?;

        match outcome {
            RotationOutcome::Replaced => {
                info!(domain = %entry.domain, "bound a fresh certificate")
            }
            RotationOutcome::Rotated { previous_cert_id } => {
                info!(
                    domain = %entry.domain,
                    %previous_cert_id,
                    "rotated certificate in place"
                )
            }
        }
    }

    info!("All domain entries processed");
    Ok(())
}

/// Print current bindings per bucket, with certificate id and expiry
async fn list_all(config: &RotationConfig) -> Result<()> {
    for entry in &config.domains {
        let client = client_for(entry, &config.credentials)?;
        let bindings = client
            .list_domain_bindings()
            .await
            .with_context(|| format!("Failed to list bindings for bucket '{}'", entry.bucket))?;

        println!("{} ({})", entry.bucket, entry.endpoint);
        if bindings.is_empty() {
            println!("  (no custom domain bindings)");
        }
        for binding in bindings {
            let last_modified = binding
                .last_modified
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());

            match &binding.certificate {
                Some(certificate) => println!(
                    "  {}  cert {}  expires {}  modified {}",
                    binding.domain, certificate.cert_id, certificate.valid_end_date, last_modified
                ),
                None => println!("  {}  (no certificate)", binding.domain),
            }
        }
    }

    Ok(())
}

fn client_for(entry: &DomainEntry, credentials: &CredentialsConfig) -> Result<OssClient> {
    OssClient::new(OssConfig {
        endpoint: entry.endpoint.clone(),
        bucket: entry.bucket.clone(),
        region: entry.region.clone(),
        credentials: Credentials {
            access_key_id: credentials.access_key_id.clone(),
            access_key_secret: credentials.access_key_secret.clone(),
        },
    })
    .with_context(|| format!("Failed to create client for bucket '{}'", entry.bucket))
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {:?}", path);
    }
    std::fs::write(path, RotationConfig::template())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    println!("Wrote template config to {:?}", path);
    Ok(())
}
