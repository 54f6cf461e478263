//! # Firmware Encryption Tool
//!
//! Encrypts a firmware image offline with the node's key, producing the same
//! `IV || ciphertext` artifact the node stores on upload.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use energy_node::config::Config;
use energy_node::ota::cipher::FirmwareCipher;

#[derive(Debug, Parser)]
#[command(version, about = "Encrypt a firmware image for OTA upload")]
struct Cli {
    /// Plain firmware image
    input: PathBuf,

    /// Destination of the encrypted artifact
    output: PathBuf,

    /// Node configuration supplying the key (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let cipher = FirmwareCipher::new(&config.ota.key_bytes()?).context("invalid firmware key")?;

    let firmware = fs::read(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let artifact = cipher.encrypt(&firmware);
    fs::write(&cli.output, &artifact)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    info!(
        "Encrypted {} ({} bytes) -> {} ({} bytes)",
        cli.input.display(),
        firmware.len(),
        cli.output.display(),
        artifact.len()
    );
    Ok(())
}
