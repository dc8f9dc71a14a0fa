//! # Client Binary Entry Point
//!
//! Command-line front end for the steganography workflow. Every hide/extract
//! invocation is one session: probe the service, collect inputs, run, then
//! materialize the result.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin client -- health
//! cargo run --bin client -- hide --technique aes --image cat.png --text HELLO --key s3cret
//! cargo run --bin client -- extract --technique lsb --image cat_LSB_....png --copy
//! ```
//!
//! The service URL comes from `--api-url`, then `STEGO_API_URL`, then the
//! config file, then `http://localhost:5000`.

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{warn, LevelFilter};
use std::path::PathBuf;

use stego_orchestrator::client::{RemoteClient, ReqwestTransport, ServiceStatus};
use stego_orchestrator::common::config::ClientConfig;
use stego_orchestrator::common::logging::init_logger;
use stego_orchestrator::common::messages::Technique;
use stego_orchestrator::workflow::materialize::SystemClipboard;
use stego_orchestrator::workflow::{monitor, CoverImage, Mode, Orchestrator, Phase, Session};

/// Command-line arguments for the client binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Base URL of the steganography service
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the service is reachable
    Health,

    /// List the available techniques
    Techniques,

    /// Hide text inside a cover image
    Hide {
        /// lsb, xor or aes
        #[arg(short, long, default_value = "lsb")]
        technique: Technique,

        /// Cover image
        #[arg(short, long)]
        image: PathBuf,

        /// Secret text to hide
        #[arg(long)]
        text: String,

        /// Encryption key (required for xor and aes)
        #[arg(short, long, default_value = "")]
        key: String,

        /// Where to save the stego image (defaults to output.download_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Extract hidden text from a stego image
    Extract {
        /// lsb, xor or aes
        #[arg(short, long, default_value = "lsb")]
        technique: Technique,

        /// Stego image
        #[arg(short, long)]
        image: PathBuf,

        /// Encryption key (required for xor and aes)
        #[arg(short, long, default_value = "")]
        key: String,

        /// Also copy the text to the clipboard
        #[arg(long)]
        copy: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logger(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let mut config = ClientConfig::load(args.config.as_deref())?;
    if args.api_url.is_some() {
        config = config.with_env_override(args.api_url);
    }

    let client = RemoteClient::new(config.service.clone(), ReqwestTransport::new()?);

    match args.command {
        Command::Techniques => {
            println!("{:<6} {:<10} {:<8} KEY", "NAME", "SECURITY", "SPEED");
            for technique in Technique::ALL {
                println!(
                    "{:<6} {:<10} {:<8} {}",
                    technique.as_str(),
                    technique.security_level().to_string(),
                    technique.speed().to_string(),
                    if technique.requires_key() { "required" } else { "-" }
                );
            }
        }

        Command::Health => match monitor::check(&client).await {
            ServiceStatus::Connected => println!("connected ({})", client.base_url()),
            ServiceStatus::Disconnected => {
                bail!("disconnected: no healthy service at {}", client.base_url())
            }
        },

        Command::Hide {
            technique,
            image,
            text,
            key,
            out_dir,
        } => {
            let orchestrator = Orchestrator::new(client);
            orchestrator.start().await;

            orchestrator.set_mode(Mode::Hide);
            orchestrator.set_technique(technique);
            orchestrator.select_image(CoverImage::open(&image)?);
            orchestrator.set_secret_text(text);
            orchestrator.set_encryption_key(key);

            orchestrator.run().await;
            ensure_success(&orchestrator.session())?;

            let dir = out_dir.unwrap_or_else(|| config.output.download_dir.clone());
            let path = orchestrator.save_stego(&dir, Utc::now())?;
            println!("{}", path.display());
        }

        Command::Extract {
            technique,
            image,
            key,
            copy,
        } => {
            let orchestrator = Orchestrator::new(client);
            orchestrator.start().await;

            orchestrator.set_mode(Mode::Extract);
            orchestrator.set_technique(technique);
            orchestrator.select_image(CoverImage::open(&image)?);
            orchestrator.set_encryption_key(key);

            orchestrator.run().await;
            ensure_success(&orchestrator.session())?;

            if let Some(text) = orchestrator.session().extracted_text() {
                println!("{}", text);
            }

            if copy {
                // The process exits right after, so the clipboard has to be
                // served until another application takes it over.
                let mut clipboard = SystemClipboard::holding();
                let copied =
                    tokio::task::block_in_place(|| orchestrator.copy_extracted(&mut clipboard));
                // Non-fatal: the text was already printed.
                if let Err(e) = copied {
                    warn!("{}", e);
                }
            }
        }
    }

    Ok(())
}

fn ensure_success(session: &Session) -> anyhow::Result<()> {
    if session.phase() != Phase::Success {
        bail!(
            "{}",
            session.error_message().unwrap_or("operation did not complete")
        );
    }
    Ok(())
}
