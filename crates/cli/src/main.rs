mod commands;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labcg_core::{
    load_config, load_config_from_env, validate_config, Config, FileSessionStore, SessionStore,
};

/// Default config file, used when present.
const DEFAULT_CONFIG: &str = "labcg.toml";

#[derive(Parser, Debug)]
#[command(author, version, about = "Submit text-to-3D and image-to-3D generation jobs")]
struct Args {
    /// Configuration file (missing file falls back to defaults and environment)
    #[arg(long, env = "LABCG_CONFIG", value_name = "PATH", default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store the API key used for every backend call
    Login {
        #[arg(long, env = "LABCG_API_KEY", hide_env_values = true)]
        api_key: String,
    },
    /// Forget the API key and all other session state
    Logout,
    /// Start a text-to-3D job
    Text {
        /// Description of the object to generate
        prompt: String,
        #[arg(long, default_value_t = 1000)]
        steps: u32,
        #[arg(long, default_value_t = 100.0)]
        guidance: f64,
        #[arg(long, default_value_t = 0)]
        seed: i64,
    },
    /// Upload a reference image and start an image-to-3D job
    Image {
        /// PNG or JPEG file
        path: PathBuf,
        #[arg(long, default_value_t = 1024)]
        texture_resolution: u32,
        #[arg(long, default_value = "triangle")]
        remesh: String,
    },
    /// Show a job
    Status { job_id: String },
    /// Print a temporary download link for a finished job
    Download { job_id: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,labcg_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load(&args.config)?;

    let store: Arc<dyn SessionStore> = Arc::new(
        FileSessionStore::open(&config.session.path).with_context(|| {
            format!("Failed to open session file {:?}", config.session.path)
        })?,
    );

    match args.command {
        Command::Login { api_key } => commands::login(&config, store.as_ref(), &api_key),
        Command::Logout => commands::logout(store.as_ref()),
        Command::Text {
            prompt,
            steps,
            guidance,
            seed,
        } => {
            let ctx = commands::Client::new(config, store)?;
            let result = ctx.submit_text(prompt, steps, guidance, seed).await;
            ctx.finish(result)
        }
        Command::Image {
            path,
            texture_resolution,
            remesh,
        } => {
            let ctx = commands::Client::new(config, store)?;
            let result = ctx.submit_image(&path, texture_resolution, remesh).await;
            ctx.finish(result)
        }
        Command::Status { job_id } => {
            let ctx = commands::Client::new(config, store)?;
            let result = ctx.status(&job_id).await;
            ctx.finish(result)
        }
        Command::Download { job_id } => {
            let ctx = commands::Client::new(config, store)?;
            let result = ctx.download(&job_id).await;
            ctx.finish(result)
        }
    }
}

/// Load and validate configuration. A missing file is not an error.
fn load(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        debug!("Loading configuration from {:?}", path);
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
    } else {
        debug!("No config file at {:?}, using defaults and environment", path);
        load_config_from_env().context("Failed to load config from environment")?
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}
