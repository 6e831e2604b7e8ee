use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use huddle_core::{IceServerConfig, RoomId};
use huddle_server::{RejoinPolicy, ServerConfig};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "huddle=info,huddle_server=info";

#[derive(Parser)]
#[command(name = "huddle", version, about = "Room signaling for mesh video calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling coordinator. Flags override HUDDLE_* variables.
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// `reject` or `replace`
        #[arg(long)]
        rejoin_policy: Option<RejoinPolicy>,

        #[arg(long)]
        max_chat_len: Option<usize>,

        /// Directory served under /static (holds the wasm bundle in pkg/)
        #[arg(long)]
        static_dir: Option<PathBuf>,

        #[arg(long, requires_all = ["turn_username", "turn_credential"])]
        turn_url: Option<String>,

        #[arg(long)]
        turn_username: Option<String>,

        #[arg(long)]
        turn_credential: Option<String>,
    },

    /// Print a fresh room identifier.
    Room,

    /// Compile the browser client into <out> with wasm-pack.
    BuildWeb {
        #[arg(long, default_value = "./huddle-wasm")]
        client: String,

        #[arg(short, long, default_value = "./static/pkg")]
        out: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            rejoin_policy,
            max_chat_len,
            static_dir,
            turn_url,
            turn_username,
            turn_credential,
        } => {
            init_tracing();

            let mut config = ServerConfig::from_env();
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(policy) = rejoin_policy {
                config.rejoin_policy = policy;
            }
            if let Some(max) = max_chat_len {
                config.max_chat_len = max;
            }
            if let Some(dir) = static_dir {
                config.static_dir = Some(dir);
            }
            if let (Some(url), Some(username), Some(credential)) =
                (turn_url, turn_username, turn_credential)
            {
                config.ice_servers.push(IceServerConfig {
                    urls: vec![url],
                    username: Some(username),
                    credential: Some(credential),
                });
            }

            println!(
                "{} {}",
                "📡 Huddle listening on".green().bold(),
                format!("http://{}", config.bind_addr).cyan()
            );
            println!(
                "   rejoin: {:?}, ICE servers: {}",
                config.rejoin_policy,
                config.ice_servers.len()
            );
            info!(
                "Starting coordinator on {} (rejoin policy {:?}, max chat length {})",
                config.bind_addr, config.rejoin_policy, config.max_chat_len
            );
            if let Some(dir) = &config.static_dir {
                info!("Serving static files from {}", dir.display());
            }
            huddle_server::serve(config).await?;
            info!("Coordinator stopped");
        }

        Commands::Room => {
            println!("{}", RoomId::generate());
        }

        Commands::BuildWeb { client, out } => {
            println!("{}", "🚀 Building the browser client...".green().bold());

            let out_path = Path::new(&out);
            if out_path.exists() {
                fs::remove_dir_all(out_path)?;
            }
            fs::create_dir_all(out_path)?;

            run_wasm_pack(&client, out_path)?;

            println!("{}", "✨ Build completed successfully!".green().bold());
            println!("   📂 WASM: {}", out_path.display());
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_wasm_pack(client_path: &str, out_dir: &Path) -> Result<()> {
    let out_abs = fs::canonicalize(out_dir).unwrap_or(out_dir.to_path_buf());
    let status = Command::new("wasm-pack")
        .args(["build", "--target", "web", "--out-dir"])
        .arg(out_abs)
        .current_dir(client_path)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .context("Failed to run wasm-pack. Is it installed?")?;

    if !status.success() {
        anyhow::bail!("WASM build failed");
    }
    Ok(())
}
