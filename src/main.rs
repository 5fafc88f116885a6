#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::{path::PathBuf, sync::Arc};

#[cfg(feature = "std")]
use battleship_server::{
    init_logging, FileStore, GameServer, MemoryStore, ServerConfig, SessionStore, BOARD_SIZE,
};
#[cfg(feature = "std")]
use clap::{Parser, Subcommand};
#[cfg(feature = "std")]
use tokio::net::TcpListener;
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[cfg(feature = "std")]
enum Commands {
    /// Host two-player games for clients connecting over TCP.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, default_value_t = BOARD_SIZE)]
        board_size: usize,
        #[arg(long, default_value_t = 30, help = "Seconds a player has to make a move")]
        turn_timeout: u64,
        #[arg(long, help = "Persist games in this directory instead of memory")]
        data_dir: Option<PathBuf>,
        #[arg(long, help = "Fix RNG seed for reproducible automatic placement (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            board_size,
            turn_timeout,
            data_dir,
            seed,
        } => {
            let config = ServerConfig {
                bind,
                board_size,
                turn_timeout: Duration::from_secs(turn_timeout),
                data_dir,
                seed,
                ..ServerConfig::default()
            };
            config.validate()?;

            let store: Arc<dyn SessionStore> = match &config.data_dir {
                Some(dir) => {
                    log::info!("storing games in {}", dir.display());
                    Arc::new(FileStore::open(dir, config.board_size).await?)
                }
                None => Arc::new(MemoryStore::new(config.board_size)),
            };
            if let Some(s) = config.seed {
                log::info!("using fixed seed: {} (placements will be reproducible)", s);
            }

            let listener = TcpListener::bind(&config.bind).await?;
            log::info!("listening on {}", listener.local_addr()?);
            let server = Arc::new(GameServer::new(config, store));
            server.serve(listener).await?;
        }
    }
    Ok(())
}
