mod error;
mod navigator;
mod prompt;
mod pull;
mod store;

use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use navigator::{HttpConnector, Navigator};
use prompt::Terminal;
use pull::CommandPuller;
use store::RegistryStore;

type NcrResult<T> = Result<T, error::NcrError>;

/// Interactive browser for Docker Registry HTTP API v2 servers
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli
{
    /// Path to the registry store (default: $HOME/.ncregistry/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Container runtime used to pull images
    #[arg(short, long, default_value = "docker")]
    runtime: String,

    /// Request timeout in seconds, 0 waits forever
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// Accept invalid TLS certificates
    #[arg(short, long)]
    insecure: bool,
}

fn main() -> NcrResult<()>
{
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => RegistryStore::default_path()?,
    };
    let mut store = RegistryStore::open(&path)?;
    info!("Using registry store {:?}", store.path());

    let timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));
    let connector = HttpConnector::new(timeout, cli.insecure);
    let puller = CommandPuller::new(cli.runtime);

    Navigator::new(&mut store, Terminal::new(), connector, puller).run()
}
