use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lanshare",
    about = "LanShare: share files, videos and messages on the local network",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "lanshare.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Print the share URL and storage layout
    Info,
    /// Show or initialize the configuration file
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
    /// Override the configured data directory
    #[arg(short, long)]
    pub data_root: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration, replacing any existing file
    Init {
        #[arg(long)]
        force: bool,
    },
}
