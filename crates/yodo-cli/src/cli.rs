use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "yodo",
    about = "YODO — You Only Download Once: ephemeral single-download file hosting",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Store a file and print its one-time identifier
    Put(PutArgs),
    /// Retrieve a blob and destroy it
    Get(GetArgs),
    /// Show a blob's metadata without consuming it
    Peek(PeekArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; flags and environment variables override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, env = "YODO_BIND")]
    pub bind: Option<SocketAddr>,
    /// Absolute path of an existing, writable directory
    #[arg(long, env = "STATE_DIRECTORY")]
    pub state_dir: Option<PathBuf>,
    /// Upload limit in bytes; 0 selects the 10 MiB default
    #[arg(long, env = "MAX_CONTENT_LENGTH")]
    pub max_content_length: Option<u64>,
}

#[derive(Args)]
pub struct StoreArgs {
    #[arg(long, env = "STATE_DIRECTORY")]
    pub state_dir: PathBuf,
}

#[derive(Args)]
pub struct PutArgs {
    /// File to upload, or `-` for standard input
    pub path: PathBuf,
    #[command(flatten)]
    pub store: StoreArgs,
    #[arg(long)]
    pub content_type: Option<String>,
    /// Display name; defaults to the file's own name
    #[arg(long)]
    pub filename: Option<String>,
    #[arg(long, env = "MAX_CONTENT_LENGTH")]
    pub max_content_length: Option<u64>,
}

#[derive(Args)]
pub struct GetArgs {
    pub id: String,
    #[command(flatten)]
    pub store: StoreArgs,
    /// Write the payload here instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PeekArgs {
    pub id: String,
    #[command(flatten)]
    pub store: StoreArgs,
}
