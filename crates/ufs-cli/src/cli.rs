use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ufs",
    about = "UUID file service: fetch file metadata and contents by UUID",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Transport used to reach the server
    #[arg(long, global = true, default_value = "stream")]
    pub backend: BackendArg,

    /// host:port of the streaming server
    #[arg(long, global = true, default_value = "localhost:50051")]
    pub server: String,

    /// Base URL of the HTTP server
    #[arg(long, global = true, default_value = "http://localhost/")]
    pub base_url: String,

    /// Output destination; `-` is stdout
    #[arg(short, long, global = true, default_value = "-")]
    pub output: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendArg {
    Rest,
    Stream,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print name, size, MIME type and creation time of a file
    Stat(IdArgs),
    /// Copy the contents of a file to the output
    Read(IdArgs),
    /// Run the file server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct IdArgs {
    pub uuid: String,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub http_addr: Option<SocketAddr>,
    #[arg(long)]
    pub stream_addr: Option<SocketAddr>,
    #[arg(long)]
    pub metadata_file: Option<PathBuf>,
}
