//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "shopassist")]
#[command(about = "Room-aware product recommendations for the Online Boutique catalog")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory holding `<secret-name>.json` files, used when the secret is not in the environment
    #[arg(long, global = true)]
    pub secrets_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the recommendation HTTP server
    Serve {
        /// Host to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable permissive CORS
        #[arg(long)]
        cors: bool,
    },
    /// Run one recommendation and print it
    Ask {
        /// What the shopper is looking for
        message: String,
        /// Room photo to describe
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Print the full trace of pipeline states
        #[arg(long)]
        trace: bool,
    },
    /// Show current configuration (secrets masked)
    Config,
}
