use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use jrnl_sdk::Backend;
use jrnl_types::{Address, Cluster, Identity};

#[derive(Parser)]
#[command(name = "jrnl", about = "Journal entries on a ledger program", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub cluster: Option<Cluster>,

    /// Ledger node URL; implies the remote backend
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[arg(long, global = true)]
    pub backend: Option<BackendArg>,

    /// Signing key file written by `jrnl keygen`
    #[arg(short, long, global = true)]
    pub keypair: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendArg {
    Simulated,
    Remote,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Simulated => Backend::Simulated,
            BackendArg::Remote => Backend::Remote,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a signing key
    Keygen(KeygenArgs),
    /// Show the address an entry title maps to
    Derive(DeriveArgs),
    /// Create a new entry
    Create(WriteArgs),
    /// Replace the message of an entry
    Update(WriteArgs),
    /// Delete an entry
    Delete(DeleteArgs),
    /// Show one entry
    Get(GetArgs),
    /// List every entry of the program
    List,
    /// Check that the journal program is deployed on the cluster
    Program,
    /// Print the effective configuration
    Config,
    /// Run a ledger node
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Where to write the key
    #[arg(short, long)]
    pub out: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct DeriveArgs {
    pub title: String,
    /// Owner identity (hex); defaults to the keypair's identity
    #[arg(long)]
    pub owner: Option<Identity>,
}

#[derive(Args)]
pub struct WriteArgs {
    pub title: String,
    pub message: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub title: String,
}

#[derive(Args)]
pub struct GetArgs {
    /// Entry address (hex)
    #[arg(required_unless_present = "title", conflicts_with = "title")]
    pub address: Option<Address>,
    /// Look the entry up by title under the keypair's identity
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Server configuration file (TOML)
    #[arg(long)]
    pub node_config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<std::net::SocketAddr>,
    /// Deploy programs with the sample entries
    #[arg(long)]
    pub seed_samples: bool,
}
