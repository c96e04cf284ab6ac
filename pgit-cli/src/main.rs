use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use commands::{
    branch, cat_file, checkout, commit, hash_object, init, log, read_tree, reset, show, status,
    tag, write_tree,
};

#[derive(Parser)]
#[command(name = "pgit")]
#[command(version, about = "A minimal content-addressed version control tool", long_about = None)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository
    Init {
        /// Directory to initialize (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Store a file as a blob and print its id
    HashObject {
        /// File to store
        file: PathBuf,
    },

    /// Print the payload of an object
    CatFile {
        /// Object id, abbreviated id, branch, tag or HEAD
        object: String,

        /// Print the object kind instead of its payload
        #[arg(short = 't')]
        kind: bool,
    },

    /// Store a directory as a tree and print its id
    WriteTree {
        /// Directory to store (defaults to the working directory)
        path: Option<PathBuf>,
    },

    /// Replace the working directory with the contents of a tree
    ReadTree {
        /// Tree id
        tree: String,
    },

    /// Record the working directory as a new commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show commit history
    Log {
        /// Revision to start from (defaults to HEAD)
        rev: Option<String>,

        /// Number of commits to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print commits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Switch to a branch, or detach HEAD at any other revision
    Checkout {
        /// Branch name, tag or commit id
        target: String,
    },

    /// List branches, or create one
    Branch {
        /// Name of the branch to create
        name: Option<String>,

        /// Where the new branch starts (defaults to HEAD)
        start: Option<String>,
    },

    /// List tags, or create one
    Tag {
        /// Name of the tag to create
        name: Option<String>,

        /// Revision to tag (defaults to HEAD)
        rev: Option<String>,
    },

    /// Show the current branch and uncommitted changes
    Status {
        /// Print status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move the current branch to a revision, keeping the working directory
    Reset {
        /// Revision to move to
        rev: String,
    },

    /// Show a commit and the changes it introduced
    Show {
        /// Revision to show (defaults to HEAD)
        rev: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base = commands::base_dir(cli.dir)?;

    match cli.command {
        Commands::Init { path } => {
            init::run(&base, path)?;
        }
        Commands::HashObject { file } => {
            hash_object::run(&base, file)?;
        }
        Commands::CatFile { object, kind } => {
            cat_file::run(&base, &object, kind)?;
        }
        Commands::WriteTree { path } => {
            write_tree::run(&base, path)?;
        }
        Commands::ReadTree { tree } => {
            read_tree::run(&base, &tree)?;
        }
        Commands::Commit { message } => {
            commit::run(&base, &message)?;
        }
        Commands::Log { rev, limit, json } => {
            log::run(&base, rev.as_deref(), limit, json)?;
        }
        Commands::Checkout { target } => {
            checkout::run(&base, &target)?;
        }
        Commands::Branch { name, start } => {
            branch::run(&base, name.as_deref(), start.as_deref())?;
        }
        Commands::Tag { name, rev } => {
            tag::run(&base, name.as_deref(), rev.as_deref())?;
        }
        Commands::Status { json } => {
            status::run(&base, json)?;
        }
        Commands::Reset { rev } => {
            reset::run(&base, &rev)?;
        }
        Commands::Show { rev } => {
            show::run(&base, rev.as_deref())?;
        }
    }

    Ok(())
}
