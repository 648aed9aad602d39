use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prbridge")]
#[command(about = "Send pull request review comments to your local editor", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
    #[arg(long = "server-url", global = true, value_name = "URL")]
    pub(crate) server_url: Option<String>,
    #[arg(long = "print-logs", global = true, default_value_t = false)]
    pub(crate) print_logs: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    #[command(about = "Manage repository to local path mappings")]
    Repo {
        #[command(subcommand)]
        action: RepoCommands,
    },
    #[command(about = "Load a saved review page and list the controls it gets")]
    Scan {
        #[arg(value_name = "HTML")]
        html: PathBuf,
        #[arg(long, value_name = "PAGE_URL")]
        url: String,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    #[command(about = "Load a saved review page and click one of its controls")]
    Click {
        #[arg(value_name = "HTML")]
        html: PathBuf,
        #[arg(long, value_name = "PAGE_URL")]
        url: String,
        #[arg(long, value_name = "N", help = "Control number as listed by `scan`")]
        control: usize,
    },
    #[command(about = "Send a hand-made request to the automation server")]
    Send {
        #[arg(long = "repo-url", value_name = "URL")]
        repo_url: String,
        #[arg(long, value_name = "PATH")]
        file: String,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        snippet: Option<String>,
        #[arg(long, default_value_t = false)]
        execute: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum RepoCommands {
    #[command(about = "List configured mappings")]
    List,
    #[command(about = "Map a remote repository URL to a local checkout")]
    Add {
        #[arg(value_name = "URL")]
        url: String,
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    #[command(about = "Remove mappings for a repository URL")]
    Remove {
        #[arg(value_name = "URL")]
        url: String,
    },
}
