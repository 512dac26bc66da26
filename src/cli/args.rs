//! CLI argument definitions using clap

use clap::{Parser, Subcommand};

/// Browse, crawl and replay curated awesome lists
#[derive(Parser, Debug)]
#[command(name = "awesome")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Print the picked repo without opening it
    #[arg(long, global = true, env = "AWESOME_NO_BROWSER")]
    pub no_browser: bool,

    /// Without a subcommand: walk the lists interactively
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Go to a random repo
    Random,

    /// Go to a random repo among your previous choices
    Surprise,

    /// Show your previous choices
    Profile,

    /// Forget your previous choices
    Reset,

    /// Download all reachable lists to the cache
    Cache,

    /// Show the cached tree
    Tree {
        /// Levels to expand below the root
        #[arg(short, long, default_value_t = 2)]
        levels: usize,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file location
    Path,
    /// Create the global config file from a template
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
