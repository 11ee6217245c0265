//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// podpatch - patch and update container images
///
/// Classifies images by the package manager they ship, runs the
/// matching update inside a container and commits the result as a
/// new image.
#[derive(Parser, Debug)]
#[command(name = "podpatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PODPATCH_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List pending updates for an image
    #[command(name = "list-updates")]
    ListUpdates(ListUpdatesArgs),

    /// Apply every pending update and commit the result
    Update(UpdateArgs),

    /// Apply security updates only and commit the result
    Patch(UpdateArgs),

    /// List images already patched or updated through podpatch
    Ps,

    /// Inspect or empty the classification cache
    Cache(CacheArgs),
}

/// Arguments for the list-updates command
#[derive(Parser, Debug)]
pub struct ListUpdatesArgs {
    /// Image to inspect (name, name:tag or ID)
    pub image: String,

    /// List security updates only
    #[arg(long)]
    pub security: bool,

    /// Machine-readable output
    #[arg(long)]
    pub machine: bool,
}

/// Arguments for the update and patch commands
#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Image to update (name, name:tag or ID)
    pub image: String,

    /// Name for the resulting image, repo[:tag]
    pub new_image: String,

    /// Author recorded on the committed image
    #[arg(long)]
    pub author: Option<String>,

    /// Commit message for the committed image
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print the cache file location
    Path,

    /// Print the cache contents
    Show,

    /// Empty the cache
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_args_parse() {
        let cli = Cli::parse_from(["podpatch", "update", "app:1.0", "app:1.1", "-m", "patched"]);
        match cli.command {
            Commands::Update(args) => {
                assert_eq!(args.image, "app:1.0");
                assert_eq!(args.new_image, "app:1.1");
                assert_eq!(args.message.as_deref(), Some("patched"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn verbosity_accumulates() {
        let cli = Cli::parse_from(["podpatch", "-vv", "ps"]);
        assert_eq!(cli.verbose, 2);
    }
}
