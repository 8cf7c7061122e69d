//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--pool <path>` / `-p`: Pool directory (env `DVOL_POOL`)
//! - `--disable-docker-integration`: Never stop or start containers
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output; prompts are not shown

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::paths::DEFAULT_POOL;

/// dvol - version control for Docker volumes
#[derive(Parser, Debug)]
#[command(name = "dvol")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pool directory holding all volumes
    #[arg(
        short,
        long,
        global = true,
        env = "DVOL_POOL",
        default_value = DEFAULT_POOL,
        value_name = "PATH"
    )]
    pub pool: PathBuf,

    /// Do not stop or start containers around snapshot operations
    #[arg(long, global = true)]
    pub disable_docker_integration: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; destructive commands then need --force
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Whether confirmation prompts may be shown.
    pub fn interactive(&self) -> bool {
        !self.quiet
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    // ========== Volumes ==========
    /// List all volumes
    #[command(
        name = "list",
        visible_alias = "ls",
        long_about = "List every volume in the pool.\n\n\
            Shows each volume's active branch and the running containers that use it. \
            The active volume is marked with an asterisk (*).",
        after_help = "\
WORKFLOW EXAMPLES:
    # See all volumes
    dvol list

    # Same, shorter
    dvol ls"
    )]
    List,

    /// Create a new volume
    #[command(
        name = "init",
        long_about = "Create a new volume with an empty master branch.\n\n\
            The new volume becomes the active volume. Names must start with a letter \
            and contain only letters, digits, '-' and '_'.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Create a volume and use it from a container
    dvol init mysql
    docker run -v mysql:/var/lib/mysql --volume-driver=dvol mysql"
    )]
    Init {
        /// Name of the volume to create
        name: String,
    },

    /// Make a volume the active volume
    #[command(
        name = "switch",
        long_about = "Make an existing volume the active volume.\n\n\
            Commands that act on a volume use the active one."
    )]
    Switch {
        /// Volume to switch to
        name: String,
    },

    /// Delete a volume and all its history
    #[command(
        name = "rm",
        long_about = "Delete a volume with all its branches and commits.\n\n\
            Refused while a running container uses the volume. Asks for confirmation \
            unless --force is given.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Delete after confirming
    dvol rm scratch

    # Delete without asking (scripts)
    dvol rm -f scratch"
    )]
    Rm {
        /// Volume to delete
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },

    // ========== History ==========
    /// Snapshot the active branch
    #[command(
        name = "commit",
        long_about = "Record a snapshot of the active branch of the active volume.\n\n\
            Running containers using the volume are stopped for the copy and \
            started again afterwards.",
        after_help = "\
WORKFLOW EXAMPLES:
    dvol commit -m \"empty database\""
    )]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show the commits of the active branch
    #[command(
        name = "log",
        long_about = "Show the commits of the active branch, newest first."
    )]
    Log {
        /// Print the raw commit list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Roll the active branch back to a commit
    #[command(
        name = "reset",
        long_about = "Replace the active branch's data with a commit's snapshot.\n\n\
            Commits after the target are dropped from the branch. A reference is \
            either a commit id or HEAD followed by carets: HEAD is the last commit, \
            HEAD^ the one before it, and so on. --hard is required because \
            uncommitted data is lost.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Throw away uncommitted changes
    dvol reset --hard HEAD

    # Go back two commits
    dvol reset --hard HEAD^^"
    )]
    Reset {
        /// Commit id or HEAD^... reference
        reference: String,

        /// Confirm that uncommitted data will be lost
        #[arg(long)]
        hard: bool,
    },

    // ========== Branches ==========
    /// List or delete branches
    #[command(
        name = "branch",
        long_about = "List the branches of the active volume, or delete one with -d.\n\n\
            The active branch is marked with an asterisk (*). Deleting a branch also \
            deletes commits no other branch lists.",
        after_help = "\
WORKFLOW EXAMPLES:
    dvol branch
    dvol branch -d experiment"
    )]
    Branch {
        /// Branch to delete
        #[arg(short = 'd', long = "delete", value_name = "BRANCH")]
        delete: Option<String>,

        /// Do not ask for confirmation when deleting
        #[arg(short, long, requires = "delete")]
        force: bool,
    },

    /// Switch branches, or create one with -b
    #[command(
        name = "checkout",
        long_about = "Make a branch the active branch of the active volume.\n\n\
            With -b, create the branch from the current branch's last commit first. \
            Uncommitted changes are not carried over.",
        after_help = "\
WORKFLOW EXAMPLES:
    dvol commit -m \"before migration\"
    dvol checkout -b migration
    dvol checkout master"
    )]
    Checkout {
        /// Branch to check out
        branch: String,

        /// Create the branch
        #[arg(short = 'b')]
        create: bool,
    },

    // ========== Configuration ==========
    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "Read or change the pool configuration.\n\n\
            Keys: user.name, user.email, docker.integration, docker.stop_retries, \
            docker.driver."
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for dvol commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    dvol completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    dvol completion zsh >> ~/.zshrc

    # Fish
    dvol completion fish > ~/.config/fish/completions/dvol.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
