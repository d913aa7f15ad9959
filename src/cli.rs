use crate::project::{ModalityPolicy, ScriptVariant};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// BSL Clippy CLI options.
#[derive(Debug, Parser)]
#[command(
    name = "bsl-clippy",
    version,
    about = "Lint BSL modules for modality, safe mode and extension compatibility",
    args_conflicts_with_subcommands = true,
    subcommand_precedence_over_arg = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub lint: LintArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lint module snapshots in files or directories.
    Lint(LintArgs),

    /// List available lints.
    ListRules,

    /// Explain a lint.
    Explain {
        /// Lint rule name.
        rule: String,
    },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LintArgs {
    /// JSON module snapshots, or directories containing them.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Base configuration snapshots extended by the linted modules.
    #[arg(long, value_name = "PATH")]
    pub base: Vec<PathBuf>,

    /// Path to a `bsl-clippy.toml` (otherwise discovered upwards).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Spelling used for rewritten identifiers.
    #[arg(long, value_enum)]
    pub variant: Option<ScriptVariant>,

    /// Modality policy of the configuration.
    #[arg(long, value_enum)]
    pub modality: Option<ModalityPolicy>,

    /// Treat the modules as a configuration extension.
    #[arg(long)]
    pub extension: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Only run these lints (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these lints (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Exit with code 1 if any diagnostics are emitted.
    #[arg(long)]
    pub deny_warnings: bool,

    /// Write the fixed text of each module to `<snapshot>.bsl`.
    #[arg(long)]
    pub fix: bool,

    /// Also apply fixes that may change code structure.
    #[arg(long, requires = "fix")]
    pub unsafe_fixes: bool,

    /// Print the changes `--fix` would make instead of writing them.
    #[arg(long, requires = "fix")]
    pub diff: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Github,
}
