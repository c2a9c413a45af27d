use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use docrelate::config::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "docrelate",
    about = "Precompute related-document links for a markdown site"
)]
pub struct Cli {
    /// Read settings from this TOML file (default: ./docrelate.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the related index from the source directory (default)
    Build,
    /// Print the related documents recorded for one document
    Show(ShowArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

/// Settings shared by every command; each overrides the config file.
#[derive(Debug, Default, Args)]
pub struct SettingsArgs {
    /// Directory scanned for markdown documents
    #[arg(long, global = true, env = "DOCRELATE_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Prefix for index keys and related URLs
    #[arg(long, global = true, env = "DOCRELATE_URL_PREFIX")]
    pub url_prefix: Option<String>,

    /// Where the related index is written
    #[arg(short, long, global = true, env = "DOCRELATE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Number of related documents kept per document
    #[arg(short = 'k', long, global = true, env = "DOCRELATE_TOP_K")]
    pub top_k: Option<usize>,

    /// Override the embedding model ID or local model path
    #[arg(long, global = true, env = "DOCRELATE_MODEL")]
    pub model: Option<String>,
}

impl SettingsArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            source_dir: self.source_dir.clone(),
            url_prefix: self.url_prefix.clone(),
            output_path: self.output.clone(),
            top_k: self.top_k,
            model: self.model.clone(),
        }
    }
}

// -- Show --

#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Document identifier (e.g. tech/post.md) or full index key
    pub document: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "docrelate",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn no_arguments_builds_with_defaults() {
        let cli = Cli::try_parse_from(["docrelate"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn settings_become_overrides() {
        let cli = Cli::try_parse_from([
            "docrelate",
            "build",
            "--source-dir",
            "posts",
            "-k",
            "3",
            "--url-prefix",
            "/blog/",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Build)));

        let overrides = cli.settings.overrides();
        assert_eq!(overrides.source_dir, Some(PathBuf::from("posts")));
        assert_eq!(overrides.top_k, Some(3));
        assert_eq!(overrides.url_prefix.as_deref(), Some("/blog/"));
    }

    #[test]
    fn model_flag_becomes_override() {
        let cli =
            Cli::try_parse_from(["docrelate", "--model", "/models/bge"])
                .unwrap();
        let config = docrelate::RelateConfig::default()
            .with_overrides(cli.settings.overrides());
        assert_eq!(config.model, "/models/bge");
    }

    #[test]
    fn parse_show() {
        let cli =
            Cli::try_parse_from(["docrelate", "show", "tech/post.md", "--json"])
                .unwrap();
        match cli.command {
            Some(Command::Show(args)) => {
                assert_eq!(args.document, "tech/post.md");
                assert!(args.json);
            }
            _ => panic!("expected show command"),
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
