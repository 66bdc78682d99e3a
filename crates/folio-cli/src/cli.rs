//! CLI argument parsing and command definitions.
//!
//! Global flags (configuration path, base path, verbosity) apply to every
//! command. Commands cover the static build, single-file rendering, the
//! authoring tools, and configuration management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use folio_content::markdown::IMAGE_PLACEHOLDER;

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments for folio.
#[derive(Parser, Debug)]
#[command(name = "folio", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "FOLIO_CONFIG", global = true)]
    pub config: Option<String>,

    /// Deployment base path (e.g. "/rl-excursions-during-pretraining").
    ///
    /// Overrides the configured base path and the GITHUB_PAGES flag.
    #[arg(short, long, global = true)]
    pub base_path: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Commands understood by the `folio` binary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the static site.
    Build {
        /// Output directory (defaults to `site.output_dir`).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render one Markdown file to an HTML fragment.
    Render {
        /// Markdown source.
        file: PathBuf,

        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap the fragment in the full page layout.
        #[arg(long)]
        page: bool,
    },

    /// Report Markdown syntax likely to break rendering.
    Lint {
        /// Markdown source.
        file: PathBuf,
    },

    /// Move `Figure N:` caption paragraphs into image titles.
    Captions(CaptionsArgs),

    /// Convert external links into footnote references.
    Footnotes(RewriteArgs),

    /// Replace image URLs with the placeholder image.
    StripImages {
        /// Markdown source.
        file: PathBuf,

        /// Output path (defaults to `<file>.noimg.md`).
        #[arg(short, long, conflicts_with = "in_place")]
        output: Option<PathBuf>,

        /// Overwrite the input file.
        #[arg(long)]
        in_place: bool,

        /// Placeholder URL.
        #[arg(long, default_value = IMAGE_PLACEHOLDER)]
        placeholder: String,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Arguments shared by the in-place rewriting tools.
#[derive(Args, Debug, Clone)]
pub struct RewriteArgs {
    /// Markdown file, or a directory searched for `*.md`.
    pub path: PathBuf,

    /// Write changes back; without this the command only reports.
    #[arg(long)]
    pub in_place: bool,
}

/// Arguments for `folio captions`.
#[derive(Args, Debug, Clone)]
pub struct CaptionsArgs {
    #[command(flatten)]
    pub rewrite: RewriteArgs,

    /// Also root `assets/…` image URLs and tidy existing titles.
    #[arg(long)]
    pub normalize: bool,
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "site.base_path").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "site.base_path").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to `./folio.toml`).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_args_default() {
        let args = CliArgs::parse_from(["folio"]);
        assert!(args.config.is_none());
        assert!(args.base_path.is_none());
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_cli_args_verbose() {
        let args = CliArgs::parse_from(["folio", "--verbose"]);
        assert!(args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_args_quiet() {
        let args = CliArgs::parse_from(["folio", "--quiet"]);
        assert!(!args.verbose);
        assert!(args.quiet);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["folio", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_cli_args_config() {
        let args = CliArgs::parse_from(["folio", "--config", "/path/to/config.toml"]);
        assert_eq!(args.config, Some("/path/to/config.toml".to_string()));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from(["folio", "build", "--base-path", "/proj", "-v"]);
        assert_eq!(args.base_path.as_deref(), Some("/proj"));
        assert!(args.verbose);
        assert!(matches!(args.command, Some(Command::Build { output: None })));
    }

    #[test]
    fn test_build_command_output() {
        let args = CliArgs::parse_from(["folio", "build", "-o", "public"]);
        match args.command {
            Some(Command::Build { output }) => assert_eq!(output, Some(PathBuf::from("public"))),
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_render_command() {
        let args = CliArgs::parse_from(["folio", "render", "post.md", "--page"]);
        match args.command {
            Some(Command::Render { file, output, page }) => {
                assert_eq!(file, PathBuf::from("post.md"));
                assert!(output.is_none());
                assert!(page);
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn test_lint_command() {
        let args = CliArgs::parse_from(["folio", "lint", "post.md"]);
        assert!(matches!(args.command, Some(Command::Lint { .. })));
    }

    #[test]
    fn test_captions_command() {
        let args = CliArgs::parse_from(["folio", "captions", "content", "--in-place"]);
        match args.command {
            Some(Command::Captions(CaptionsArgs {
                rewrite: RewriteArgs { path, in_place },
                normalize,
            })) => {
                assert_eq!(path, PathBuf::from("content"));
                assert!(in_place);
                assert!(!normalize);
            }
            _ => panic!("Expected Captions command"),
        }
    }

    #[test]
    fn test_captions_normalize_flag() {
        let args = CliArgs::parse_from(["folio", "captions", "post.md", "--normalize"]);
        match args.command {
            Some(Command::Captions(captions)) => {
                assert!(captions.normalize);
                assert!(!captions.rewrite.in_place);
            }
            _ => panic!("Expected Captions command"),
        }
    }

    #[test]
    fn test_footnotes_command_dry_run_default() {
        let args = CliArgs::parse_from(["folio", "footnotes", "post.md"]);
        match args.command {
            Some(Command::Footnotes(RewriteArgs { in_place, .. })) => assert!(!in_place),
            _ => panic!("Expected Footnotes command"),
        }
    }

    #[test]
    fn test_strip_images_defaults() {
        let args = CliArgs::parse_from(["folio", "strip-images", "post.md"]);
        match args.command {
            Some(Command::StripImages {
                file,
                output,
                in_place,
                placeholder,
            }) => {
                assert_eq!(file, PathBuf::from("post.md"));
                assert!(output.is_none());
                assert!(!in_place);
                assert_eq!(placeholder, IMAGE_PLACEHOLDER);
            }
            _ => panic!("Expected StripImages command"),
        }
    }

    #[test]
    fn test_strip_images_output_conflicts_with_in_place() {
        let result =
            CliArgs::try_parse_from(["folio", "strip-images", "a.md", "-o", "b.md", "--in-place"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_command() {
        let args = CliArgs::parse_from(["folio", "version"]);
        assert!(matches!(args.command, Some(Command::Version)));
    }

    // ------------------------------------------------------------------------
    // Config command tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_path_command() {
        let args = CliArgs::parse_from(["folio", "config", "path"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Path,
            })) => {}
            _ => panic!("Expected Config Path command"),
        }
    }

    #[test]
    fn test_config_get_command() {
        let args = CliArgs::parse_from(["folio", "config", "get", "site.base_path"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Get { key },
            })) => {
                assert_eq!(key, "site.base_path");
            }
            _ => panic!("Expected Config Get command"),
        }
    }

    #[test]
    fn test_config_set_command() {
        let args = CliArgs::parse_from(["folio", "config", "set", "site.github_pages", "true"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Set { key, value },
            })) => {
                assert_eq!(key, "site.github_pages");
                assert_eq!(value, "true");
            }
            _ => panic!("Expected Config Set command"),
        }
    }

    #[test]
    fn test_config_init_force() {
        let args = CliArgs::parse_from(["folio", "config", "init", "--force"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Init { file, force },
            })) => {
                assert!(file.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command with force"),
        }
    }

    #[test]
    fn test_config_export_docker_env() {
        let args = CliArgs::parse_from(["folio", "config", "export", "--docker-env"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Export { docker_env },
            })) => {
                assert!(docker_env);
            }
            _ => panic!("Expected Config Export command with docker_env"),
        }
    }
}
