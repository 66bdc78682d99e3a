//! The folio application: logging setup and command dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use folio_content::markdown::RenderOptions;
use folio_content::tools::{captions, footnotes, lint};
use folio_content::{load_document, render_document};
use folio_core::util::files::{find_all_files, read_file, write_file, FindOptions};
use folio_core::{ConfigProvider, Result};
use folio_site::layout::{render_page, PageContext};
use folio_site::{SeoMeta, SiteBuilder};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{CaptionsArgs, CliArgs, Command, RewriteArgs};
use crate::config::FolioConfig;
use crate::config_handlers;

// ============================================================================
// Outcome
// ============================================================================

/// How a successful command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report.
    Clean,
    /// Lint issues, or changes pending in a dry run.
    Findings,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Clean => ExitCode::SUCCESS,
            Self::Findings => ExitCode::from(1),
        }
    }
}

// ============================================================================
// FolioCli
// ============================================================================

/// The `folio` command-line application.
pub struct FolioCli {
    name: String,
    config: Arc<FolioConfig>,
    version: String,
}

impl FolioCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = FolioConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    pub fn new(name: impl Into<String>, config: FolioConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    /// `log` records from the library crates are forwarded to the same subscriber.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<Outcome> {
        self.init_logging(args.verbose, args.quiet);
        tracing::debug!(command = ?args.command, config = ?args.config, "dispatching");
        let base_flag = args.base_path.as_deref();

        match args.command {
            Some(Command::Build { output }) => self.build(base_flag, output).await,
            Some(Command::Render { file, output, page }) => {
                self.render(base_flag, &file, output.as_deref(), page).await
            }
            Some(Command::Lint { file }) => lint_file(&file).await,
            Some(Command::Captions(CaptionsArgs { rewrite, normalize })) => {
                rewrite_markdown(&rewrite, "captions", |text| move_captions(text, normalize)).await
            }
            Some(Command::Footnotes(rewrite)) => {
                rewrite_markdown(&rewrite, "footnotes", footnotes::links_to_footnotes).await
            }
            Some(Command::StripImages {
                file,
                output,
                in_place,
                placeholder,
            }) => strip_images(&file, output, in_place, &placeholder).await,
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(Outcome::Clean)
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)?;
                Ok(Outcome::Clean)
            }
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(Outcome::Clean)
            }
        }
    }

    async fn build(&self, base_flag: Option<&str>, output: Option<PathBuf>) -> Result<Outcome> {
        let config = &*self.config;
        let base = config.resolve_base_path(base_flag)?;
        info!(
            "building {} with base path '{}'",
            config.project_name(),
            base
        );

        let mut builder = SiteBuilder::from_config(config)?
            .header(config.header.clone())
            .pages(config.pages.iter().cloned())
            .base_path(base);
        if let Some(url) = &config.site.site_url {
            builder = builder.site_url(url.as_str());
        }
        if let Some(output) = output {
            builder = builder.output(output);
        }

        let report = builder.build().await?;
        for missing in &report.missing_assets {
            warn!("missing asset: {missing}");
        }
        println!(
            "Built {} page(s), copied {} asset(s) into {}",
            report.pages.len(),
            report.assets_copied,
            builder.output_dir().display()
        );
        Ok(Outcome::Clean)
    }

    async fn render(
        &self,
        base_flag: Option<&str>,
        file: &Path,
        output: Option<&Path>,
        page: bool,
    ) -> Result<Outcome> {
        let config = &*self.config;
        let base = config.resolve_base_path(base_flag)?;
        let source = load_document(file, &base).await?;
        let doc = render_document(&source, &RenderOptions::default());

        let html = if page {
            let title = doc.title().unwrap_or(&config.header.title);
            let seo = SeoMeta::new(title, "");
            render_page(&PageContext {
                seo: &seo,
                header: &config.header,
                body_html: &doc.html,
                base: &base,
            })
        } else {
            doc.html
        };

        match output {
            Some(path) => {
                write_file(path, &html).await?;
                info!("wrote {}", path.display());
            }
            None => print!("{html}"),
        }
        Ok(Outcome::Clean)
    }
}

// ============================================================================
// Authoring tools
// ============================================================================

async fn lint_file(file: &Path) -> Result<Outcome> {
    let text = read_file(file).await?;

    let (_, unicode) = lint::normalize_unicode(&text);
    if !unicode.is_empty() {
        println!("{}: unicode whitespace {unicode}", file.display());
    }

    let issues = lint::find_issues(&text);
    for issue in &issues {
        println!("{}:{issue}", file.display());
    }

    if issues.is_empty() {
        info!("{}: no issues", file.display());
        Ok(Outcome::Clean)
    } else {
        warn!("{}: {} issue(s)", file.display(), issues.len());
        Ok(Outcome::Findings)
    }
}

/// Caption paragraphs into image titles, then optional image-line cleanup.
fn move_captions(text: &str, normalize: bool) -> (String, usize) {
    let (out, stats) = captions::captions_to_titles(text);
    if !normalize {
        return (out, stats.captions_removed);
    }
    let options = captions::NormalizeOptions {
        asset_paths: true,
        titles: true,
    };
    let normalized = captions::normalize_images(&out, options);
    let tidied = usize::from(normalized != out);
    (normalized, stats.captions_removed + tidied)
}

/// The Markdown files named by `path`: the file itself or every `*.md` below it.
async fn markdown_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = find_all_files(path, FindOptions::markdown())
        .await?
        .into_iter()
        .map(|info| info.path)
        .collect();
    files.sort();
    Ok(files)
}

/// Apply `transform` to each file; `transform` returns the new text and a
/// change count. A file counts as changed when its text differs.
async fn rewrite_markdown<F>(args: &RewriteArgs, tool: &str, transform: F) -> Result<Outcome>
where
    F: Fn(&str) -> (String, usize),
{
    let mut pending = 0;
    for path in markdown_files(&args.path).await? {
        let text = read_file(&path).await?;
        let (rewritten, changes) = transform(&text);
        if rewritten == text {
            continue;
        }
        if args.in_place {
            write_file(&path, &rewritten).await?;
            println!("{}: {tool}: {changes} change(s) written", path.display());
        } else {
            println!("{}: {tool}: {changes} change(s) pending", path.display());
            pending += 1;
        }
    }

    if pending > 0 {
        println!("{pending} file(s) would change; rerun with --in-place");
        Ok(Outcome::Findings)
    } else {
        Ok(Outcome::Clean)
    }
}

/// Default output for `strip-images`: `post.md` becomes `post.noimg.md`.
fn noimg_path(file: &Path) -> PathBuf {
    file.with_extension("noimg.md")
}

async fn strip_images(
    file: &Path,
    output: Option<PathBuf>,
    in_place: bool,
    placeholder: &str,
) -> Result<Outcome> {
    let text = read_file(file).await?;
    let (stripped, replaced) = lint::strip_image_paths(&text, placeholder);

    let dest = match (in_place, output) {
        (true, _) => file.to_path_buf(),
        (false, Some(output)) => output,
        (false, None) => noimg_path(file),
    };
    write_file(&dest, &stripped).await?;
    println!(
        "{}: replaced {replaced} image path(s), wrote {}",
        file.display(),
        dest.display()
    );
    Ok(Outcome::Clean)
}

// ============================================================================
// Tests
// ============================================================================
