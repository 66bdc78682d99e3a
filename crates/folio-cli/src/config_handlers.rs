//! `folio config` subcommands.
//!
//! `get` and `export` read the merged configuration (file plus `FOLIO_*`
//! overlay). `set` edits the file itself and refuses edits that would leave
//! it unloadable.

use crate::cli::ConfigAction;
use crate::config::{FolioConfig, PROJECT_MARKER};
use folio_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Handle a config subcommand.
///
/// Takes the raw `--config` path: `path` and `init` run before any file
/// exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => show_path(config_path),
        ConfigAction::Get { key } => {
            let config = FolioConfig::load(config_path)?;
            println!("{}", lookup(&config, &key)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut doc = ConfigDocument::open(&existing_file(config_path)?)?;
            doc.set(&key, &value)?;
            doc.save()?;
            println!("Set {key} = {value} in {}", doc.path.display());
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            let path = init_target(file.as_deref())?;
            write_default(&path, force)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
        ConfigAction::Export { docker_env } => {
            let config = FolioConfig::load(config_path)?;
            for line in export_lines(&config, docker_env)? {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn show_path(config_path: Option<&str>) -> Result<()> {
    let path = FolioConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("No config location could be resolved"))?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(not created yet; run `folio config init`)");
    }
    Ok(())
}

fn existing_file(config_path: Option<&str>) -> Result<PathBuf> {
    match FolioConfig::resolve_config_path(config_path) {
        Some(path) if path.exists() => Ok(path),
        Some(path) => Err(Error::config(format!(
            "{} does not exist; run `folio config init` first",
            path.display()
        ))),
        None => Err(Error::config("No config location could be resolved")),
    }
}

/// Render the merged value at `key` for stdout.
fn lookup(config: &FolioConfig, key: &str) -> Result<String> {
    let root = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;
    let mut current = &root;
    for segment in key_segments(key)? {
        current = current
            .get(segment)
            .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))?;
    }
    Ok(display_value(current))
}

fn display_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Table(table) => {
            toml::to_string_pretty(table).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

/// Split a dotted key, rejecting empty segments (`site..x`, `.site`).
fn key_segments(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(Error::config(format!("Invalid key '{key}'")));
    }
    Ok(segments)
}

/// Read a command-line value as a TOML literal (`true`, `3`, `["a", "b"]`,
/// `"quoted"`), falling back to a plain string.
///
/// Dates stay strings: every date-like field in the config is text.
fn infer_value(raw: &str) -> toml::Value {
    let parsed = toml::from_str::<toml::Table>(&format!("value = {raw}"))
        .ok()
        .filter(|table| table.len() == 1)
        .and_then(|mut table| table.remove("value"));
    match parsed {
        Some(toml::Value::Datetime(_)) | None => toml::Value::String(raw.to_string()),
        Some(value) => value,
    }
}

/// A config file held as a TOML table, edited in place.
struct ConfigDocument {
    path: PathBuf,
    root: toml::Table,
}

impl ConfigDocument {
    fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let root = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// Set `key` to `raw`, creating tables along the way.
    ///
    /// The document is unchanged when the result would not load as a
    /// [`FolioConfig`].
    fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let segments = key_segments(key)?;
        let Some((leaf, tables)) = segments.split_last() else {
            return Err(Error::config(format!("Invalid key '{key}'")));
        };

        let mut candidate = self.root.clone();
        let mut table = &mut candidate;
        for name in tables {
            let next = table
                .entry(name.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            table = next
                .as_table_mut()
                .ok_or_else(|| Error::config(format!("'{name}' in '{key}' is not a table")))?;
        }
        table.insert(leaf.to_string(), infer_value(raw));

        toml::Value::Table(candidate.clone())
            .try_into::<FolioConfig>()
            .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;
        self.root = candidate;
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let text = toml::to_string_pretty(&self.root).map_err(|e| Error::config(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| Error::io_with_path(e, &self.path))
    }
}

/// `--file`, else `folio.toml` in the working directory.
fn init_target(file: Option<&str>) -> Result<PathBuf> {
    match file {
        Some(p) => Ok(PathBuf::from(p)),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(PROJECT_MARKER))
            .map_err(|e| Error::config(format!("Could not determine working directory: {e}"))),
    }
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "{} already exists; pass --force to replace it",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let text = FolioConfig::default().to_toml_string()?;
    std::fs::write(path, text).map_err(|e| Error::io_with_path(e, path))
}

/// The overlayable settings as `KEY=value` lines, or `--env KEY=value` for
/// `docker run`.
fn export_lines(config: &FolioConfig, docker_env: bool) -> Result<Vec<String>> {
    let lines = config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| {
            let assignment = format!("{key}={}", shell_quote(&value));
            if docker_env {
                format!("--env {assignment}")
            } else {
                assignment
            }
        })
        .collect();
    Ok(lines)
}

/// Single-quote `value` unless it is made only of shell-safe characters.
fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@%+,".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
