//! `.env` loading, done before the command line is parsed so the values can
//! act as flag fallbacks.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

#[derive(Debug, PartialEq, Eq)]
pub struct LoadedEnvFile {
    pub path: PathBuf,
    pub explicit: bool,
    pub applied: usize,
}

fn env_error(message: impl Into<String>) -> ConfigError {
    ConfigError::EnvFile(message.into())
}

/// Find `--env-file PATH` / `--env-file=PATH` among the raw arguments.
/// Everything else is left for clap.
fn env_file_arg(args: impl IntoIterator<Item = OsString>) -> Result<Option<PathBuf>, ConfigError> {
    let mut args = args.into_iter().skip(1);
    let mut found: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        let value = match arg.to_str() {
            Some("--") => break,
            Some("--env-file") => Some(
                args.next()
                    .map(PathBuf::from)
                    .ok_or_else(|| env_error("`--env-file` requires a path argument"))?,
            ),
            Some(s) => match s.strip_prefix("--env-file=") {
                Some("") => return Err(env_error("`--env-file` requires a path argument")),
                Some(p) => Some(PathBuf::from(p)),
                None => None,
            },
            None => None,
        };
        if let Some(path) = value {
            if found.is_some() {
                return Err(env_error("`--env-file` provided more than once"));
            }
            found = Some(path);
        }
    }
    Ok(found)
}

/// Load the file named by `--env-file`, or `./.env` when it exists.
/// Variables already present in the process environment win.
pub fn load_from_args(args: impl IntoIterator<Item = OsString>) -> Result<Option<LoadedEnvFile>, ConfigError> {
    if let Some(path) = env_file_arg(args)? {
        if !path.is_file() {
            return Err(env_error(format!("env file not found: {}", path.display())));
        }
        let applied = apply(&path)?;
        return Ok(Some(LoadedEnvFile {
            path,
            explicit: true,
            applied,
        }));
    }

    let default_path = std::env::current_dir()
        .map_err(|e| env_error(format!("unable to read current directory: {e}")))?
        .join(".env");
    if !default_path.is_file() {
        return Ok(None);
    }
    let applied = apply(&default_path)?;
    Ok(Some(LoadedEnvFile {
        path: default_path,
        explicit: false,
        applied,
    }))
}

fn apply(path: &Path) -> Result<usize, ConfigError> {
    let mut applied = 0;
    for (key, value) in parse_file(path)? {
        if std::env::var_os(&key).is_none() {
            // Single-threaded at this point; nothing else reads the environment yet.
            unsafe {
                std::env::set_var(&key, value);
            }
            applied += 1;
        }
    }
    Ok(applied)
}

fn parse_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| env_error(format!("failed to read {}: {e}", path.display())))?;
    let mut pairs = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let parsed =
            parse_assignment(line).map_err(|e| env_error(format!("{}:{}: {e}", path.display(), index + 1)))?;
        pairs.extend(parsed);
    }
    Ok(pairs)
}

fn parse_assignment(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let assignment = trimmed.strip_prefix("export ").map(str::trim_start).unwrap_or(trimmed);

    let (key, raw) = assignment.split_once('=').ok_or("missing '=' in assignment")?;
    let key = key.trim();
    if key.is_empty() {
        return Err("environment variable name cannot be empty".into());
    }
    if key.chars().any(char::is_whitespace) {
        return Err(format!("environment variable name contains whitespace: {key}"));
    }
    Ok(Some((key.to_string(), parse_value(raw)?)))
}

fn parse_value(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix('"') {
        quoted(rest, '"', true)
    } else if let Some(rest) = trimmed.strip_prefix('\'') {
        quoted(rest, '\'', false)
    } else {
        let value = trimmed.split('#').next().unwrap_or_default();
        Ok(value.trim_end().to_string())
    }
}

/// Read up to the closing `quote`; only a comment may follow it.
fn quoted(input: &str, quote: char, escapes: bool) -> Result<String, String> {
    let mut result = String::new();
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if escapes => {
                let escaped = chars.next().ok_or("unterminated escape sequence")?;
                result.push(match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                });
            }
            c if c == quote => {
                let remainder = chars.as_str().trim();
                return if remainder.is_empty() || remainder.starts_with('#') {
                    Ok(result)
                } else {
                    Err(format!("unexpected characters after closing {quote}"))
                };
            }
            other => result.push(other),
        }
    }
    Err(format!("unterminated {quote}-quoted value"))
}
