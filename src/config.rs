//! Configuration loading for the CLI.
//!
//! Values are resolved per key with the priority: command-line flag,
//! environment variable, config file, built-in default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use textru::HttpTimeouts;

use crate::cli::Args;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "TEXTRU_API_KEY";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "TEXTRU_BASE_URL";

/// Values read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// text.ru API key.
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: Option<String>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if self.api_key.as_deref().is_some_and(|key| key.trim().is_empty()) {
            bail!("Invalid config value for `api_key`: must not be empty");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Fully resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeouts: HttpTimeouts,
}

impl Settings {
    /// Returns the API key or an error explaining where to set it.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().with_context(|| {
            format!(
                "No API key configured. Pass --api-key, set {API_KEY_ENV}, \
                 or add `api_key` to the config file"
            )
        })
    }
}

/// Loads the config file and merges it with flags and environment.
pub fn resolve_settings(args: &Args) -> Result<Settings> {
    let file_config = match &args.config {
        Some(path) => Some(load_file_config(path)?),
        None => load_default_file_config()?,
    }
    .unwrap_or_default();

    Ok(merge_settings(
        args,
        env_var_non_empty(API_KEY_ENV),
        env_var_non_empty(BASE_URL_ENV),
        file_config,
    ))
}

fn merge_settings(
    args: &Args,
    env_api_key: Option<String>,
    env_base_url: Option<String>,
    file_config: FileConfig,
) -> Settings {
    let defaults = HttpTimeouts::default();
    Settings {
        api_key: args
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or(env_api_key)
            .or(file_config.api_key),
        base_url: args
            .base_url
            .clone()
            .or(env_base_url)
            .or(file_config.base_url),
        timeouts: HttpTimeouts {
            connect_timeout_secs: args
                .connect_timeout
                .or(file_config.connect_timeout_secs)
                .unwrap_or(defaults.connect_timeout_secs),
            read_timeout_secs: args
                .read_timeout
                .or(file_config.read_timeout_secs)
                .unwrap_or(defaults.read_timeout_secs),
        },
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/textru/config.toml`
/// 2. `$HOME/.config/textru/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("textru").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("textru")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

fn env_var_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Loads config from the default path if present.
fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "api_key" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `api_key` value on line {line_number}"))?;
                cfg.api_key = Some(parsed);
            }
            "base_url" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `base_url` value on line {line_number}"))?;
                cfg.base_url = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_number}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_number}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

/// Parses a basic double-quoted string. Supports the `\"`, `\\`, `\n` and
/// `\t` escapes.
fn parse_string_literal(raw_value: &str) -> Result<String> {
    let Some(inner) = raw_value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        bail!("Expected double-quoted string");
    };

    let mut parsed = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('"') => parsed.push('"'),
                Some('\\') => parsed.push('\\'),
                Some('n') => parsed.push('\n'),
                Some('t') => parsed.push('\t'),
                Some(other) => bail!("Unsupported escape sequence '\\{other}'"),
                None => bail!("Unterminated escape sequence"),
            },
            '"' => bail!("Unescaped quote inside string"),
            _ => parsed.push(ch),
        }
    }
    Ok(parsed)
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
