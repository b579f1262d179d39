use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TASK_POLL_MS: u64 = 5000;
const MIN_TASK_POLL_MS: u64 = 250;

#[derive(Parser, Debug, Default)]
#[command(
    name = "seb-dashboard",
    about = "Live terminal dashboard for the SocialEarning bot"
)]
pub struct Args {
    /// Bot HTTP root, e.g. http://127.0.0.1:5000
    #[arg(long)]
    pub base_url: Option<String>,
    /// TOML file with defaults for every flag
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub task_poll_ms: Option<u64>,
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub task_poll_ms: Option<u64>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub debug: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub task_poll: Duration,
    pub log_dir: PathBuf,
    pub debug: bool,
}

impl Config {
    pub fn endpoint(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub fn load_config() -> Result<Config> {
    let args = Args::parse();
    let env = |key: &str| std::env::var(key).ok();
    let file = match resolve_config_path(args.config.as_deref(), &env) {
        Some((path, explicit)) => load_file_config(&path, explicit)?,
        None => FileConfig::default(),
    };
    resolve_config(&args, &file, &env)
}

/// Merges flag > env > file > default.
pub fn resolve_config(
    args: &Args,
    file: &FileConfig,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Config> {
    let base_url = args
        .base_url
        .clone()
        .or_else(|| non_empty(env("SEB_BASE_URL")))
        .or_else(|| file.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = validate_base_url(&base_url)?;

    let task_poll_ms = match args.task_poll_ms {
        Some(value) => value,
        None => match non_empty(env("SEB_TASK_POLL_MS")) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("SEB_TASK_POLL_MS is not a number: {raw}"))?,
            None => file.task_poll_ms.unwrap_or(DEFAULT_TASK_POLL_MS),
        },
    };

    let log_dir = args
        .log_dir
        .clone()
        .or_else(|| non_empty(env("SEB_LOG_DIR")).map(PathBuf::from))
        .or_else(|| file.log_dir.clone())
        .unwrap_or_else(|| default_log_dir(env));

    let debug = args.debug
        || env("SEB_DEBUG")
            .as_deref()
            .and_then(parse_bool_flag)
            .or(file.debug)
            .unwrap_or(false);

    Ok(Config {
        base_url,
        task_poll: Duration::from_millis(task_poll_ms.max(MIN_TASK_POLL_MS)),
        log_dir,
        debug,
    })
}

fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let Some(host) = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
    else {
        bail!("base url must start with http:// or https://, got `{raw}`");
    };
    if host.is_empty() {
        bail!("base url has no host: `{raw}`");
    }
    Ok(trimmed.to_string())
}

/// Returns the config file to read and whether the user asked for it
/// explicitly (a missing explicit file is an error, a missing default is not).
fn resolve_config_path(
    flag: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Option<(PathBuf, bool)> {
    if let Some(path) = flag {
        return Some((path.to_path_buf(), true));
    }
    if let Some(path) = non_empty(env("SEB_CONFIG")) {
        return Some((PathBuf::from(path), true));
    }
    let base = non_empty(env("XDG_CONFIG_HOME"))
        .map(PathBuf::from)
        .or_else(|| non_empty(env("HOME")).map(|home| PathBuf::from(home).join(".config")))?;
    let path = base.join("seb").join("dashboard.toml");
    if path.exists() {
        Some((path, false))
    } else {
        None
    }
}

fn load_file_config(path: &Path, explicit: bool) -> Result<FileConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if !explicit => {
            eprintln!("seb-dashboard: ignoring {}: {err}", path.display());
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };
    match parse_file_config(&contents) {
        Ok(config) => Ok(config),
        Err(err) => {
            eprintln!("seb-dashboard: invalid config {}: {err}", path.display());
            Ok(FileConfig::default())
        }
    }
}

pub fn parse_file_config(contents: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(contents)
}

fn default_log_dir(env: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(value) = non_empty(env("XDG_STATE_HOME")) {
        return PathBuf::from(value).join("seb");
    }
    if let Some(value) = non_empty(env("HOME")) {
        return PathBuf::from(value)
            .join(".local")
            .join("state")
            .join("seb");
    }
    PathBuf::from(".seb/state")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_inputs() {
        let env = env_from(&[("HOME", "/home/op")]);
        let config = resolve_config(&Args::default(), &FileConfig::default(), &env).expect("config");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.task_poll, Duration::from_millis(DEFAULT_TASK_POLL_MS));
        assert_eq!(config.log_dir, PathBuf::from("/home/op/.local/state/seb"));
        assert!(!config.debug);
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let file = parse_file_config(
            "base_url = \"http://file:1\"\ntask_poll_ms = 9000\ndebug = true\n",
        )
        .expect("toml");
        let env = env_from(&[("SEB_BASE_URL", "http://env:2/"), ("SEB_TASK_POLL_MS", "7000")]);

        let config = resolve_config(&Args::default(), &file, &env).expect("config");
        assert_eq!(config.base_url, "http://env:2");
        assert_eq!(config.task_poll, Duration::from_millis(7000));
        assert!(config.debug);

        let args = Args {
            base_url: Some("https://bot.example".to_string()),
            task_poll_ms: Some(100),
            ..Args::default()
        };
        let config = resolve_config(&args, &file, &env).expect("config");
        assert_eq!(config.base_url, "https://bot.example");
        assert_eq!(config.task_poll, Duration::from_millis(MIN_TASK_POLL_MS));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let env = env_from(&[]);
        let args = Args {
            base_url: Some("ftp://bot".to_string()),
            ..Args::default()
        };
        assert!(resolve_config(&args, &FileConfig::default(), &env).is_err());

        let bad_poll = env_from(&[("SEB_TASK_POLL_MS", "soon")]);
        assert!(resolve_config(&Args::default(), &FileConfig::default(), &bad_poll).is_err());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://127.0.0.1:5000/", "/api/task/list"),
            "http://127.0.0.1:5000/api/task/list"
        );
        assert_eq!(endpoint("http://h", "start"), "http://h/start");
    }

    #[test]
    fn parses_bool_flags() {
        assert_eq!(parse_bool_flag("YES"), Some(true));
        assert_eq!(parse_bool_flag("off"), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }
}
