//! Configuration discovery and effective settings resolution.
//!
//! rasqc reads `rasqc.toml|yaml|yml` from the model directory (or the
//! closest ancestor holding one, stopping at a `.git` directory) and merges
//! it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `checksuite`: `ffrd`
//! - `output`: `human`
//! - `theme`: `nineties`
//! - `schema`: `bundled`
//! - `timeout_ms`: none (0 also disables)
//! - `parallel`: false
//! - `out_dir`: `<model dir>/rasqc`
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_NAMES: [&str; 3] = ["rasqc.toml", "rasqc.yaml", "rasqc.yml"];

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
/// Root configuration loaded from `rasqc.toml|yaml`.
pub struct RasqcConfig {
    pub checksuite: Option<String>,
    pub output: Option<String>,
    pub theme: Option<String>,
    pub schema: Option<String>,
    pub timeout_ms: Option<u64>,
    pub parallel: Option<bool>,
    pub out_dir: Option<String>,
}

#[derive(Debug, Default, Clone)]
/// Values given on the command line; `None` defers to the config file.
pub struct CliOverrides<'a> {
    pub checksuite: Option<&'a str>,
    pub output: Option<&'a str>,
    pub theme: Option<&'a str>,
    pub schema: Option<&'a str>,
    pub timeout_ms: Option<u64>,
    pub parallel: Option<bool>,
    pub out_dir: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
/// Fully-resolved configuration used by the run after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_found: bool,
    pub checksuite: String,
    pub output: String,
    pub theme: String,
    pub schema: String,
    pub timeout: Option<Duration>,
    pub parallel: bool,
    pub out_dir: PathBuf,
}

/// Walk upward from `start` to the directory owning the configuration.
///
/// Stops when a `rasqc.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `RasqcConfig` from `rasqc.toml` or `rasqc.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<RasqcConfig> {
    let toml_path = root.join("rasqc.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str::<RasqcConfig>(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                log::warn!("ignoring {}: {}", toml_path.display(), e);
                None
            }
        };
    }
    for yml in ["rasqc.yaml", "rasqc.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str::<RasqcConfig>(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    log::warn!("ignoring {}: {}", p.display(), e);
                    None
                }
            };
        }
    }
    None
}

/// Resolve `Effective` for a model located in `model_dir`.
pub fn resolve_effective(model_dir: &Path, cli: &CliOverrides<'_>) -> Effective {
    let root = detect_root(model_dir);
    let loaded = load_config(&root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let checksuite = cli
        .checksuite
        .map(str::to_string)
        .or(cfg.checksuite)
        .unwrap_or_else(|| "ffrd".to_string());
    let output = cli
        .output
        .map(str::to_string)
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let theme = cli
        .theme
        .map(str::to_string)
        .or(cfg.theme)
        .unwrap_or_else(|| "nineties".to_string());
    let schema = cli
        .schema
        .map(str::to_string)
        .or(cfg.schema)
        .unwrap_or_else(|| "bundled".to_string());
    let timeout = cli
        .timeout_ms
        .or(cfg.timeout_ms)
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis);
    let parallel = cli.parallel.or(cfg.parallel).unwrap_or(false);
    // Relative out_dir in the config file is anchored at the config root.
    let out_dir = match (cli.out_dir, cfg.out_dir) {
        (Some(d), _) => PathBuf::from(d),
        (None, Some(d)) => root.join(d),
        (None, None) => model_dir.join("rasqc"),
    };

    Effective {
        root,
        config_found,
        checksuite,
        output,
        theme,
        schema,
        timeout,
        parallel,
        out_dir,
    }
}
