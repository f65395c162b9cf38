use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the project root
pub const CONFIG_FILE: &str = "abt.yaml";

/// Log verbosity
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// Main ABT configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub compile: CompileConfig,
    pub docs: DocsConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Manifest path, relative to the project root unless absolute
    pub output: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Docs directory, relative to the project root unless absolute
    pub output: PathBuf,
}

/// Settings for the local chat runtime
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub host: String,
    pub port: u16,
    /// Timeout for one upstream completion request
    pub timeout_secs: u64,
    /// Completion API base URL (overridden by OPENAI_BASE_URL)
    pub base_url: String,
    /// Model used when an agent names none (overridden by OPENAI_MODEL)
    pub default_model: String,
    /// Temperature used when an agent sets none
    pub default_temperature: f64,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("abt_manifest.json"),
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(crate::docs::DEFAULT_DOCS_DIR),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            timeout_secs: 60,
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            default_temperature: 0.2,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>, root: &Path) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            let path = Self::expand_path(path);
            return Self::load_from_file(&path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check ABT_CONFIG env var
        if let Ok(env_path) = std::env::var("ABT_CONFIG") {
            let path = Self::expand_path(Path::new(&env_path));
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from ABT_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try <root>/abt.yaml
        let local_config = root.join(CONFIG_FILE);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load {}: {}", local_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }

    /// Anchor a configured path at the project root unless it is absolute
    pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
        let expanded = Self::expand_path(path);
        if expanded.is_absolute() { expanded } else { root.join(expanded) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.compile.output, PathBuf::from("abt_manifest.json"));
        assert_eq!(config.docs.output, PathBuf::from("abt_docs"));
        assert_eq!(config.runtime.host, "127.0.0.1");
        assert_eq!(config.runtime.port, 8000);
        assert_eq!(config.runtime.timeout_secs, 60);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("runtime:\n  port: 9100\nlog_level: debug\n").unwrap();
        assert_eq!(config.runtime.port, 9100);
        assert_eq!(config.runtime.host, "127.0.0.1");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.compile.output, PathBuf::from("abt_manifest.json"));
    }

    #[test]
    fn test_load_from_project_root() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "compile:\n  output: build/manifest.json\n").unwrap();
        let config = Config::load(None, temp.path()).unwrap();
        assert_eq!(config.compile.output, PathBuf::from("build/manifest.json"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        assert!(Config::load(Some(&missing), temp.path()).is_err());
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/project");
        assert_eq!(
            Config::resolve_path(root, Path::new("abt_manifest.json")),
            PathBuf::from("/project/abt_manifest.json")
        );
        assert_eq!(
            Config::resolve_path(root, Path::new("/tmp/out.json")),
            PathBuf::from("/tmp/out.json")
        );
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Off.as_filter(), log::LevelFilter::Off);
        assert_eq!(LogLevel::Trace.as_filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let yaml_str = serde_yaml::to_string(&config).expect("Failed to serialize");
        let parsed: Config = serde_yaml::from_str(&yaml_str).expect("Failed to deserialize");
        assert_eq!(parsed.runtime.port, config.runtime.port);
        assert_eq!(parsed.compile.output, config.compile.output);
    }
}
