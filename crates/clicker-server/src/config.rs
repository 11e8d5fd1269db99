//! Server configuration: defaults, file loading, and store selection.
//!
//! A config file is optional. When `CLICKER_CONFIG` names one, its format is
//! picked from the extension (`.ron`, `.toml`, or `.json`) and any field it
//! leaves out keeps its default.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clicker_core::store::{FileStore, MemoryStore, PLAYER_KEY, StateStore};
use serde::Deserialize;

/// Environment variable holding the config file path.
pub const CONFIG_ENV: &str = "CLICKER_CONFIG";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file has an extension we don't support.
    #[error("unsupported config format: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A value parsed but cannot be used.
    #[error("invalid {field}: {detail}")]
    Invalid { field: &'static str, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// ServerConfig
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,
    /// Directory for the file store. `None` keeps state in memory only.
    pub data_dir: Option<PathBuf>,
    /// Store key the player's state lives under.
    pub player_key: String,
    /// Default tracing filter. `RUST_LOG` takes precedence.
    pub log_filter: String,
    /// Value for `Access-Control-Allow-Origin`; `*` allows any origin.
    pub allow_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
            data_dir: None,
            player_key: PLAYER_KEY.to_string(),
            log_filter: "info".to_string(),
            allow_origin: "*".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from the file named by [`CONFIG_ENV`], or use defaults when the
    /// variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => load_config(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// The persistence backend this config asks for.
    pub fn build_store(&self) -> Box<dyn StateStore> {
        match &self.data_dir {
            Some(dir) => Box::new(FileStore::new(dir)),
            None => Box::new(MemoryStore::new()),
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.player_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "player_key",
                detail: "must not be empty".into(),
            });
        }
        if self.allow_origin.is_empty() {
            return Err(ConfigError::Invalid {
                field: "allow_origin",
                detail: "must not be empty".into(),
            });
        }
        Ok(self)
    }
}

// ===========================================================================
// Format detection and loading
// ===========================================================================

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Parse config text in the given format.
pub fn parse_config(content: &str, format: Format, file: &Path) -> Result<ServerConfig, ConfigError> {
    let parse_err = |detail: String| ConfigError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    let config: ServerConfig = match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?,
    };
    config.validate()
}

/// Read and parse a config file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, format, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str, format: Format) -> Result<ServerConfig, ConfigError> {
        parse_config(content, format, Path::new("test"))
    }

    #[test]
    fn detect_by_extension() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("a.yaml")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
        assert!(detect_format(Path::new("config")).is_err());
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = parse(
            r#"
            bind = "0.0.0.0:9000"
            data_dir = "/var/lib/clicker"
            "#,
            Format::Toml,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/clicker")));
        assert_eq!(config.player_key, "global_state");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn ron_and_json_parse() {
        let config = parse(r#"(player_key: "p1", log_filter: "debug")"#, Format::Ron).unwrap();
        assert_eq!(config.player_key, "p1");
        assert_eq!(config.log_filter, "debug");

        let config = parse(r#"{"allow_origin": "https://play.example"}"#, Format::Json).unwrap();
        assert_eq!(config.allow_origin, "https://play.example");
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = parse("bind = ", Format::Toml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("parse error in test"));
    }

    #[test]
    fn empty_player_key_is_rejected() {
        let err = parse(r#"player_key = """#, Format::Toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "player_key", .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clicker.toml");
        std::fs::write(&path, "log_filter = \"warn\"\n").unwrap();
        assert_eq!(load_config(&path).unwrap().log_filter, "warn");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(load_config(&missing), Err(ConfigError::Io(_))));
    }

    #[test]
    fn store_follows_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let store = config.build_store();
        store.store("k", "v").unwrap();
        assert!(dir.path().join("k.json").exists());

        let store = ServerConfig::default().build_store();
        store.store("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v"));
    }
}
