//! Configuration management for piiguard.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default analysis language tag passed to the analyzer engine.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default Tesseract language for OCR.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Default maximum upload size in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

const UPLOADS_SUBDIR: &str = "uploads";

/// Which analyzer/anonymizer implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// Built-in regex pattern engine (default, no external services).
    #[default]
    Pattern,
    /// Remote presidio-compatible analyzer/anonymizer HTTP services.
    Presidio,
}

impl EngineBackend {
    /// Parse a backend name, as used in config files and env overrides.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pattern" => Some(Self::Pattern),
            "presidio" => Some(Self::Presidio),
            _ => None,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory for request-scoped upload files.
    pub upload_dir: PathBuf,
    /// Analysis language tag passed to the analyzer.
    pub language: String,
    /// Tesseract language for OCR.
    pub ocr_language: String,
    /// Engine backend selection.
    pub backend: EngineBackend,
    /// Presidio analyzer endpoint.
    pub analyzer_url: String,
    /// Presidio anonymizer endpoint.
    pub anonymizer_url: String,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("piiguard");

        Self {
            upload_dir: data_dir.join(UPLOADS_SUBDIR),
            language: DEFAULT_LANGUAGE.to_string(),
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            backend: EngineBackend::default(),
            analyzer_url: "http://localhost:5002".to_string(),
            anonymizer_url: "http://localhost:5001".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Settings {
    /// Ensure the upload directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.upload_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create upload directory '{}': {}",
                    self.upload_dir.display(),
                    e
                ),
            )
        })
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upload directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_dir: Option<String>,
    /// Analysis language tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Tesseract language for OCR.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_language: Option<String>,
    /// Engine backend ("pattern" or "presidio").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<EngineBackend>,
    /// Presidio analyzer endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_url: Option<String>,
    /// Presidio anonymizer endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymizer_url: Option<String>,
    /// Maximum upload size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a specific file path.
    /// Supports TOML, YAML, and JSON based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

        let mut config: Config = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
            _ => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref upload_dir) = self.upload_dir {
            settings.upload_dir = self.resolve_path(upload_dir, base_dir);
        }
        if let Some(ref language) = self.language {
            settings.language = language.clone();
        }
        if let Some(ref ocr_language) = self.ocr_language {
            settings.ocr_language = ocr_language.clone();
        }
        if let Some(backend) = self.backend {
            settings.backend = backend;
        }
        if let Some(ref url) = self.analyzer_url {
            settings.analyzer_url = url.clone();
        }
        if let Some(ref url) = self.anonymizer_url {
            settings.anonymizer_url = url.clone();
        }
        if let Some(max) = self.max_upload_bytes {
            settings.max_upload_bytes = max;
        }
    }
}

/// Look for a config file in standard locations.
/// Checks piiguard.{ext} in the working directory, then the user config dir.
fn find_config_file() -> Option<PathBuf> {
    let extensions = ["toml", "yaml", "yml", "json"];

    for ext in extensions {
        let path = PathBuf::from(format!("piiguard.{}", ext));
        if path.exists() {
            return Some(path);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        for ext in extensions {
            let path = config_dir.join("piiguard").join(format!("config.{}", ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

/// Apply environment variable overrides on top of file config.
fn apply_env_overrides(settings: &mut Settings) {
    if let Some(dir) = std::env::var("PIIGUARD_UPLOAD_DIR")
        .ok()
        .filter(|s| !s.is_empty())
    {
        tracing::debug!("Using PIIGUARD_UPLOAD_DIR from environment: {}", dir);
        settings.upload_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
    }
    if let Some(url) = std::env::var("PIIGUARD_ANALYZER_URL")
        .ok()
        .filter(|s| !s.is_empty())
    {
        tracing::debug!("Using PIIGUARD_ANALYZER_URL from environment: {}", url);
        settings.analyzer_url = url;
    }
    if let Some(url) = std::env::var("PIIGUARD_ANONYMIZER_URL")
        .ok()
        .filter(|s| !s.is_empty())
    {
        tracing::debug!("Using PIIGUARD_ANONYMIZER_URL from environment: {}", url);
        settings.anonymizer_url = url;
    }
    if let Some(backend) = std::env::var("PIIGUARD_BACKEND")
        .ok()
        .and_then(|s| EngineBackend::parse(&s))
    {
        settings.backend = backend;
    }
    if let Some(language) = std::env::var("PIIGUARD_LANGUAGE")
        .ok()
        .filter(|s| !s.is_empty())
    {
        settings.language = language;
    }
}

/// Load settings, optionally from an explicit config file path.
/// Returns (Settings, Config) tuple.
pub async fn load_settings(config_path: Option<&Path>) -> (Settings, Config) {
    let config = match config_path.map(|p| p.to_path_buf()).or_else(find_config_file) {
        Some(path) => Config::load_from_path(&path).await.unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Config::default()
        }),
        None => Config::default(),
    };

    let mut settings = Settings::default();

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    apply_env_overrides(&mut settings);

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.language, "en");
        assert_eq!(settings.ocr_language, "eng");
        assert_eq!(settings.backend, EngineBackend::Pattern);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(EngineBackend::parse("pattern"), Some(EngineBackend::Pattern));
        assert_eq!(
            EngineBackend::parse("PRESIDIO"),
            Some(EngineBackend::Presidio)
        );
        assert_eq!(EngineBackend::parse("other"), None);
    }

    #[tokio::test]
    async fn test_load_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("piiguard.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "language = \"de\"\nbackend = \"presidio\"\nanalyzer_url = \"http://pii:5002\"\nupload_dir = \"scratch\""
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());

        assert_eq!(settings.language, "de");
        assert_eq!(settings.backend, EngineBackend::Presidio);
        assert_eq!(settings.analyzer_url, "http://pii:5002");
        assert_eq!(settings.upload_dir, dir.path().join("scratch"));
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "ocr_language: deu\nmax_upload_bytes: 1024\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());

        assert_eq!(settings.ocr_language, "deu");
        assert_eq!(settings.max_upload_bytes, 1024);
    }
}
