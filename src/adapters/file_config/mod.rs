// File config adapter - Loads the pipeline configuration from YAML or TOML files

use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{ConfigError, ConfigResult};

/// Config files searched when none is given explicitly
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = ["config.yaml", "config.yml", "cartoonizer.toml"];

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// File configuration adapter
pub struct FileConfigAdapter;

impl FileConfigAdapter {
    /// Load a config file; keys it omits keep their defaults
    pub fn load(path: &Path) -> ConfigResult<PipelineConfig> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content, format).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse config text in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<PipelineConfig, String> {
        if content.trim().is_empty() {
            return Ok(PipelineConfig::default());
        }
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// First default config file present in the working directory
    pub fn discover() -> Option<PathBuf> {
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_legacy_yaml_keys() {
        let yaml = r#"
run_local: false
gpu: true
colab-mode: false
original_frame_rate: true
output_frame_rate: 24
resize-dim: 854
trim-video: true
trim-video-length: 3
original_resolution: false
"#;
        let config = FileConfigAdapter::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert!(!config.run_local);
        assert!(config.gpu);
        assert!(config.original_frame_rate);
        assert_eq!(config.output_frame_rate, "24");
        assert_eq!(config.resize_width, 854);
        assert!(config.trim_video);
        assert_eq!(config.trim_length_secs, 3);
        assert_eq!(config.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
run_local = true
output_frame_rate = "30000/1001"
resize_width = 1280
work_dir = "/var/cartoonizer"
process_timeout_secs = 0
"#;
        let config = FileConfigAdapter::parse(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.output_frame_rate, "30000/1001");
        assert_eq!(config.resize_width, 1280);
        assert_eq!(config.work_dir, PathBuf::from("/var/cartoonizer"));
        assert_eq!(config.process_timeout(), None);
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = FileConfigAdapter::parse("  \n", ConfigFormat::Yaml).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.YAML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("c.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("c.json")).is_err());
    }

    #[test]
    fn test_load_reports_missing_and_malformed_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FileConfigAdapter::load(&dir.path().join("absent.yaml")),
            Err(ConfigError::FileNotFound { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "resize_width = \"wide\"").unwrap();
        assert!(matches!(
            FileConfigAdapter::load(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }
}
