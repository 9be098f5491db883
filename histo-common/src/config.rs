use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketingConfig {
    #[serde(default = "default_bins")]
    pub bins: usize,
    #[serde(default = "default_log_base")]
    pub log_base: f64,
}

fn default_bins() -> usize {
    10
}
fn default_log_base() -> f64 {
    2.0
}

impl Default for BucketingConfig {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            log_base: default_log_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
    #[serde(default)]
    pub template: Option<String>, // falls back to the stock layout for the sample type when None
}

fn default_bar_width() -> usize {
    50
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
            template: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bucketing: BucketingConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    pub fn config_path() -> PathBuf {
        if let Ok(env_path) = std::env::var("HISTO_CONFIG") {
            return PathBuf::from(env_path); // $HISTO_CONFIG overrides default config path
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("histo")
            .join("config.toml")
    }

    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Missing files are not an error: the defaults apply.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let cfg: Self =
            toml::from_str(&content).map_err(|e| crate::HistoError::Config(e.to_string()))?;
        Ok(cfg)
    }

    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::HistoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
