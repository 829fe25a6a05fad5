//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Index configuration / 索引配置
    #[serde(default)]
    pub index: IndexConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Index configuration / 索引配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Root directory, one sub-directory per index / 索引根目录
    pub data_dir: String,
    /// Index created at startup, `null` to skip / 启动时创建的默认索引
    pub default_index: Option<String>,
    /// Writer memory budget per index / 每个索引的写入内存
    pub writer_heap_bytes: usize,
    pub writer_threads: usize,
    /// Hits sampled by range distribution / 区间分布抽样数
    pub range_sample_size: usize,
    /// Upper bound for `from + size` / 分页窗口上限
    pub max_result_window: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            default_index: Some("default".to_string()),
            writer_heap_bytes: 50_000_000,
            writer_threads: 1,
            range_sample_size: crate::search::DEFAULT_RANGE_SAMPLE,
            max_result_window: 10_000,
        }
    }
}

impl AppConfig {
    /// Get the full data directory path / 获取完整的数据目录路径
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.index.data_dir)
    }

    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists
/// 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    load_config_from(&get_config_path())
}

pub fn load_config_from(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config(&config, config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig, config_path: &Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = load_config_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.index.default_index.as_deref(), Some("default"));
        assert_eq!(config.index.range_sample_size, 10_000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"index":{"data_dir":"/tmp/idx","default_index":null}}"#).unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.get_data_dir(), PathBuf::from("/tmp/idx"));
        assert_eq!(config.index.default_index, None);
        assert_eq!(config.index.writer_threads, 1);
        assert_eq!(config.get_bind_address(), "0.0.0.0:8080");
    }
}
