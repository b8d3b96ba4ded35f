//! 连接配置
//!
//! 从 TOML 文件加载连接参数，并支持环境变量覆盖。

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析配置文件失败: {0}")]
    Parse(String),

    /// 验证错误
    #[error("配置验证失败: {0}")]
    Validation(String),

    /// 环境变量错误
    #[error("环境变量解析失败: {0}")]
    EnvVar(String),
}

/// 配置 Result 类型
pub type Result<T> = std::result::Result<T, ConfigError>;

/// 连接配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// 每个连接的发送缓冲区上限（字节），排队未被对端读取的数据超过它时发送失败
    #[serde(default = "default_max_send_buffer_size")]
    pub max_send_buffer_size: usize,

    /// 单次发送的数据包上限（字节）
    #[serde(default = "default_max_package_size")]
    pub max_package_size: usize,

    /// 进程内传输报告的本地地址
    #[serde(default = "default_local_address")]
    pub local_address: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_send_buffer_size: default_max_send_buffer_size(),
            max_package_size: default_max_package_size(),
            local_address: default_local_address(),
        }
    }
}

impl ConnectionConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 从 TOML 字符串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 从环境变量加载配置并覆盖
    ///
    /// 支持的环境变量：
    /// - SOCKLINE_MAX_SEND_BUFFER_SIZE: 发送缓冲区上限
    /// - SOCKLINE_MAX_PACKAGE_SIZE: 数据包上限
    /// - SOCKLINE_LOCAL_ADDRESS: 本地地址
    pub fn load_with_env_override(mut self) -> Result<Self> {
        if let Ok(size) = std::env::var("SOCKLINE_MAX_SEND_BUFFER_SIZE") {
            self.max_send_buffer_size = size.parse().map_err(|_| {
                ConfigError::EnvVar(
                    "SOCKLINE_MAX_SEND_BUFFER_SIZE 必须是有效的 usize 数字".to_string(),
                )
            })?;
        }

        if let Ok(size) = std::env::var("SOCKLINE_MAX_PACKAGE_SIZE") {
            self.max_package_size = size.parse().map_err(|_| {
                ConfigError::EnvVar("SOCKLINE_MAX_PACKAGE_SIZE 必须是有效的 usize 数字".to_string())
            })?;
        }

        if let Ok(addr) = std::env::var("SOCKLINE_LOCAL_ADDRESS") {
            self.local_address = addr;
        }

        Ok(self)
    }

    /// 从文件加载并应用环境变量覆盖
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file(path)?.load_with_env_override()
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.max_send_buffer_size == 0 {
            return Err(ConfigError::Validation("发送缓冲区上限不能为 0".to_string()));
        }

        if self.max_package_size == 0 {
            return Err(ConfigError::Validation("数据包上限不能为 0".to_string()));
        }

        self.local_addr()?;
        Ok(())
    }

    /// 解析本地地址
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.local_address.parse().map_err(|_| {
            ConfigError::Validation(format!("无效的本地地址: {}", self.local_address))
        })
    }

    /// 获取配置摘要信息
    pub fn summary(&self) -> String {
        format!(
            "Sockline 连接配置:\n  本地地址: {}\n  发送缓冲区上限: {} 字节\n  数据包上限: {} 字节",
            self.local_address, self.max_send_buffer_size, self.max_package_size
        )
    }
}

// 默认值函数
fn default_max_send_buffer_size() -> usize {
    1024 * 1024
}

fn default_max_package_size() -> usize {
    10 * 1024 * 1024
}

fn default_local_address() -> String {
    "127.0.0.1:0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::default();
        assert_eq!(config.max_send_buffer_size, 1_048_576);
        assert_eq!(config.max_package_size, 10_485_760);
        assert_eq!(config.local_address, "127.0.0.1:0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ConnectionConfig::from_toml_str("max_send_buffer_size = 4096").unwrap();
        assert_eq!(config.max_send_buffer_size, 4096);
        assert_eq!(config.max_package_size, 10_485_760);
    }

    #[test]
    fn test_invalid_toml() {
        let result = ConnectionConfig::from_toml_str("max_package_size = \"big\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join("sockline_config_from_file.toml");
        std::fs::write(
            &path,
            "max_package_size = 512\nlocal_address = \"[::1]:7000\"\n",
        )
        .unwrap();

        let config = ConnectionConfig::from_file(&path).unwrap();
        assert_eq!(config.max_package_size, 512);
        assert_eq!(config.local_addr().unwrap().port(), 7000);
        assert!(config.local_addr().unwrap().is_ipv6());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let result = ConnectionConfig::from_file("/nonexistent/sockline.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validate_zero_send_buffer() {
        let config = ConnectionConfig {
            max_send_buffer_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_package_size() {
        let config = ConnectionConfig {
            max_package_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_local_address() {
        let config = ConnectionConfig {
            local_address: "localhost".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // 环境变量为进程级共享状态，所有覆盖场景放在同一个测试里顺序执行
    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("SOCKLINE_MAX_SEND_BUFFER_SIZE", "2048");
            std::env::set_var("SOCKLINE_LOCAL_ADDRESS", "10.0.0.5:9000");
        }
        let config = ConnectionConfig::default().load_with_env_override().unwrap();
        assert_eq!(config.max_send_buffer_size, 2048);
        assert_eq!(config.local_address, "10.0.0.5:9000");

        unsafe {
            std::env::set_var("SOCKLINE_MAX_PACKAGE_SIZE", "invalid");
        }
        let result = ConnectionConfig::default().load_with_env_override();
        assert!(matches!(result, Err(ConfigError::EnvVar(_))));

        unsafe {
            std::env::remove_var("SOCKLINE_MAX_SEND_BUFFER_SIZE");
            std::env::remove_var("SOCKLINE_LOCAL_ADDRESS");
            std::env::remove_var("SOCKLINE_MAX_PACKAGE_SIZE");
        }
    }

    #[test]
    fn test_config_summary() {
        let config = ConnectionConfig::default();
        let summary = config.summary();
        assert!(summary.contains("Sockline 连接配置"));
        assert!(summary.contains("127.0.0.1:0"));
    }
}
