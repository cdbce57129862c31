//! 转换层配置
//!
//! YAML 格式，所有字段都有默认值：
//!
//! ```yaml
//! logging:
//!   level: debug
//! max_tools: 50
//! models:
//!   claude-sonnet-4-5: CLAUDE_SONNET_4_5_20250929_V1_0
//! ```

use crate::error::ModelNotFoundError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace / debug / info / warn / error
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

/// Kiro 模型映射表（客户端模型名 → CodeWhisperer 模型 ID）
pub fn default_model_map() -> IndexMap<String, String> {
    [
        // Opus 4.5 系列
        ("claude-opus-4-5", "claude-opus-4.5"),
        ("claude-opus-4-5-20251101", "claude-opus-4.5"),
        // Haiku 4.5 系列
        ("claude-haiku-4-5", "claude-haiku-4.5"),
        ("claude-haiku-4-5-20251001", "claude-haiku-4.5"),
        // Sonnet 4.5 系列
        ("claude-sonnet-4-5", "CLAUDE_SONNET_4_5_20250929_V1_0"),
        ("claude-sonnet-4-5-20250929", "CLAUDE_SONNET_4_5_20250929_V1_0"),
        // Sonnet 4 系列
        ("claude-sonnet-4-20250514", "CLAUDE_SONNET_4_20250514_V1_0"),
        // Sonnet 3.7/3.5 系列（兼容旧版本）
        ("claude-3-7-sonnet-20250219", "CLAUDE_3_7_SONNET_20250219_V1_0"),
        ("claude-3-5-sonnet-20241022", "CLAUDE_3_7_SONNET_20250219_V1_0"),
        ("claude-3-5-sonnet-latest", "CLAUDE_3_7_SONNET_20250219_V1_0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub logging: LoggingConfig,
    pub models: IndexMap<String, String>,
    /// 单次请求最多携带的标准工具数
    pub max_tools: usize,
    /// 工具描述的最大字符数（超出部分截断并以 `...` 结尾）
    pub max_tool_description_chars: usize,
    pub origin: String,
    pub chat_trigger_type: String,
    /// 提前判定 token 即将过期的秒数
    pub expiry_skew_secs: i64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            models: default_model_map(),
            max_tools: 50,
            max_tool_description_chars: 500,
            origin: "AI_EDITOR".to_string(),
            chat_trigger_type: "MANUAL".to_string(),
            expiry_skew_secs: 300,
        }
    }
}

impl TranslatorConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::info!(
            "[CONFIG] loaded {:?}: {} model mappings",
            path,
            config.models.len()
        );
        Ok(config)
    }

    /// 查找客户端模型对应的 CodeWhisperer 模型 ID
    pub fn resolve_model(&self, model: &str, request_id: &str) -> Result<&str, ModelNotFoundError> {
        self.models
            .get(model)
            .map(String::as_str)
            .ok_or_else(|| ModelNotFoundError::new(model, request_id))
    }

    /// 支持的客户端模型名，按配置顺序
    pub fn supported_models(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TranslatorConfig::default();
        assert_eq!(config.max_tools, 50);
        assert_eq!(config.max_tool_description_chars, 500);
        assert_eq!(config.supported_models()[0], "claude-opus-4-5");
        assert_eq!(
            config.resolve_model("claude-sonnet-4-5", "r").unwrap(),
            "CLAUDE_SONNET_4_5_20250929_V1_0"
        );
    }

    #[test]
    fn test_unknown_model_is_lookup_failure() {
        let config = TranslatorConfig::default();
        let err = config.resolve_model("gpt-4o", "req-1").unwrap_err();
        assert_eq!(err.model, "gpt-4o");
        assert_eq!(err.request_id, "req-1");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = TranslatorConfig::from_yaml_str(
            "logging:\n  level: debug\nmax_tools: 8\nmodels:\n  my-model: CW_MODEL\n",
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.ansi);
        assert_eq!(config.max_tools, 8);
        assert_eq!(config.origin, "AI_EDITOR");
        assert_eq!(config.supported_models(), vec!["my-model"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tool_description_chars: 64").unwrap();
        let config = TranslatorConfig::load(file.path()).unwrap();
        assert_eq!(config.max_tool_description_chars, 64);
    }

    #[test]
    fn test_load_missing_file() {
        let err = TranslatorConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            TranslatorConfig::from_yaml_str("max_tools: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}
