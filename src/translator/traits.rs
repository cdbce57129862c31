//! 协议转换器 Trait 定义
//!
//! - `RequestTranslator`: 将前端协议请求转换为后端协议请求
//! - `ResponseTranslator`: 将 CodeWhisperer 流式事件转换为前端格式

use crate::error::{ContentError, ModelNotFoundError, ToolError};
use crate::models::codewhisperer::AssistantResponseEvent;

/// 请求转换器 Trait
///
/// # 类型参数
///
/// - `Input`: 前端请求类型（如 OpenAI ChatCompletionRequest）
/// - `Output`: 后端请求类型（如 CodeWhispererRequest）
/// - `Error`: 转换错误类型
pub trait RequestTranslator {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    fn translate_request(&self, request: Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 响应转换器 Trait
///
/// 将已校验的 `AssistantResponseEvent` 转换为目标前端协议的响应格式。
pub trait ResponseTranslator {
    type Output;

    /// 转换单个事件
    ///
    /// - `Some(output)`: 生成的响应数据
    /// - `None`: 该事件不需要生成输出
    fn translate_event(&mut self, event: &AssistantResponseEvent) -> Option<Self::Output>;

    /// 生成流结束时的最终输出
    fn finalize(&mut self) -> Vec<Self::Output> {
        Vec::new()
    }

    /// 重置转换器状态
    fn reset(&mut self);
}

/// 转换错误类型
#[derive(Debug, Clone)]
pub struct TranslateError {
    pub kind: TranslateErrorKind,
    pub message: String,
    /// 原始数据（用于调试）
    pub source_data: Option<String>,
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TranslateError {}

/// 转换错误类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateErrorKind {
    /// 无效的请求格式
    InvalidRequest,
    /// 不支持的功能
    UnsupportedFeature,
    /// 缺少必要字段
    MissingField,
    /// 模型不存在
    ModelNotFound,
    /// 序列化/反序列化错误
    SerializationError,
}

impl std::fmt::Display for TranslateErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "InvalidRequest"),
            Self::UnsupportedFeature => write!(f, "UnsupportedFeature"),
            Self::MissingField => write!(f, "MissingField"),
            Self::ModelNotFound => write!(f, "ModelNotFound"),
            Self::SerializationError => write!(f, "SerializationError"),
        }
    }
}

impl TranslateError {
    pub fn new(kind: TranslateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_data: None,
        }
    }

    /// 带原始数据创建错误
    pub fn with_source(
        kind: TranslateErrorKind,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source_data: Some(source.into()),
        }
    }
}

impl From<ContentError> for TranslateError {
    fn from(err: ContentError) -> Self {
        let kind = match &err {
            ContentError::Json(_) => TranslateErrorKind::SerializationError,
            ContentError::MissingField { .. } | ContentError::MissingMessageField(_) => {
                TranslateErrorKind::MissingField
            }
            ContentError::UnknownType { .. }
            | ContentError::UnsupportedImageSource { .. }
            | ContentError::UnsupportedMediaType { .. } => TranslateErrorKind::UnsupportedFeature,
            _ => TranslateErrorKind::InvalidRequest,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<ToolError> for TranslateError {
    fn from(err: ToolError) -> Self {
        let kind = match &err {
            ToolError::MissingField { .. } | ToolError::MissingToolName(_) => {
                TranslateErrorKind::MissingField
            }
            _ => TranslateErrorKind::InvalidRequest,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<ModelNotFoundError> for TranslateError {
    fn from(err: ModelNotFoundError) -> Self {
        Self::with_source(TranslateErrorKind::ModelNotFound, err.to_string(), err.to_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_error_display() {
        let err = TranslateError::new(TranslateErrorKind::InvalidRequest, "test error");
        assert_eq!(format!("{}", err), "InvalidRequest: test error");
    }

    #[test]
    fn test_translate_error_with_source() {
        let err = TranslateError::with_source(
            TranslateErrorKind::SerializationError,
            "failed to parse",
            "{invalid json}",
        );
        assert_eq!(err.source_data.as_deref(), Some("{invalid json}"));
    }

    #[test]
    fn test_model_not_found_keeps_envelope() {
        let err: TranslateError = ModelNotFoundError::new("gpt-x", "r1").into();
        assert_eq!(err.kind, TranslateErrorKind::ModelNotFound);
        assert!(err
            .source_data
            .as_deref()
            .unwrap()
            .contains("\"code\":\"model_not_found\""));
    }

    #[test]
    fn test_content_error_kind() {
        let err: TranslateError = ContentError::UnknownType {
            index: 0,
            block_type: "audio".to_string(),
        }
        .into();
        assert_eq!(err.kind, TranslateErrorKind::UnsupportedFeature);
    }
}
