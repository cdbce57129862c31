//! 转换层错误类型
//!
//! - `ContentError`: 核心内容解码失败（致命，指明出错的类型与位置）
//! - `ToolError`: 工具定义 / tool_choice 解码失败
//! - `ModelNotFoundError`: 模型查找失败，输出固定的外部错误结构

use serde::Serialize;
use thiserror::Error;

/// 内容解码错误
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("content must be a string or an array of content blocks, got {0}")]
    InvalidShape(&'static str),

    #[error("content block #{index} is not an object")]
    NotAnObject { index: usize },

    #[error("content block #{index} has no `type` discriminator")]
    MissingType { index: usize },

    #[error("content block #{index} has unsupported type `{block_type}`")]
    UnknownType { index: usize, block_type: String },

    #[error("content block #{index} (`{block_type}`) is missing required field `{field}`")]
    MissingField {
        index: usize,
        block_type: &'static str,
        field: &'static str,
    },

    #[error("content block #{index} has unsupported image source type `{source_type}`, only base64 is accepted")]
    UnsupportedImageSource { index: usize, source_type: String },

    #[error("content block #{index} has unsupported image media type `{media_type}`")]
    UnsupportedMediaType { index: usize, media_type: String },

    #[error("content block #{index} carries a tool_result payload that is neither string, list nor object")]
    InvalidToolResult { index: usize },

    #[error("unsupported message role `{0}`")]
    UnknownRole(String),

    #[error("message is missing required field `{0}`")]
    MissingMessageField(&'static str),
}

/// 工具 / tool_choice 解码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("{dialect} tool definition is not an object")]
    NotAnObject { dialect: crate::models::Dialect },

    #[error("{dialect} tool definition is missing `{field}`")]
    MissingField {
        dialect: crate::models::Dialect,
        field: &'static str,
    },

    #[error("unsupported tool_choice `{0}`")]
    UnknownToolChoice(String),

    #[error("tool_choice object of type `{0}` is missing `name`")]
    MissingToolName(String),
}

/// 流式事件校验失败的单项原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    #[error("event carries no payload and is missing required identifier `{0}`")]
    MissingIdentifier(&'static str),

    #[error("invalid value `{value}` for `{field}`, expected one of {expected}")]
    InvalidEnum {
        field: &'static str,
        value: String,
        expected: String,
    },
}

/// 一次校验中发现的全部失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event validation failed: {}", join_errors(.errors))]
pub struct ValidationFailure {
    pub errors: Vec<EventValidationError>,
}

fn join_errors(errors: &[EventValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationFailure {
    pub fn has_missing_identifier(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, EventValidationError::MissingIdentifier(_)))
    }

    pub fn has_invalid_enum(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, EventValidationError::InvalidEnum { .. }))
    }
}

/// 模型查找失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no available channel for model {model} (request id: {request_id})")]
pub struct ModelNotFoundError {
    pub model: String,
    pub request_id: String,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(rename = "type")]
    error_type: &'a str,
}

impl ModelNotFoundError {
    pub fn new(model: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            request_id: request_id.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        404
    }

    pub fn error_code(&self) -> &'static str {
        "model_not_found"
    }

    pub fn error_type(&self) -> &'static str {
        "new_api_error"
    }

    /// 转换为 JSON 错误响应
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "type": self.error_type()
            }
        })
    }

    /// 字段顺序固定为 code / message / type 的响应体
    pub fn to_body(&self) -> String {
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                error_type: self.error_type(),
            },
        };
        // 仅包含字符串字段，序列化不会失败
        serde_json::to_string(&envelope).unwrap_or_default()
    }
}
