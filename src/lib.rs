//! ProxyCast 协议转换层
//!
//! 在 OpenAI、Anthropic 与 CodeWhisperer (Kiro) 三种方言之间转换
//! 对话请求和流式响应事件。纯值转换，不做任何网络 I/O。
//!
//! - `models`: 线上结构与规范模型
//! - `converter`: 内容、工具、用量的规范转换
//! - `translator`: 请求/响应转换器与 `assistantResponseEvent` 编解码
//! - `credential`: 凭证令牌
//! - `config` / `logger`: 配置与日志

pub mod config;
pub mod converter;
pub mod credential;
pub mod error;
pub mod logger;
pub mod models;
pub mod translator;

pub use config::{ConfigError, LoggingConfig, TranslatorConfig};
pub use credential::{CredentialToken, RefreshResponse};
pub use error::{
    ContentError, EventValidationError, ModelNotFoundError, ToolError, ValidationFailure,
};
pub use models::canonical::{
    ChatRequest, ContentBlock, ImageMediaType, ImageSource, Message, Role, ToolChoice,
    ToolDefinition, ToolResultContent, Usage,
};
pub use models::codewhisperer::AssistantResponseEvent;
pub use models::Dialect;
pub use translator::{RequestTranslator, ResponseTranslator, TranslateError, TranslateErrorKind};
