//! 协议转换层
//!
//! 处理 OpenAI、Anthropic 前端协议与 Kiro/CodeWhisperer 后端之间的
//! 请求和响应格式转换。
//!
//! # 架构设计
//!
//! ```text
//! translator/
//! ├── traits.rs              # 转换器 trait 定义
//! └── kiro/                  # Kiro/CodeWhisperer 后端
//!     ├── event.rs           # assistantResponseEvent 解码/校验/编码
//!     ├── request.rs         # ChatRequest → CodeWhispererRequest
//!     ├── openai.rs          # OpenAI 请求解码 + 事件 → OpenAI chunk
//!     └── anthropic.rs       # Anthropic 请求解码 + 事件 → Anthropic SSE
//! ```
//!
//! # 使用示例
//!
//! ```ignore
//! use proxycast_translate::config::TranslatorConfig;
//! use proxycast_translate::translator::kiro::AnthropicRequestTranslator;
//! use proxycast_translate::translator::traits::RequestTranslator;
//!
//! let translator = AnthropicRequestTranslator::new(TranslatorConfig::default());
//! let cw_request = translator.translate_request(anthropic_request)?;
//!
//! for frame in frames {
//!     let event = AssistantResponseEvent::from_value(&frame);
//!     if event.validate().is_ok() {
//!         // 转换为前端格式
//!     }
//! }
//! ```

pub mod kiro;
pub mod traits;

pub use kiro::{
    AnthropicRequestTranslator, AnthropicResponseTranslator, OpenAiRequestTranslator,
    OpenAiResponseTranslator,
};
pub use traits::{RequestTranslator, ResponseTranslator, TranslateError, TranslateErrorKind};
