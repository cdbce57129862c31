//! Kiro/CodeWhisperer 后端协议转换
//!
//! # 调用链
//!
//! ## OpenAI 协议
//! ```text
//! OpenAI ChatCompletionRequest
//!   → [openai.rs] decode_openai_request
//!   → ChatRequest
//!   → [request.rs] build_codewhisperer_request
//!   → CodeWhispererRequest
//!   → (传输层) assistantResponseEvent 帧
//!   → [event.rs] decode_stream_event + validate_event
//!   → [openai.rs] OpenAiResponseTranslator
//!   → ChatCompletionChunk
//! ```
//!
//! ## Anthropic 协议
//! ```text
//! Anthropic MessagesRequest
//!   → [anthropic.rs] decode_anthropic_request
//!   → ChatRequest
//!   → [request.rs] build_codewhisperer_request
//!   → CodeWhispererRequest
//!   → (传输层) assistantResponseEvent 帧
//!   → [event.rs] decode_stream_event + validate_event
//!   → [anthropic.rs] AnthropicResponseTranslator
//!   → Anthropic SSE
//! ```

pub mod anthropic;
pub mod event;
pub mod openai;
pub mod request;

pub use anthropic::{decode_anthropic_request, AnthropicRequestTranslator, AnthropicResponseTranslator};
pub use event::{
    decode_event, decode_event_str, decode_stream_event, encode_event, validate_event,
};
pub use openai::{decode_openai_request, OpenAiRequestTranslator, OpenAiResponseTranslator};
pub use request::build_codewhisperer_request;
