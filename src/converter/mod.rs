//! 规范模型转换
//!
//! - `content`: 消息内容（字符串 / 内容块）
//! - `tools`: 工具定义与 tool_choice
//! - `usage`: Token 用量命名转换

pub mod content;
pub mod tools;
pub mod usage;

pub use content::{decode_content, decode_content_str, decode_message, encode_content, encode_message};
pub use tools::{
    from_canonical_tool, from_canonical_tool_choice, to_canonical_tool, to_canonical_tool_choice,
};
pub use usage::{to_input_output_dialect, to_prompt_completion_dialect};
