//! Token 用量在两套命名之间的转换
//!
//! - prompt/completion/total（OpenAI）
//! - input/output（Anthropic），不携带 total
//!
//! 转换到 prompt/completion 时对两套字段求和。若同一个值上两套字段
//! 都被填充，会重复计数；目前保留这一行为，调用方需保证每个值只
//! 使用一套命名。

use crate::models::canonical::Usage;

impl Usage {
    /// prompt/completion 方言
    pub fn prompt_completion(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            ..Self::default()
        }
    }

    /// input/output 方言
    pub fn input_output(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
            ..Self::default()
        }
    }

    /// 总量：显式给出时直接使用，否则推导
    pub fn total(&self) -> u32 {
        self.total_tokens.unwrap_or_else(|| derive_total(self))
    }
}

fn derive_total(usage: &Usage) -> u32 {
    let prompt_side = usage
        .prompt_tokens
        .unwrap_or(0)
        .saturating_add(usage.completion_tokens.unwrap_or(0));
    if prompt_side != 0 {
        prompt_side
    } else {
        usage
            .input_tokens
            .unwrap_or(0)
            .saturating_add(usage.output_tokens.unwrap_or(0))
    }
}

/// 转换为 input/output 方言：input = prompt，output = completion
pub fn to_input_output_dialect(usage: &Usage) -> Usage {
    Usage::input_output(
        usage.prompt_tokens.unwrap_or(0),
        usage.completion_tokens.unwrap_or(0),
    )
}

/// 转换为 prompt/completion 方言
///
/// prompt = prompt + input，completion = completion + output；
/// total 取 prompt + completion（源值上的），为零时取 input + output。
pub fn to_prompt_completion_dialect(usage: &Usage) -> Usage {
    let prompt = usage
        .prompt_tokens
        .unwrap_or(0)
        .saturating_add(usage.input_tokens.unwrap_or(0));
    let completion = usage
        .completion_tokens
        .unwrap_or(0)
        .saturating_add(usage.output_tokens.unwrap_or(0));

    if usage.prompt_tokens.is_some() && usage.input_tokens.is_some() {
        tracing::debug!(
            "[USAGE] both naming conventions populated, summing prompt={:?} input={:?}",
            usage.prompt_tokens,
            usage.input_tokens
        );
    }

    Usage {
        prompt_tokens: Some(prompt),
        completion_tokens: Some(completion),
        total_tokens: Some(derive_total(usage)),
        input_tokens: None,
        output_tokens: None,
    }
}
