//! 日志管理模块
use crate::config::LoggingConfig;
use anyhow::{anyhow, Context};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::Level;

/// 安装全局 fmt subscriber
///
/// 每个进程只能调用一次，重复调用返回错误。
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .with_context(|| format!("invalid log level `{}`", config.level))?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(config.ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::info!("[LOGGER] logging initialized at {}", level);
    Ok(())
}

/// 脱敏规则：(pattern, replacement)
static SANITIZE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Bearer token
        (r"Bearer\s+[A-Za-z0-9._-]+", "Bearer ***"),
        (
            r#"api[_-]?key["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
            "api_key: ***",
        ),
        (
            r#"access[_-]?token["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
            "access_token: ***",
        ),
        (
            r#"refresh[_-]?token["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
            "refresh_token: ***",
        ),
        // Kiro 的 camelCase 字段
        (
            r#"(?:accessToken|refreshToken)["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
            "token: ***",
        ),
        (r#"\btoken["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#, "token: ***"),
        (
            r#"client[_-]?secret["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
            "client_secret: ***",
        ),
        (r#"password["']?\s*[:=]\s*["']?[^\s"',}]+"#, "password: ***"),
        (
            r#"\bsecret["']?\s*[:=]\s*["']?[A-Za-z0-9._-]+"#,
            "secret: ***",
        ),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
        Ok(re) => Some((re, replacement)),
        Err(e) => {
            tracing::error!("[LOGGER] invalid sanitize pattern {}: {}", pattern, e);
            None
        }
    })
    .collect()
});

/// 日志脱敏，覆盖 token / api key / secret / password 等字段
pub fn sanitize_log_message(message: &str) -> String {
    let mut sanitized = message.to_string();
    for (re, replacement) in SANITIZE_RULES.iter() {
        sanitized = re.replace_all(&sanitized, *replacement).into_owned();
    }
    sanitized
}
