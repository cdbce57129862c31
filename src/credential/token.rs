use crate::config::TranslatorConfig;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

fn default_expires_in() -> i64 {
    3600
}

/// Token 刷新响应
///
/// Kiro 返回 camelCase，OAuth 类提供商返回 snake_case，两种都接受。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(alias = "expiresIn", default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(alias = "profileArn", default)]
    pub profile_arn: Option<String>,
    /// 响应里可能回显新的 refresh token，是否采用由调用方决定
    #[serde(alias = "refreshToken", default)]
    pub refresh_token: Option<String>,
    #[serde(alias = "tokenType", default)]
    pub token_type: Option<String>,
}

/// 凭证令牌
///
/// 只通过整体替换更新：刷新后得到新值，不做部分修改。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialToken {
    pub access_token: String,
    pub refresh_token: String,
    /// RFC 3339
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl CredentialToken {
    /// 由刷新响应和调用方持有的 refresh token 构建
    pub fn from_refresh(response: RefreshResponse, refresh_token: impl Into<String>) -> Self {
        Self::from_refresh_at(response, refresh_token, Utc::now())
    }

    pub fn from_refresh_at(
        response: RefreshResponse,
        refresh_token: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = expiry_after(now, response.expires_in);
        tracing::debug!("[CREDENTIAL] token refreshed, expires at {}", expires_at.to_rfc3339());
        Self {
            access_token: response.access_token,
            refresh_token: refresh_token.into(),
            expires_at,
            profile_arn: response.profile_arn,
            token_type: response.token_type,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// 提前 `skew_secs` 秒视为即将过期（默认提前 5 分钟刷新）
    pub fn is_expiring_soon(&self, now: DateTime<Utc>, skew_secs: i64) -> bool {
        match Duration::try_seconds(skew_secs).and_then(|skew| now.checked_add_signed(skew)) {
            Some(deadline) => deadline >= self.expires_at,
            None => skew_secs > 0,
        }
    }

    /// 按配置的提前量判断是否需要刷新
    pub fn needs_refresh(&self, now: DateTime<Utc>, config: &TranslatorConfig) -> bool {
        self.is_expiring_soon(now, config.expiry_skew_secs)
    }
}

/// `now + expires_in` 秒；负值视为立即过期，溢出时取最大时间
fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    if expires_in < 0 {
        tracing::debug!("[CREDENTIAL] negative expires_in {}, treating as expired", expires_in);
        return now;
    }
    Duration::try_seconds(expires_in)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or_else(|| {
            tracing::warn!("[CREDENTIAL] expires_in {} out of range, clamping", expires_in);
            DateTime::<Utc>::MAX_UTC
        })
}

fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}***")
}

impl std::fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialToken")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .field("profile_arn", &self.profile_arn)
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_camel_case_response() {
        let resp: RefreshResponse = serde_json::from_str(
            r#"{"accessToken":"atk","expiresIn":600,"profileArn":"arn:x","refreshToken":"new"}"#,
        )
        .unwrap();
        let token = CredentialToken::from_refresh_at(resp, "original", t0());
        assert_eq!(token.access_token, "atk");
        assert_eq!(token.refresh_token, "original");
        assert_eq!(token.expires_at, t0() + Duration::seconds(600));
        assert_eq!(token.profile_arn.as_deref(), Some("arn:x"));
    }

    #[test]
    fn test_snake_case_response_default_expiry() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"access_token":"atk","token_type":"Bearer"}"#).unwrap();
        assert_eq!(resp.expires_in, 3600);
        let token = CredentialToken::from_refresh_at(resp, "rt", t0());
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
        assert_eq!(token.expires_at, t0() + Duration::hours(1));
    }

    #[test]
    fn test_expiry_checks() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"a","expiresIn":600}"#).unwrap();
        let token = CredentialToken::from_refresh_at(resp, "rt", t0());

        assert!(!token.is_expired(t0()));
        assert!(!token.is_expired(t0() + Duration::seconds(599)));
        assert!(token.is_expired(t0() + Duration::seconds(600)));

        assert!(!token.is_expiring_soon(t0(), 300));
        assert!(token.is_expiring_soon(t0() + Duration::seconds(300), 300));
    }

    #[test]
    fn test_zero_expiry_is_expired_immediately() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"a","expiresIn":0}"#).unwrap();
        let token = CredentialToken::from_refresh_at(resp, "rt", t0());
        assert!(token.is_expired(t0()));
    }

    #[test]
    fn test_huge_expires_in_clamped() {
        for raw in [
            r#"{"accessToken":"a","expiresIn":9223372036854775807}"#,
            r#"{"accessToken":"a","expiresIn":9000000000000000}"#,
        ] {
            let resp: RefreshResponse = serde_json::from_str(raw).unwrap();
            let token = CredentialToken::from_refresh(resp, "rt");
            assert_eq!(token.expires_at, DateTime::<Utc>::MAX_UTC);
            assert!(!token.is_expired(Utc::now()));
            assert!(!token.is_expiring_soon(Utc::now(), 300));
        }
    }

    #[test]
    fn test_negative_expires_in_is_expired() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"a","expiresIn":-30}"#).unwrap();
        let token = CredentialToken::from_refresh_at(resp, "rt", t0());
        assert_eq!(token.expires_at, t0());
        assert!(token.is_expired(t0()));
    }

    #[test]
    fn test_needs_refresh_uses_config_skew() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"a","expiresIn":600}"#).unwrap();
        let token = CredentialToken::from_refresh_at(resp, "rt", t0());

        let config = TranslatorConfig::default();
        assert!(!token.needs_refresh(t0() + Duration::seconds(299), &config));
        assert!(token.needs_refresh(t0() + Duration::seconds(300), &config));

        let config = TranslatorConfig {
            expiry_skew_secs: 0,
            ..TranslatorConfig::default()
        };
        assert!(!token.needs_refresh(t0() + Duration::seconds(599), &config));
        assert!(!token.is_expiring_soon(t0(), i64::MIN));
    }

    #[test]
    fn test_serde_rfc3339() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"a","expiresIn":60}"#).unwrap();
        let token = CredentialToken::from_refresh_at(resp, "rt", t0());
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["expires_at"], "2025-01-01T00:01:00Z");
        assert!(json.get("profile_arn").is_none());

        let back: CredentialToken = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"aoaSECRETVALUE"}"#).unwrap();
        let token = CredentialToken::from_refresh_at(resp, "rtkSECRETVALUE", t0());
        let debug = format!("{token:?}");
        assert!(!debug.contains("SECRETVALUE"));
        assert!(debug.contains("aoaS***"));
    }
}
