/*
 * Responsibility
 * - 環境変数や設定の読み込み (REDIS_URL, token secret, rate limit など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Per route-group limit: `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u64,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub redis_url: String,

    // HMAC secret shared with the token issuer
    pub access_token_secret: String,
    pub access_token_key_prefix: String,
    pub access_token_leeway_seconds: u64,

    pub rate_limit: RateLimitConfig,
    pub trust_proxy_headers: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("access_token_key_prefix", &self.access_token_key_prefix)
            .field("access_token_leeway_seconds", &self.access_token_leeway_seconds)
            .field("rate_limit", &self.rate_limit)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or("PORT", std::env::var("PORT").ok(), 3000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let redis_url = std::env::var("REDIS_URL").map_err(|_| ConfigError::Missing("REDIS_URL"))?;

        let access_token_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?;
        if access_token_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("ACCESS_TOKEN_SECRET"));
        }

        let access_token_key_prefix = std::env::var("ACCESS_TOKEN_KEY_PREFIX")
            .unwrap_or_else(|_| "access_token".to_string());

        let access_token_leeway_seconds: u64 = parse_or(
            "ACCESS_TOKEN_LEEWAY_SECONDS",
            std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS").ok(),
            60,
        )?;

        let max_requests: u64 = parse_or(
            "RATE_LIMIT_MAX_REQUESTS",
            std::env::var("RATE_LIMIT_MAX_REQUESTS").ok(),
            60,
        )?;

        let window_seconds: u64 = parse_or(
            "RATE_LIMIT_WINDOW_SECONDS",
            std::env::var("RATE_LIMIT_WINDOW_SECONDS").ok(),
            60,
        )?;
        if window_seconds == 0 {
            return Err(ConfigError::Invalid("RATE_LIMIT_WINDOW_SECONDS"));
        }

        let trust_proxy_headers = std::env::var("TRUST_PROXY_HEADERS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            addr,
            app_env,
            redis_url,
            access_token_secret,
            access_token_key_prefix,
            access_token_leeway_seconds,
            rate_limit: RateLimitConfig::new(max_requests, Duration::from_secs(window_seconds)),
            trust_proxy_headers,
        })
    }
}

// Unset falls back to `default`; set but unparsable is a startup error.
fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_value_uses_default() {
        assert_eq!(parse_or::<u64>("RATE_LIMIT_MAX_REQUESTS", None, 60).unwrap(), 60);
    }

    #[test]
    fn set_value_is_parsed() {
        let port: u16 = parse_or("PORT", Some("8080".into()), 3000).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn unparsable_value_is_rejected() {
        let err = parse_or::<u64>("RATE_LIMIT_MAX_REQUESTS", Some("6O".into()), 60).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("RATE_LIMIT_MAX_REQUESTS")));

        let err = parse_or::<u16>("PORT", Some("70000".into()), 3000).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("PORT")));

        let err = parse_or::<u64>("ACCESS_TOKEN_LEEWAY_SECONDS", Some("".into()), 60).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS")));
    }
}
