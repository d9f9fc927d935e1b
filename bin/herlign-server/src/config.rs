//! Server configuration, loaded from environment variables at startup.

use herlign_core::RateLimitConfig;

/// Runtime configuration for herlign-server.
///
/// Every field has a default so the server boots without any environment
/// variables set; the chat bot simply answers with the fallback text until a
/// completion API key is provided.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// sqlx SQLite URL (default: `"sqlite://herlign.db?mode=rwc"`).
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated CORS origins; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Mount `/swagger-ui` and `/api-docs/openapi.json`.
    pub enable_swagger: bool,

    /// Salt mixed into guest IP hashes.
    pub ip_hash_salt: String,

    /// Days a guest chat session lives before the cleanup job removes it.
    pub session_ttl_days: i64,

    /// Hours an admin bearer token stays valid.
    pub admin_token_ttl_hours: i64,

    /// Bootstrap admin created on startup when both are set and the email is unknown.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,

    /// Shared secret required by the cleanup endpoint, when set.
    pub cron_secret: Option<String>,

    /// Directory uploaded media is written to and served from.
    pub media_dir: String,

    /// Prefix used to build public media URLs.
    pub public_base_url: String,

    pub completion: CompletionConfig,

    pub youtube: YouTubeConfig,

    pub rate_limits: RateLimits,

    /// Seconds between sweeps of expired rate-limit windows.
    pub rate_limit_sweep_secs: u64,
}

/// Which completion provider to call, picked from the API keys present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionProvider {
    OpenAi { api_key: String },
    Gemini { api_key: String },
    DeepSeek { api_key: String },
    Disabled,
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub provider: CompletionProvider,
    pub timeout_secs: u64,
}

/// Credentials for the podcast sync. Both must be set for it to run.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: Option<String>,
    pub channel_id: Option<String>,
    /// Data API root, default `https://www.googleapis.com/youtube/v3`.
    pub api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub chat: RateLimitConfig,
    pub auth: RateLimitConfig,
    pub upload: RateLimitConfig,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            chat: RateLimitConfig::CHAT,
            auth: RateLimitConfig::AUTH,
            upload: RateLimitConfig::UPLOAD,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("HERLIGN_BIND", "0.0.0.0:3000"),
            database_url: env_or("HERLIGN_DATABASE_URL", "sqlite://herlign.db?mode=rwc"),
            log_level: env_or("HERLIGN_LOG", "info"),
            log_json: env_flag("HERLIGN_LOG_JSON", false),
            cors_allowed_origins: env_opt("HERLIGN_CORS_ORIGINS"),
            enable_swagger: env_flag("HERLIGN_ENABLE_SWAGGER", true),
            ip_hash_salt: env_or("HERLIGN_IP_HASH_SALT", ""),
            session_ttl_days: parse_env("HERLIGN_SESSION_TTL_DAYS", 30),
            admin_token_ttl_hours: parse_env("HERLIGN_ADMIN_TOKEN_TTL_HOURS", 24),
            admin_email: env_opt("HERLIGN_ADMIN_EMAIL"),
            admin_password: env_opt("HERLIGN_ADMIN_PASSWORD"),
            cron_secret: env_opt("HERLIGN_CRON_SECRET"),
            media_dir: env_or("HERLIGN_MEDIA_DIR", "./media"),
            public_base_url: env_or("HERLIGN_PUBLIC_BASE_URL", "http://localhost:3000"),
            completion: CompletionConfig {
                provider: provider_from_keys(
                    env_opt("OPENAI_API_KEY"),
                    env_opt("GEMINI_API_KEY"),
                    env_opt("DEEPSEEK_API_KEY"),
                ),
                timeout_secs: parse_env("HERLIGN_COMPLETION_TIMEOUT_SECS", 30),
            },
            youtube: YouTubeConfig {
                api_key: env_opt("HERLIGN_YOUTUBE_API_KEY"),
                channel_id: env_opt("HERLIGN_YOUTUBE_CHANNEL_ID"),
                api_url: env_or("HERLIGN_YOUTUBE_API_URL", "https://www.googleapis.com/youtube/v3"),
                timeout_secs: parse_env("HERLIGN_YOUTUBE_TIMEOUT_SECS", 30),
            },
            rate_limits: RateLimits {
                chat: rate_env("HERLIGN_RATE_CHAT", RateLimitConfig::CHAT),
                auth: rate_env("HERLIGN_RATE_AUTH", RateLimitConfig::AUTH),
                upload: rate_env("HERLIGN_RATE_UPLOAD", RateLimitConfig::UPLOAD),
            },
            rate_limit_sweep_secs: parse_env("HERLIGN_RATE_SWEEP_SECS", 300),
        }
    }

    /// Defaults with an in-memory database, for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            bind_address: "127.0.0.1:0".into(),
            database_url: "sqlite::memory:".into(),
            log_level: "debug".into(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: false,
            ip_hash_salt: "test-salt".into(),
            session_ttl_days: 30,
            admin_token_ttl_hours: 24,
            admin_email: None,
            admin_password: None,
            cron_secret: None,
            media_dir: std::env::temp_dir()
                .join(format!("herlign-media-{}", uuid::Uuid::new_v4()))
                .to_string_lossy()
                .into_owned(),
            public_base_url: "http://localhost:3000".into(),
            completion: CompletionConfig {
                provider: CompletionProvider::Disabled,
                timeout_secs: 5,
            },
            youtube: YouTubeConfig {
                api_key: None,
                channel_id: None,
                api_url: "http://127.0.0.1:9".into(),
                timeout_secs: 5,
            },
            rate_limits: RateLimits::default(),
            rate_limit_sweep_secs: 300,
        }
    }
}

/// OpenAI wins over Gemini, Gemini over DeepSeek.
pub fn provider_from_keys(
    openai: Option<String>,
    gemini: Option<String>,
    deepseek: Option<String>,
) -> CompletionProvider {
    if let Some(api_key) = openai {
        CompletionProvider::OpenAi { api_key }
    } else if let Some(api_key) = gemini {
        CompletionProvider::Gemini { api_key }
    } else if let Some(api_key) = deepseek {
        CompletionProvider::DeepSeek { api_key }
    } else {
        CompletionProvider::Disabled
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn rate_env(key: &str, default: RateLimitConfig) -> RateLimitConfig {
    std::env::var(key)
        .ok()
        .and_then(|v| RateLimitConfig::parse(&v))
        .unwrap_or(default)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn provider_priority() {
        let p = provider_from_keys(Some("o".into()), Some("g".into()), Some("d".into()));
        assert_eq!(p, CompletionProvider::OpenAi { api_key: "o".into() });
        let p = provider_from_keys(None, Some("g".into()), Some("d".into()));
        assert_eq!(p, CompletionProvider::Gemini { api_key: "g".into() });
        let p = provider_from_keys(None, None, Some("d".into()));
        assert_eq!(p, CompletionProvider::DeepSeek { api_key: "d".into() });
        assert_eq!(provider_from_keys(None, None, None), CompletionProvider::Disabled);
    }
}
