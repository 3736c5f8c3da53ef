use anyhow::{Context, Result};

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted auth/database project, e.g. `https://xyz.supabase.co`.
    pub supabase_url: String,
    /// Public (anon) project key sent as `apikey` on every hosted-store call.
    pub supabase_anon_key: String,
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Marks the session cookie `Secure`. Enable behind HTTPS.
    pub session_secure_cookie: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            supabase_url: trim_base_url(require_env("SUPABASE_URL")?),
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_api_url: trim_base_url(
                std::env::var("OPENAI_API_URL")
                    .unwrap_or_else(|_| DEFAULT_OPENAI_API_URL.to_string()),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_secure_cookie: std::env::var("SESSION_SECURE_COOKIE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
impl Config {
    /// Config pointing every hosted service at `base_url` (a mock server in tests).
    pub fn for_tests(base_url: &str) -> Self {
        Config {
            supabase_url: base_url.to_string(),
            supabase_anon_key: "anon-key".to_string(),
            openai_api_key: "sk-test".to_string(),
            openai_api_url: base_url.to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            session_secure_cookie: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_base_url_strips_trailing_slashes() {
        assert_eq!(
            trim_base_url("https://abc.supabase.co//".to_string()),
            "https://abc.supabase.co"
        );
        assert_eq!(
            trim_base_url("https://api.openai.com/v1".to_string()),
            "https://api.openai.com/v1"
        );
    }
}
