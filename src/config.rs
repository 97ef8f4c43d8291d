use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Explanation and product-suggestion backend.
    pub api_url: String,
    /// Profile data API serving `/api/findOne` and `/api/updateOne`.
    pub data_api_url: String,
    /// Stored session identifier, if any.
    pub client_id: Option<String>,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_url: std::env::var("CREDIT_API_URL")
                .or_else(|_| std::env::var("NEXT_PUBLIC_API_URL"))
                .map_err(|_| {
                    anyhow::anyhow!(
                        "CREDIT_API_URL or NEXT_PUBLIC_API_URL environment variable required"
                    )
                })
                .and_then(|url| validate_base_url("CREDIT_API_URL", &url))?,
            data_api_url: std::env::var("DATA_API_URL")
                .map_err(|_| anyhow::anyhow!("DATA_API_URL environment variable required"))
                .and_then(|url| validate_base_url("DATA_API_URL", &url))?,
            client_id: std::env::var("CLIENT_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a positive number"))?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Credit API URL: {}", config.api_url);
        tracing::debug!("Data API URL: {}", config.data_api_url);
        tracing::debug!(
            "Stored client id present: {}",
            config.client_id.is_some()
        );
        tracing::debug!("HTTP timeout: {}s", config.http_timeout_secs);

        Ok(config)
    }
}

/// Checks that `raw` is a non-empty http(s) URL and strips trailing slashes.
pub fn validate_base_url(name: &str, raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    let parsed =
        Url::parse(trimmed).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let url = validate_base_url("CREDIT_API_URL", "http://localhost:5000/").unwrap();
        assert_eq!(url, "http://localhost:5000");
    }

    #[test]
    fn test_base_url_rejects_empty_and_bad_scheme() {
        assert!(validate_base_url("DATA_API_URL", "   ").is_err());
        assert!(validate_base_url("DATA_API_URL", "ftp://example.com").is_err());
        assert!(validate_base_url("DATA_API_URL", "not a url").is_err());
    }
}
