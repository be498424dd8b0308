use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub artifacts: ArtifactConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Local artifact directory, used when no registry URL is configured.
    pub local_dir: String,
    /// Remote model registry base URL. Takes precedence over `local_dir`.
    pub registry_url: Option<String>,
    pub registry_token: Option<String>,
    pub fetch_timeout_secs: u64,
    pub fetch_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// When set, /predict, /explain, /reference and /model/info require a
    /// valid HS256 bearer token. Unset means open access (development).
    pub jwt_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid u16"),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "pricing-service".to_string()),
            },
            artifacts: ArtifactConfig {
                local_dir: env::var("ARTIFACT_DIR").unwrap_or_else(|_| "model".to_string()),
                registry_url: env::var("MODEL_REGISTRY_URL").ok(),
                registry_token: env::var("MODEL_REGISTRY_TOKEN").ok(),
                fetch_timeout_secs: env::var("ARTIFACT_FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("ARTIFACT_FETCH_TIMEOUT_SECS must be a valid u64"),
                fetch_retries: env::var("ARTIFACT_FETCH_RETRIES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("ARTIFACT_FETCH_RETRIES must be a valid u32"),
                retry_backoff_ms: env::var("ARTIFACT_RETRY_BACKOFF_MS")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()
                    .expect("ARTIFACT_RETRY_BACKOFF_MS must be a valid u64"),
            },
            auth: AuthConfig {
                jwt_secret: env::var("AUTH_JWT_SECRET").ok(),
            },
        })
    }
}
