/// Artifact retrieval: local directory or remote model registry.
///
/// Remote fetches carry an explicit request timeout and a small bounded retry
/// count with exponential backoff. Retrieval only happens during startup;
/// nothing on the request path touches this module.
use crate::config::ArtifactConfig;
use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

enum ArtifactSource {
    Local(PathBuf),
    Remote {
        base_url: String,
        token: Option<String>,
        client: reqwest::Client,
        retries: u32,
        backoff: Duration,
    },
}

pub struct ArtifactStore {
    source: ArtifactSource,
}

impl ArtifactStore {
    pub fn from_config(config: &ArtifactConfig) -> Result<Self> {
        let source = match &config.registry_url {
            Some(base_url) => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(config.fetch_timeout_secs))
                    .build()
                    .map_err(|e| AppError::Internal(format!("http client: {}", e)))?;
                ArtifactSource::Remote {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    token: config.registry_token.clone(),
                    client,
                    retries: config.fetch_retries,
                    backoff: Duration::from_millis(config.retry_backoff_ms),
                }
            }
            None => ArtifactSource::Local(PathBuf::from(&config.local_dir)),
        };
        Ok(Self { source })
    }

    /// Fetch one artifact by name, as raw bytes.
    pub async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        match &self.source {
            ArtifactSource::Local(dir) => {
                let path = dir.join(name);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        debug!(artifact = name, bytes = bytes.len(), "loaded local artifact");
                        Ok(bytes)
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(AppError::ArtifactNotFound(name.to_string()))
                    }
                    Err(e) => Err(AppError::Internal(format!(
                        "reading artifact {}: {}",
                        name, e
                    ))),
                }
            }
            ArtifactSource::Remote {
                base_url,
                token,
                client,
                retries,
                backoff,
            } => {
                let url = format!("{}/{}", base_url, name);
                let mut attempt = 0u32;
                loop {
                    let mut request = client.get(&url);
                    if let Some(token) = token {
                        request = request.bearer_auth(token);
                    }

                    match request.send().await {
                        Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => {
                            // Missing on the registry; retrying won't help.
                            return Err(AppError::ArtifactNotFound(name.to_string()));
                        }
                        Ok(resp) if resp.status().is_success() => {
                            let bytes = resp.bytes().await.map_err(|e| {
                                AppError::Internal(format!("reading artifact {}: {}", name, e))
                            })?;
                            debug!(
                                artifact = name,
                                bytes = bytes.len(),
                                "fetched registry artifact"
                            );
                            return Ok(bytes.to_vec());
                        }
                        Ok(resp) if attempt >= *retries => {
                            return Err(AppError::Internal(format!(
                                "fetching artifact {}: registry returned {}",
                                name,
                                resp.status()
                            )));
                        }
                        Err(e) if attempt >= *retries => {
                            return Err(AppError::Internal(format!(
                                "fetching artifact {}: {}",
                                name, e
                            )));
                        }
                        Ok(resp) => {
                            warn!(
                                artifact = name,
                                status = %resp.status(),
                                attempt,
                                "artifact fetch failed, retrying"
                            );
                        }
                        Err(e) => {
                            warn!(artifact = name, error = %e, attempt, "artifact fetch failed, retrying");
                        }
                    }

                    tokio::time::sleep(*backoff * 2u32.saturating_pow(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
