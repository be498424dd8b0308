/// Optional JWT bearer gate for the prediction surfaces.
///
/// When no secret is configured (development) every request passes. When a
/// secret is set, requests must carry a valid HS256 bearer token.
use crate::error::{AppError, Result};
use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

pub fn require_bearer(req: &HttpRequest, jwt_secret: Option<&str>) -> Result<()> {
    let Some(secret) = jwt_secret else {
        return Ok(());
    };

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("missing bearer token".to_string()))?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| AppError::Authentication("invalid bearer token".to_string()))?;

    tracing::debug!(subject = %data.claims.sub, "authorized request");
    Ok(())
}
