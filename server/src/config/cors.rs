use axum::http::{header, HeaderName, HeaderValue, Method};
use std::env;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::extractors::auth::{USER_ID_HEADER, USER_NAME_HEADER, USER_ROLE_HEADER};

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

pub fn create_cors_layer() -> CorsLayer {
    let origins = env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string());
    cors_layer_for(&origins)
}

fn cors_layer_for(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_NAME_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
        ])
        .expose_headers([header::CONTENT_LENGTH, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS));

    let allowed = parse_origins(origins);
    if allowed.is_empty() {
        tracing::warn!(
            "CORS: No valid origins configured, using permissive settings for development"
        );
        // Credentials cannot be combined with a wildcard origin.
        layer.allow_origin(AllowOrigin::any())
    } else {
        tracing::info!("CORS: Configured with {} allowed origin(s)", allowed.len());
        layer
            .allow_origin(AllowOrigin::list(allowed))
            .allow_credentials(true)
    }
}

fn parse_origins(origins: &str) -> Vec<HeaderValue> {
    origins
        .split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(value) => {
                    tracing::debug!("CORS: Allowing origin: {}", trimmed);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origins_are_valid() {
        assert_eq!(parse_origins(DEFAULT_ALLOWED_ORIGINS).len(), 2);
    }

    #[test]
    fn test_blank_and_invalid_origins_are_skipped() {
        let parsed = parse_origins(" ,http://localhost:3000, bad\norigin ,");
        assert_eq!(parsed, vec![HeaderValue::from_static("http://localhost:3000")]);
    }

    #[test]
    fn test_empty_configuration_builds_permissive_layer() {
        let _layer = cors_layer_for("");
        let _layer = cors_layer_for(DEFAULT_ALLOWED_ORIGINS);
    }
}
