use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::svg::sanitize_svg;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AvatarError {
    #[error("avatar service request failed: {0}")]
    Transport(String),
    #[error("avatar service did not respond in time")]
    Timeout,
    #[error("avatar service responded with status {0}")]
    Status(u16),
    #[error("avatar service returned an empty image")]
    EmptyResponse,
    #[error("avatar service response contained no usable SVG markup")]
    NotSvg,
}

/// Source of raw avatar SVG for a customer name.
#[async_trait]
pub trait AvatarSource: Send + Sync {
    async fn fetch_svg(&self, name: &str) -> Result<String, AvatarError>;
}

/// Fetches the avatar for `name`, sanitizes the untrusted SVG, and encodes it
/// for storage on the customer record.
pub async fn fetch_profile_image(
    source: &dyn AvatarSource,
    name: &str,
) -> Result<String, AvatarError> {
    let raw = source.fetch_svg(name).await?;
    if raw.trim().is_empty() {
        return Err(AvatarError::EmptyResponse);
    }
    let sanitized = sanitize_svg(&raw);
    if sanitized.trim().is_empty() {
        return Err(AvatarError::NotSvg);
    }
    Ok(STANDARD.encode(sanitized.as_bytes()))
}
