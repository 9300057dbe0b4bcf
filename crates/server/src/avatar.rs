use std::time::Duration;

use async_trait::async_trait;
use clientele_core::avatar::{AvatarError, AvatarSource};
use clientele_core::config::AvatarConfig;

/// Fetches SVG avatars from an HTTP generator such as ui-avatars.
///
/// Requests are `GET {base_url}?name=<name>&format=svg`. The client carries
/// the configured timeout, and dropping the returned future aborts the
/// request.
#[derive(Clone)]
pub struct HttpAvatarSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAvatarSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.into() })
    }

    pub fn from_config(config: &AvatarConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.base_url.trim(), Duration::from_secs(config.timeout_secs))
    }
}

fn transport_error(error: reqwest::Error) -> AvatarError {
    if error.is_timeout() {
        AvatarError::Timeout
    } else {
        AvatarError::Transport(error.to_string())
    }
}

#[async_trait]
impl AvatarSource for HttpAvatarSource {
    async fn fetch_svg(&self, name: &str) -> Result<String, AvatarError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("name", name), ("format", "svg")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AvatarError::Status(status.as_u16()));
        }

        response.text().await.map_err(transport_error)
    }
}
