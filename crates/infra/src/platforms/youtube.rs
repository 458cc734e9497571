//! YouTube platform adapter.
//!
//! Maps the generic [`PlatformAdapter`] port onto the YouTube Data API:
//! video listing, privacy status updates, and OAuth refresh grants. Base
//! URLs are injectable so tests can point the adapter at a mock server.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shomer_core::PlatformAdapter;
use shomer_domain::{
    ContentItem, Platform, PlatformToken, Result, ShomerError, Visibility,
};
use tracing::{debug, instrument};

use crate::errors::InfraError;

const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_OAUTH_BASE_URL: &str = "https://oauth2.googleapis.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: u32 = 50;

/// Privacy status used to hide a video.
const HIDDEN_PRIVACY_STATUS: &str = "private";

/// YouTube adapter configuration.
#[derive(Debug, Clone)]
pub struct YouTubeAdapterConfig {
    /// Base URL of the YouTube Data API.
    pub api_base_url: String,
    /// Base URL of the Google OAuth token endpoint.
    pub oauth_base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub request_timeout: Duration,
}

impl YouTubeAdapterConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            oauth_base_url: DEFAULT_OAUTH_BASE_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Point both endpoints at a different host (mock servers in tests).
    pub fn with_base_urls(
        mut self,
        api_base_url: impl Into<String>,
        oauth_base_url: impl Into<String>,
    ) -> Self {
        self.api_base_url = api_base_url.into();
        self.oauth_base_url = oauth_base_url.into();
        self
    }
}

/// reqwest-backed implementation of the YouTube portion of the adapter port.
pub struct YouTubeAdapter {
    client: Client,
    config: YouTubeAdapterConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    status: VideoStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatus {
    privacy_status: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

impl YouTubeAdapter {
    pub fn new(config: YouTubeAdapterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ShomerError::from(InfraError::from(e)))?;
        Ok(Self { client, config })
    }

    fn videos_url(&self) -> String {
        format!("{}/videos", self.config.api_base_url)
    }

    fn token_url(&self) -> String {
        format!("{}/token", self.config.oauth_base_url)
    }
}

fn http_error(err: reqwest::Error) -> ShomerError {
    InfraError::from(err).into()
}

#[async_trait]
impl PlatformAdapter for YouTubeAdapter {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn hidden_visibility(&self) -> Visibility {
        Visibility::new(HIDDEN_PRIVACY_STATUS)
    }

    /// Page through the authenticated channel's uploads.
    #[instrument(skip(self, token))]
    async fn list_content(&self, token: &PlatformToken) -> Result<Vec<ContentItem>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.videos_url())
                .bearer_auth(&token.access_token)
                .query(&[
                    ("part", "status"),
                    ("mine", "true"),
                    ("maxResults", &PAGE_SIZE.to_string()),
                ]);
            if let Some(ref page) = page_token {
                request = request.query(&[("pageToken", page.as_str())]);
            }

            let page: VideoListResponse = request
                .send()
                .await
                .map_err(http_error)?
                .error_for_status()
                .map_err(http_error)?
                .json()
                .await
                .map_err(http_error)?;

            items.extend(page.items.into_iter().map(|video| ContentItem {
                id: video.id,
                visibility: Visibility::new(video.status.privacy_status),
            }));

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(user_id = %token.user_id, count = items.len(), "listed videos");
        Ok(items)
    }

    #[instrument(skip(self, token, visibility), fields(visibility = visibility.as_str()))]
    async fn set_visibility(
        &self,
        token: &PlatformToken,
        content_id: &str,
        visibility: &Visibility,
    ) -> Result<()> {
        let body = VideoResource {
            id: content_id.to_string(),
            status: VideoStatus { privacy_status: visibility.as_str().to_string() },
        };

        self.client
            .put(self.videos_url())
            .bearer_auth(&token.access_token)
            .query(&[("part", "status")])
            .json(&body)
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;

        Ok(())
    }

    /// Exchange the stored refresh token for a fresh access token.
    #[instrument(skip(self, token))]
    async fn refresh_token(&self, token: &PlatformToken) -> Result<PlatformToken> {
        let refresh_token = token.refresh_token.as_deref().ok_or_else(|| {
            ShomerError::Auth(format!(
                "no refresh token stored for {} on {}",
                token.user_id, token.platform
            ))
        })?;

        let response: TokenResponse = self
            .client
            .post(self.token_url())
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?
            .json()
            .await
            .map_err(http_error)?;

        let expires_at =
            response.expires_in.map(|secs| Utc::now() + chrono::Duration::seconds(secs));

        Ok(PlatformToken {
            user_id: token.user_id.clone(),
            platform: token.platform,
            access_token: response.access_token,
            // Google usually omits the refresh token on refresh grants.
            refresh_token: response.refresh_token.or_else(|| token.refresh_token.clone()),
            expires_at,
        })
    }
}
