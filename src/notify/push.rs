//! Pushover push notifications
//!
//! `PushoverClient` talks to the Pushover messages API; `Notifier`
//! resolves a named push profile and its token, sends, and turns every
//! failure into a logged `Outcome` instead of an error.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{push_secret_key, Config, PushProfile};
use crate::outcome::{DeliveryError, Outcome};
use crate::traits::{CredentialStore, PushSender};

/// Request body of `POST /1/messages.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushNotification {
    pub token: String,
    pub user: String,
    pub message: String,
    pub title: String,
    pub url: String,
    pub url_title: String,
    pub sound: String,
    /// Always `"1"`: messages may contain basic HTML
    pub html: String,
}

/// Optional presentation fields of a push notification
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub title: String,
    pub url: String,
    pub url_title: String,
    pub sound: String,
}

impl PushOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Pushover API response
#[derive(Debug, Deserialize)]
struct PushoverResponse {
    status: i64,
    #[serde(default)]
    errors: Vec<String>,
}

/// Interprets a Pushover reply
///
/// The message was accepted only if the HTTP status is 2xx and the JSON
/// body reports `"status": 1`.
///
/// # Errors
/// Returns an error with the API's `errors` if the message was rejected,
/// or if the body is not Pushover JSON.
pub fn check_pushover_response(http_status: u16, body: &str) -> Result<()> {
    let response: PushoverResponse = serde_json::from_str(body).with_context(|| {
        format!("Pushover returned HTTP {} with an unexpected body", http_status)
    })?;

    if response.status == 1 && (200..300).contains(&http_status) {
        return Ok(());
    }

    let detail = if response.errors.is_empty() {
        "no details given".to_string()
    } else {
        response.errors.join("; ")
    };
    Err(anyhow!(
        "Pushover rejected message (HTTP {}): {}",
        http_status,
        detail
    ))
}

/// HTTP client for the Pushover messages API
pub struct PushoverClient {
    client: Client,
    base_url: String,
}

impl PushoverClient {
    /// Creates a client for the API rooted at `base_url`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(false)
            .use_rustls_tls()
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/1/messages.json", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PushSender for PushoverClient {
    async fn send(&self, notification: &PushNotification) -> Result<()> {
        let response = self
            .client
            .post(self.messages_url())
            .json(notification)
            .send()
            .await
            .context("Failed to reach Pushover")?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        check_pushover_response(status, &body)
    }
}

/// Sends push notifications by profile name
pub struct Notifier {
    profiles: HashMap<String, PushProfile>,
    credentials: Arc<dyn CredentialStore>,
    sender: Arc<dyn PushSender>,
}

impl Notifier {
    pub fn new(
        profiles: HashMap<String, PushProfile>,
        credentials: Arc<dyn CredentialStore>,
        sender: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            profiles,
            credentials,
            sender,
        }
    }

    pub fn from_config(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        sender: Arc<dyn PushSender>,
    ) -> Self {
        Self::new(config.push.clone(), credentials, sender)
    }

    /// Sends `message` to the recipient of push profile `profile`
    ///
    /// Never fails loudly: an unknown profile, a missing token or a
    /// transport error is logged and returned as a failed `Outcome`.
    pub async fn send_push(
        &self,
        profile: &str,
        message: &str,
        options: PushOptions,
    ) -> Outcome<DeliveryError> {
        let result = self.try_send_push(profile, message, options).await;
        if let Err(e) = &result {
            tracing::warn!(profile, "Push notification not sent: {}", e);
        }
        result.into()
    }

    async fn try_send_push(
        &self,
        profile: &str,
        message: &str,
        options: PushOptions,
    ) -> Result<(), DeliveryError> {
        let push_profile = self
            .profiles
            .get(profile)
            .ok_or_else(|| DeliveryError::UnknownProfile {
                kind: "push",
                name: profile.to_string(),
            })?;

        let secret_key = push_secret_key(profile);
        let token = self
            .credentials
            .get_secret(&secret_key)
            .map_err(|_| DeliveryError::MissingSecret(secret_key))?;

        let notification = PushNotification {
            token,
            user: push_profile.user.clone(),
            message: message.to_string(),
            title: options.title,
            url: options.url,
            url_title: options.url_title,
            sound: options.sound,
            html: "1".to_string(),
        };

        self.sender
            .send(&notification)
            .await
            .map_err(DeliveryError::Transport)
    }
}
