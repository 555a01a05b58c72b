use std::{path::Path, time::Duration};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{dto::PushMessage, services::PushSender};

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_TTL_SECS: i64 = 3600;
/// A cached token is refreshed this long before the expiry Google reported.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

#[derive(Debug, Deserialize)]
struct ServiceAccount {
    #[serde(rename = "type")]
    kind: String,
    project_id: String,
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: OffsetDateTime,
}

impl CachedToken {
    fn new(token: AccessToken, now: OffsetDateTime) -> Self {
        Self {
            value: token.access_token,
            expires_at: now + time::Duration::seconds(token.expires_in),
        }
    }

    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        now + time::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

/// Firebase Cloud Messaging (HTTP v1) client built from a service-account file.
///
/// The OAuth access token is shared by every send until shortly before it
/// expires, so a fan-out over N devices costs one token exchange.
pub struct FcmClient {
    http: Client,
    project_id: String,
    client_email: String,
    token_uri: String,
    key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl FcmClient {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read firebase credentials {}", path.display()))?;
        let client = Self::from_json(&raw)?;
        info!(project_id = %client.project_id, "firebase messaging initialized");
        Ok(client)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let account: ServiceAccount =
            serde_json::from_str(raw).context("parse firebase service account")?;
        if account.kind != "service_account" {
            return Err(anyhow!(
                "invalid service account credentials: type is '{}'",
                account.kind
            ));
        }
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .context("parse service account private key")?;
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("build fcm http client")?;
        Ok(Self {
            http,
            project_id: account.project_id,
            client_email: account.client_email,
            token_uri: account.token_uri,
            key,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        // held across the exchange so concurrent sends refresh once
        let mut cached = self.token.lock().await;
        if let Some(token) = cached
            .as_ref()
            .filter(|t| t.is_fresh(OffsetDateTime::now_utc()))
        {
            return Ok(token.value.clone());
        }

        let token = self.exchange_token().await?;
        debug!(expires_at = %token.expires_at, "fetched fcm access token");
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn exchange_token(&self) -> anyhow::Result<CachedToken> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: FCM_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .context("sign oauth assertion")?;

        let res = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("request oauth access token")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("oauth token exchange failed with {status}: {body}"));
        }
        let token: AccessToken = res.json().await.context("parse oauth token response")?;
        Ok(CachedToken::new(token, OffsetDateTime::now_utc()))
    }
}

pub(crate) fn message_body(token: &str, message: &PushMessage) -> serde_json::Value {
    json!({
        "message": {
            "token": token,
            "notification": {
                "title": message.title,
                "body": message.body,
            },
            "data": message.data,
        }
    })
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(&self, token: &str, message: &PushMessage) -> anyhow::Result<String> {
        let access_token = self.access_token().await?;
        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.project_id
        );
        let res = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&message_body(token, message))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("send fcm message")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("fcm send failed with {status}: {body}"));
        }
        let sent: SendResponse = res.json().await.context("parse fcm response")?;
        debug!(name = %sent.name, "fcm message accepted");
        Ok(sent.name)
    }
}
