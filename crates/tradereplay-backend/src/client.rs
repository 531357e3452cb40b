//! HTTP client for the hosted backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use tradereplay_config::BackendConfig;
use tradereplay_protocols::store::{get_typed, keys, set_typed};
use tradereplay_protocols::{BackendError, LocalStore, TradeRecord, TradeSink};

use crate::model::{NewTradeReplay, TradeReplay};
use crate::session::{Session, TokenResponse};

const TRADES_TABLE: &str = "trade_replays";

/// Anything the review views can list trades from.
#[async_trait]
pub trait TradeSource: Send + Sync {
    async fn list_trades(&self) -> Result<Vec<TradeReplay>, BackendError>;
}

/// Auth, table and storage calls against the hosted backend.
///
/// The session is cached in memory and persisted in the local store so a
/// restart stays signed in.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    store: Arc<dyn LocalStore>,
    session: RwLock<Option<Session>>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig, store: Arc<dyn LocalStore>) -> Result<Self, BackendError> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| BackendError::Validation("backend.base_url is not set".into()))?;
        url::Url::parse(base_url)
            .map_err(|e| BackendError::Validation(format!("backend.base_url: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone().unwrap_or_default(),
            bucket: config.bucket.clone(),
            store,
            session: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Current session, if signed in.
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Drop the in-memory session without touching the stored one.
    pub fn forget_session(&self) {
        self.session.write().take();
    }

    fn require_session(&self) -> Result<Session, BackendError> {
        self.session().ok_or(BackendError::NotAuthenticated)
    }

    /// Restore a persisted session. Expired sessions are dropped.
    pub async fn load_session(&self) -> Result<Option<Session>, BackendError> {
        let stored: Option<Session> = get_typed(self.store.as_ref(), keys::SESSION).await?;
        let session = stored.filter(|s| {
            let expired = s.is_expired(Utc::now());
            if expired {
                info!("Stored session for {} has expired", s.user_id);
            }
            !expired
        });
        *self.session.write() = session.clone();
        Ok(session)
    }

    /// Password sign-in. The new session replaces any previous one.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let request = self
            .http
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = Self::decode(Self::send(request).await?).await?;
        let session = token.into_session(Utc::now());

        set_typed(self.store.as_ref(), keys::SESSION, &session).await?;
        *self.session.write() = Some(session.clone());
        info!("Signed in as {}", session.email.as_deref().unwrap_or(&session.user_id));
        Ok(session)
    }

    /// Forget the session locally; the remote logout is best-effort.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        let previous = self.session.write().take();
        if let Some(session) = previous {
            let request = self
                .http
                .post(self.url("/auth/v1/logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token);
            if let Err(e) = Self::send(request).await {
                warn!("Remote logout failed: {}", e);
            }
        }
        self.store.remove(keys::SESSION).await?;
        info!("Signed out");
        Ok(())
    }

    fn authed(&self, builder: reqwest::RequestBuilder, session: &Session) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    /// Insert a row owned by the signed-in user and return it.
    pub async fn create_trade(&self, trade: &NewTradeReplay) -> Result<TradeReplay, BackendError> {
        let session = self.require_session()?;
        let mut row = trade.clone();
        row.user_id = session.user_id.clone();

        let request = self
            .authed(self.http.post(self.url(&format!("/rest/v1/{}", TRADES_TABLE))), &session)
            .header("Prefer", "return=representation")
            .json(&row);
        let mut rows: Vec<TradeReplay> = Self::decode(Self::send(request).await?).await?;
        let created = rows
            .pop()
            .ok_or_else(|| BackendError::Decode("insert returned no rows".into()))?;
        debug!("Created remote trade {}", created.id);
        Ok(created)
    }

    /// All of the user's trades, newest first.
    pub async fn fetch_trades(&self) -> Result<Vec<TradeReplay>, BackendError> {
        let session = self.require_session()?;
        let request = self
            .authed(self.http.get(self.url(&format!("/rest/v1/{}", TRADES_TABLE))), &session)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        Self::decode(Self::send(request).await?).await
    }

    /// Upload a file under `<user_id>/<filename>` in the recordings bucket
    /// and return its public URL.
    pub async fn upload_file(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let session = self.require_session()?;
        if filename.is_empty() || filename.contains('/') {
            return Err(BackendError::Validation(format!("invalid file name '{}'", filename)));
        }

        let object = format!("{}/{}/{}", self.bucket, session.user_id, filename);
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| BackendError::Validation(format!("content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let request = self
            .authed(self.http.post(self.url(&format!("/storage/v1/object/{}", object))), &session)
            .multipart(form);
        Self::send(request).await?;

        let public_url = self.url(&format!("/storage/v1/object/public/{}", object));
        info!("Uploaded {}", public_url);
        Ok(public_url)
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status,
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Pull a readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "message", "msg", "error"]
                .iter()
                .find_map(|field| v[*field].as_str().map(String::from))
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl TradeSource for BackendClient {
    async fn list_trades(&self) -> Result<Vec<TradeReplay>, BackendError> {
        self.fetch_trades().await
    }
}

#[async_trait]
impl TradeSink for BackendClient {
    async fn push_trade(&self, trade: &TradeRecord) -> Result<(), BackendError> {
        self.create_trade(&NewTradeReplay::from(trade)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
