//! # Blocking HTTP Backend
//!
//! [`RepositoryBackend`] over the repository's REST API, rooted at
//! `{base}/ma/v1`.
//!
//! ## Error mapping
//!
//! | Condition | Kind |
//! |---|---|
//! | connection failure or timeout (after retry) | `BackendIo` |
//! | HTTP 404 | `NotFound` |
//! | any other non-2xx | `BackendRejected` (status and body in the message) |
//! | 2xx body that does not decode | `BadData` |
//!
//! The service has no attachment update endpoint, so
//! [`update_attachment`](RepositoryBackend::update_attachment) deletes the
//! old attachment and adds the new one. That pair is not atomic.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use lars_core::{Action, AssetId, AttachmentId, RepoError};

use crate::backend::RepositoryBackend;
use crate::config::RepositoryConfig;
use crate::retry::{retry_send, Replay};
use crate::types::{Asset, AssetType, Attachment, AttachmentPayload};

/// API root below the configured repository URL.
const API_ROOT: &str = "ma/v1";

/// Longest response body excerpt carried in an error message.
const BODY_EXCERPT_LEN: usize = 512;

/// HTTP client for the asset repository service.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    credentials: Option<(String, Zeroizing<String>)>,
    api_key: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .field("user", &self.credentials.as_ref().map(|(u, _)| u))
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// Build a backend from configuration.
    pub fn new(config: &RepositoryConfig) -> Result<Self, RepoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                RepoError::backend_io(format!("failed to build HTTP client: {e}")).with_source(e)
            })?;

        let base_url = format!(
            "{}/{API_ROOT}",
            config.repository_url.as_str().trim_end_matches('/')
        );
        let credentials = match (&config.user, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            base_url,
            credentials,
            api_key: config.api_key.clone(),
        })
    }

    /// The resolved API root, e.g. `https://repo.example.com/ma/v1`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}/{path}", self.base_url));
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, Some(password.as_str()));
        }
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("apiKey", key.as_str())]);
        }
        builder
    }

    /// Send with transport retry and map the response status.
    fn send<F>(
        &self,
        operation: &str,
        replay: Replay,
        asset_id: Option<&AssetId>,
        build: F,
    ) -> Result<Response, RepoError>
    where
        F: Fn() -> Result<Response, reqwest::Error>,
    {
        tracing::debug!(operation, asset_id = asset_id.map(AssetId::as_str), "repository call");

        let resp = retry_send(operation, replay, build).map_err(|e| {
            RepoError::backend_io(format!("{operation}: {e}"))
                .for_resource(asset_id.cloned())
                .with_source(e)
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().unwrap_or_default();
        let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
        let err = if status == StatusCode::NOT_FOUND {
            RepoError::not_found(format!("{operation}: HTTP {status}"))
        } else {
            RepoError::rejected(format!("{operation}: HTTP {status}: {excerpt}"))
        };
        Err(err.for_resource(asset_id.cloned()))
    }

    fn decode<T: DeserializeOwned>(
        operation: &str,
        asset_id: Option<&AssetId>,
        resp: Response,
    ) -> Result<T, RepoError> {
        let body = resp.text().map_err(|e| {
            RepoError::backend_io(format!("{operation}: failed to read response body: {e}"))
                .for_resource(asset_id.cloned())
                .with_source(e)
        })?;
        serde_json::from_str(&body).map_err(|e| {
            RepoError::bad_data(format!("{operation}: undecodable response: {e}"))
                .for_resource(asset_id.cloned())
                .with_source(e)
        })
    }

    fn attachment_form(
        attachment: &Attachment,
        info: &str,
        content: &[u8],
    ) -> Result<multipart::Form, reqwest::Error> {
        let info_part = multipart::Part::text(info.to_string()).mime_str("application/json")?;
        let mut file_part = multipart::Part::bytes(content.to_vec()).file_name(attachment.name.clone());
        if let Some(content_type) = &attachment.content_type {
            file_part = file_part.mime_str(content_type)?;
        }
        Ok(multipart::Form::new()
            .part("attachmentInfo", info_part)
            .part("file", file_part))
    }
}

impl RepositoryBackend for HttpBackend {
    fn add_asset(&self, asset: &Asset) -> Result<Asset, RepoError> {
        if asset.id.is_some() {
            return Err(RepoError::validation("a new asset must not carry an id")
                .for_resource(asset.id.clone()));
        }
        let resp = self.send("add_asset", Replay::ConnectOnly, None, || {
            self.request(Method::POST, "assets").json(asset).send()
        })?;
        Self::decode("add_asset", None, resp)
    }

    fn get_asset(&self, id: &AssetId) -> Result<Asset, RepoError> {
        let path = format!("assets/{id}");
        let resp = self.send("get_asset", Replay::Any, Some(id), || {
            self.request(Method::GET, &path).send()
        })?;
        Self::decode("get_asset", Some(id), resp)
    }

    fn update_asset(&self, asset: &Asset) -> Result<Asset, RepoError> {
        let id = asset
            .id
            .as_ref()
            .ok_or_else(|| RepoError::validation("cannot update an asset without an id"))?;
        let path = format!("assets/{id}");
        let resp = self.send("update_asset", Replay::Any, Some(id), || {
            self.request(Method::PUT, &path).json(asset).send()
        })?;
        Self::decode("update_asset", Some(id), resp)
    }

    fn delete_asset(&self, id: &AssetId) -> Result<(), RepoError> {
        let path = format!("assets/{id}");
        self.send("delete_asset", Replay::Any, Some(id), || {
            self.request(Method::DELETE, &path).send()
        })?;
        Ok(())
    }

    fn list_assets(
        &self,
        asset_type: Option<AssetType>,
    ) -> Result<Vec<Result<Asset, RepoError>>, RepoError> {
        let resp = self.send("list_assets", Replay::Any, None, || {
            let mut req = self.request(Method::GET, "assets");
            if let Some(t) = asset_type {
                req = req.query(&[("type", t.as_str())]);
            }
            req.send()
        })?;
        let documents: Vec<serde_json::Value> = Self::decode("list_assets", None, resp)?;

        Ok(documents
            .into_iter()
            .map(|doc| {
                let id = doc
                    .get("_id")
                    .and_then(serde_json::Value::as_str)
                    .map(AssetId::new);
                serde_json::from_value::<Asset>(doc).map_err(|e| {
                    RepoError::bad_data(format!("undecodable asset document: {e}"))
                        .for_resource(id)
                        .with_source(e)
                })
            })
            .collect())
    }

    fn add_attachment(
        &self,
        asset_id: &AssetId,
        attachment: &Attachment,
        payload: AttachmentPayload<'_>,
    ) -> Result<Attachment, RepoError> {
        let path = format!("assets/{asset_id}/attachments");
        let info = serde_json::to_string(attachment).map_err(|e| {
            RepoError::validation(format!("cannot encode attachment metadata: {e}"))
                .for_resource(Some(asset_id.clone()))
                .with_source(e)
        })?;

        let content: Option<Vec<u8>> = match payload {
            AttachmentPayload::Link => None,
            AttachmentPayload::Bytes(bytes) => Some(bytes.to_vec()),
            AttachmentPayload::File(file) => Some(std::fs::read(file).map_err(|e| {
                RepoError::validation(format!(
                    "cannot read attachment content from {}: {e}",
                    file.display()
                ))
                .for_resource(Some(asset_id.clone()))
                .with_source(e)
            })?),
        };

        let resp = self.send("add_attachment", Replay::ConnectOnly, Some(asset_id), || {
            let req = self
                .request(Method::POST, &path)
                .query(&[("name", attachment.name.as_str())]);
            match &content {
                None => req
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(info.clone())
                    .send(),
                Some(bytes) => req.multipart(Self::attachment_form(attachment, &info, bytes)?).send(),
            }
        })?;
        Self::decode("add_attachment", Some(asset_id), resp)
    }

    fn update_attachment(
        &self,
        asset_id: &AssetId,
        attachment: &Attachment,
        payload: AttachmentPayload<'_>,
    ) -> Result<Attachment, RepoError> {
        let old_id = attachment.id.as_ref().ok_or_else(|| {
            RepoError::validation(format!(
                "cannot update attachment {} without an id",
                attachment.name
            ))
            .for_resource(Some(asset_id.clone()))
        })?;
        self.delete_attachment(asset_id, old_id)?;

        let mut replacement = attachment.clone();
        replacement.id = None;
        self.add_attachment(asset_id, &replacement, payload)
    }

    fn get_attachment_content(
        &self,
        asset_id: &AssetId,
        attachment_id: &AttachmentId,
    ) -> Result<Box<dyn Read + Send>, RepoError> {
        let path = format!("assets/{asset_id}/attachments/{attachment_id}/content");
        let resp = self
            .send("get_attachment_content", Replay::Any, Some(asset_id), || {
                self.request(Method::GET, &path).send()
            })
            .map_err(|e| e.for_attachment(Some(attachment_id.clone())))?;
        Ok(Box::new(resp))
    }

    fn delete_attachment(
        &self,
        asset_id: &AssetId,
        attachment_id: &AttachmentId,
    ) -> Result<(), RepoError> {
        let path = format!("assets/{asset_id}/attachments/{attachment_id}");
        self.send("delete_attachment", Replay::Any, Some(asset_id), || {
            self.request(Method::DELETE, &path).send()
        })
        .map_err(|e| e.for_attachment(Some(attachment_id.clone())))?;
        Ok(())
    }

    fn update_state(&self, asset_id: &AssetId, action: Action) -> Result<(), RepoError> {
        let path = format!("assets/{asset_id}/state");
        let body = serde_json::json!({ "action": action.wire_name() });
        self.send("update_state", Replay::ConnectOnly, Some(asset_id), || {
            self.request(Method::PUT, &path).json(&body).send()
        })?;
        Ok(())
    }
}
