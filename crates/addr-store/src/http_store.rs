use std::time::Duration;

use addr_config::{StoreConfig, StoreToken};
use addr_reconcile::{DocumentStore, Mutator, StoreError};
use addr_schemas::{DocumentList, RawDocument};
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

/// Configmap-style document store reached over HTTP.
///
/// Collection: `{base}/api/v1/namespaces/{ns}/configmaps`.
/// Item: `{collection}/{name}`.
///
/// The bearer token is never logged.
#[derive(Clone)]
pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
    namespace: String,
    token: Option<StoreToken>,
    conflict_retries: u32,
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .field("token", &self.token)
            .field("conflict_retries", &self.conflict_retries)
            .finish()
    }
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            namespace: namespace.into(),
            token: None,
            conflict_retries: 3,
        }
    }

    pub fn from_config(cfg: &StoreConfig, token: Option<StoreToken>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| StoreError::Transport(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            namespace: cfg.namespace.clone(),
            token,
            conflict_retries: cfg.update_conflict_retries,
        })
    }

    pub fn with_token(mut self, token: StoreToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/api/v1/namespaces/{}/configmaps",
            self.base_url.trim_end_matches('/'),
            self.namespace
        )
    }

    fn item_url(&self, name: &str) -> String {
        format!("{}/{}", self.collection_url(), name)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t.expose()),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, StoreError> {
        self.authorize(req)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))
    }

    async fn fetch(&self, name: &str) -> Result<Result<RawDocument, u16>, StoreError> {
        let resp = self.send(self.http.get(self.item_url(name))).await?;
        let status = resp.status();
        if !status.is_success() {
            return Ok(Err(status.as_u16()));
        }
        let doc = resp
            .json::<RawDocument>()
            .await
            .map_err(|e| StoreError::Decode(format!("document '{name}': {e}")))?;
        Ok(Ok(doc))
    }
}

async fn status_error(resp: Response) -> StoreError {
    let code = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    StoreError::Status { code, message }
}

#[async_trait::async_trait]
impl DocumentStore for HttpStore {
    async fn get(&self, selector: &str) -> Result<Vec<RawDocument>, StoreError> {
        let resp = self
            .send(
                self.http
                    .get(self.collection_url())
                    .query(&[("labelSelector", selector)]),
            )
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let list = resp
            .json::<DocumentList>()
            .await
            .map_err(|e| StoreError::Decode(format!("list '{selector}': {e}")))?;
        Ok(list.items)
    }

    async fn post(&self, document: &RawDocument) -> Result<u16, StoreError> {
        let resp = self
            .send(self.http.post(self.collection_url()).json(document))
            .await?;
        Ok(resp.status().as_u16())
    }

    async fn update(&self, name: &str, mutate: &Mutator) -> Result<u16, StoreError> {
        let mut attempt = 0;
        loop {
            let current = match self.fetch(name).await? {
                Ok(doc) => doc,
                Err(code) => return Ok(code),
            };
            let Some(next) = mutate(current)? else {
                return Ok(StatusCode::NOT_MODIFIED.as_u16());
            };

            let resp = self.send(self.http.put(self.item_url(name)).json(&next)).await?;
            let status = resp.status();
            if status == StatusCode::CONFLICT && attempt < self.conflict_retries {
                attempt += 1;
                debug!(name, attempt, "update conflict, re-reading document");
                continue;
            }
            if status == StatusCode::CONFLICT {
                warn!(name, attempts = attempt + 1, "update conflict retries exhausted");
            }
            return Ok(status.as_u16());
        }
    }

    async fn delete_resource(&self, name: &str) -> Result<(), StoreError> {
        let resp = self.send(self.http.delete(self.item_url(name))).await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(())
    }
}
