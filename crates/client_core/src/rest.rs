//! reqwest-backed access to the document backend.
//!
//! Every request carries the bearer token held in the [`TokenStore`] (when
//! one is present), and every non-success response is folded into a
//! [`FetchError`] so callers only ever deal with one error type.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    error::ApiError,
    protocol::{LoginRequest, LoginResponse, Page, Query},
};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::{
    error::FetchError,
    filters::ListFilters,
    list_resource::PageSource,
    resources::Resource,
};

/// Holds the access token issued by the backend.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    pub async fn set(&self, token: impl Into<String>) {
        *self.inner.write().await = Some(token.into());
    }

    pub async fn clear(&self) {
        self.inner.write().await.take();
    }
}

#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
    tokens: TokenStore,
}

impl RestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut base_url = Url::parse(base_url.trim()).map_err(|err| {
            FetchError::validation(format!("invalid server url `{base_url}`: {err}"))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            tokens: TokenStore::new(),
        })
    }

    pub fn with_tokens(mut self, tokens: TokenStore) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Exchanges credentials for an access token and keeps it for later calls.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), FetchError> {
        let url = self.endpoint("auth/login", None)?;
        let response = self
            .send(self.http.post(url).json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            }))
            .await?;
        let body: LoginResponse = response.json().await?;
        self.tokens.set(body.access_token).await;
        info!(%email, "signed in");
        Ok(())
    }

    pub async fn logout(&self) {
        self.tokens.clear().await;
    }

    pub async fn list<T, F>(&self, path: &str, query: &Query<F>) -> Result<Page<T>, FetchError>
    where
        T: DeserializeOwned,
        F: ListFilters,
    {
        let url = self.endpoint(path, None)?;
        let response = self
            .send(self.http.get(url).query(&query_params(query)))
            .await?;
        Ok(response.json::<Page<T>>().await?)
    }

    pub async fn update<T, P>(&self, path: &str, id: &str, patch: &P) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = self.endpoint(path, Some(id))?;
        let response = self.send(self.http.patch(url).json(patch)).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, path: &str, id: &str) -> Result<(), FetchError> {
        let url = self.endpoint(path, Some(id))?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str, id: Option<&str>) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(path.trim_matches('/'))
            .map_err(|err| FetchError::validation(format!("invalid path `{path}`: {err}")))?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|()| FetchError::validation(format!("cannot address `{id}` under `{path}`")))?
                .push(id);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, FetchError> {
        let request = match self.tokens.get().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "backend response");
        if status.is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Query-string pairs for a list request: paging, sorting, then filters.
pub fn query_params<F: ListFilters>(query: &Query<F>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.to_string()),
        ("limit", query.limit.to_string()),
    ];
    if let Some(sort) = &query.sort {
        params.push(("sortBy", sort.key.clone()));
        params.push(("sortOrder", sort.order.as_str().to_string()));
    }
    params.extend(query.filters.to_params());
    params
}

async fn error_from_response(response: Response) -> FetchError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|err| err.message)
        .ok()
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => FetchError::Validation(message),
        _ => FetchError::Transport {
            status: Some(status.as_u16()),
            message,
        },
    }
}

/// [`PageSource`] that lists a [`Resource`] over HTTP.
pub struct HttpPageSource<R> {
    client: RestClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R> HttpPageSource<R> {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Resource> PageSource<R::Item, R::Filters> for HttpPageSource<R> {
    async fn fetch_page(
        &self,
        query: &Query<R::Filters>,
    ) -> Result<Page<R::Item>, FetchError> {
        self.client.list(R::PATH, query).await
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;
