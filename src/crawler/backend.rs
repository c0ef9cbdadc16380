//! Per-unit fetch backends
//!
//! Every unit gets its own backend from a [`BackendProvider`]: the shared
//! HTTP client plus, when the adapter renders pages, a rendering session that
//! no other unit touches. Targets are routed by their [`FetchMode`].

use crate::config::{FetchConfig, RenderConfig};
use crate::crawler::fetcher::{FetchMode, FetchResult, FetchTarget, Fetcher, HttpFetcher};
use crate::crawler::render::RenderSession;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Opens the backend a unit crawls with
#[async_trait]
pub trait BackendProvider: Send + Sync {
    /// Opens a fresh backend; `needs_render` asks for a rendering session
    async fn open(&self, needs_render: bool) -> Result<Arc<dyn Fetcher>>;
}

/// HTTP plus an optional rendering session
pub struct UnitBackend {
    http: HttpFetcher,
    session: Option<RenderSession>,
}

impl UnitBackend {
    pub fn new(http: HttpFetcher, session: Option<RenderSession>) -> Self {
        Self { http, session }
    }
}

#[async_trait]
impl Fetcher for UnitBackend {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult {
        match (target.mode, &self.session) {
            (FetchMode::Http, _) => self.http.get(&target.url).await,
            (FetchMode::Rendered(scroll), Some(session)) => {
                session.render(&target.url, scroll).await
            }
            (FetchMode::Rendered(_), None) => FetchResult::RenderError {
                error: format!("No rendering session for {}", target.url),
            },
        }
    }

    async fn close(&self) {
        if let Some(session) = &self.session {
            session.close().await;
        }
    }
}

/// Provider used for real crawls
pub struct DefaultProvider {
    client: Client,
    fetch: FetchConfig,
    render: RenderConfig,
}

impl DefaultProvider {
    pub fn new(client: Client, fetch: FetchConfig, render: RenderConfig) -> Self {
        Self {
            client,
            fetch,
            render,
        }
    }
}

#[async_trait]
impl BackendProvider for DefaultProvider {
    async fn open(&self, needs_render: bool) -> Result<Arc<dyn Fetcher>> {
        let session = if needs_render {
            Some(RenderSession::open(&self.render, &self.fetch).await?)
        } else {
            None
        };
        Ok(Arc::new(UnitBackend::new(
            HttpFetcher::new(self.client.clone()),
            session,
        )))
    }
}
