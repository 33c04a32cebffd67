//! Read access to the shapes persisted for a room.
//!
//! Fetching is best effort: any failure is logged and yields an empty
//! sequence, so a canvas can always open.

use crate::shapes::Shape;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors from the HTTP read API. Never returned by [`ShapeSource`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("unexpected body: {0}")]
    Body(String),
}

/// Source of the initial scene of a room.
pub trait ShapeSource {
    /// Shapes of `room_id` in creation order, or empty on failure.
    fn fetch_shapes<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Vec<Shape>>;
}

/// A fixed shape list.
#[derive(Debug, Clone, Default)]
pub struct StaticShapeSource {
    pub shapes: Vec<Shape>,
}

impl ShapeSource for StaticShapeSource {
    fn fetch_shapes<'a>(&'a self, _room_id: &'a str) -> BoxFuture<'a, Vec<Shape>> {
        Box::pin(async move { self.shapes.clone() })
    }
}

/// Fetches `GET {base}/shapes/{room}` and reads the `shapes` array.
#[derive(Debug, Clone)]
pub struct HttpShapeSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpShapeSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn shapes_url(&self, room_id: &str) -> Result<reqwest::Url, FetchError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("shapes")
            .push(room_id);
        Ok(url)
    }

    /// Fetch without swallowing errors.
    pub async fn try_fetch(&self, room_id: &str) -> Result<Vec<Shape>, FetchError> {
        let url = self.shapes_url(room_id)?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let body: serde_json::Value = response.json().await?;
        parse_shapes(body)
    }
}

impl ShapeSource for HttpShapeSource {
    fn fetch_shapes<'a>(&'a self, room_id: &'a str) -> BoxFuture<'a, Vec<Shape>> {
        Box::pin(async move {
            match self.try_fetch(room_id).await {
                Ok(shapes) => shapes,
                Err(e) => {
                    log::error!("Failed to fetch shapes for room {room_id}: {e}");
                    Vec::new()
                }
            }
        })
    }
}

/// Read the `shapes` array of a response body. Entries that are not valid
/// shapes are skipped.
pub fn parse_shapes(mut body: serde_json::Value) -> Result<Vec<Shape>, FetchError> {
    let Some(serde_json::Value::Array(entries)) = body.get_mut("shapes").map(serde_json::Value::take)
    else {
        return Err(FetchError::Body("missing shapes array".to_string()));
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Shape>(entry) {
            Ok(shape) => Some(shape),
            Err(e) => {
                log::warn!("Skipping malformed shape: {e}");
                None
            }
        })
        .collect())
}
