//! Typed HTTP client for the catalog service.

use catalog_app::books::models::{Book, BookInput, Created};
use reqwest::{StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{kind} ({status}): {message}")]
    Api {
        status: StatusCode,
        kind: String,
        message: String,
    },
}

impl ClientError {
    /// HTTP status for errors the service answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            ClientError::InvalidBaseUrl { .. } => None,
        }
    }
}

/// Error body the service sends with every non-2xx response.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    message: String,
}

/// Client for the `/books` API rooted at a base URL.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base: Url,
}

impl CatalogClient {
    /// Build a client for `base_url`, which must be an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let invalid = |reason: &str| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };

        let mut base = Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            return Err(invalid("expected http://host[:port]"));
        }

        // `join` replaces the last segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a path relative to the base.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: self.base.to_string(),
                reason: e.to_string(),
            })
    }

    /// Fetch the service greeting.
    pub async fn greeting(&self) -> Result<String, ClientError> {
        let response = self.http.get(self.endpoint("")?).send().await?;
        decode(response).await
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        let response = self.http.get(self.endpoint("books")?).send().await?;
        decode(response).await
    }

    pub async fn get_book(&self, id: u64) -> Result<Book, ClientError> {
        let url = self.endpoint(&format!("books/{id}"))?;
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    pub async fn create_book(&self, input: &BookInput) -> Result<Created, ClientError> {
        let response = self
            .http
            .post(self.endpoint("books")?)
            .json(input)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update_book(&self, id: u64, input: &BookInput) -> Result<Book, ClientError> {
        let url = self.endpoint(&format!("books/{id}"))?;
        let response = self.http.put(url).json(input).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await?;
    let (kind, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => (body.error, body.message),
        Err(_) => ("http_error".to_string(), text),
    };

    tracing::debug!(status = %status, kind = %kind, "catalog service returned an error");
    Err(ClientError::Api {
        status,
        kind,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_without_scheme_separator_is_rejected() {
        assert!(CatalogClient::new("localhost8800").is_err());
        assert!(CatalogClient::new("localhost:8800").is_err());
        assert!(CatalogClient::new("ftp://localhost:8800").is_err());
    }

    #[test]
    fn endpoints_are_joined_under_the_base_path() {
        let client = CatalogClient::new("http://localhost:8800").unwrap();
        assert_eq!(
            client.endpoint("books").unwrap().as_str(),
            "http://localhost:8800/books"
        );

        let nested = CatalogClient::new("http://example.com/catalog").unwrap();
        assert_eq!(
            nested.endpoint("/books/7").unwrap().as_str(),
            "http://example.com/catalog/books/7"
        );
    }
}
