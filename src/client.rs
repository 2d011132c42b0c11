use std::time::Duration;

use reqwest::{StatusCode, blocking::Client};
use thiserror::Error;
use tracing::debug;

use crate::models::Movie;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, DNS failure or timeout.
    #[error("Cannot communicate with server.")]
    Unreachable(#[source] reqwest::Error),
    #[error("Server rejected the request: {0}")]
    Rejected(String),
    #[error("Cannot communicate with server.")]
    Server(StatusCode),
    #[error("Received an invalid response from the server.")]
    Decode(#[source] reqwest::Error),
    #[error("Cannot build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),
}

/// Blocking client for the catalog service. Each call honors the configured timeout.
#[derive(Clone, Debug)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent("moviedb-tui/0.1")
            .timeout(timeout)
            .build()
            .map_err(ClientError::Setup)?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn list_movies(&self, limit: u64, skip: u64) -> Result<Vec<Movie>, ClientError> {
        let resp = self
            .http
            .get(format!("{}/movies", self.base_url))
            .query(&[("limit", limit), ("skip", skip)])
            .send()
            .map_err(ClientError::Unreachable)?;

        check(resp)?.json().map_err(body_error)
    }

    pub fn add_movie(&self, movie: &Movie) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(format!("{}/movies", self.base_url))
            .json(movie)
            .send()
            .map_err(ClientError::Unreachable)?;
        ack(resp)
    }

    pub fn update_movie(&self, id: i32, movie: &Movie) -> Result<String, ClientError> {
        let resp = self
            .http
            .put(format!("{}/update/{id}", self.base_url))
            .json(movie)
            .send()
            .map_err(ClientError::Unreachable)?;
        ack(resp)
    }

    pub fn delete_movie(&self, id: i32) -> Result<String, ClientError> {
        let resp = self
            .http
            .delete(format!("{}/movies/{id}", self.base_url))
            .send()
            .map_err(ClientError::Unreachable)?;
        ack(resp)
    }
}

fn check(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status.is_client_error() {
        let msg = resp.text().unwrap_or_else(|err| {
            debug!(error = %err, %status, "could not read rejection body");
            String::new()
        });
        let msg = msg.trim();
        return Err(ClientError::Rejected(if msg.is_empty() {
            status.to_string()
        } else {
            msg.to_string()
        }));
    }
    Err(ClientError::Server(status))
}

fn ack(resp: reqwest::blocking::Response) -> Result<String, ClientError> {
    let text = check(resp)?.text().map_err(body_error)?;
    Ok(text.trim().to_string())
}

/// A body that stalls past the deadline is a transport failure, not a bad payload.
fn body_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() { ClientError::Unreachable(err) } else { ClientError::Decode(err) }
}
