//! IPFS Directory Service Module
//!
//! Drives the IPFS HTTP API to build unixfs directories:
//! - `POST /api/v0/object/new?arg=unixfs-dir` creates the empty directory
//! - `POST /api/v0/object/patch/add-link?arg=<dir>&arg=<name>&arg=<hash>` links one file
//!
//! Each link call returns a new directory hash, which is threaded into the next call.

use super::DirectoryService;
use crate::error::{BatchWriterError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// IPFS HTTP API client
pub struct IpfsDirectoryService {
    client: reqwest::Client,
    base_url: String,
}

impl IpfsDirectoryService {
    /// Creates a new IPFS client
    ///
    /// # Arguments
    /// * `base_url` - IPFS API address, e.g. "http://127.0.0.1:5001"
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn call(&self, path: &str, args: &[&str]) -> Result<String> {
        let url = format!("{}/api/v0/{}", self.base_url, path);
        let query: Vec<(&str, &str)> = args.iter().map(|arg| ("arg", *arg)).collect();

        let response = self.client.post(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BatchWriterError::directory(format!(
                "{path} failed (status={status}): {body}"
            )));
        }

        let object: ObjectResponse = response
            .json()
            .await
            .map_err(|e| BatchWriterError::directory(format!("{path} returned an unreadable body: {e}")))?;
        Ok(object.hash)
    }
}

#[async_trait]
impl DirectoryService for IpfsDirectoryService {
    async fn create_empty_directory(&self) -> Result<String> {
        let hash = self.call("object/new", &["unixfs-dir"]).await?;
        debug!(directory = %hash, "created empty directory");
        Ok(hash)
    }

    async fn add_files(&self, directory_reference: &str, identifiers: &[String]) -> Result<String> {
        let mut directory = directory_reference.to_string();
        for identifier in identifiers {
            // The link is named after the file's own hash.
            directory = self
                .call("object/patch/add-link", &[directory.as_str(), identifier.as_str(), identifier.as_str()])
                .await?;
        }
        debug!(directory = %directory, files = identifiers.len(), "added files to directory");
        Ok(directory)
    }
}
