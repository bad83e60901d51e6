//! Directory Service Module
//!
//! This module groups a set of content-addressed files into one directory
//! artifact and returns the artifact's own content address.
//!
//! The hashing and storage behind it belong to the service (IPFS); this
//! crate only drives it through `DirectoryService`.

mod ipfs;

pub use ipfs::IpfsDirectoryService;

use crate::error::Result;
use async_trait::async_trait;

/// Builds content-addressed directory artifacts.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Create a fresh empty directory and return its reference.
    async fn create_empty_directory(&self) -> Result<String>;

    /// Link every identifier into `directory_reference` and return the
    /// reference of the resulting directory.
    ///
    /// With no identifiers the input reference is returned unchanged.
    async fn add_files(&self, directory_reference: &str, identifiers: &[String]) -> Result<String>;
}
