// Remote, versioned file store: read plus conditional write-or-create.
// Every write carries the version token from a prior read so the store can
// reject a path that changed underneath us. The read-then-write race window
// is acceptable: this pipeline is single-writer by design.

mod github;

pub use github::GithubStore;

use async_trait::async_trait;
use thiserror::Error;

/// File content plus the store's version token for it (a content hash).
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub version: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("path changed concurrently: {0}")]
    VersionConflict(String),
    #[error("store API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected store response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads `path`; None when the path does not exist yet.
    async fn read(&self, path: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Compare-and-swap write. `expected` is the version token from a prior
    /// read; None means "create, the path must not exist". A mismatch fails
    /// with `VersionConflict`.
    async fn cas_write(
        &self,
        path: &str,
        expected: Option<&str>,
        content: &[u8],
        message: &str,
    ) -> Result<(), StoreError>;

    /// Overwrite-or-create: reads the current version token (NotFound reads
    /// as "create") and submits the write with it.
    async fn write(&self, path: &str, content: &[u8], message: &str) -> Result<(), StoreError> {
        let expected = self.read(path).await?.map(|f| f.version);
        self.cas_write(path, expected.as_deref(), content, message)
            .await
    }
}
