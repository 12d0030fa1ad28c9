use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    /// Removing an object that does not exist succeeds.
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    fn public_url(&self, key: &str) -> String;
    /// Maps a URL produced by `public_url` back to its key. `None` for foreign URLs.
    fn key_from_url(&self, url: &str) -> Option<String>;
}

/// Files on local disk, served back under `public_prefix`.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>, public_prefix: &str) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self {
            root,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(key);
        let plain = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        anyhow::ensure!(plain, "refusing storage key {key:?}");
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir for {}", key))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write object {}", key))?;
        debug!(%key, %content_type, bytes = body.len(), "object stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%key, "object deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(%key, "object already absent");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("delete object {}", key)),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_prefix, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_prefix)?
            .strip_prefix('/')
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }
}
