use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Where uploaded posters live. Keys are flat file names generated by the
/// server; anything that looks like a path is refused.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    fn public_url(&self, key: &str) -> String;
    /// Inverse of [`StorageClient::public_url`]; `None` for URLs this store
    /// did not hand out.
    fn key_from_url(&self, url: &str) -> Option<String>;
}

/// Files on the local disk, served by `ServeDir` under `public_prefix`.
#[derive(Clone, Debug)]
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

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(is_flat_key(key), "invalid object key {key:?}");
        Ok(self.root.join(key))
    }
}

fn is_flat_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\', '\0'])
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        tracing::debug!(key, bytes = body.len(), "object stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_prefix, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        let key = url
            .strip_prefix(self.public_prefix.as_str())?
            .strip_prefix('/')?;
        is_flat_key(key).then(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("images"), "/static/images/")
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn put_then_delete_object() {
        let (_dir, storage) = store().await;
        storage
            .put_object("poster.png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        let path = storage.root().join("poster.png");
        assert_eq!(std::fs::read(&path).unwrap(), b"png");

        storage.delete_object("poster.png").await.unwrap();
        assert!(!path.exists());
        // deleting twice is fine
        storage.delete_object("poster.png").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let (_dir, storage) = store().await;
        for key in ["../escape.png", "a/b.png", "..", "", "c:\\x.png"] {
            assert!(
                storage.put_object(key, Bytes::new()).await.is_err(),
                "{key:?} accepted"
            );
        }
    }

    #[tokio::test]
    async fn public_url_roundtrips_to_key() {
        let (_dir, storage) = store().await;
        let url = storage.public_url("abc.jpg");
        assert_eq!(url, "/static/images/abc.jpg");
        assert_eq!(storage.key_from_url(&url).as_deref(), Some("abc.jpg"));
        assert_eq!(storage.key_from_url("https://cdn.example/abc.jpg"), None);
        assert_eq!(storage.key_from_url("/static/images/../db.sqlite"), None);
    }
}
