use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use crate::storage::StorageClient;

/// One uploaded file as it came off the multipart stream.
#[derive(Debug)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Writes the upload under a fresh `<uuid>.<ext>` key. The client's file name
/// only ever contributes its extension.
pub async fn store_image(
    storage: &dyn StorageClient,
    img: UploadItem,
) -> anyhow::Result<StoredImage> {
    anyhow::ensure!(!img.body.is_empty(), "empty image upload");

    let key = object_key(img.file_name.as_deref(), img.content_type.as_deref());
    storage
        .put_object(&key, img.body)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let url = storage.public_url(&key);
    Ok(StoredImage { key, url })
}

/// Removes an image we no longer reference. Failures are logged, not returned:
/// the database is already the source of truth at this point.
pub async fn discard_image(storage: &dyn StorageClient, key: &str) {
    if let Err(e) = storage.delete_object(key).await {
        tracing::warn!(error = %format!("{e:#}"), key, "failed to remove image");
    }
}

pub fn object_key(file_name: Option<&str>, content_type: Option<&str>) -> String {
    let ext = file_name
        .and_then(ext_from_file_name)
        .or_else(|| content_type.and_then(ext_from_mime).map(str::to_string))
        .unwrap_or_else(|| "bin".to_string());
    format!("{}.{}", Uuid::new_v4(), ext)
}

fn ext_from_file_name(name: &str) -> Option<String> {
    // strip any directory part a client may have sent
    let base = name.rsplit(['/', '\\']).next()?;
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 8 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::storage::LocalStorage;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn test_ext_from_file_name() {
        assert_eq!(ext_from_file_name("poster.PNG").as_deref(), Some("png"));
        assert_eq!(ext_from_file_name("../../etc/cover.jpg").as_deref(), Some("jpg"));
        assert_eq!(ext_from_file_name("C:\\tmp\\a.webp").as_deref(), Some("webp"));
        assert_eq!(ext_from_file_name("noext"), None);
        assert_eq!(ext_from_file_name(".hidden"), None);
        assert_eq!(ext_from_file_name("weird.p/ng"), None);
        assert_eq!(ext_from_file_name("long.abcdefghij"), None);
    }

    #[test]
    fn object_key_never_contains_client_path() {
        let key = object_key(Some("../../../etc/passwd.png"), None);
        assert!(key.ends_with(".png"));
        assert!(!key.contains('/'));
        assert!(!key.contains(".."));

        assert!(object_key(None, Some("image/jpeg")).ends_with(".jpg"));
        assert!(object_key(Some("x"), Some("text/plain")).ends_with(".bin"));
        assert_ne!(object_key(None, None), object_key(None, None));
    }

    #[tokio::test]
    async fn store_and_discard_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "/static/images").await.unwrap();

        let stored = store_image(
            &storage,
            UploadItem {
                body: Bytes::from_static(b"\x89PNG"),
                content_type: Some("image/png".into()),
                file_name: Some("../poster.png".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(stored.url, format!("/static/images/{}", stored.key));
        let path = dir.path().join(&stored.key);
        assert!(path.exists());

        discard_image(&storage, &stored.key).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn empty_upload_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "/img").await.unwrap();
        let err = store_image(
            &storage,
            UploadItem {
                body: Bytes::new(),
                content_type: None,
                file_name: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
