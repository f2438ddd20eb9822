use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::config::StorageConfig;

/// Opaque photo storage. Bytes go in, a stable reference comes out.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, ttl: Duration) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("s3 put_object {key}"))?;
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("s3 delete_object {key}"))?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(ttl)?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}

/// Keeps objects in memory; used by `AppState::fake`.
#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        self.objects.write().await.insert(key.to_string(), body);
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, _ttl: Duration) -> anyhow::Result<String> {
        Ok(format!("https://fake.local/{key}"))
    }
}

pub fn ext_from_mime(ct: &str) -> &'static str {
    match ct {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), "jpg");
        assert_eq!(ext_from_mime("image/jpg"), "jpg");
        assert_eq!(ext_from_mime("image/png"), "png");
        assert_eq!(ext_from_mime("image/webp"), "webp");
        assert_eq!(ext_from_mime("image/heic"), "heic");
        assert_eq!(ext_from_mime("application/octet-stream"), "bin");
    }

    #[tokio::test]
    async fn memory_storage_round_trip() {
        let s = MemoryStorage::default();
        let r = s.upload("a/b.jpg", Bytes::from_static(b"x"), "image/jpeg").await.unwrap();
        assert_eq!(r, "a/b.jpg");
        assert_eq!(s.keys().await, vec!["a/b.jpg"]);
        assert!(s.presign_get(&r, Duration::from_secs(60)).await.unwrap().contains("a/b.jpg"));
        s.delete(&r).await.unwrap();
        assert!(s.keys().await.is_empty());
    }
}
