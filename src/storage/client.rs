use super::{Clock, SystemClock, derive_key, half_size_png};
use crate::{Error, Result, config::StorageConfig};
use object_store::{ObjectStore, PutPayload, aws::AmazonS3Builder, path::Path as StorePath};
use reqwest::{Client, header};
use std::{path::Path, sync::Arc};
use tracing::{error, info};

const BROWSER_ACCEPT: &str = concat!(
    "text/html,application/xhtml+xml,application/xml;q=0.9,",
    "image/avif,image/webp,image/apng,*/*;q=0.8,",
    "application/signed-exchange;v=b3;q=0.7"
);
const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36"
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
    pub thumbnail_url: String,
}

/// Uploads images to an S3-compatible bucket and hands back public URLs.
pub struct OssClient {
    store: Arc<dyn ObjectStore>,
    http: Client,
    clock: Arc<dyn Clock>,
    endpoint_url: String,
    bucket: String,
    custom_domain: Option<String>,
}

impl OssClient {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if config.endpoint_url.is_empty() || config.bucket.is_empty() {
            return Err(Error::config("storage endpoint_url and bucket must be set"));
        }

        let store = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint_url)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region)
            .build()?;

        Self::with_store(Arc::new(store), config)
    }

    /// Uses an existing store, e.g. `object_store::memory::InMemory` in tests.
    pub fn with_store(store: Arc<dyn ObjectStore>, config: &StorageConfig) -> Result<Self> {
        Ok(Self {
            store,
            http: Client::builder().build()?,
            clock: Arc::new(SystemClock),
            endpoint_url: config.endpoint_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            custom_domain: config.custom_domain.clone().filter(|d| !d.is_empty()),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn derive_key(&self, source_url: Option<&str>, is_thumbnail: bool) -> String {
        derive_key(self.clock.as_ref(), source_url, is_thumbnail)
    }

    pub fn public_url(&self, key: &str) -> String {
        match &self.custom_domain {
            Some(domain) => format!("https://{}/{}", domain, key),
            None => format!("{}/{}/{}", self.endpoint_url, self.bucket, key),
        }
    }

    /// Stores `source` under `key`. Remote sources are downloaded first;
    /// local files are deleted once stored.
    pub async fn upload(&self, source: &str, key: &str) -> Result<String> {
        self.upload_inner(source, key).await.inspect_err(|e| {
            error!("Upload of '{}' failed: {}", source, e);
        })
    }

    async fn upload_inner(&self, source: &str, key: &str) -> Result<String> {
        let bytes = if is_remote(source) {
            self.fetch_remote(source).await?
        } else {
            tokio::fs::read(source).await?
        };

        self.put(key, bytes).await?;
        info!("Uploaded '{}' to '{}/{}'", source, self.bucket, key);

        if !is_remote(source) && Path::new(source).exists() {
            tokio::fs::remove_file(source).await?;
        }

        let url = self.public_url(key);
        info!("File URL: {}", url);
        Ok(url)
    }

    /// Reads back `stored_key`, writes a half-size PNG next to it and returns
    /// the thumbnail's URL. `source_url` only feeds the thumbnail's name.
    pub async fn make_thumbnail(
        &self,
        source_url: Option<&str>,
        stored_key: &str,
    ) -> Result<String> {
        self.make_thumbnail_inner(source_url, stored_key)
            .await
            .inspect_err(|e| {
                error!("Thumbnail for '{}' failed: {}", stored_key, e);
            })
    }

    async fn make_thumbnail_inner(
        &self,
        source_url: Option<&str>,
        stored_key: &str,
    ) -> Result<String> {
        let original = self
            .store
            .get(&StorePath::from(stored_key))
            .await?
            .bytes()
            .await?;

        let thumbnail = half_size_png(&original)?;
        let thumbnail_key = self.derive_key(source_url, true);
        self.put(&thumbnail_key, thumbnail).await?;

        let url = self.public_url(&thumbnail_key);
        info!("Thumbnail URL: {}", url);
        Ok(url)
    }

    /// Upload plus thumbnail under keys derived from `source`.
    pub async fn upload_image(&self, source: &str) -> Result<UploadedImage> {
        let source_url = is_remote(source).then_some(source);
        let key = self.derive_key(source_url, false);
        let url = self.upload(source, &key).await?;
        let thumbnail_url = self.make_thumbnail(source_url, &key).await?;

        Ok(UploadedImage {
            key,
            url,
            thumbnail_url,
        })
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, BROWSER_ACCEPT)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus { status, body });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.store
            .put(&StorePath::from(key), PutPayload::from(bytes))
            .await?;
        Ok(())
    }
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
