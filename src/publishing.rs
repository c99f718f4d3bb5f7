// src/publishing.rs
use std::path::PathBuf;

use anyhow::Context;
use aws_sdk_s3::primitives::ByteStream;
use serde_json::json;

use crate::error::{LoanscanError, Result};

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &'static str;
    /// Publish the serialized report.
    async fn publish(&self, document: &str) -> anyhow::Result<()>;
}

/// Prints the document, as operators read it from the job log.
pub struct StdoutPublisher;

#[async_trait::async_trait]
impl Publisher for StdoutPublisher {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn publish(&self, document: &str) -> anyhow::Result<()> {
        println!("{document}");
        Ok(())
    }
}

/// Writes the document to a local path.
pub struct FilePublisher {
    pub path: PathBuf,
}

impl FilePublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Publisher for FilePublisher {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn publish(&self, document: &str) -> anyhow::Result<()> {
        tokio::fs::write(&self.path, document.as_bytes())
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), bytes = document.len(), "report written");
        Ok(())
    }
}

/// Anonymous read-only grant on a single object.
pub fn read_only_policy(bucket: &str, key: &str) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "AddPerm",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{bucket}/{key}")],
        }],
    })
}

/// Uploads the document to S3 and (re)applies the public-read policy.
pub struct S3Publisher {
    client: aws_sdk_s3::Client,
    pub bucket: String,
    pub key: String,
}

impl S3Publisher {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into(), key: key.into() }
    }

    /// Client from the ambient AWS credential chain, pinned to `region`.
    pub async fn from_env(region: &str, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(aws_sdk_s3::Client::new(&shared), bucket, key)
    }
}

#[async_trait::async_trait]
impl Publisher for S3Publisher {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn publish(&self, document: &str) -> anyhow::Result<()> {
        let put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .content_type("application/json")
            .body(ByteStream::from(document.as_bytes().to_vec()))
            .send()
            .await
            .with_context(|| format!("put_object s3://{}/{}", self.bucket, self.key))?;
        tracing::info!(bucket = %self.bucket, key = %self.key, etag = ?put.e_tag(), "upload ok");

        let policy = read_only_policy(&self.bucket, &self.key).to_string();
        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(policy)
            .send()
            .await
            .with_context(|| format!("put_bucket_policy {}", self.bucket))?;
        tracing::info!(bucket = %self.bucket, "bucket policy set");
        Ok(())
    }
}

/// Run publishers in order; the first failure stops the chain. Earlier
/// outputs (e.g. the local file) are left in place.
pub async fn publish_all(publishers: &[Box<dyn Publisher>], document: &str) -> Result<()> {
    for p in publishers {
        if let Err(e) = p.publish(document).await {
            tracing::error!(publisher = p.name(), "publish failed: {e:?}");
            return Err(LoanscanError::PublishFailure(e.into()));
        }
    }
    Ok(())
}
