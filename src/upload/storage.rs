//! Object-store transport using Apache OpenDAL's S3 service.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use opendal::{Operator, Writer, services};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::dependencies::Transport;
use super::extension;
use crate::config::StorageTarget;

/// Part size for multipart uploads.
const UPLOAD_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Publishes files to an S3-compatible bucket.
pub struct S3Transport {
    operator: Operator,
    bucket: String,
}

impl S3Transport {
    /// Builds the S3 operator. No network traffic happens here.
    pub fn from_target(target: &StorageTarget) -> Result<Self> {
        let builder = services::S3::default()
            .endpoint(&target.endpoint)
            .bucket(&target.bucket)
            .access_key_id(&target.access_key)
            .secret_access_key(&target.secret_key)
            .region(&target.region);

        let operator = Operator::new(builder)
            .with_context(|| format!("invalid S3 settings for bucket '{}'", target.bucket))?
            .finish();

        Ok(Self {
            operator,
            bucket: target.bucket.clone(),
        })
    }

    /// Drops any parts already sent for a failed write.
    async fn abort(&self, writer: &mut Writer, key: &str) {
        if let Err(e) = writer.abort().await {
            log::warn!("Failed to abort S3 write to {}/{}: {}", self.bucket, key, e);
        }
    }
}

#[async_trait]
impl Transport for S3Transport {
    async fn publish(&self, local_path: &Path, key: &str) -> Result<(), String> {
        let mut file = File::open(local_path)
            .await
            .map_err(|e| format!("failed to open {}: {}", local_path.display(), e))?;

        log::debug!(
            "Publishing {} to {}/{} in {} byte chunks",
            local_path.display(),
            self.bucket,
            key,
            UPLOAD_CHUNK_SIZE
        );

        let writer = self.operator.writer_with(key).chunk(UPLOAD_CHUNK_SIZE);
        let writer = match extension::content_type_for(extension::classify(key)) {
            Some(content_type) => writer.content_type(content_type),
            None => writer,
        };
        let mut writer = writer
            .await
            .map_err(|e| format!("S3 write to {}/{} failed: {}", self.bucket, key, e))?;

        let mut sent = 0u64;
        loop {
            let mut chunk = Vec::with_capacity(UPLOAD_CHUNK_SIZE);
            let read = (&mut file)
                .take(UPLOAD_CHUNK_SIZE as u64)
                .read_to_end(&mut chunk)
                .await;
            let read = match read {
                Ok(read) => read,
                Err(e) => {
                    self.abort(&mut writer, key).await;
                    return Err(format!("failed to read {}: {}", local_path.display(), e));
                }
            };
            if read == 0 {
                break;
            }
            if let Err(e) = writer.write(chunk).await {
                self.abort(&mut writer, key).await;
                return Err(format!("S3 write to {}/{} failed: {}", self.bucket, key, e));
            }
            sent += read as u64;
        }

        writer
            .close()
            .await
            .map_err(|e| format!("S3 write to {}/{} failed: {}", self.bucket, key, e))?;

        log::info!("Published {} bytes to {}/{}", sent, self.bucket, key);
        Ok(())
    }
}
