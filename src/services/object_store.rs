//! Object storage for uploaded resumes.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use super::UpstreamError;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `bucket/key` and return a locator for the object.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String, UpstreamError>;
}

/// `resumes/<submissionId>/<epochMillis>-<fileName>`.
///
/// Path separators in the client supplied name are flattened so the object
/// always lands under the submission's prefix.
pub fn resume_key(submission_id: &str, now_ms: u64, file_name: &str) -> String {
    let file_name: String = file_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("resumes/{submission_id}/{now_ms}-{file_name}")
}

/// Content type from the file extension; unknown types are generic binary.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    region: String,
}

impl S3ObjectStore {
    pub fn new(shared: &aws_config::SdkConfig, region: &str) -> Self {
        let config = aws_sdk_s3::config::Builder::from(shared)
            .region(aws_sdk_s3::config::Region::new(region.to_string()))
            .build();
        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            region: region.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String, UpstreamError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .set_metadata(Some(metadata))
            .send()
            .await
            .map_err(|e| UpstreamError::ObjectStore(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(bucket = %bucket, key = %key, size, "Object stored");
        Ok(format!("https://{bucket}.s3.{}.amazonaws.com/{key}", self.region))
    }
}
