//! External collaborators.
//!
//! # Data Flow
//! ```text
//! submissions handler
//!     → object_store.rs (resume upload, S3)
//!     → records.rs      (submission write, DynamoDB)
//!     → email.rs        (operator + submitter mail, SES)
//!
//! projects handler
//!     → records.rs      (query by category index / scan by status)
//! ```
//!
//! # Design Decisions
//! - Handlers only see the traits; AWS clients are built once at startup
//! - In-memory implementations back local development and tests
//! - No retries beyond what the AWS SDK does by default

pub mod email;
pub mod memory;
pub mod object_store;
pub mod records;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{AwsConfig, BackendKind, ServiceConfig};

pub use email::{EmailSender, OutgoingEmail, SesEmailSender};
pub use memory::{MemoryEmailSender, MemoryObjectStore, MemoryRecordStore};
pub use object_store::{content_type_for, resume_key, ObjectStore, S3ObjectStore};
pub use records::{DynamoRecordStore, FieldEq, RecordStore};

/// A collaborator call failed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("object store: {0}")]
    ObjectStore(String),

    #[error("record store: {0}")]
    RecordStore(String),

    #[error("email: {0}")]
    Email(String),

    #[error("decode: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Metric label for the failing collaborator.
    pub fn collaborator(&self) -> &'static str {
        match self {
            UpstreamError::ObjectStore(_) => "object_store",
            UpstreamError::RecordStore(_) => "record_store",
            UpstreamError::Email(_) => "email",
            UpstreamError::Decode(_) => "decode",
        }
    }
}

/// The set of collaborators handed to the HTTP layer.
#[derive(Clone)]
pub struct Collaborators {
    pub objects: Arc<dyn ObjectStore>,
    pub records: Arc<dyn RecordStore>,
    pub email: Arc<dyn EmailSender>,
}

impl Collaborators {
    /// Build the collaborators selected by `storage.backend`.
    pub async fn from_config(config: &ServiceConfig) -> Self {
        match config.storage.backend {
            BackendKind::Aws => Self::aws(&config.aws).await,
            BackendKind::Memory => {
                tracing::warn!("Using in-memory collaborators, nothing is persisted and no email is sent");
                Self::in_memory()
            }
        }
    }

    /// S3, DynamoDB and SES clients, each in its configured region.
    pub async fn aws(config: &AwsConfig) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        tracing::info!(
            s3_region = %config.s3_region(),
            dynamodb_region = %config.dynamodb_region(),
            ses_region = %config.ses_region(),
            "AWS collaborators configured"
        );

        Self {
            objects: Arc::new(S3ObjectStore::new(&shared, config.s3_region())),
            records: Arc::new(DynamoRecordStore::new(&shared, config.dynamodb_region())),
            email: Arc::new(SesEmailSender::new(&shared, config.ses_region())),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            objects: Arc::new(MemoryObjectStore::new()),
            records: Arc::new(MemoryRecordStore::new()),
            email: Arc::new(MemoryEmailSender::new()),
        }
    }
}
