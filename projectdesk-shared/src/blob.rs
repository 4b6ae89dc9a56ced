//! File storage for task attachments

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{DeskError, DeskResult};

/// Default bucket for task attachments
pub const DEFAULT_BUCKET: &str = "project-files";

/// Object storage with public URLs
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `data` under `path`
    async fn upload(&self, path: &str, data: Bytes, content_type: Option<&str>) -> DeskResult<()>;

    /// Public URL of the object at `path`
    fn public_url(&self, path: &str) -> String;
}

/// Storage path of a task attachment: `task-files/{project}/{millis}.{ext}`
pub fn task_attachment_path(project_id: uuid::Uuid, millis: i64, extension: &str) -> String {
    format!("task-files/{}/{}.{}", project_id, millis, extension)
}

/// Stored object
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Map-backed storage for local development and tests
#[derive(Debug, Clone)]
pub struct MemoryBlobStorage {
    base_url: String,
    bucket: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryBlobStorage {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(path).cloned())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(&self, path: &str, data: Bytes, content_type: Option<&str>) -> DeskResult<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| DeskError::Internal("blob storage lock poisoned".to_string()))?;

        if objects.contains_key(path) {
            return Err(DeskError::Conflict(format!("Object already exists: {}", path)));
        }

        objects.insert(
            path.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
    }
}
