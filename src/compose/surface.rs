//! Compose surface: where drafts are read from and merged bodies written to

use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::merge::merge_reply;
use crate::ai::GeneratedReply;
use crate::mail::{ComposeDraft, MergedCompose};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid draft: {0}")]
    Json(#[from] serde_json::Error),
    #[error("draft must be a JSON object")]
    NotAnObject,
}

pub trait ComposeSurface: Send {
    /// Current state of the draft
    fn draft(&self) -> impl Future<Output = Result<ComposeDraft, SurfaceError>> + Send;

    /// Replace the draft body
    fn set_body(
        &mut self,
        merged: MergedCompose,
    ) -> impl Future<Output = Result<(), SurfaceError>> + Send;
}

/// Merge a successfully generated reply into the surface's current body
pub async fn apply_reply<C: ComposeSurface>(
    surface: &mut C,
    reply: &GeneratedReply,
) -> Result<MergedCompose, SurfaceError> {
    let draft = surface.draft().await?;
    let merged = merge_reply(reply, &draft.body);
    surface.set_body(merged.clone()).await?;
    tracing::info!("Reply inserted into compose body");
    Ok(merged)
}

/// Draft stored as a JSON compose-details file.
///
/// Fields other than `body` and `isPlainText` are left untouched on write.
#[derive(Debug, Clone)]
pub struct DraftFile {
    path: PathBuf,
}

impl DraftFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ComposeSurface for DraftFile {
    async fn draft(&self) -> Result<ComposeDraft, SurfaceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn set_body(&mut self, merged: MergedCompose) -> Result<(), SurfaceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let mut value: Value = serde_json::from_str(&content)?;
        let fields = value.as_object_mut().ok_or(SurfaceError::NotAnObject)?;
        fields.insert("body".to_string(), Value::String(merged.body));
        fields.insert("isPlainText".to_string(), Value::Bool(merged.is_plain_text));

        let content = serde_json::to_string_pretty(&value)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}
