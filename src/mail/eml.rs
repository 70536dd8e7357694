//! Mail store over a directory tree of `.eml` files.
//!
//! Each subdirectory is a folder (files directly under the root belong to
//! `Inbox`). Message ids are assigned in sorted path order when the store is
//! opened, so thread listings come back oldest first for conventionally named
//! files.

use std::path::{Path, PathBuf};

use super::parser::{ParsedMessage, parse_message};
use super::store::{MailStore, StoreError};
use super::types::{FullMessage, InlineTextPart, MessageHeader, MessageId};

const ROOT_FOLDER: &str = "Inbox";

#[derive(Debug, Clone)]
struct EmlEntry {
    id: MessageId,
    folder: String,
    thread_id: String,
    path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EmlStore {
    root: PathBuf,
    entries: Vec<EmlEntry>,
}

impl EmlStore {
    /// Scan `root` and index every `.eml` file found
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        let is_dir = tokio::fs::metadata(&root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut paths = collect_eml_files(&root).await?;
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for (index, path) in paths.into_iter().enumerate() {
            let id = MessageId(index as u32 + 1);
            let raw = tokio::fs::read(&path).await?;
            let Some(parsed) = parse_message(&raw) else {
                tracing::warn!("Skipping unparseable message {}", path.display());
                continue;
            };

            let folder = path
                .parent()
                .and_then(|dir| dir.strip_prefix(&root).ok())
                .map(|rel| rel.to_string_lossy().replace('\\', "/"))
                .filter(|rel| !rel.is_empty())
                .unwrap_or_else(|| ROOT_FOLDER.to_string());
            let thread_id = parsed
                .thread_root
                .unwrap_or_else(|| format!("local-{}", id));

            entries.push(EmlEntry {
                id,
                folder,
                thread_id,
                path,
            });
        }

        tracing::info!("Indexed {} messages under {}", entries.len(), root.display());
        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: MessageId) -> Result<&EmlEntry, StoreError> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    async fn load(&self, entry: &EmlEntry) -> Result<ParsedMessage, StoreError> {
        let raw = tokio::fs::read(&entry.path).await?;
        parse_message(&raw).ok_or(StoreError::Parse(entry.id))
    }

    async fn header(&self, entry: &EmlEntry) -> Result<MessageHeader, StoreError> {
        let parsed = self.load(entry).await?;
        Ok(MessageHeader {
            id: entry.id,
            subject: parsed.subject,
            folder: entry.folder.clone(),
            thread_id: entry.thread_id.clone(),
            snippet: parsed.snippet,
        })
    }
}

/// Walk `root` for `.eml` files. Symlinks are not followed.
async fn collect_eml_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let path = entry.path();
            if file_type.is_symlink() {
                tracing::debug!("Skipping symlink {}", path.display());
            } else if file_type.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"))
            {
                found.push(path);
            }
        }
    }
    Ok(found)
}

impl MailStore for EmlStore {
    async fn get_full_message(&self, id: MessageId) -> Result<FullMessage, StoreError> {
        let parsed = self.load(self.entry(id)?).await?;
        Ok(FullMessage {
            parts: parsed.parts.into_iter().map(|(part, _)| part).collect(),
        })
    }

    async fn get_message(&self, id: MessageId) -> Result<MessageHeader, StoreError> {
        self.header(self.entry(id)?).await
    }

    async fn list_thread_messages(
        &self,
        folder: &str,
        thread_id: &str,
    ) -> Result<Vec<MessageHeader>, StoreError> {
        let mut headers = Vec::new();
        for entry in self
            .entries
            .iter()
            .filter(|e| e.folder == folder && e.thread_id == thread_id)
        {
            headers.push(self.header(entry).await?);
        }
        Ok(headers)
    }

    async fn list_inline_text_parts(
        &self,
        id: MessageId,
        part_ids: &[String],
    ) -> Result<Vec<InlineTextPart>, StoreError> {
        let parsed = self.load(self.entry(id)?).await?;
        Ok(parsed
            .parts
            .into_iter()
            .filter(|(part, _)| part_ids.contains(&part.part_id))
            .map(|(part, content)| InlineTextPart {
                part_id: part.part_id,
                content,
            })
            .collect())
    }
}
