use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use docrag_core::traits::DocumentStore;
use docrag_core::types::{OwnerId, StoredDocument};
use docrag_core::{Error, Result};

/// Documents laid out on disk as `<root>/<user_id>/<file>`.
///
/// Files nested deeper keep their path below the user directory as the
/// original filename. Entries outside a numeric user directory are skipped.
#[derive(Debug, Clone)]
pub struct DirectoryDocumentStore {
    root: PathBuf,
}

impl DirectoryDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(root: &Path) -> Result<Vec<StoredDocument>> {
        if !root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("document directory {} does not exist", root.display()),
            )));
        }
        let mut docs = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            let mut parts = rel.components();
            let user_dir = parts
                .next()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .unwrap_or_default();
            let filename = parts.as_path().to_string_lossy().to_string();
            if filename.is_empty() {
                tracing::warn!(
                    path = %entry.path().display(),
                    "file outside a user directory skipped"
                );
                continue;
            }
            let Ok(user_id) = user_dir.parse::<OwnerId>() else {
                tracing::warn!(dir = %user_dir, "non-numeric user directory skipped");
                continue;
            };
            let content = read_file_content(entry.path())?;
            docs.push(StoredDocument {
                id: rel.to_string_lossy().to_string(),
                content: Some(content),
                original_filename: filename,
                user_id,
            });
        }
        tracing::debug!(
            root = %root.display(),
            documents = docs.len(),
            "document directory scanned"
        );
        Ok(docs)
    }
}

fn read_file_content(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

#[async_trait]
impl DocumentStore for DirectoryDocumentStore {
    async fn list_documents(&self) -> Result<Vec<StoredDocument>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || Self::scan(&root))
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
    }
}
