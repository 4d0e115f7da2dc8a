//! Templates stored as files in a local directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::sources::template::is_plain_name;
use crate::sources::{Context, SourceError, SourceResult, TemplateSource};

/// Every regular, non-hidden file directly inside the interpolated
/// directory is one template, named after the file.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateSource {
    path: String,
    context: Context,
}

impl DirectoryTemplateSource {
    pub fn new(path: impl Into<String>, context: Context) -> Self {
        Self {
            path: path.into(),
            context,
        }
    }

    fn directory(&self) -> PathBuf {
        PathBuf::from(self.context.interpolate(&self.path))
    }
}

#[async_trait]
impl TemplateSource for DirectoryTemplateSource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn list_templates(&self) -> SourceResult<Vec<String>> {
        let dir = self.directory();
        tracing::debug!(path = %dir.display(), "Listing templates");

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(SourceError::Io { path: dir, source }),
        };

        let mut names = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|source| SourceError::Io {
                path: dir.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };

            let file_type = entry.file_type().await.map_err(|source| SourceError::Io {
                path: entry.path(),
                source,
            })?;
            if !file_type.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn fetch_template(&self, template: &str) -> SourceResult<Option<String>> {
        if !is_plain_name(template) {
            return Ok(None);
        }

        let path = self.directory().join(template);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SourceError::Io { path, source }),
        }
    }
}
