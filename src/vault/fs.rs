//! Filesystem-backed vault.

use super::Vault;
use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// A vault rooted at a directory of markdown files.
///
/// Paths handed to the [`Vault`] methods are vault-relative with forward
/// slashes; lexical `..` traversal out of the root is rejected.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Creates a vault over the given root directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The vault root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalizes a vault-relative path lexically, rejecting escapes.
    fn normalize(path: &str) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::ParentDir => {
                    parts.pop()?;
                }
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }

    fn absolute(&self, path: &str) -> Option<PathBuf> {
        Self::normalize(path).map(|p| self.root.join(p))
    }

    /// All markdown files in the vault, as sorted vault-relative paths.
    #[must_use]
    pub fn markdown_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().is_some_and(|e| e == "md") {
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        files.push(rel.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
        }
        files.sort();
        files
    }

    /// Tries a candidate relative path, returning its normalized form when a
    /// file exists there.
    fn existing(&self, candidate: &str) -> Option<String> {
        let normalized = Self::normalize(candidate)?;
        self.root.join(&normalized).is_file().then_some(normalized)
    }

    /// Finds a note whose file name (with or without `.md`) matches the raw
    /// target, case-insensitively, anywhere in the vault.
    fn resolve_by_basename(&self, raw: &str) -> Option<String> {
        let wanted = raw.rsplit('/').next().unwrap_or(raw).to_lowercase();
        let wanted_md = format!("{wanted}.md");
        self.markdown_files().into_iter().find(|path| {
            let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
            name == wanted || name == wanted_md
        })
    }
}

impl Vault for FsVault {
    fn read(&self, path: &str) -> Result<String> {
        let abs = self.absolute(path).ok_or_else(|| Error::OperationFailed {
            operation: "read_note".to_string(),
            cause: format!("invalid path: {path}"),
        })?;
        std::fs::read_to_string(&abs).map_err(|e| Error::OperationFailed {
            operation: "read_note".to_string(),
            cause: format!("{}: {e}", abs.display()),
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.absolute(path).is_some_and(|p| p.is_file())
    }

    fn resolve_link_target(&self, raw: &str, from: &str) -> Option<String> {
        let raw = raw.trim();
        // A bare `#Heading` link refers back to the linking note itself.
        if raw.is_empty() {
            return self.exists(from).then(|| from.to_string());
        }

        let with_ext = if raw.to_lowercase().ends_with(".md") {
            raw.to_string()
        } else {
            format!("{raw}.md")
        };

        let parent = Path::new(from)
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        for candidate in [raw.to_string(), with_ext] {
            if !parent.is_empty() {
                if let Some(found) = self.existing(&format!("{parent}/{candidate}")) {
                    return Some(found);
                }
            }
            if let Some(found) = self.existing(&candidate) {
                return Some(found);
            }
        }

        self.resolve_by_basename(raw)
    }
}
