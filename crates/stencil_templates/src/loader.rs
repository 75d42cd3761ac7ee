//! Template loading from a directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};

/// Default file extension of template files.
pub const DEFAULT_EXTENSION: &str = "mustache";

/// Finds and reads template files under a root directory.
///
/// Template names are paths relative to the root, without extension and
/// with `/` separators: `root/mail/header.mustache` is `mail/header`.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    root: PathBuf,
    extension: String,
}

impl TemplateLoader {
    /// Create a new template loader.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file holding template `name`.
    ///
    /// Names are relative paths that stay under the root: absolute names and
    /// `..` components are rejected.
    pub fn path_of(&self, name: &str) -> TemplateResult<PathBuf> {
        let relative = Path::new(name);
        let contained = relative.components().next().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !contained || name.contains('\\') {
            return Err(TemplateError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", name, self.extension)))
    }

    /// Reads the source of template `name`.
    pub fn load(&self, name: &str) -> TemplateResult<String> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        debug!("Loading template {} from {:?}", name, path);
        Ok(fs::read_to_string(path)?)
    }

    /// Names of every template file under the root, sorted.
    pub fn discover(&self) -> TemplateResult<Vec<String>> {
        if !self.root.exists() {
            warn!("Templates directory does not exist: {:?}", self.root);
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", self.root, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = self.name_of(entry.path()) {
                names.push(name);
            }
        }
        names.sort();

        info!("Discovered {} templates in {:?}", names.len(), self.root);
        Ok(names)
    }

    fn name_of(&self, path: &Path) -> Option<String> {
        if path.extension()?.to_str()? != self.extension {
            return None;
        }
        let relative = path.strip_prefix(&self.root).ok()?.with_extension("");
        let components: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(components.join("/"))
    }
}
