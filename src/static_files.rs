//! Static asset serving.
//!
//! A [`StaticAssetResolver`] maps request paths under a prefix (default
//! `/static/`) to files under a root directory. The root is checked when the
//! resolver is built, so a missing folder is a startup error and never a
//! per-request surprise.
//!
//! Requests can only reach files inside the root: `..` segments, absolute
//! remainders and symlinks pointing outside the root are all treated as
//! "not found".

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Error;
use crate::response::{ContentType, Response};

pub const DEFAULT_PREFIX: &str = "/static/";

/// Serves files from `root` for request paths starting with `prefix`.
#[derive(Clone, Debug)]
pub struct StaticAssetResolver {
    root: PathBuf,
    prefix: String,
}

impl StaticAssetResolver {
    /// Resolver for `root` under [`DEFAULT_PREFIX`].
    ///
    /// Fails with [`Error::StaticFolderMisconfigured`] if `root` does not
    /// exist or is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| Error::StaticFolderMisconfigured {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !canonical.is_dir() {
            return Err(Error::StaticFolderMisconfigured {
                path: root.to_path_buf(),
                reason: "not a directory".to_owned(),
            });
        }
        Ok(Self { root: canonical, prefix: DEFAULT_PREFIX.to_owned() })
    }

    /// Replaces the URL prefix. `assets` and `/assets/` are equivalent.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        self.prefix = if trimmed.is_empty() {
            "/".to_owned()
        } else {
            format!("/{trimmed}/")
        };
        self
    }

    pub fn root(&self) -> &Path { &self.root }
    pub fn prefix(&self) -> &str { &self.prefix }

    /// Whether `path` falls under this resolver's prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// The file response for `path`, or `None` when there is nothing to
    /// serve (no match, no file, or a path outside the root).
    pub fn resolve(&self, path: &str) -> Option<Response> {
        let rest = path.strip_prefix(&self.prefix)?;
        let file = self.locate(rest)?;
        match fs::read(&file) {
            Ok(bytes) => {
                debug!(file = %file.display(), len = bytes.len(), "serving static file");
                let content_type = ContentType::from_path(&file);
                Some(Response::builder().bytes(content_type, bytes))
            }
            Err(e) => {
                warn!(file = %file.display(), "static file unreadable: {e}");
                None
            }
        }
    }

    /// Maps the remainder of a request path to an existing file under the root.
    fn locate(&self, rest: &str) -> Option<PathBuf> {
        let mut candidate = self.root.clone();
        for comp in Path::new(rest).components() {
            match comp {
                Component::Normal(part) => candidate.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    warn!(path = rest, "rejected static path outside root");
                    return None;
                }
            }
        }

        // Canonicalizing resolves symlinks; the result has to stay under the root.
        let resolved = candidate.canonicalize().ok()?;
        if !resolved.starts_with(&self.root) {
            warn!(path = rest, "rejected static path escaping root");
            return None;
        }
        resolved.is_file().then_some(resolved)
    }
}
