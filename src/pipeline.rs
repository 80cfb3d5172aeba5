use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{PipelineError, StoreError};
use crate::html::CONTENT_TYPE;
use crate::index::{is_markdown_key, is_publishable_page, output_key, render_index};

/// Key/value text storage the pipeline reads sources from and writes pages to.
///
/// Keys are `/`-separated relative names, as in an object store.
pub trait DocumentStore {
    fn read_text(&self, key: &str) -> Result<String, StoreError>;
    fn write(&self, key: &str, body: &str, content_type: &str) -> Result<(), StoreError>;
    fn list_keys(&self) -> Result<Vec<String>, StoreError>;
}

/// A [`DocumentStore`] backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        if key.is_empty() {
            return Err(StoreError::invalid_key(key, "empty"));
        }
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StoreError::invalid_key(key, "must be relative to the store root"));
        }
        Ok(self.root().join(relative))
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> Result<(), StoreError> {
        let entries = fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| StoreError::io(&path, e))?;
            if file_type.is_dir() {
                self.collect_keys(&path, keys)?;
            } else if file_type.is_file() {
                if let Ok(relative) = path.strip_prefix(self.root()) {
                    let key: Vec<_> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect();
                    keys.push(key.join("/"));
                }
            }
        }
        Ok(())
    }
}

impl DocumentStore for FsStore {
    fn read_text(&self, key: &str) -> Result<String, StoreError> {
        let path = self.path_for(key)?;
        let bytes = fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        String::from_utf8(bytes).map_err(|_| StoreError::Encoding {
            key: key.to_string(),
        })
    }

    fn write(&self, key: &str, body: &str, content_type: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        debug!(path = %path.display(), content_type, bytes = body.len(), "writing");
        fs::write(&path, body).map_err(|e| StoreError::io(&path, e))
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        if self.root().is_dir() {
            self.collect_keys(self.root(), &mut keys)?;
        }
        keys.sort();
        Ok(keys)
    }
}

/// Pick the destination for a source location.
///
/// An explicit destination wins. Otherwise a source named `*-in` publishes to
/// `*-out` next to it, and anything else publishes in place.
pub fn route_destination(source: &Path, configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }

    let name = source.file_name().and_then(|n| n.to_str());
    match name.and_then(|n| n.strip_suffix("-in")) {
        Some(stem) => source.with_file_name(format!("{stem}-out")),
        None => source.to_path_buf(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub source: String,
    pub output: String,
}

#[derive(Debug)]
pub struct Failure {
    pub key: String,
    pub error: PipelineError,
}

/// Outcome of one batch. Every key lands in exactly one of the lists.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<Converted>,
    pub skipped: Vec<String>,
    pub failed: Vec<Failure>,
    pub index_updated: bool,
    pub index_error: Option<PipelineError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.index_error.is_none()
    }
}

/// Converts Markdown documents from one store into pages in another and keeps
/// the destination index current.
pub struct Pipeline<S, D> {
    source: S,
    destination: D,
    config: Config,
}

impl<S: DocumentStore, D: DocumentStore> Pipeline<S, D> {
    pub fn new(source: S, destination: D, config: Config) -> Self {
        Self {
            source,
            destination,
            config,
        }
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// Every Markdown key in the source store.
    pub fn pending_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .source
            .list_keys()?
            .into_iter()
            .filter(|key| is_markdown_key(key))
            .collect())
    }

    /// Process a batch of "document created" notifications.
    ///
    /// A failing document is recorded and the rest of the batch continues.
    pub fn process_batch<I>(&self, keys: I) -> BatchReport
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut report = BatchReport::default();

        for key in keys {
            let key = key.as_ref();
            if !is_markdown_key(key) {
                debug!(key, "not markdown, skipping");
                report.skipped.push(key.to_string());
                continue;
            }

            match self.process_document(key) {
                Ok(output) => {
                    info!(source = key, output = %output, "converted");
                    report.converted.push(Converted {
                        source: key.to_string(),
                        output,
                    });
                }
                Err(error) => {
                    warn!(key, %error, "conversion failed");
                    report.failed.push(Failure {
                        key: key.to_string(),
                        error,
                    });
                }
            }
        }

        if !report.converted.is_empty() {
            match self.rebuild_index() {
                Ok(_) => report.index_updated = true,
                Err(error) => {
                    warn!(%error, "index update failed");
                    report.index_error = Some(error);
                }
            }
        }

        report
    }

    /// Convert one document and write its page. Returns the output key.
    pub fn process_document(&self, key: &str) -> Result<String, PipelineError> {
        let markdown = self
            .source
            .read_text(key)
            .map_err(|source| PipelineError::Read {
                key: key.to_string(),
                source,
            })?;

        let html = crate::markdown_to_html_with_config(&markdown, &self.config);
        let output = output_key(key);

        self.destination
            .write(&output, &html, CONTENT_TYPE)
            .map_err(|source| PipelineError::Write {
                key: output.clone(),
                source,
            })?;

        Ok(output)
    }

    /// Regenerate the index from the pages currently in the destination.
    /// Returns the number of pages listed.
    pub fn rebuild_index(&self) -> Result<usize, PipelineError> {
        let index = &self.config.index;
        let keys = self
            .destination
            .list_keys()
            .map_err(|source| PipelineError::Index { source })?;

        let pages: Vec<&str> = keys
            .iter()
            .map(String::as_str)
            .filter(|key| is_publishable_page(key, index))
            .collect();
        let html = render_index(pages.iter().copied(), index);

        self.destination
            .write(&index.file_name, &html, CONTENT_TYPE)
            .map_err(|source| PipelineError::Index { source })?;

        debug!(pages = pages.len(), "index rebuilt");
        Ok(pages.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("/data/notes-in", None, "/data/notes-out")]
    #[case("/data/inbox-in", None, "/data/inbox-out")]
    #[case("/data/notes", None, "/data/notes")]
    #[case("/data/notes-in", Some("/srv/site"), "/srv/site")]
    fn routing(#[case] source: &str, #[case] configured: Option<&str>, #[case] expected: &str) {
        assert_eq!(
            route_destination(Path::new(source), configured.map(Path::new)),
            PathBuf::from(expected)
        );
    }

    #[rstest]
    #[case("")]
    #[case("../escape.md")]
    #[case("/etc/passwd")]
    #[case("a/../../b.md")]
    fn rejects_keys_outside_root(#[case] key: &str) {
        let store = FsStore::new("/tmp/store");
        assert!(matches!(
            store.path_for(key),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn nested_keys_round_trip_through_fs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path());
        assert_eq!(store.root(), dir.path());
        store.write("a/b/c.html", "x", CONTENT_TYPE).expect("write");
        store.write("top.html", "y", CONTENT_TYPE).expect("write");

        assert_eq!(
            store.list_keys().expect("list"),
            vec!["a/b/c.html".to_string(), "top.html".to_string()]
        );
        assert_eq!(store.read_text("a/b/c.html").expect("read"), "x");
    }

    #[test]
    fn missing_root_lists_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path().join("absent"));
        assert!(store.list_keys().expect("list").is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("bad.md"), [0xff, 0xfe, 0x00]).expect("write");
        let store = FsStore::new(dir.path());
        assert!(matches!(
            store.read_text("bad.md"),
            Err(StoreError::Encoding { .. })
        ));
    }
}
