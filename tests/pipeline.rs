use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;

use notepress::pipeline::{DocumentStore, FsStore, Pipeline};
use notepress::{CONTENT_TYPE, Config, PipelineError, StoreError};
use pretty_assertions::assert_eq;

/// In-memory store; keys listed in `broken` fail to read.
#[derive(Default)]
struct MemoryStore {
    objects: RefCell<BTreeMap<String, (String, String)>>,
    broken: Vec<&'static str>,
}

impl MemoryStore {
    fn with(objects: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (key, body) in objects {
            store
                .objects
                .borrow_mut()
                .insert(key.to_string(), (body.to_string(), "text/markdown".to_string()));
        }
        store
    }

    fn body(&self, key: &str) -> Option<String> {
        self.objects.borrow().get(key).map(|(body, _)| body.clone())
    }

    fn content_type(&self, key: &str) -> Option<String> {
        self.objects.borrow().get(key).map(|(_, ct)| ct.clone())
    }
}

impl DocumentStore for MemoryStore {
    fn read_text(&self, key: &str) -> Result<String, StoreError> {
        if self.broken.iter().any(|broken| *broken == key) {
            return Err(StoreError::Encoding {
                key: key.to_string(),
            });
        }
        self.body(key).ok_or_else(|| {
            StoreError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such key"),
            )
        })
    }

    fn write(&self, key: &str, body: &str, content_type: &str) -> Result<(), StoreError> {
        self.objects.borrow_mut().insert(
            key.to_string(),
            (body.to_string(), content_type.to_string()),
        );
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.objects.borrow().keys().cloned().collect())
    }
}

#[test]
fn converts_markdown_and_indexes_pages() {
    let source = MemoryStore::with(&[
        ("b.md", "# B"),
        ("a.md", "Some **bold** text."),
        ("notes/c.MD", "- item"),
    ]);
    let pipeline = Pipeline::new(source, MemoryStore::default(), Config::default());

    let report = pipeline.process_batch(["b.md", "a.md", "notes/c.MD"]);

    assert!(report.is_success());
    assert!(report.index_updated);
    assert_eq!(report.converted.len(), 3);

    let dest = pipeline.destination();
    let page = dest.body("a.html").expect("a.html written");
    assert!(page.contains("<p>Some <strong>bold</strong> text.</p>"));
    assert_eq!(dest.content_type("a.html").as_deref(), Some(CONTENT_TYPE));
    assert!(dest.body("notes/c.html").expect("nested page").contains("<li>item</li>"));

    let index = dest.body("index.html").expect("index written");
    assert!(index.contains(
        "<li><a href=\"a.html\">a.html</a></li>\n\
         <li><a href=\"b.html\">b.html</a></li>\n\
         <li><a href=\"notes/c.html\">notes/c.html</a></li>"
    ));
    assert!(!index.contains("href=\"index.html\""));
}

#[test]
fn non_markdown_keys_are_skipped() {
    let source = MemoryStore::with(&[("photo.png", "binary")]);
    let pipeline = Pipeline::new(source, MemoryStore::default(), Config::default());

    let report = pipeline.process_batch(["photo.png"]);

    assert_eq!(report.skipped, vec!["photo.png".to_string()]);
    assert!(report.converted.is_empty());
    assert!(!report.index_updated);
    assert!(pipeline.destination().body("index.html").is_none());
}

#[test]
fn one_failing_document_does_not_block_siblings() {
    let mut source = MemoryStore::with(&[("good.md", "ok"), ("bad.md", "ok")]);
    source.broken.push("bad.md");
    let pipeline = Pipeline::new(source, MemoryStore::default(), Config::default());

    let report = pipeline.process_batch(["bad.md", "missing.md", "good.md"]);

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 2);
    assert!(matches!(
        report.failed[0].error,
        PipelineError::Read {
            source: StoreError::Encoding { .. },
            ..
        }
    ));
    assert_eq!(report.failed[1].key, "missing.md");
    assert_eq!(report.converted.len(), 1);
    assert_eq!(report.converted[0].output, "good.html");
    assert!(report.index_updated);
}

#[test]
fn publishes_between_directories() {
    let root = tempfile::tempdir().expect("tempdir");
    let source_dir = root.path().join("notes-in");
    let dest_dir = root.path().join("notes-out");
    fs::create_dir_all(source_dir.join("sub")).expect("mkdir");
    fs::write(source_dir.join("hello.md"), "# Hello\n\nSee [site](http://x).").expect("write");
    fs::write(source_dir.join("sub/deep.md"), "*deep*").expect("write");
    fs::write(source_dir.join("readme.txt"), "ignored").expect("write");

    let destination = notepress::pipeline::route_destination(&source_dir, None);
    assert_eq!(destination, dest_dir);

    let pipeline = Pipeline::new(
        FsStore::new(&source_dir),
        FsStore::new(&destination),
        Config::default(),
    );
    let keys = pipeline.pending_keys().expect("list");
    assert_eq!(keys, vec!["hello.md".to_string(), "sub/deep.md".to_string()]);

    let report = pipeline.process_batch(&keys);
    assert!(report.is_success());

    let hello = fs::read_to_string(dest_dir.join("hello.html")).expect("hello.html");
    assert!(hello.starts_with("<!doctype html>"));
    assert!(hello.contains("<h1>Hello</h1>\n\n<p>See <a href=\"http://x\" target=\"_blank\" rel=\"noopener noreferrer\">site</a>.</p>"));

    let deep = fs::read_to_string(dest_dir.join("sub/deep.html")).expect("deep.html");
    assert!(deep.contains("<p><em>deep</em></p>"));

    let index = fs::read_to_string(dest_dir.join("index.html")).expect("index.html");
    assert!(index.contains("<a href=\"hello.html\">hello.html</a>"));
    assert!(index.contains("<a href=\"sub/deep.html\">sub/deep.html</a>"));
}

#[test]
fn index_lists_pages_from_earlier_batches() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("old.html"), "<p>old</p>").expect("write");
    fs::write(dir.path().join("new.md"), "new").expect("write");

    let store = FsStore::new(dir.path());
    let pipeline = Pipeline::new(store.clone(), store, Config::default());
    let report = pipeline.process_batch(["new.md"]);
    assert!(report.is_success());

    let index = fs::read_to_string(dir.path().join("index.html")).expect("index");
    assert!(index.contains("new.html"));
    assert!(index.contains("old.html"));
    assert!(!index.contains("new.md"));
}

#[test]
fn conversions_run_independently_across_threads() {
    let docs: Vec<String> = (0..8)
        .map(|i| format!("# Doc {i}\n- a{i}\n- b{i}\n\ntext {i}"))
        .collect();

    let results: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = docs
            .iter()
            .map(|doc| scope.spawn(move || notepress::markdown_to_html(doc)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("conversion thread"))
            .collect()
    });

    for (i, html) in results.iter().enumerate() {
        assert!(html.contains(&format!(
            "<h1>Doc {i}</h1>\n<ul>\n<li>a{i}</li>\n<li>b{i}</li>\n</ul>\n\n<p>text {i}</p>"
        )));
    }
}
