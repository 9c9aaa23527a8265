//! Export Integration Tests

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;
use tempfile::tempdir;
use thug_core::{JsonLogError, RunOptions};
use thug_jsonlog::{ContentStore, GraphRenderer, JsonLog, NullRenderer, Report};

fn opts(json_logging: bool, file_logging: bool) -> RunOptions {
    let mut opts = RunOptions::default();
    opts.json_logging = json_logging;
    opts.file_logging = file_logging;
    opts
}

struct CountingRenderer(Rc<Cell<usize>>);

impl GraphRenderer for CountingRenderer {
    fn render(&self, _report: &Report, _dir: &Path) -> Result<(), JsonLogError> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

struct FailingStore;

impl ContentStore for FailingStore {
    fn store_content(
        &self,
        _dir: &Path,
        _name: &str,
        _content: &[u8],
    ) -> Result<PathBuf, JsonLogError> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
    }
}

#[test]
fn test_export_round_trip() {
    let temp = tempdir().unwrap();
    let mut log = JsonLog::new("test", opts(true, false));

    log.record_code("a\nb", "js", "script");
    log.export(temp.path()).unwrap();

    let text = log.get_serialized().expect("export should cache the report");
    let parsed: Value = serde_json::from_str(text).unwrap();
    assert_eq!(parsed["code"][0]["snippet"], "ab");
    assert_eq!(parsed["code"][0]["language"], "js");
    assert_eq!(parsed["logtype"], "json-log");
    assert_eq!(parsed["thug"]["version"], "test");
}

#[test]
fn test_serialized_absent_before_export() {
    let mut log = JsonLog::new("test", opts(true, false));
    log.record_code("x", "js", "script");
    assert!(log.get_serialized().is_none());
}

#[test]
fn test_cache_is_stable_between_reads() {
    let temp = tempdir().unwrap();
    let mut log = JsonLog::new("test", opts(true, false));
    log.record_code("x", "js", "script");
    log.export(temp.path()).unwrap();

    let first = log.get_serialized().unwrap().to_string();
    // Recording after export does not touch the cache
    log.record_code("y", "js", "script");
    assert_eq!(log.get_serialized(), Some(first.as_str()));
    assert_eq!(log.get_serialized(), Some(first.as_str()));
}

#[test]
fn test_inactive_export_is_noop() {
    let temp = tempdir().unwrap();
    let mut log = JsonLog::new("test", opts(false, true));
    log.export(temp.path()).unwrap();

    assert!(log.get_serialized().is_none());
    assert!(!temp.path().join("analysis").exists());
}

#[test]
fn test_persisted_layout() {
    let temp = tempdir().unwrap();
    let mut log = JsonLog::new("test", opts(true, true));
    log.set_subject_url("http://a/");
    log.record_connection("http://a/", "http://b/", "iframe", Default::default());
    log.export(temp.path()).unwrap();

    let dir = temp.path().join("analysis").join("json");
    let on_disk = std::fs::read_to_string(dir.join("analysis.json")).unwrap();
    assert_eq!(Some(on_disk.as_str()), log.get_serialized());

    let graph = std::fs::read_to_string(dir.join("graph.dot")).unwrap();
    assert!(graph.contains("http://b/"));
}

#[test]
fn test_format_only_keeps_report_in_memory() {
    let temp = tempdir().unwrap();
    let renders = Rc::new(Cell::new(0));
    let mut options = opts(false, true);
    options.output_formats.insert(thug_core::OutputFormat::Json);

    let mut log =
        JsonLog::new("test", options).with_renderer(Box::new(CountingRenderer(renders.clone())));
    log.export(temp.path()).unwrap();

    assert!(log.get_serialized().is_some());
    assert_eq!(renders.get(), 0);
    assert!(!temp.path().join("analysis").exists());
}

#[test]
fn test_renderer_called_once_per_persisted_export() {
    let temp = tempdir().unwrap();
    let renders = Rc::new(Cell::new(0));
    let mut log = JsonLog::new("test", opts(true, true))
        .with_renderer(Box::new(CountingRenderer(renders.clone())));

    log.export(temp.path()).unwrap();
    assert_eq!(renders.get(), 1);
}

#[test]
fn test_store_failure_still_caches() {
    let temp = tempdir().unwrap();
    let mut log = JsonLog::new("test", opts(true, true))
        .with_store(Box::new(FailingStore))
        .with_renderer(Box::new(NullRenderer));

    let err = log.export(temp.path()).unwrap_err();
    assert_eq!(err.code(), "io");
    assert!(log.get_serialized().is_some());
}

#[test]
fn test_field_order_preserved_in_output() {
    let temp = tempdir().unwrap();
    let mut log = JsonLog::new("test", opts(true, false));
    log.export(temp.path()).unwrap();

    let text = log.get_serialized().unwrap();
    let positions: Vec<usize> = [
        "\"url\"",
        "\"timestamp\"",
        "\"logtype\"",
        "\"thug\"",
        "\"behavior\"",
        "\"code\"",
        "\"files\"",
        "\"connections\"",
        "\"locations\"",
        "\"exploits\"",
        "\"classifiers\"",
    ]
    .iter()
    .map(|key| text.find(key).unwrap())
    .collect();

    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
}
