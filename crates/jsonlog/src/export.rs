// jsonlog/export.rs
// Serialize the report, optionally persist it with its graph, cache the text

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use thug_core::JsonLogError;

use crate::document::Report;
use crate::mapper::{DotMapper, GraphRenderer};
use crate::storage::{ContentStore, FsContentStore};

pub const REPORT_FILE: &str = "analysis.json";

/// `<base>/analysis/json`
pub fn log_dir(base_dir: &Path) -> PathBuf {
    base_dir.join("analysis").join("json")
}

pub struct Exporter {
    store: Box<dyn ContentStore>,
    renderer: Box<dyn GraphRenderer>,
    cached: Option<String>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(Box::new(FsContentStore), Box::new(DotMapper))
    }
}

impl Exporter {
    pub fn new(store: Box<dyn ContentStore>, renderer: Box<dyn GraphRenderer>) -> Self {
        Self {
            store,
            renderer,
            cached: None,
        }
    }

    pub fn set_store(&mut self, store: Box<dyn ContentStore>) {
        self.store = store;
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn GraphRenderer>) {
        self.renderer = renderer;
    }

    /// Pretty JSON with 4-space indentation, field order as declared
    pub fn to_json(report: &Report) -> Result<String, JsonLogError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        report.serialize(&mut ser)?;
        String::from_utf8(buf)
            .map_err(|e| JsonLogError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Serializes and caches the report. With `persist`, also writes
    /// analysis.json and the companion graph under `base_dir`.
    /// The cache is populated before any write is attempted.
    pub fn export(
        &mut self,
        report: &Report,
        base_dir: &Path,
        persist: bool,
    ) -> Result<(), JsonLogError> {
        let text = Self::to_json(report)?;
        let text = self.cached.insert(text);

        if persist {
            let dir = log_dir(base_dir);
            let path = self.store.store_content(&dir, REPORT_FILE, text.as_bytes())?;
            self.renderer.render(report, &dir)?;
            tracing::info!("📁 JSON report exported: {:?}", path);
        }

        Ok(())
    }

    pub fn cached(&self) -> Option<&str> {
        self.cached.as_deref()
    }
}
