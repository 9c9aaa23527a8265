//! The JSON analysis logger.
//!
//! [`JsonLog`] owns one [`Report`] for the lifetime of a run. Every recording
//! operation checks the activation gate first and silently does nothing when
//! it is closed, so call sites in the analysis code stay unconditional.
//! Recording never fails: text is normalized, optional data defaults to null.
//!
//! One writer per instance. Concurrent analyses each own their own logger.

use serde_json::Value;
use std::path::Path;

use thug_core::{EncodingDetector, JsonLogError, RunOptions};

use crate::document::{
    now_timestamp, BehaviorEntry, ClassifierEntry, CodeEntry, ConnectionEntry, ConnectionFlags,
    ExploitEntry, LocationEntry, LocationFlags, Report,
};
use crate::export::Exporter;
use crate::gate::{ActivationGate, GateMode};
use crate::mapper::GraphRenderer;
use crate::normalize::{Payload, TextNormalizer};
use crate::observation::{BehaviorNote, FetchedContent, Observation};
use crate::storage::ContentStore;

pub const DEFAULT_METHOD: &str = "Dynamic Analysis";

pub struct JsonLog {
    options: RunOptions,
    gate: ActivationGate,
    normalizer: TextNormalizer,
    report: Report,
    exporter: Exporter,
}

impl JsonLog {
    /// Logger that records only when the options ask for JSON
    pub fn new(version: &str, options: RunOptions) -> Self {
        Self::with_mode(version, options, GateMode::Configured)
    }

    /// Always-on logger, for callers that consume the report directly
    pub fn provider(version: &str, options: RunOptions) -> Self {
        Self::with_mode(version, options, GateMode::Provider)
    }

    pub fn with_mode(version: &str, options: RunOptions, mode: GateMode) -> Self {
        let report = Report::new(version, &options);
        Self {
            options,
            gate: ActivationGate::new(mode),
            normalizer: TextNormalizer::default(),
            report,
            exporter: Exporter::default(),
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn EncodingDetector>) -> Self {
        self.normalizer = TextNormalizer::new(detector);
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn GraphRenderer>) -> Self {
        self.exporter.set_renderer(renderer);
        self
    }

    pub fn with_store(mut self, store: Box<dyn ContentStore>) -> Self {
        self.exporter.set_store(store);
        self
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active(&self.options)
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Swap in new run options. The gate follows them from the next call on;
    /// the metadata block keeps what was captured at construction.
    pub fn reconfigure(&mut self, options: RunOptions) {
        self.options = options;
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    fn accepts(&self, kind: &str) -> bool {
        let active = self.is_active();
        if !active {
            tracing::trace!(kind, "json logging inactive, event dropped");
        }
        active
    }

    pub fn set_subject_url<'a>(&mut self, url: impl Into<Payload<'a>>) {
        if !self.accepts("url") {
            return;
        }
        self.report.url = Some(self.normalizer.fix(url.into()));
    }

    pub fn record_code<'a>(
        &mut self,
        snippet: impl Into<Payload<'a>>,
        language: impl Into<Payload<'a>>,
        relationship: impl Into<Payload<'a>>,
    ) {
        self.record_code_with_method(snippet, language, relationship, DEFAULT_METHOD);
    }

    pub fn record_code_with_method<'a>(
        &mut self,
        snippet: impl Into<Payload<'a>>,
        language: impl Into<Payload<'a>>,
        relationship: impl Into<Payload<'a>>,
        method: impl Into<Payload<'a>>,
    ) {
        if !self.accepts("code") {
            return;
        }

        let n = &self.normalizer;
        let entry = CodeEntry {
            snippet: n.fix(snippet.into()),
            language: n.fix(language.into()),
            relationship: n.fix(relationship.into()),
            method: n.fix(method.into()),
        };
        self.report.code.push(entry);
    }

    /// Records the edge and a derived behavior note
    /// `"source -- method --> destination"`, tagged `[Exploit]` for exploit edges.
    pub fn record_connection<'a>(
        &mut self,
        source: impl Into<Payload<'a>>,
        destination: impl Into<Payload<'a>>,
        method: &str,
        flags: ConnectionFlags,
    ) {
        if !self.accepts("connection") {
            return;
        }

        let source = self.normalizer.fix(source.into());
        let destination = self.normalizer.fix(destination.into());

        let note = if flags.exploit {
            format!("[Exploit]  {} -- {} --> {}", source, method, destination)
        } else {
            format!("{} -- {} --> {}", source, method, destination)
        };
        self.record_behavior_warn(BehaviorNote::description(note.as_str()));

        self.report.connections.push(ConnectionEntry {
            source,
            destination,
            method: method.to_string(),
            flags,
        });
    }

    /// Only the URL is normalized; fetch metadata is copied as given
    pub fn record_location<'a>(
        &mut self,
        url: impl Into<Payload<'a>>,
        data: &FetchedContent,
        flags: LocationFlags,
    ) {
        if !self.accepts("location") {
            return;
        }

        let entry = LocationEntry {
            url: self.normalizer.fix(url.into()),
            content_type: data.ctype.clone(),
            md5: data.md5.clone(),
            sha256: data.sha256.clone(),
            flags,
            size: data.fsize,
            mimetype: data.mtype.clone(),
        };
        self.report.locations.push(entry);
    }

    pub fn record_exploit<'a>(
        &mut self,
        url: impl Into<Payload<'a>>,
        module: &str,
        description: &str,
        cve: Option<&str>,
        data: Option<Value>,
    ) {
        if !self.accepts("exploit") {
            return;
        }

        let entry = ExploitEntry {
            url: self.normalizer.fix(url.into()),
            module: module.to_string(),
            description: description.to_string(),
            cve: cve.map(str::to_string),
            data,
        };
        self.report.exploits.push(entry);
    }

    /// Identical matches are kept once
    pub fn record_classifier<'a, I>(
        &mut self,
        classifier: &str,
        url: impl Into<Payload<'a>>,
        rule: &str,
        tags: I,
    ) where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if !self.accepts("classifier") {
            return;
        }

        let entry = ClassifierEntry {
            classifier: classifier.to_string(),
            url: self.normalizer.fix(url.into()),
            rule: rule.to_string(),
            tags: tags.into_iter().map(Into::into).collect(),
        };

        if self.report.classifiers.contains(&entry) {
            tracing::debug!(classifier, rule, "duplicate classifier match skipped");
            return;
        }
        self.report.classifiers.push(entry);
    }

    pub fn record_behavior(&mut self, note: BehaviorNote<'_>) {
        if !self.accepts("behavior") {
            return;
        }
        if note.is_blank() {
            return;
        }

        let n = &self.normalizer;
        let entry = BehaviorEntry {
            description: n.fix_opt(note.description),
            cve: n.fix_opt(note.cve),
            method: n.fix(note.method.unwrap_or(Payload::Text(DEFAULT_METHOD))),
            timestamp: now_timestamp(),
        };
        self.report.behavior.push(entry);
    }

    /// Suspicious behavior; recorded the same way as any other note
    pub fn record_behavior_warn(&mut self, note: BehaviorNote<'_>) {
        self.record_behavior(note);
    }

    /// Stored verbatim
    pub fn record_file(&mut self, data: Value) {
        if !self.accepts("file") {
            return;
        }
        self.report.files.push(data);
    }

    /// Dispatch a replayed observation to its recorder
    pub fn record(&mut self, observation: &Observation) {
        match observation {
            Observation::Url { url } => self.set_subject_url(url),
            Observation::Code {
                snippet,
                language,
                relationship,
                method,
            } => self.record_code_with_method(
                snippet,
                language,
                relationship,
                method.as_deref().unwrap_or(DEFAULT_METHOD),
            ),
            Observation::Connection {
                source,
                destination,
                method,
                flags,
            } => self.record_connection(source, destination, method, flags.clone()),
            Observation::Location { url, data, flags } => {
                self.record_location(url, data, flags.clone())
            }
            Observation::Exploit {
                url,
                module,
                description,
                cve,
                data,
            } => self.record_exploit(url, module, description, cve.as_deref(), data.clone()),
            Observation::Classifier {
                classifier,
                url,
                rule,
                tags,
            } => self.record_classifier(classifier, url, rule, tags.iter().cloned()),
            Observation::Behavior {
                description,
                cve,
                method,
            } => self.record_behavior(BehaviorNote {
                description: description.as_ref().map(Payload::from),
                cve: cve.as_ref().map(Payload::from),
                method: method.as_ref().map(Payload::from),
            }),
            // url and params describe where the file came from; the record is the data alone
            Observation::File { data, .. } => self.record_file(data.clone()),
        }
    }

    /// Serialize the report, write it under `base_dir/analysis/json` when
    /// JSON and file logging are both on, and cache the text.
    /// Does nothing while the gate is closed.
    pub fn export(&mut self, base_dir: impl AsRef<Path>) -> Result<(), JsonLogError> {
        if !self.accepts("export") {
            return Ok(());
        }
        let persist = self.gate.persists(&self.options);
        self.exporter.export(&self.report, base_dir.as_ref(), persist)
    }

    /// Text produced by the last export, if any
    pub fn get_serialized(&self) -> Option<&str> {
        self.exporter.cached()
    }
}
