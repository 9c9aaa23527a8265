// jsonlog/document.rs
// Canonical analysis report - the one aggregate every recorder appends to

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thug_core::RunOptions;

pub const LOGTYPE: &str = "json-log";

/// Timestamp layout used for the report and for behavior notes
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// The full report. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub url: Option<String>,
    pub timestamp: String,
    pub logtype: String,
    pub thug: ToolInfo,

    pub behavior: Vec<BehaviorEntry>,
    pub code: Vec<CodeEntry>,
    pub files: Vec<Value>,
    pub connections: Vec<ConnectionEntry>,
    pub locations: Vec<LocationEntry>,
    pub exploits: Vec<ExploitEntry>,
    pub classifiers: Vec<ClassifierEntry>,
}

impl Report {
    pub fn new(version: &str, opts: &RunOptions) -> Self {
        Self {
            url: None,
            timestamp: now_timestamp(),
            logtype: LOGTYPE.to_string(),
            thug: ToolInfo::capture(version, opts),
            behavior: vec![],
            code: vec![],
            files: vec![],
            connections: vec![],
            locations: vec![],
            exploits: vec![],
            classifiers: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.behavior.is_empty()
            && self.code.is_empty()
            && self.files.is_empty()
            && self.connections.is_empty()
            && self.locations.is_empty()
            && self.exploits.is_empty()
            && self.classifiers.is_empty()
    }
}

/// Identification block, captured once from the run options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub version: String,
    pub personality: Personality,
    pub plugins: Plugins,
    pub options: OptionsSnapshot,
}

impl ToolInfo {
    pub fn capture(version: &str, opts: &RunOptions) -> Self {
        Self {
            version: version.to_string(),
            personality: Personality {
                useragent: opts.useragent.clone(),
            },
            plugins: Plugins {
                acropdf: opts.vuln_modules.status("acropdf"),
                javaplugin: opts.vuln_modules.status("javaplugin"),
                shockwaveflash: opts.vuln_modules.status("shockwave_flash"),
            },
            options: OptionsSnapshot {
                local: opts.local,
                nofetch: opts.no_fetch,
                proxy: opts.proxy.clone(),
                events: opts.events.clone(),
                delay: opts.delay,
                referer: opts.referer.clone(),
                timeout: opts.timeout,
                threshold: opts.threshold,
                extensive: opts.extensive,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub useragent: String,
}

/// Plugin version, or "disabled"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugins {
    pub acropdf: String,
    pub javaplugin: String,
    pub shockwaveflash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    pub local: bool,
    pub nofetch: bool,
    pub proxy: Option<String>,
    pub events: Vec<String>,
    pub delay: u64,
    pub referer: String,
    pub timeout: u64,
    pub threshold: u32,
    pub extensive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEntry {
    pub description: Option<String>,
    pub cve: Option<String>,
    pub method: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub snippet: String,
    pub language: String,
    pub relationship: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub source: String,
    pub destination: String,
    pub method: String,
    pub flags: ConnectionFlags,
}

/// Known connection flag plus caller-defined extras
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionFlags {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exploit: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConnectionFlags {
    pub fn exploit() -> Self {
        Self {
            exploit: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub url: String,
    #[serde(rename = "content-type")]
    pub content_type: Option<String>,
    pub md5: Option<String>,
    pub sha256: Option<String>,
    pub flags: LocationFlags,
    pub size: Option<u64>,
    pub mimetype: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationFlags {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocationFlags {
    pub fn error() -> Self {
        Self {
            error: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploitEntry {
    pub url: String,
    pub module: String,
    pub description: String,
    pub cve: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierEntry {
    pub classifier: String,
    pub url: String,
    pub rule: String,
    pub tags: Vec<String>,
}
