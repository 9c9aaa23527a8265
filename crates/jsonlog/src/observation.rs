// jsonlog/observation.rs
// Recorder inputs: fetched content metadata, behavior notes, and the
// serializable observation stream used for replay

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::document::{ConnectionFlags, LocationFlags};
use crate::normalize::Payload;

/// What the fetcher knows about a downloaded resource.
/// Missing keys deserialize to None.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchedContent {
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
    pub md5: Option<String>,
    pub sha256: Option<String>,
    pub fsize: Option<u64>,
    /// Content type as announced by the server
    pub ctype: Option<String>,
    /// Computed MIME type
    pub mtype: Option<String>,
}

impl FetchedContent {
    /// Hashes and size computed from the body
    pub fn from_body(body: &[u8], ctype: Option<&str>, mtype: Option<&str>) -> Self {
        let sha256 = hex::encode(Sha256::digest(body));
        Self {
            content: Some(body.to_vec()),
            md5: Some(format!("{:x}", md5::compute(body))),
            sha256: Some(sha256),
            fsize: Some(body.len() as u64),
            ctype: ctype.map(str::to_string),
            mtype: mtype.map(str::to_string),
        }
    }
}

/// A behavior note. Notes with neither description nor CVE are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorNote<'a> {
    pub description: Option<Payload<'a>>,
    pub cve: Option<Payload<'a>>,
    pub method: Option<Payload<'a>>,
}

impl<'a> BehaviorNote<'a> {
    pub fn description(description: impl Into<Payload<'a>>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn cve(cve: impl Into<Payload<'a>>) -> Self {
        Self {
            cve: Some(cve.into()),
            ..Self::default()
        }
    }

    pub fn with_cve(mut self, cve: impl Into<Payload<'a>>) -> Self {
        self.cve = Some(cve.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<Payload<'a>>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Empty strings count as absent
    pub fn is_blank(&self) -> bool {
        let blank = |p: &Option<Payload<'_>>| p.map_or(true, |p| p.is_empty());
        blank(&self.description) && blank(&self.cve)
    }
}

/// One recorded observation, as a tagged JSON object.
/// Used to replay a captured run into a fresh recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Url {
        url: String,
    },
    Code {
        snippet: String,
        language: String,
        relationship: String,
        #[serde(default)]
        method: Option<String>,
    },
    Connection {
        source: String,
        destination: String,
        method: String,
        #[serde(default)]
        flags: ConnectionFlags,
    },
    Location {
        url: String,
        #[serde(default)]
        data: FetchedContent,
        #[serde(default)]
        flags: LocationFlags,
    },
    Exploit {
        url: String,
        module: String,
        description: String,
        #[serde(default)]
        cve: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
    Classifier {
        classifier: String,
        url: String,
        rule: String,
        #[serde(default)]
        tags: Vec<String>,
    },
    Behavior {
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        cve: Option<String>,
        #[serde(default)]
        method: Option<String>,
    },
    File {
        data: Value,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        params: Option<Value>,
    },
}

impl Observation {
    pub fn kind(&self) -> &'static str {
        match self {
            Observation::Url { .. } => "url",
            Observation::Code { .. } => "code",
            Observation::Connection { .. } => "connection",
            Observation::Location { .. } => "location",
            Observation::Exploit { .. } => "exploit",
            Observation::Classifier { .. } => "classifier",
            Observation::Behavior { .. } => "behavior",
            Observation::File { .. } => "file",
        }
    }
}
