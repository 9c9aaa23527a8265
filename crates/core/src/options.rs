//! Run options for an analysis: personality, fetch behaviour, logging switches
//! and the state of the emulated vulnerable plugins.
//!
//! Options are an immutable value handed to each logger at construction.
//! They can be built from defaults, a JSON document, or `THUG_*` environment
//! variables layered over the defaults.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::JsonLogError;

/// Status string reported for a plugin that is disabled or unknown
pub const DISABLED: &str = "disabled";

/// Output formats a run can ask the logging layer for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Maec11,
    Elasticsearch,
    Mongodb,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Maec11 => "maec11",
            OutputFormat::Elasticsearch => "elasticsearch",
            OutputFormat::Mongodb => "mongodb",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "maec11" => Some(OutputFormat::Maec11),
            "elasticsearch" => Some(OutputFormat::Elasticsearch),
            "mongodb" => Some(OutputFormat::Mongodb),
            _ => None,
        }
    }
}

/// State of one emulated vulnerable module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleState {
    pub enabled: bool,
    pub version: String,
}

impl ModuleState {
    pub fn enabled(version: &str) -> Self {
        Self {
            enabled: true,
            version: version.to_string(),
        }
    }
}

/// Module name -> state, queried by key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VulnModules {
    modules: BTreeMap<String, ModuleState>,
}

impl Default for VulnModules {
    fn default() -> Self {
        let mut modules = BTreeMap::new();
        modules.insert("acropdf".to_string(), ModuleState::enabled("9.1.0"));
        modules.insert("shockwave_flash".to_string(), ModuleState::enabled("10.0.64.0"));
        modules.insert("javaplugin".to_string(), ModuleState::enabled("1.6.0.32"));
        Self { modules }
    }
}

impl VulnModules {
    pub fn empty() -> Self {
        Self {
            modules: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, state: ModuleState) {
        self.modules.insert(name.to_string(), state);
    }

    pub fn disable(&mut self, name: &str) {
        if let Some(state) = self.modules.get_mut(name) {
            state.enabled = false;
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModuleState> {
        self.modules.get(name)
    }

    /// Version string of an enabled module, `"disabled"` otherwise.
    /// Unknown modules count as disabled.
    pub fn status(&self, name: &str) -> String {
        match self.modules.get(name) {
            Some(state) if state.enabled => state.version.clone(),
            _ => DISABLED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub useragent: String,
    pub local: bool,
    pub no_fetch: bool,
    pub proxy: Option<String>,
    pub events: Vec<String>,
    /// Milliseconds
    pub delay: u64,
    pub referer: String,
    /// Seconds
    pub timeout: u64,
    pub threshold: u32,
    pub extensive: bool,

    // Logging switches
    pub json_logging: bool,
    pub file_logging: bool,
    pub output_formats: BTreeSet<OutputFormat>,

    pub vuln_modules: VulnModules,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            useragent: "winxpie60".to_string(),
            local: false,
            no_fetch: false,
            proxy: None,
            events: vec![],
            delay: 0,
            referer: "about:blank".to_string(),
            timeout: 600,
            threshold: 0,
            extensive: false,
            json_logging: false,
            file_logging: false,
            output_formats: BTreeSet::new(),
            vuln_modules: VulnModules::default(),
        }
    }
}

impl RunOptions {
    pub fn from_json_str(s: &str) -> Result<Self, JsonLogError> {
        serde_json::from_str(s).map_err(|e| JsonLogError::InvalidOptions {
            reason: e.to_string(),
        })
    }

    /// Defaults overridden by `THUG_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `THUG_*` key.
    /// Unparsable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        if let Some(ua) = lookup("THUG_USERAGENT") {
            opts.useragent = ua;
        }
        if let Some(v) = lookup("THUG_LOCAL") {
            opts.local = parse_bool(&v);
        }
        if let Some(v) = lookup("THUG_NO_FETCH") {
            opts.no_fetch = parse_bool(&v);
        }
        if let Some(proxy) = lookup("THUG_PROXY") {
            if !proxy.is_empty() {
                opts.proxy = Some(proxy);
            }
        }
        if let Some(events) = lookup("THUG_EVENTS") {
            opts.events = split_list(&events).map(str::to_string).collect();
        }
        if let Some(v) = lookup("THUG_DELAY") {
            if let Ok(ms) = v.parse() {
                opts.delay = ms;
            }
        }
        if let Some(referer) = lookup("THUG_REFERER") {
            opts.referer = referer;
        }
        if let Some(v) = lookup("THUG_TIMEOUT") {
            if let Ok(secs) = v.parse() {
                opts.timeout = secs;
            }
        }
        if let Some(v) = lookup("THUG_THRESHOLD") {
            if let Ok(n) = v.parse() {
                opts.threshold = n;
            }
        }
        if let Some(v) = lookup("THUG_EXTENSIVE") {
            opts.extensive = parse_bool(&v);
        }
        if let Some(v) = lookup("THUG_JSON_LOGGING") {
            opts.json_logging = parse_bool(&v);
        }
        if let Some(v) = lookup("THUG_FILE_LOGGING") {
            opts.file_logging = parse_bool(&v);
        }
        if let Some(formats) = lookup("THUG_OUTPUT_FORMATS") {
            opts.output_formats = split_list(&formats).filter_map(OutputFormat::parse).collect();
        }

        // Format: THUG_<MODULE>_DISABLED=true, THUG_<MODULE>_VERSION=x.y.z
        for name in ["acropdf", "shockwave_flash", "javaplugin"] {
            let prefix = format!("THUG_{}", name.to_uppercase());
            if let Some(version) = lookup(&format!("{}_VERSION", prefix)) {
                opts.vuln_modules.set(name, ModuleState::enabled(&version));
            }
            if let Some(v) = lookup(&format!("{}_DISABLED", prefix)) {
                if parse_bool(&v) {
                    opts.vuln_modules.disable(name);
                }
            }
        }

        opts
    }

    pub fn wants_format(&self, format: OutputFormat) -> bool {
        self.output_formats.contains(&format)
    }
}

fn parse_bool(v: &str) -> bool {
    v.to_lowercase() == "true" || v == "1"
}

fn split_list(v: &str) -> impl Iterator<Item = &str> {
    v.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_leave_logging_off() {
        let opts = RunOptions::default();
        assert!(!opts.json_logging);
        assert!(!opts.file_logging);
        assert!(opts.output_formats.is_empty());
        assert_eq!(opts.vuln_modules.status("acropdf"), "9.1.0");
    }

    #[test]
    fn test_env_overrides() {
        let opts = RunOptions::from_lookup(lookup_from(&[
            ("THUG_JSON_LOGGING", "1"),
            ("THUG_FILE_LOGGING", "TRUE"),
            ("THUG_PROXY", "socks5://127.0.0.1:9050"),
            ("THUG_DELAY", "250"),
            ("THUG_TIMEOUT", "not-a-number"),
            ("THUG_OUTPUT_FORMATS", "json, maec11,bogus"),
            ("THUG_EVENTS", "click,mouseover"),
        ]));

        assert!(opts.json_logging);
        assert!(opts.file_logging);
        assert_eq!(opts.proxy.as_deref(), Some("socks5://127.0.0.1:9050"));
        assert_eq!(opts.delay, 250);
        // Unparsable value keeps the default
        assert_eq!(opts.timeout, 600);
        assert!(opts.wants_format(OutputFormat::Json));
        assert!(opts.wants_format(OutputFormat::Maec11));
        assert_eq!(opts.output_formats.len(), 2);
        assert_eq!(opts.events, vec!["click", "mouseover"]);
    }

    #[test]
    fn test_module_disable_and_version_override() {
        let opts = RunOptions::from_lookup(lookup_from(&[
            ("THUG_JAVAPLUGIN_DISABLED", "true"),
            ("THUG_ACROPDF_VERSION", "8.0"),
        ]));

        assert_eq!(opts.vuln_modules.status("javaplugin"), DISABLED);
        assert_eq!(opts.vuln_modules.status("acropdf"), "8.0");
        assert_eq!(opts.vuln_modules.status("shockwave_flash"), "10.0.64.0");
    }

    #[test]
    fn test_unknown_module_is_disabled() {
        let modules = VulnModules::empty();
        assert_eq!(modules.status("silverlight"), DISABLED);
    }

    #[test]
    fn test_from_json_partial_document() {
        let opts = RunOptions::from_json_str(
            r#"{"json_logging": true, "output_formats": ["json"], "useragent": "win7ie90"}"#,
        )
        .unwrap();
        assert!(opts.json_logging);
        assert_eq!(opts.useragent, "win7ie90");
        assert_eq!(opts.referer, "about:blank");
        assert!(opts.wants_format(OutputFormat::Json));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = RunOptions::from_json_str("{not json").unwrap_err();
        assert_eq!(err.code(), "invalid_options");
    }
}
