// jsonlog/gate.rs
// Activation gate - consulted before every mutation and before export

use thug_core::{OutputFormat, RunOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Active only when the run options ask for JSON
    Configured,
    /// Always active, regardless of options
    Provider,
}

#[derive(Debug, Clone, Copy)]
pub struct ActivationGate {
    mode: GateMode,
}

impl ActivationGate {
    pub fn new(mode: GateMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }

    /// Evaluated against the options current at call time
    pub fn is_active(&self, opts: &RunOptions) -> bool {
        opts.json_logging
            || opts.wants_format(OutputFormat::Json)
            || self.mode == GateMode::Provider
    }

    /// File output needs JSON logging proper plus file logging;
    /// a json output format alone only keeps the report in memory
    pub fn persists(&self, opts: &RunOptions) -> bool {
        opts.json_logging && opts.file_logging
    }
}
