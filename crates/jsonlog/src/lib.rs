// jsonlog crate lib.rs
// JSON analysis report - record, normalize, export

pub mod document;
pub mod export;
pub mod gate;
pub mod mapper;
pub mod normalize;
pub mod observation;
pub mod recorder;
pub mod storage;

pub use document::{
    BehaviorEntry, ClassifierEntry, CodeEntry, ConnectionEntry, ConnectionFlags, ExploitEntry,
    LocationEntry, LocationFlags, Report, ToolInfo,
};
pub use export::{Exporter, REPORT_FILE};
pub use gate::{ActivationGate, GateMode};
pub use mapper::{DotMapper, GraphRenderer, NullRenderer};
pub use normalize::{Payload, TextNormalizer};
pub use observation::{BehaviorNote, FetchedContent, Observation};
pub use recorder::{JsonLog, DEFAULT_METHOD};
pub use storage::{ContentStore, FsContentStore};
