pub mod encoding;
pub mod error;
pub mod options;

pub use encoding::{ChardetDetector, Detection, EncodingDetector, NoDetector};
pub use error::JsonLogError;
pub use options::{ModuleState, OutputFormat, RunOptions, VulnModules};
