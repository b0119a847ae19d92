pub mod config;
pub mod paths;
pub mod sink;

pub use config::SherpaConfig;
pub use paths::SherpaPaths;
pub use sink::{EventSink, JsonlSink};
