pub mod log_sink;
pub mod sample_discovery;

pub use log_sink::LogSink;
pub use sample_discovery::{discover_samples, find_simx, sample_id_from_name};
