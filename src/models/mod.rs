pub mod outcome;
pub mod params;
pub mod selection;

pub use outcome::{RunOutcome, SampleRun};
pub use params::BatchParams;
pub use selection::{select_samples, SampleSelection, SelectionMode};
