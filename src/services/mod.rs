pub mod progress;
pub mod result_compare;
pub mod result_writer;
pub mod sample_extractor;

pub use progress::{ProgressReport, ProgressTracker};
pub use result_compare::{compare, load_result_set, Comparison, Mismatch};
pub use result_writer::ResultWriter;
pub use sample_extractor::SampleExtractor;
