pub mod answer_collector;
pub mod assembler;
pub mod cell_matcher;
pub mod heading_classifier;
pub mod prompt_extractor;
pub mod status_reporter;

pub use answer_collector::AnswerCollector;
pub use assembler::assemble;
pub use cell_matcher::CellMatcher;
pub use heading_classifier::{classify_heading, HeadingKind};
pub use prompt_extractor::extract_prompts;
pub use status_reporter::report;
