pub mod loaders;
pub mod manifest;
pub mod notebook;
pub mod prompt;
pub mod report;

pub use loaders::{load_all_manifests, load_manifest};
pub use manifest::AssignmentManifest;
pub use notebook::{safe_read, Cell, CellKind, CellTags, Notebook};
pub use prompt::{AnswerStatus, QuestionPrompt, StopMarker, SubmitterMap};
pub use report::{MissingAnswerReport, PromptStatusRow};
