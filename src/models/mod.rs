pub mod exam;
pub mod loaders;
pub mod script;

pub use exam::{ExamConfig, GradingPolicy, QuestionId, QuestionSpec, ScoringKind};
pub use loaders::{load_exam_config, load_script_uploads, ScriptUpload};
pub use script::{IdStatus, OcrStatus, OverallStatus, QuestionResult, ScriptRecord};
