pub mod script_loader;
pub mod toml_loader;

pub use script_loader::{load_script_uploads, ScriptUpload};
pub use toml_loader::{load_exam_config, parse_exam_config};
