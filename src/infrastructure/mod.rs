pub mod ocr_engine;
pub mod rasterizer;

pub use ocr_engine::{HttpOcrEngine, OcrEngine, OcrOutput, PreprocessHints};
pub use rasterizer::{PageImage, Pages, RasterizedDocument};
