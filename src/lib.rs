pub mod annotate;
pub mod classifier;
pub mod cli;
pub mod error;
pub mod helpers;
pub mod mapping;
pub mod model;
pub mod postprocess;
pub mod preprocess;

pub use crate::annotate::{AnnotateOptions, AnnotateReport, Annotated, Failure, annotate_sources, annotated_path};
pub use crate::classifier::{Classifier, ClassifierConfig};
pub use crate::cli::Args;
pub use crate::error::{Error, Result};
pub use crate::helpers::{
    Overlay, draw_results, format_recognition, open_scaled, results_summary, scale_to_width,
};
pub use crate::mapping::{LabelTable, load_labels};
pub use crate::model::{InferenceEngine, OnnxModel, OnnxSession};
pub use crate::postprocess::{CONFIDENCE_THRESHOLD, NO_DETECTION, Recognition, decode_predictions};
pub use crate::preprocess::{PreprocessConfig, Processor};
