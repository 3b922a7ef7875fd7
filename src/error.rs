use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load model from {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    #[error("failed to read labels from {path}: {source}")]
    LabelLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("label file {0} contains no labels")]
    EmptyLabels(PathBuf),

    #[error("model produced {scores} scores but the label table has {labels} entries")]
    LabelMismatch { scores: usize, labels: usize },

    #[error("unexpected model output shape {0:?}, expected [batch, classes]")]
    OutputShape(Vec<usize>),

    #[error("model returned no output tensors")]
    MissingOutput,

    #[error("cannot classify an empty batch")]
    EmptyBatch,

    #[error("failed to resize image: {0}")]
    Resize(String),

    #[error("failed to load font from {path}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error(transparent)]
    Runtime(#[from] ort::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
