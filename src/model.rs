use std::path::Path;

use ndarray::{Array2, ArrayView4};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch};
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::Tensor;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Anything that turns a `[batch, N, N, 3]` input into `[batch, classes]` scores.
pub trait InferenceEngine {
    fn run(&self, input: ArrayView4<f32>) -> Result<Array2<f32>>;
}

pub struct OnnxModel {
    provider: [ExecutionProviderDispatch; 1],
}

impl OnnxModel {
    pub fn new(cuda: bool) -> Self {
        let provider = if cuda {
            [CUDAExecutionProvider::default().build().error_on_failure()]
        } else {
            [CPUExecutionProvider::default().build()]
        };
        Self { provider }
    }

    pub fn load_model(&self, model_path: impl AsRef<Path>) -> Result<OnnxSession> {
        let path = model_path.as_ref();
        let to_err = |source| Error::ModelLoad {
            path: path.to_path_buf(),
            source,
        };
        let session = SessionBuilder::new()
            .map_err(to_err)?
            .with_execution_providers(self.provider.clone())
            .map_err(to_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(to_err)?
            .commit_from_file(path)
            .map_err(to_err)?;
        info!(path = %path.display(), "model loaded");
        Ok(OnnxSession { session })
    }
}

/// A committed ONNX Runtime session; read-only once loaded.
pub struct OnnxSession {
    session: Session,
}

impl InferenceEngine for OnnxSession {
    fn run(&self, input: ArrayView4<f32>) -> Result<Array2<f32>> {
        let batch = input.shape()[0];
        let t = std::time::Instant::now();
        let tensor = Tensor::from_array(input.to_owned())?;
        let ys = self.session.run(ort::inputs![tensor]?)?;
        debug!(elapsed = ?t.elapsed(), "[model]");

        let (_name, output) = ys.iter().next().ok_or(Error::MissingOutput)?;
        let scores = output.try_extract_tensor::<f32>()?;
        scores_to_rows(scores.shape(), scores.iter().copied().collect(), batch)
    }
}

/// Flattens everything after the batch axis, so `[B, C]`, `[B, 1, 1, C]` and
/// (for a single image) `[C]` all become `[B, C]`.
pub(crate) fn scores_to_rows(shape: &[usize], values: Vec<f32>, batch: usize) -> Result<Array2<f32>> {
    let rows = match shape {
        [] => return Err(Error::OutputShape(shape.to_vec())),
        [_] if batch == 1 => 1,
        [_] => return Err(Error::OutputShape(shape.to_vec())),
        [b, ..] if *b == batch => batch,
        _ => return Err(Error::OutputShape(shape.to_vec())),
    };
    let classes = values.len() / rows.max(1);
    Ok(Array2::from_shape_vec((rows, classes), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_output_is_one_row() {
        let rows = scores_to_rows(&[3], vec![0.1, 0.7, 0.2], 1).unwrap();
        assert_eq!(rows.shape(), &[1, 3]);
        assert_eq!(rows[[0, 1]], 0.7);
    }

    #[test]
    fn trailing_singleton_axes_are_flattened() {
        let values: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let rows = scores_to_rows(&[2, 1, 1, 4], values, 2).unwrap();
        assert_eq!(rows.shape(), &[2, 4]);
        assert_eq!(rows[[1, 0]], 4.0);
    }

    #[test]
    fn batch_mismatch_is_rejected() {
        let err = scores_to_rows(&[1, 4], vec![0.0; 4], 2).unwrap_err();
        assert!(matches!(err, Error::OutputShape(shape) if shape == vec![1, 4]));
        assert!(scores_to_rows(&[], vec![0.5], 1).is_err());
    }
}
