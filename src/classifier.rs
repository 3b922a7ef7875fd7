use std::path::PathBuf;

use image::DynamicImage;
use ndarray::Axis;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::mapping::{LabelTable, load_labels};
use crate::model::{InferenceEngine, OnnxModel, OnnxSession};
use crate::postprocess::{CONFIDENCE_THRESHOLD, Recognition, decode_predictions};
use crate::preprocess::{DEFAULT_INPUT_SIZE, PreprocessConfig, Processor};

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_size: u32,
    pub threshold: f32,
    pub cuda: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/model.onnx"),
            labels_path: PathBuf::from("assets/labels.txt"),
            input_size: DEFAULT_INPUT_SIZE,
            threshold: CONFIDENCE_THRESHOLD,
            cuda: false,
        }
    }
}

/// Model, label table and preprocessing bundled for whole-image classification.
pub struct Classifier<E = OnnxSession> {
    engine: E,
    labels: LabelTable,
    processor: Processor,
    threshold: f32,
}

impl Classifier<OnnxSession> {
    /// Loads the model and label assets named in `config`.
    ///
    /// Any failure is logged and returned; there is no partially loaded
    /// classifier.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let load = || -> Result<Self> {
            let engine = OnnxModel::new(config.cuda).load_model(&config.model_path)?;
            let labels = load_labels(&config.labels_path)?;
            Ok(Self::with_engine(engine, labels, config))
        };
        match load() {
            Ok(classifier) => {
                info!(labels = classifier.labels.len(), "model and labels loaded");
                Ok(classifier)
            }
            Err(e) => {
                error!(error = %e, "failed to initialize classifier");
                Err(e)
            }
        }
    }
}

impl<E: InferenceEngine> Classifier<E> {
    pub fn with_engine(engine: E, labels: LabelTable, config: &ClassifierConfig) -> Self {
        Self {
            engine,
            labels,
            processor: Processor::new(PreprocessConfig::with_input_size(config.input_size)),
            threshold: config.threshold,
        }
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn input_size(&self) -> u32 {
        self.processor.input_size()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn recognize_image(&self, image: &DynamicImage) -> Result<Vec<Recognition>> {
        let tensor = self.processor.preprocess(image)?;
        let scores = self.engine.run(tensor.view())?;
        let row = scores
            .axis_iter(Axis(0))
            .next()
            .ok_or_else(|| Error::OutputShape(scores.shape().to_vec()))?;
        let results = decode_predictions(&row.to_vec(), &self.labels, self.threshold)?;
        debug!(?results, "detection results");
        Ok(results)
    }

    /// Runs the model once over all images; one result list per image.
    pub fn recognize_batch(&self, images: &[DynamicImage]) -> Result<Vec<Vec<Recognition>>> {
        let tensor = self.processor.preprocess_batch(images)?;
        let scores = self.engine.run(tensor.view())?;
        if scores.nrows() != images.len() {
            return Err(Error::OutputShape(scores.shape().to_vec()));
        }
        scores
            .axis_iter(Axis(0))
            .map(|row| decode_predictions(&row.to_vec(), &self.labels, self.threshold))
            .collect()
    }
}
