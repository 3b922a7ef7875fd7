use imageproc::rect::Rect;

use crate::error::{Error, Result};
use crate::mapping::LabelTable;

/// Scores must be strictly above this to count as a detection.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

pub const NO_DETECTION: &str = "No detection";

/// One labelled class score.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Output index of the class, as a decimal string.
    pub id: String,
    pub title: String,
    pub confidence: f32,
    /// Never filled in by whole-image classification.
    pub location: Option<Rect>,
}

impl Recognition {
    pub fn new(id: impl Into<String>, title: impl Into<String>, confidence: f32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            confidence,
            location: None,
        }
    }

    pub fn sentinel() -> Self {
        Self::new("0", NO_DETECTION, 0.0)
    }

    pub fn is_detection(&self) -> bool {
        *self != Self::sentinel()
    }
}

/// Keeps every class whose score is above `threshold`, in output-index order.
///
/// The result is never empty: with no detections it holds exactly the
/// `"No detection"` sentinel.
pub fn decode_predictions(
    scores: &[f32],
    labels: &LabelTable,
    threshold: f32,
) -> Result<Vec<Recognition>> {
    if scores.len() != labels.len() {
        return Err(Error::LabelMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }

    let mut recognitions: Vec<Recognition> = scores
        .iter()
        .zip(labels.iter())
        .enumerate()
        .filter(|(_, (score, _))| **score > threshold)
        .map(|(i, (score, label))| Recognition::new(i.to_string(), label, *score))
        .collect();

    if recognitions.is_empty() {
        recognitions.push(Recognition::sentinel());
    }
    Ok(recognitions)
}
