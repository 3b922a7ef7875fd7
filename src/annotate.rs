use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, error, info};

use crate::classifier::Classifier;
use crate::error::Result;
use crate::helpers::{DISPLAY_WIDTH, Overlay, draw_results, open_scaled};
use crate::model::InferenceEngine;
use crate::postprocess::Recognition;

#[derive(Debug, Clone, Copy)]
pub struct AnnotateOptions<'a> {
    pub output_dir: &'a Path,
    pub max_width: u32,
    /// Images per model call.
    pub batch_size: usize,
    /// Without a font the scaled image is saved as is.
    pub overlay: Option<&'a Overlay>,
}

impl<'a> AnnotateOptions<'a> {
    pub fn new(output_dir: &'a Path) -> Self {
        Self {
            output_dir,
            max_width: DISPLAY_WIDTH,
            batch_size: 1,
            overlay: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotated {
    pub source: PathBuf,
    pub output: PathBuf,
    pub results: Vec<Recognition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub source: PathBuf,
    pub reason: String,
}

/// Outcome of a run, in source order.
#[derive(Debug, Default)]
pub struct AnnotateReport {
    pub annotated: Vec<Annotated>,
    pub failed: Vec<Failure>,
}

impl AnnotateReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn fail(&mut self, source: &Path, reason: String) {
        error!(source = %source.display(), %reason, "image processing failed");
        self.failed.push(Failure {
            source: source.to_path_buf(),
            reason,
        });
    }
}

/// `<output_dir>/<stem>_annotated.png`
pub fn annotated_path(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{stem}_annotated.png"))
}

/// Classifies every source and saves an annotated copy of each.
///
/// A source that cannot be read, classified or saved is recorded in the
/// report; the rest are still processed.
pub fn annotate_sources<E: InferenceEngine>(
    classifier: &Classifier<E>,
    sources: &[PathBuf],
    options: &AnnotateOptions,
) -> AnnotateReport {
    let mut report = AnnotateReport::default();

    for chunk in sources.chunks(options.batch_size.max(1)) {
        let mut paths = Vec::with_capacity(chunk.len());
        let mut images = Vec::with_capacity(chunk.len());
        for path in chunk {
            match open_scaled(path, options.max_width) {
                Ok(image) => {
                    paths.push(path.as_path());
                    images.push(image);
                }
                Err(e) => report.fail(path, e.to_string()),
            }
        }
        if images.is_empty() {
            continue;
        }

        let t = std::time::Instant::now();
        let batch_results = match classifier.recognize_batch(&images) {
            Ok(results) => results,
            Err(e) => {
                let reason = e.to_string();
                for path in paths {
                    report.fail(path, reason.clone());
                }
                continue;
            }
        };
        debug!(images = images.len(), elapsed = ?t.elapsed(), "classified batch");

        for ((path, image), results) in paths.into_iter().zip(&images).zip(batch_results) {
            match save_annotated(path, image, &results, options) {
                Ok(output) => report.annotated.push(Annotated {
                    source: path.to_path_buf(),
                    output,
                    results,
                }),
                Err(e) => report.fail(path, e.to_string()),
            }
        }
    }
    report
}

fn save_annotated(
    source: &Path,
    image: &DynamicImage,
    results: &[Recognition],
    options: &AnnotateOptions,
) -> Result<PathBuf> {
    let annotated = match options.overlay {
        Some(overlay) => draw_results(image, results, overlay),
        None => image.to_rgba8(),
    };
    let output = annotated_path(source, options.output_dir);
    annotated.save(&output)?;
    info!(source = %source.display(), output = %output.display(), "annotated image saved");
    Ok(output)
}
