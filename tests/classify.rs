use std::io::Write;

use image::{DynamicImage, Rgb, RgbImage};
use ndarray::{Array2, ArrayView4};

use photo_classifier::{
    Classifier, ClassifierConfig, Error, InferenceEngine, NO_DETECTION, Processor,
    PreprocessConfig, Recognition, load_labels, results_summary,
};

/// Returns the same score row for every image in the batch.
struct FixedScores(Vec<f32>);

impl InferenceEngine for FixedScores {
    fn run(&self, input: ArrayView4<f32>) -> photo_classifier::Result<Array2<f32>> {
        let batch = input.shape()[0];
        let values = self.0.iter().copied().cycle().take(batch * self.0.len()).collect();
        Ok(Array2::from_shape_vec((batch, self.0.len()), values)?)
    }
}

fn label_file(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

fn photo() -> DynamicImage {
    let mut img = RgbImage::new(64, 48);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = Rgb([(x * 4) as u8, (y * 5) as u8, 90]);
    }
    DynamicImage::ImageRgb8(img)
}

fn classifier(scores: Vec<f32>, labels: &[&str]) -> Classifier<FixedScores> {
    let file = label_file(labels);
    let labels = load_labels(file.path()).unwrap();
    Classifier::with_engine(FixedScores(scores), labels, &ClassifierConfig::default())
}

#[test]
fn cat_dog_bird() {
    let clf = classifier(vec![0.9, 0.2, 0.6], &["cat", "dog", "bird"]);
    let results = clf.recognize_image(&photo()).unwrap();
    assert_eq!(
        results,
        vec![Recognition::new("0", "cat", 0.9), Recognition::new("2", "bird", 0.6)]
    );
    assert_eq!(results_summary(&results), "Results:\ncat (90.00%)\nbird (60.00%)\n");
}

#[test]
fn low_scores_give_single_sentinel() {
    let clf = classifier(vec![0.5, 0.1, 0.0, 0.49], &["a", "b", "c", "d"]);
    let results = clf.recognize_image(&photo()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, NO_DETECTION);
    assert_eq!(results[0].id, "0");
    assert_eq!(results[0].confidence, 0.0);
}

#[test]
fn batch_gives_one_result_list_per_image() {
    let clf = classifier(vec![0.1, 0.95], &["maple", "oak"]);
    let results = clf.recognize_batch(&[photo(), photo(), photo()]).unwrap();
    assert_eq!(results.len(), 3);
    for per_image in results {
        assert_eq!(per_image, vec![Recognition::new("1", "oak", 0.95)]);
    }
}

#[test]
fn mismatched_assets_are_an_error() {
    let clf = classifier(vec![0.9, 0.9], &["only-one"]);
    assert!(matches!(
        clf.recognize_image(&photo()),
        Err(Error::LabelMismatch { scores: 2, labels: 1 })
    ));
}

#[test]
fn preprocessing_gray_is_zero_for_any_size() {
    let gray = DynamicImage::ImageRgb8(RgbImage::from_pixel(33, 21, Rgb([128, 128, 128])));
    for side in [1, 16, 224] {
        let buffer = Processor::new(PreprocessConfig::with_input_size(side))
            .to_flat(&gray)
            .unwrap();
        assert_eq!(buffer.len(), 3 * (side * side) as usize);
        assert!(buffer.iter().all(|&v| v == 0.0));
    }
}
