use std::fmt;
use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;

use crate::error::{Error, Result};
use crate::postprocess::{NO_DETECTION, Recognition};

pub const DISPLAY_WIDTH: u32 = 1024;

const TEXT_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const TEXT_SIZE: f32 = 60.0;
const TEXT_LEFT: i32 = 10;
const FIRST_BASELINE: i32 = 100;
const LINE_SPACING: i32 = 70;

/// Decodes the image at `path` and rescales it for display and classification.
pub fn open_scaled(path: impl AsRef<Path>, max_width: u32) -> Result<DynamicImage> {
    let image = image::open(path)?;
    Ok(scale_to_width(&image, max_width))
}

/// Rescales to `max_width`, keeping the aspect ratio.
///
/// Images narrower than `max_width` are scaled up too.
pub fn scale_to_width(image: &DynamicImage, max_width: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width == 0 || max_width == 0 || width == max_width {
        return image.clone();
    }
    let aspect_ratio = height as f32 / width as f32;
    let new_height = ((max_width as f32 * aspect_ratio) as u32).max(1);
    image.resize_exact(max_width, new_height, FilterType::Triangle)
}

pub fn format_recognition(result: &Recognition) -> String {
    if result.title == NO_DETECTION {
        NO_DETECTION.to_string()
    } else {
        format!("{} ({:.2}%)", result.title, result.confidence * 100.0)
    }
}

pub fn results_summary(results: &[Recognition]) -> String {
    let mut summary = String::from("Results:\n");
    for result in results {
        summary.push_str(&format_recognition(result));
        summary.push('\n');
    }
    summary
}

/// Font used to write results onto the image.
pub struct Overlay {
    font: FontVec,
}

// FontVec has no useful Debug output
impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay").finish_non_exhaustive()
    }
}

impl Overlay {
    /// Distance from the top of a text line to its baseline, in pixels.
    pub fn ascent(&self) -> i32 {
        self.font.as_scaled(PxScale::from(TEXT_SIZE)).ascent().round() as i32
    }

    pub fn load(font_path: impl AsRef<Path>) -> Result<Self> {
        let path = font_path.as_ref();
        let to_err = |reason: String| Error::FontLoad {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = std::fs::read(path).map_err(|e| to_err(e.to_string()))?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| to_err(e.to_string()))?;
        Ok(Self { font })
    }
}

/// Writes one line per result in the top-left corner of a copy of `image`.
pub fn draw_results(image: &DynamicImage, results: &[Recognition], overlay: &Overlay) -> RgbaImage {
    let mut canvas = image.to_rgba8();
    let scale = PxScale::from(TEXT_SIZE);
    // draw_text_mut positions the top of the line, the offsets above are baselines
    let ascent = overlay.ascent();

    for (index, result) in results.iter().enumerate() {
        let baseline = FIRST_BASELINE + index as i32 * LINE_SPACING;
        draw_text_mut(
            &mut canvas,
            TEXT_COLOR,
            TEXT_LEFT,
            baseline - ascent,
            scale,
            &overlay.font,
            &format_recognition(result),
        );
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSansMono.ttf");

    #[test]
    fn formats_detections_as_percentages() {
        assert_eq!(format_recognition(&Recognition::new("3", "oak", 0.87654)), "oak (87.65%)");
        assert_eq!(format_recognition(&Recognition::sentinel()), "No detection");
    }

    #[test]
    fn summary_lists_every_result() {
        let results = vec![Recognition::new("0", "cat", 0.9), Recognition::new("2", "bird", 0.6)];
        assert_eq!(results_summary(&results), "Results:\ncat (90.00%)\nbird (60.00%)\n");
        assert_eq!(results_summary(&[Recognition::sentinel()]), "Results:\nNo detection\n");
    }

    #[test]
    fn scales_to_display_width() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 300, Rgb([1, 2, 3])));
        let scaled = scale_to_width(&img, DISPLAY_WIDTH);
        assert_eq!((scaled.width(), scaled.height()), (1024, 768));

        let tall = DynamicImage::ImageRgb8(RgbImage::new(2048, 4000));
        let scaled = scale_to_width(&tall, DISPLAY_WIDTH);
        assert_eq!((scaled.width(), scaled.height()), (1024, 2000));
    }

    #[test]
    fn missing_font_is_reported() {
        let err = Overlay::load("no/such/font.ttf").err().unwrap();
        assert!(matches!(err, Error::FontLoad { .. }));
    }

    #[test]
    fn garbage_font_is_reported() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a font").unwrap();
        assert!(matches!(Overlay::load(file.path()), Err(Error::FontLoad { .. })));
    }

    #[test]
    fn draws_red_lines_below_the_first_baseline() {
        let overlay = Overlay::load(FONT).unwrap();
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(1024, 400, Rgb([255, 255, 255])));
        let results = vec![Recognition::new("0", "cat", 0.9), Recognition::new("2", "bird", 0.6)];
        let canvas = draw_results(&white, &results, &overlay);
        assert_eq!(canvas.dimensions(), (1024, 400));

        let descent = overlay.font.as_scaled(PxScale::from(TEXT_SIZE)).descent().round() as i32;
        // one pixel of slack for glyph bounding-box rounding
        let top = FIRST_BASELINE - overlay.ascent() - 1;
        let bottom = FIRST_BASELINE + LINE_SPACING - descent + 1;

        // red blended over white lowers green and blue together and keeps red
        let inked: Vec<(u32, u32, Rgba<u8>)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, px)| px.0[1] < 250)
            .map(|(x, y, px)| (x, y, *px))
            .collect();
        assert!(!inked.is_empty());
        for (x, y, px) in &inked {
            assert!(*x as i32 >= TEXT_LEFT, "ink at x={x}");
            assert!((top..=bottom).contains(&(*y as i32)), "ink at y={y}");
            assert!(px.0[0] >= 254, "not red: {px:?}");
            assert_eq!(px.0[1], px.0[2]);
        }
        // both lines are drawn: ink above the first baseline and below it
        assert!(inked.iter().any(|(_, y, _)| (*y as i32) < FIRST_BASELINE));
        assert!(inked.iter().any(|(_, y, _)| (*y as i32) > FIRST_BASELINE - descent));
    }

    #[test]
    fn open_scaled_reports_unreadable_files() {
        assert!(matches!(open_scaled("no/such/photo.jpg", DISPLAY_WIDTH), Err(Error::Image(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        RgbImage::from_pixel(256, 128, Rgb([10, 200, 30])).save(&path).unwrap();
        let scaled = open_scaled(&path, DISPLAY_WIDTH).unwrap();
        assert_eq!((scaled.width(), scaled.height()), (1024, 512));
    }
}
