use std::path::PathBuf;

use clap::Parser;

use crate::classifier::ClassifierConfig;
use crate::helpers::DISPLAY_WIDTH;
use crate::postprocess::CONFIDENCE_THRESHOLD;
use crate::preprocess::DEFAULT_INPUT_SIZE;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ONNX model path
    #[arg(long, default_value = "assets/model.onnx")]
    pub model: PathBuf,

    /// newline-delimited label file, one class per model output
    #[arg(long, default_value = "assets/labels.txt")]
    pub labels: PathBuf,

    /// image path(s)
    #[arg(long, required = true, num_args = 1..)]
    pub source: Vec<PathBuf>,

    /// directory for annotated images
    #[arg(long, default_value = "output")]
    pub output: PathBuf,

    /// TTF/OTF font for the result overlay; without it images are saved unannotated
    #[arg(long)]
    pub font: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_INPUT_SIZE)]
    pub input_size: u32,

    #[arg(long, default_value_t = CONFIDENCE_THRESHOLD)]
    pub threshold: f32,

    /// width images are scaled to before classification and display
    #[arg(long, default_value_t = DISPLAY_WIDTH)]
    pub max_width: u32,

    /// images per model call
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: u32,

    #[arg(long)]
    pub cuda: bool,

    /// log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<&Args> for ClassifierConfig {
    fn from(args: &Args) -> Self {
        Self {
            model_path: args.model.clone(),
            labels_path: args.labels.clone(),
            input_size: args.input_size,
            threshold: args.threshold,
            cuda: args.cuda,
        }
    }
}
