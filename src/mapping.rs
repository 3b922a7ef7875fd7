use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::ops::Index;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Class names in model output order.
///
/// Line `i` of the label file names output index `i`. Blank lines are kept so
/// that a stray empty line never shifts every following label by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> std::io::Result<Self> {
        let labels = BufReader::new(reader)
            .lines()
            .map(|line| line.map(|name| name.trim_end().to_string()))
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Index<usize> for LabelTable {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.labels[index]
    }
}

/// Loads a newline-delimited label file.
pub fn load_labels(file_path: impl AsRef<Path>) -> Result<LabelTable> {
    let path = file_path.as_ref();
    let to_err = |source| Error::LabelLoad {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_err)?;
    let table = LabelTable::from_reader(file).map_err(to_err)?;
    if table.is_empty() {
        return Err(Error::EmptyLabels(path.to_path_buf()));
    }

    debug!(path = %path.display(), count = table.len(), "loaded labels");
    Ok(table)
}
