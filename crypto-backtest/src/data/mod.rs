pub mod kline;
pub mod loader;
pub mod synthetic;

pub use kline::{parse_kline_row, parse_kline_rows};
pub use loader::{load_csv, load_json, parse_timestamp};
pub use synthetic::generate_synthetic_bars;

use std::path::{Path, PathBuf};

use common::{BacktestError, Bar, Result};

/// Producer of a finite, finished bar series
///
/// Transport concerns (HTTP, rate limits, retries) live behind this
/// boundary; the backtest core only ever sees the returned bars.
pub trait BarSource {
    fn fetch_bars(&self) -> Result<Vec<Bar>>;
}

/// Bars read from a local CSV or JSON file
#[derive(Debug, Clone)]
pub struct FileBarSource {
    path: PathBuf,
}

impl FileBarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BarSource for FileBarSource {
    fn fetch_bars(&self) -> Result<Vec<Bar>> {
        load_file(&self.path)
    }
}

/// Load bars from file, detecting format from extension
pub fn load_file(path: &Path) -> Result<Vec<Bar>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        _ => Err(BacktestError::DataLoad(format!(
            "Unsupported file format: {}",
            ext
        ))),
    }
}
