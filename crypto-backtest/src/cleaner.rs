use common::{BacktestError, Bar, CleanerConfig, DataQuality, Result, Timestamp};
use serde::Serialize;
use tracing::{debug, warn};

use crate::indicators::RollingWindow;

/// Counts collected while cleaning a bar series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_bars: usize,
    pub output_bars: usize,
    pub duplicates: usize,
    pub invalid_ohlc: usize,
    pub negative_volume: usize,
    pub invalid_price: usize,
    pub gaps: usize,
    pub suspicious: usize,
}

impl CleaningReport {
    pub fn dropped(&self) -> usize {
        self.input_bars - self.output_bars
    }
}

/// Normalizes raw bars into a sorted, deduplicated, quality-flagged series
#[derive(Debug, Clone, Default)]
pub struct BarCleaner {
    config: CleanerConfig,
}

impl BarCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    pub fn clean(&self, bars: &[Bar]) -> Result<Vec<Bar>> {
        self.clean_with_report(bars).map(|(bars, _)| bars)
    }

    pub fn clean_with_report(&self, bars: &[Bar]) -> Result<(Vec<Bar>, CleaningReport)> {
        let mut report = CleaningReport {
            input_bars: bars.len(),
            ..Default::default()
        };

        let mut kept: Vec<Bar> = bars
            .iter()
            .filter(|bar| {
                if !bar.has_positive_prices() {
                    report.invalid_price += 1;
                    false
                } else if !bar.has_valid_ohlc() {
                    report.invalid_ohlc += 1;
                    false
                } else if !(bar.volume >= 0.0) {
                    report.negative_volume += 1;
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        // Stable sort keeps arrival order among equal timestamps, so the
        // last bar of each run is the last one seen.
        kept.sort_by_key(|bar| bar.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(kept.len());
        for bar in kept {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => {
                    *last = bar;
                    report.duplicates += 1;
                }
                _ => deduped.push(bar),
            }
        }

        self.flag_quality(&mut deduped, &mut report);
        report.output_bars = deduped.len();

        if report.dropped() > 0 {
            warn!(
                input = report.input_bars,
                output = report.output_bars,
                duplicates = report.duplicates,
                invalid_ohlc = report.invalid_ohlc,
                negative_volume = report.negative_volume,
                invalid_price = report.invalid_price,
                "dropped bars while cleaning"
            );
        } else {
            debug!(
                bars = report.output_bars,
                gaps = report.gaps,
                suspicious = report.suspicious,
                "cleaned bar series"
            );
        }

        let required = self.config.min_bars.max(1);
        if deduped.len() < required {
            return Err(BacktestError::InsufficientData {
                required,
                actual: deduped.len(),
            });
        }

        Ok((deduped, report))
    }

    /// Recompute quality flags from scratch; incoming flags are ignored.
    fn flag_quality(&self, bars: &mut [Bar], report: &mut CleaningReport) {
        let gap_threshold = self.gap_threshold(bars);
        let mut volumes = RollingWindow::new(self.config.volume_lookback);

        for i in 0..bars.len() {
            let mut gap = false;
            let mut suspicious = false;

            if i > 0 {
                let prev = &bars[i - 1];
                let bar = &bars[i];
                if let Some(threshold) = gap_threshold {
                    gap = bar.timestamp - prev.timestamp > threshold;
                }

                let jump = (bar.close / prev.close - 1.0).abs();
                if jump > self.config.price_jump_threshold {
                    suspicious = true;
                }

                if volumes.len() >= self.config.min_volume_history && !volumes.is_empty() {
                    let avg_volume = volumes.sum() / volumes.len() as f64;
                    if avg_volume > 0.0
                        && bar.volume > avg_volume * self.config.volume_spike_multiplier
                    {
                        suspicious = true;
                    }
                }
            }

            if gap {
                report.gaps += 1;
            }
            if suspicious {
                report.suspicious += 1;
            }

            bars[i].quality = if gap {
                DataQuality::Gap
            } else if suspicious {
                DataQuality::Suspicious
            } else {
                DataQuality::Good
            };
            volumes.push(bars[i].volume);
        }
    }

    fn gap_threshold(&self, bars: &[Bar]) -> Option<i64> {
        if let Some(max_gap) = self.config.max_gap_ms {
            return Some(max_gap);
        }
        let timestamps: Vec<Timestamp> = bars.iter().map(|b| b.timestamp).collect();
        let median = median_interval(&timestamps)?;
        Some((median as f64 * self.config.gap_tolerance).floor() as i64)
    }
}

/// Median delta between consecutive timestamps, if any delta is positive
pub fn median_interval(timestamps: &[Timestamp]) -> Option<i64> {
    let mut deltas: Vec<i64> = timestamps
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0)
        .collect();
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_unstable();
    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 0 {
        Some((deltas[mid - 1] + deltas[mid]) / 2)
    } else {
        Some(deltas[mid])
    }
}

/// Check that every consecutive interval is within `tolerance_ms` of `interval_ms`
pub fn is_continuous(bars: &[Bar], interval_ms: i64, tolerance_ms: i64) -> bool {
    bars.windows(2)
        .all(|w| (w[1].timestamp - w[0].timestamp - interval_ms).abs() <= tolerance_ms)
}
