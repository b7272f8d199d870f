use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// Bar interval as used by exchange kline endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1s")]
    S1,
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::S1,
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
    ];

    pub fn as_millis(self) -> i64 {
        const SECOND: i64 = 1_000;
        const MINUTE: i64 = 60 * SECOND;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        match self {
            Timeframe::S1 => SECOND,
            Timeframe::M1 => MINUTE,
            Timeframe::M5 => 5 * MINUTE,
            Timeframe::M15 => 15 * MINUTE,
            Timeframe::M30 => 30 * MINUTE,
            Timeframe::H1 => HOUR,
            Timeframe::H4 => 4 * HOUR,
            Timeframe::D1 => DAY,
            Timeframe::W1 => 7 * DAY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::S1 => "1s",
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| BacktestError::DataLoad(format!("Unknown timeframe: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_millis() {
        assert_eq!(Timeframe::M1.as_millis(), 60_000);
        assert_eq!(Timeframe::H4.as_millis(), 14_400_000);
        assert_eq!(Timeframe::W1.as_millis(), 604_800_000);
    }

    #[test]
    fn test_timeframe_parse() {
        assert_eq!("15m".parse::<Timeframe>().unwrap(), Timeframe::M15);
        assert_eq!(" 1d ".parse::<Timeframe>().unwrap(), Timeframe::D1);
        assert!("2m".parse::<Timeframe>().is_err());

        for tf in Timeframe::ALL {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
        }
    }

    #[test]
    fn test_timeframe_serde_names() {
        assert_eq!(serde_json::to_string(&Timeframe::H1).unwrap(), "\"1h\"");
        let tf: Timeframe = serde_json::from_str("\"5m\"").unwrap();
        assert_eq!(tf, Timeframe::M5);
    }
}
