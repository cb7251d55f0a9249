//! Market data records served to clients.

use serde::{Deserialize, Serialize};

use crate::upstream::{RawCandle, RawTicker};

/// Standardized ticker snapshot for one trading pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    /// Unix timestamp in milliseconds
    pub timestamp: Option<i64>,
    /// ISO 8601 datetime string
    pub datetime: Option<String>,
    /// Highest price in 24h
    pub high: Option<f64>,
    /// Lowest price in 24h
    pub low: Option<f64>,
    /// Best current bid price
    pub bid: Option<f64>,
    /// Best current ask price
    pub ask: Option<f64>,
    /// Last traded price
    pub last: Option<f64>,
    /// Volume traded in 24h
    pub volume: Option<f64>,
}

impl Ticker {
    /// Validates an adapter ticker.
    ///
    /// Rejects an empty symbol and any price or volume that is negative or not
    /// finite. Missing fields are allowed.
    pub fn from_raw(raw: RawTicker) -> Result<Self, String> {
        if raw.symbol.trim().is_empty() {
            return Err("ticker has no symbol".to_string());
        }

        let numbers = [
            ("high", raw.high),
            ("low", raw.low),
            ("bid", raw.bid),
            ("ask", raw.ask),
            ("last", raw.last),
            ("volume", raw.volume),
        ];
        for (field, value) in numbers {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("ticker field '{}' has invalid value {}", field, v));
                }
            }
        }

        Ok(Self {
            symbol: raw.symbol,
            timestamp: raw.timestamp,
            datetime: raw.datetime,
            high: raw.high,
            low: raw.low,
            bid: raw.bid,
            ask: raw.ask,
            last: raw.last,
            volume: raw.volume,
        })
    }
}

/// One OHLCV candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn from_raw(raw: RawCandle) -> Result<Self, String> {
        let RawCandle(timestamp, open, high, low, close, volume) = raw;
        if [open, high, low, close, volume].iter().any(|v| !v.is_finite()) {
            return Err(format!("candle at {} has non-finite values", timestamp));
        }
        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_ticker() -> RawTicker {
        RawTicker {
            symbol: "BTC/USDT".to_string(),
            timestamp: Some(1_678_886_400_000),
            datetime: Some("2023-03-15T12:00:00.000Z".to_string()),
            high: Some(30_000.0),
            low: Some(29_000.0),
            bid: Some(29_500.0),
            ask: Some(29_501.0),
            last: Some(29_500.5),
            volume: Some(1_000.0),
        }
    }

    #[test]
    fn test_ticker_from_raw() {
        let ticker = Ticker::from_raw(raw_ticker()).unwrap();
        assert_eq!(ticker.symbol, "BTC/USDT");
        assert_eq!(ticker.last, Some(29_500.5));
    }

    #[test]
    fn test_ticker_allows_missing_fields() {
        let raw = RawTicker {
            symbol: "ETH/USD".to_string(),
            ..RawTicker::default()
        };
        let ticker = Ticker::from_raw(raw).unwrap();
        assert!(ticker.last.is_none());
    }

    #[test]
    fn test_ticker_rejects_bad_values() {
        let mut raw = raw_ticker();
        raw.last = Some(f64::NAN);
        assert!(Ticker::from_raw(raw).is_err());

        let mut raw = raw_ticker();
        raw.bid = Some(-1.0);
        assert!(Ticker::from_raw(raw).is_err());

        let mut raw = raw_ticker();
        raw.symbol = " ".to_string();
        assert!(Ticker::from_raw(raw).is_err());
    }

    #[test]
    fn test_candle_from_raw() {
        let candle =
            Candle::from_raw(RawCandle(1_678_838_400_000, 29_000.0, 29_100.0, 28_900.0, 29_050.0, 100.0))
                .unwrap();
        assert_eq!(candle.timestamp, 1_678_838_400_000);
        assert_eq!(candle.close, 29_050.0);

        assert!(Candle::from_raw(RawCandle(0, 1.0, f64::INFINITY, 1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_ticker_serialize() {
        let ticker = Ticker::from_raw(raw_ticker()).unwrap();
        let json = serde_json::to_value(&ticker).unwrap();
        assert_eq!(json["symbol"], "BTC/USDT");
        assert_eq!(json["ask"], 29_501.0);
    }
}
