//! Ticker message decoding.
//!
//! Accepts a raw 24h ticker object or a combined-stream envelope:
//!
//! ```jsonc
//! { "e": "24hrTicker", "E": 1700000000000, "s": "BTCUSDT", "c": "43000.10", ... }
//! { "stream": "btcusdt@ticker", "data": { "s": "BTCUSDT", "c": "43000.10", ... } }
//! ```
//!
//! `c` may be a JSON string or number. `E` is optional.

use chrono::DateTime;
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::Tick;

pub fn parse_ticker(raw: &str) -> Result<Tick, DecodeError> {
    let json: Value = serde_json::from_str(raw)?;
    let body = json.get("data").unwrap_or(&json);

    let symbol = body
        .get("s")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingField("s"))?
        .to_uppercase();

    let price = match body.get("c") {
        Some(Value::String(s)) => s
            .parse::<f64>()
            .map_err(|_| DecodeError::InvalidPrice(s.clone()))?,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| DecodeError::InvalidPrice(n.to_string()))?,
        Some(other) => return Err(DecodeError::InvalidPrice(other.to_string())),
        None => return Err(DecodeError::MissingField("c")),
    };

    if !price.is_finite() || price <= 0.0 {
        return Err(DecodeError::InvalidPrice(price.to_string()));
    }

    let event_time = match body.get("E").and_then(Value::as_i64) {
        Some(ms) => Some(DateTime::from_timestamp_millis(ms).ok_or(DecodeError::InvalidTimestamp(ms))?),
        None => None,
    };

    Ok(Tick {
        symbol,
        price,
        event_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_ticker() {
        let t = parse_ticker(r#"{"e":"24hrTicker","E":1700000000000,"s":"BTCUSDT","c":"43000.5"}"#)
            .unwrap();

        assert_eq!(t.symbol, "BTCUSDT");
        assert_eq!(t.price, 43000.5);
        assert_eq!(t.event_time.unwrap().timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn parses_combined_stream_envelope() {
        let t = parse_ticker(r#"{"stream":"ethusdt@ticker","data":{"s":"ethusdt","c":2500}}"#).unwrap();

        assert_eq!(t.symbol, "ETHUSDT");
        assert_eq!(t.price, 2500.0);
        assert!(t.event_time.is_none());
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(parse_ticker("{not json"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn rejects_missing_symbol_or_price() {
        assert!(matches!(
            parse_ticker(r#"{"c":"1.0"}"#),
            Err(DecodeError::MissingField("s"))
        ));
        assert!(matches!(
            parse_ticker(r#"{"s":"BTCUSDT"}"#),
            Err(DecodeError::MissingField("c"))
        ));
    }

    #[test]
    fn rejects_unparseable_or_non_positive_price() {
        assert!(matches!(
            parse_ticker(r#"{"s":"BTCUSDT","c":"abc"}"#),
            Err(DecodeError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_ticker(r#"{"s":"BTCUSDT","c":"0"}"#),
            Err(DecodeError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_ticker(r#"{"s":"BTCUSDT","c":true}"#),
            Err(DecodeError::InvalidPrice(_))
        ));
    }

    #[test]
    fn subscription_ack_is_a_decode_error() {
        // Binance answers SUBSCRIBE with {"result":null,"id":1}
        assert!(parse_ticker(r#"{"result":null,"id":1}"#).is_err());
    }
}
