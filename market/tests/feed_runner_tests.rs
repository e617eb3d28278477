use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc::Sender;

use market::{
    InstrumentRegistry, Sample, Source,
    error::FetchError,
    feed::{FeedMerger, FeedTransport, TimestampPolicy},
    history::{BootstrapSettings, HistoryApi, bootstrap_all},
};

/// Replays a fixed list of frames, then ends like a closed socket.
struct ScriptedTransport {
    frames: Vec<String>,
}

#[async_trait::async_trait]
impl FeedTransport for ScriptedTransport {
    async fn stream_messages(&self, sender: Sender<String>) -> anyhow::Result<()> {
        for f in &self.frames {
            sender.send(f.clone()).await?;
        }
        Ok(())
    }
}

fn ticker(symbol: &str, price: &str) -> String {
    format!(r#"{{"e":"24hrTicker","s":"{symbol}","c":"{price}"}}"#)
}

#[tokio::test]
async fn two_feeds_merge_into_one_registry() {
    let registry = Arc::new(InstrumentRegistry::new(["BTCUSDT", "ETHUSDT"], 2_000));

    let primary = Arc::new(ScriptedTransport {
        frames: vec![
            ticker("btcusdt", "100"),
            "not json".to_string(),
            ticker("ETHUSDT", "2000"),
        ],
    });
    let secondary = Arc::new(ScriptedTransport {
        frames: vec![ticker("BTCUSDT", "100.5"), ticker("DOGEUSDT", "0.1")],
    });

    let (p_transport, p_ingest) =
        FeedMerger::new(Arc::clone(&registry), Source::Primary, TimestampPolicy::Receipt).spawn(primary);
    let (s_transport, s_ingest) =
        FeedMerger::new(Arc::clone(&registry), Source::Secondary, TimestampPolicy::Receipt)
            .spawn(secondary);

    p_transport.await.unwrap();
    s_transport.await.unwrap();
    let p_counters = p_ingest.await.unwrap();
    let s_counters = s_ingest.await.unwrap();

    assert_eq!(p_counters.accepted(), 2);
    assert_eq!(p_counters.decode_errors(), 1);
    assert_eq!(s_counters.accepted(), 1);
    assert_eq!(s_counters.unknown_symbol(), 1);

    let btc = registry.view("BTCUSDT").unwrap();
    assert_eq!(btc.history.len(), 2);
    assert!(btc.latest_price.is_some());
    assert_eq!(registry.latest("ETHUSDT").unwrap(), (Some(2000.0), Source::Primary));
}

#[tokio::test]
async fn primary_label_survives_later_secondary_ticks() {
    let registry = Arc::new(InstrumentRegistry::new(["BTCUSDT"], 2_000));

    let (t, i) = FeedMerger::new(Arc::clone(&registry), Source::Primary, TimestampPolicy::Receipt)
        .spawn(Arc::new(ScriptedTransport {
            frames: vec![ticker("BTCUSDT", "100")],
        }));
    t.await.unwrap();
    i.await.unwrap();

    let (t, i) = FeedMerger::new(Arc::clone(&registry), Source::Secondary, TimestampPolicy::Receipt)
        .spawn(Arc::new(ScriptedTransport {
            frames: vec![ticker("BTCUSDT", "99")],
        }));
    t.await.unwrap();
    i.await.unwrap();

    assert_eq!(registry.latest("BTCUSDT").unwrap(), (Some(99.0), Source::Primary));
}

struct MockHistory;

fn base() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

#[async_trait::async_trait]
impl HistoryApi for MockHistory {
    async fn fetch_history(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<Sample>, FetchError> {
        match symbol {
            "BTCUSDT" => Ok((0..limit as i64)
                .map(|i| Sample::new(base() + TimeDelta::hours(i), 100.0 + i as f64).unwrap())
                .collect()),
            "ETHUSDT" => Ok(Vec::new()),
            _ => Err(FetchError::Status {
                status: 400,
                body: "Invalid symbol.".into(),
            }),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn bootstrap_seeds_good_symbols_and_reports_failures() {
    let registry = Arc::new(InstrumentRegistry::new(["BTCUSDT", "ETHUSDT", "BADUSDT"], 150));
    let settings = BootstrapSettings {
        interval: "1h".into(),
        limit: 200,
        concurrency: 2,
        pause: Duration::from_millis(100),
    };

    let report = bootstrap_all(Arc::new(MockHistory), Arc::clone(&registry), &settings).await;

    assert_eq!(report.seeded, 1);
    assert_eq!(report.failed, vec!["BADUSDT".to_string(), "ETHUSDT".to_string()]);

    let btc = registry.buffer_snapshot("BTCUSDT").unwrap();
    assert_eq!(btc.len(), 150);
    assert_eq!(btc.newest().unwrap().price, 299.0);
    assert!(registry.buffer_snapshot("ETHUSDT").unwrap().is_empty());
    assert!(registry.buffer_snapshot("BADUSDT").unwrap().is_empty());
}
