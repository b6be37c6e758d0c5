#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Url, header::HeaderMap};
use stock::{HttpTransport, ManualClock, MemoryCache, PriceClient, RawResponse, TransportFuture};

/// Replays canned `(status, body)` pairs in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<(Url, HeaderMap)>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<(u16, String)>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back((status, body.into()));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<Url> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.requests.lock().unwrap().last().map(|(_, h)| h.clone())
    }
}

impl HttpTransport for ScriptedTransport {
    fn get<'a>(&'a self, url: &'a Url, headers: &'a HeaderMap) -> TransportFuture<'a> {
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap()
                .push((url.clone(), headers.clone()));
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("no scripted response for {url}"))?;
            Ok(RawResponse {
                url: url.clone(),
                status,
                body,
            })
        })
    }
}

/// Wednesday 11:00 in New York (EDT).
pub fn in_session() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 15, 0, 0).unwrap()
}

/// Tuesday 22:00 in New York (EDT).
pub fn after_hours() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 2, 0, 0).unwrap()
}

pub fn client(transport: Arc<ScriptedTransport>, clock: Arc<ManualClock>) -> PriceClient {
    PriceClient::new("https://data.example.test", "key-id", "secret-key")
        .unwrap()
        .with_transport(transport)
        .with_cache(Arc::new(MemoryCache::new(clock.clone())))
        .with_clock(clock)
}

/// Bars body with closes 100, 102, 98, 105, 103, 99, 101 on consecutive days,
/// listed out of chronological order.
pub fn shuffled_bars_body() -> String {
    let bars = [
        ("2026-10-09T04:00:00Z", 105.0),
        ("2026-10-06T04:00:00Z", 100.0),
        ("2026-10-12T04:00:00Z", 99.0),
        ("2026-10-08T04:00:00Z", 98.0),
        ("2026-10-13T04:00:00Z", 101.0),
        ("2026-10-07T04:00:00Z", 102.0),
        ("2026-10-10T04:00:00Z", 103.0),
    ];
    let bars: Vec<serde_json::Value> = bars
        .iter()
        .map(|(t, c)| {
            serde_json::json!({
                "t": t, "o": c - 0.5, "h": c + 1.0, "l": c - 1.0, "c": c,
                "v": 1_200_000, "n": 9000, "vw": c
            })
        })
        .collect();
    serde_json::json!({ "bars": bars, "symbol": "UNH", "next_page_token": null }).to_string()
}

pub fn latest_trade_body(symbol: &str, price: f64) -> String {
    serde_json::json!({
        "trades": {
            symbol: { "t": "2026-10-14T14:59:58.123Z", "x": "V", "p": price, "s": 100, "c": ["@"], "i": 52983525029461u64, "z": "A" }
        }
    })
    .to_string()
}
