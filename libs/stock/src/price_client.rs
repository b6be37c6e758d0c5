use std::sync::Arc;

use anyhow::{Result, ensure};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use chrono_tz::{America::New_York, Tz};
use reqwest::{
    Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    Clock, FetchError, HttpFetcher, HttpTransport, MemoryCache, ReqwestTransport, SystemClock,
    TtlCache, market_hours_ttl,
    validate::{parse_body, require},
};

pub const DEFAULT_BASE_API: &str = "https://data.alpaca.markets";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const DAY_TIMEFRAME: &str = "1Day";
const BARS_LIMIT: u32 = 100;

/// Alpaca market-data client for one symbol's daily bars and latest trade.
///
/// Historical bars go through the TTL cache; the latest trade is always fetched live.
#[derive(Clone)]
pub struct PriceClient {
    fetcher: HttpFetcher,
    cache: Arc<dyn TtlCache>,
    clock: Arc<dyn Clock>,
    base_api: Url,
    headers: HeaderMap,
    max_attempts: u32,
    market_tz: Tz,
    custom_cache: bool,
}

impl PriceClient {
    pub fn new(base_api: &str, key_id: &str, secret: &str) -> Result<Self> {
        let base_api = Url::parse(base_api)?;
        ensure!(
            !base_api.cannot_be_a_base(),
            "base API url must be hierarchical: {base_api}"
        );

        let mut secret = HeaderValue::from_str(secret)?;
        secret.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("APCA-API-KEY-ID", HeaderValue::from_str(key_id)?);
        headers.insert("APCA-API-SECRET-KEY", secret);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Ok(Self {
            fetcher: HttpFetcher::new(Arc::new(ReqwestTransport::default())),
            cache: Arc::new(MemoryCache::new(clock.clone())),
            clock,
            base_api,
            headers,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            market_tz: New_York,
            custom_cache: false,
        })
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.fetcher = HttpFetcher::new(transport);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn TtlCache>) -> Self {
        self.cache = cache;
        self.custom_cache = true;
        self
    }

    /// Replaces the clock used for request windows and TTL selection.
    ///
    /// The built-in cache is rebuilt on the new clock. A cache passed to
    /// [`with_cache`](Self::with_cache) keeps its own clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        if !self.custom_cache {
            self.cache = Arc::new(MemoryCache::new(clock.clone()));
        }
        self.clock = clock;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_market_timezone(mut self, tz: Tz) -> Self {
        self.market_tz = tz;
        self
    }

    /// Daily bars for the `days + 1` days ending one day before now, oldest first.
    #[instrument(name = "fetch_historical_bars", skip_all, fields(symbol = %symbol, days = days))]
    pub async fn fetch_historical_bars(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<PriceBar>, FetchError> {
        let key = bars_cache_key(symbol, days);

        if let Some(payload) = self.cache.get(&key) {
            match serde_json::from_str::<Vec<PriceBar>>(&payload) {
                Ok(bars) => {
                    debug!(key = %key, bars = bars.len(), "cache hit");
                    return Ok(bars);
                }
                Err(e) => warn!(key = %key, error = %e, "discarding unreadable cache entry"),
            }
        } else {
            debug!(key = %key, "cache miss");
        }

        let now = self.clock.now();
        let (start, end) =
            historical_window(now, days).ok_or(FetchError::WindowOutOfRange { days })?;
        let url = self.bars_url(symbol, start, end);

        let response = self
            .fetcher
            .fetch(&url, &self.headers, self.max_attempts)
            .await?;
        let body = parse_body(&response)?;

        // Alpaca answers `"bars": null` (or an empty list) when the window holds no sessions.
        if body
            .get("bars")
            .is_some_and(|bars| bars.is_null() || bars.as_array().is_some_and(Vec::is_empty))
        {
            return Err(FetchError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let raw = require(&body, &["bars"], &response)?;

        let mut bars: Vec<PriceBar> = serde_json::from_value(raw).map_err(|e| {
            warn!(url = %url, error = %e, "bars do not match the expected schema");
            FetchError::MalformedResponse {
                field: String::from("bars"),
                context: url.to_string(),
            }
        })?;

        // The API does not promise ordering; sort_by_key is stable so ties keep response order.
        bars.sort_by_key(|bar| bar.timestamp);

        match serde_json::to_string(&bars) {
            Ok(payload) => self
                .cache
                .set(&key, payload, market_hours_ttl(now, self.market_tz)),
            Err(e) => warn!(key = %key, error = %e, "failed to serialize bars for cache"),
        }

        info!(bars = bars.len(), "fetched historical bars");
        Ok(bars)
    }

    /// Price of the most recent trade. Never cached.
    #[instrument(name = "fetch_latest_price", skip_all, fields(symbol = %symbol))]
    pub async fn fetch_latest_price(&self, symbol: &str) -> Result<f64, FetchError> {
        let url = self.latest_trade_url(symbol);

        let response = self
            .fetcher
            .fetch(&url, &self.headers, self.max_attempts)
            .await?;
        let body = parse_body(&response)?;

        let price = require(&body, &["trades", symbol, "p"], &response).map_err(|_| {
            FetchError::NoTradeData {
                symbol: symbol.to_string(),
            }
        })?;

        price.as_f64().ok_or_else(|| FetchError::MalformedResponse {
            field: format!("trades.{symbol}.p"),
            context: url.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_api.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn bars_url(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Url {
        let mut url = self.endpoint(&["v2", "stocks", symbol, "bars"]);
        url.query_pairs_mut()
            .append_pair("timeframe", DAY_TIMEFRAME)
            .append_pair("start", &start.to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("end", &end.to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("limit", &BARS_LIMIT.to_string());
        url
    }

    fn latest_trade_url(&self, symbol: &str) -> Url {
        let mut url = self.endpoint(&["v2", "stocks", "trades", "latest"]);
        url.query_pairs_mut()
            .append_pair("symbols", symbol)
            .append_pair("feed", "iex");
        url
    }
}

/// Cache key covering every parameter that shapes a historical response.
pub fn bars_cache_key(symbol: &str, days: u32) -> String {
    format!("bars:{symbol}:{days}")
}

/// `(start, end)` for a historical request made at `now`.
///
/// The end sits a naive 24 hours back so the still-open trading day is not requested;
/// weekends and holidays are not special-cased. `None` when the start would fall
/// outside the representable date range.
pub fn historical_window(
    now: DateTime<Utc>,
    days: u32,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let end = now.checked_sub_signed(Duration::days(1))?;
    let start = end.checked_sub_signed(Duration::days(i64::from(days) + 1))?;
    Some((start, end))
}

//
// Match Alpaca API JSON
// https://docs.alpaca.markets/reference/stockbars
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "c")]
    pub close: f64,
}
