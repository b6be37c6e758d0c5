use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::{ChangePoint, ChangeSeries, Color, FetchError, PriceClient};

/// Everything the renderer needs to draw one ticker widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetView {
    pub symbol: String,
    pub price: String,
    pub change: String,
    pub color: Color,
    pub points: Vec<ChangePoint>,
    pub min: f64,
    pub max: f64,
}

impl WidgetView {
    pub fn new(symbol: &str, series: ChangeSeries) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: series.price_text(),
            change: series.percent_text(),
            color: series.sign.color(),
            points: series.points,
            min: series.min,
            max: series.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetOutcome {
    Ready(WidgetView),
    /// A single line shown instead of the chart.
    Message { text: String },
}

impl WidgetOutcome {
    pub fn missing_credentials() -> Self {
        Self::Message {
            text: String::from("missing credentials"),
        }
    }

    pub fn no_data(symbol: &str) -> Self {
        Self::Message {
            text: format!("no data for {symbol}"),
        }
    }
}

/// Runs one render invocation: historical bars, then the latest trade, then the series.
///
/// A historical failure stops before the latest trade is requested. A missing latest
/// trade degrades to the historical trend; any other latest-trade failure is shown as
/// no data.
#[instrument(name = "load_widget", skip_all, fields(symbol = %symbol, days = days))]
pub async fn load_widget(client: &PriceClient, symbol: &str, days: u32) -> WidgetOutcome {
    let bars = match client.fetch_historical_bars(symbol, days).await {
        Ok(bars) => bars,
        Err(e) => {
            warn!(error = %e, "historical fetch failed");
            return WidgetOutcome::no_data(symbol);
        }
    };

    let latest = match client.fetch_latest_price(symbol).await {
        Ok(price) => Some(price),
        Err(FetchError::NoTradeData { .. }) => {
            info!("latest trade unavailable, showing historical trend only");
            None
        }
        Err(e) => {
            warn!(error = %e, "latest price fetch failed");
            return WidgetOutcome::no_data(symbol);
        }
    };

    match ChangeSeries::build(&bars, latest) {
        Ok(series) => WidgetOutcome::Ready(WidgetView::new(symbol, series)),
        Err(e) => {
            error!(error = %e, "change series build failed");
            WidgetOutcome::no_data(symbol)
        }
    }
}
