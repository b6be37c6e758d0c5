use serde::Serialize;

use crate::{FetchError, PriceBar};

/// One plotted point: position in the series and distance from the baseline close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangePoint {
    pub index: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
    /// No live price; the change is the historical trend only.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Red,
    Neutral,
}

impl Sign {
    pub fn color(self) -> Color {
        match self {
            Sign::Positive => Color::Green,
            Sign::Negative => Color::Red,
            Sign::Neutral => Color::Neutral,
        }
    }
}

/// Baseline-relative price series plus the summary shown next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSeries {
    pub points: Vec<ChangePoint>,
    pub min: f64,
    pub max: f64,
    /// Percent change, truncated toward zero to one decimal.
    pub percent_change: f64,
    pub sign: Sign,
    pub display_price: f64,
}

impl ChangeSeries {
    /// Builds the series from bars sorted oldest first.
    ///
    /// With a latest price, one extra point is appended and the percent change is measured
    /// against the last close. Without one, the change spans the whole window and the sign
    /// is [`Sign::Neutral`].
    pub fn build(bars: &[PriceBar], latest_price: Option<f64>) -> Result<Self, FetchError> {
        let (first, last) = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(FetchError::EmptyInput),
        };

        let baseline = first.close;
        let last_close = last.close;

        let mut points = Vec::with_capacity(bars.len() + 1);
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        let closes = bars.iter().map(|bar| bar.close).chain(latest_price);
        for (i, close) in closes.enumerate() {
            let delta = close - baseline;
            min = min.min(delta);
            max = max.max(delta);
            points.push(ChangePoint {
                index: i as f64,
                delta,
            });
        }

        let (percent_change, sign, display_price) = match latest_price {
            Some(latest) => {
                let pct = truncate_tenths(percent(latest, last_close));
                let sign = if pct >= 0.0 {
                    Sign::Positive
                } else {
                    Sign::Negative
                };
                (pct, sign, latest)
            }
            None => (
                truncate_tenths(percent(last_close, baseline)),
                Sign::Neutral,
                last_close,
            ),
        };

        Ok(Self {
            points,
            min,
            max,
            percent_change,
            sign,
            display_price,
        })
    }

    /// e.g. `+2.9%`, `-0.4%`, or `1.0%` when there is no live price.
    pub fn percent_text(&self) -> String {
        match self.sign {
            Sign::Positive => format!("+{:.1}%", self.percent_change),
            Sign::Negative | Sign::Neutral => format!("{:.1}%", self.percent_change),
        }
    }

    /// Display price truncated (not rounded) to whole units.
    pub fn price_text(&self) -> String {
        format!("${}", self.display_price.trunc() as i64)
    }
}

fn percent(value: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    (value - reference) / reference * 100.0
}

/// Truncates toward zero at one decimal place: 1.96 becomes 1.9, -1.96 becomes -1.9.
pub fn truncate_tenths(value: f64) -> f64 {
    // + 0.0 turns -0.0 into 0.0
    (value * 10.0).trunc() / 10.0 + 0.0
}
