mod cache;
mod change_series;
mod clock;
mod error;
mod http;
mod price_client;
mod validate;
mod widget;

pub use cache::{MemoryCache, TtlCache, market_hours_ttl};
pub use change_series::{ChangePoint, ChangeSeries, Color, Sign, truncate_tenths};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::FetchError;
pub use http::{HttpFetcher, HttpTransport, RawResponse, ReqwestTransport, TransportFuture};
pub use price_client::{
    DEFAULT_BASE_API, DEFAULT_MAX_ATTEMPTS, PriceBar, PriceClient, bars_cache_key,
    historical_window,
};
pub use validate::validate;
pub use widget::{WidgetOutcome, WidgetView, load_widget};
