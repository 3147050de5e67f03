//! ホテル価格スクレイパーライブラリ
//!
//! 予約サイトのホテルページを日付ごとに開き、部屋タイプ別の
//! 価格・空室状況を取得する。
//!
//! # 使用例
//!
//! ```rust,ignore
//! use booking_scraper::{PriceScanService, RoomType, ScanRequest, ScraperConfig};
//! use chrono::NaiveDate;
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = PriceScanService::new(ScraperConfig::default());
//!
//!     let request = ScanRequest::new(
//!         "https://www.booking.com/hotel/il/sample.html",
//!         NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
//!         7,
//!         [RoomType::RoomOnly, RoomType::WithBreakfast],
//!     );
//!
//!     let records = service.call(request).await.unwrap();
//!     println!("{}", booking_scraper::records_to_json(&records));
//! }
//! ```

pub mod booking;
pub mod config;
pub mod error;
pub mod extract;
pub mod scraper;
pub mod service;
pub mod traits;
pub mod types;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

// 主要な型をリエクスポート
pub use booking::BookingBrowser;
pub use config::{PartySize, ScraperConfig};
pub use error::ScraperError;
pub use extract::ExtractionStrategy;
pub use scraper::DateRangeScraper;
pub use service::PriceScanService;
pub use traits::PageSource;
pub use types::{records_to_json, PageSnapshot, PriceRecord, RoomType, ScanRequest};

/// ログを標準エラー出力へ出す（標準出力はJSON専用）
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = std::io::stderr().is_terminal();

    tracing_subscriber::registry()
        .with(filter)
        .with(log_layer(std::io::stderr, ansi))
        .init();
}

/// 端末でない出力先（パイプ等）には `ansi = false` でエスケープシーケンスを出さない
pub fn log_layer<S, W>(writer: W, ansi: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(ansi)
}
