use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::booking::BookingBrowser;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::scraper::DateRangeScraper;
use crate::types::{PriceRecord, ScanRequest};

/// tower::Serviceを実装した価格スキャンサービス
///
/// 不正なリクエストのみエラーを返す。スキャン中の失敗は
/// 空室なしレコードか空の結果として `Ok` で返る。
#[derive(Debug, Clone, Default)]
pub struct PriceScanService {
    config: ScraperConfig,
}

impl PriceScanService {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }
}

impl Service<ScanRequest> for PriceScanService {
    type Response = Vec<PriceRecord>;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScanRequest) -> Self::Future {
        info!(
            "スキャンリクエスト受信: url={}, start={}, days={}",
            req.hotel_url, req.start_date, req.days_forward
        );

        let config = self.config.clone();

        Box::pin(async move {
            req.validate()?;

            let browser = BookingBrowser::new(config.clone());
            let mut scraper = DateRangeScraper::new(browser, config);
            let records = scraper.scrape(&req).await;

            info!(
                "スキャン完了: {}/{}件",
                records.len(),
                req.expected_records()
            );

            Ok(records)
        })
    }
}
