use std::path::PathBuf;
use std::time::Duration;

use booking_scraper::{ExtractionStrategy, RoomType, ScanRequest, ScraperConfig, ScraperError};
use chrono::NaiveDate;
use clap::Parser;

/// 位置引数はすべて省略可能にしてあり、足りない場合は空配列を出力する
#[derive(Parser, Debug)]
#[command(
    name = "booking-scraper",
    version,
    about = "チェックイン日の範囲でホテルの部屋価格を取得する"
)]
pub struct Cli {
    /// ホテルページのURL
    pub hotel_url: Option<String>,

    /// 最初のチェックイン日 (YYYY-MM-DD)
    pub start_date: Option<String>,

    /// 取得する日数
    pub days_forward: Option<String>,

    /// 部屋タイプのJSON配列 (例: '["room_only","with_breakfast"]')
    pub room_types: Option<String>,

    /// 5つ目以降の位置引数（無視する）
    #[arg(hide = true)]
    pub extra: Vec<String>,

    /// ブラウザを表示モードで起動
    #[arg(long, env = "SCRAPER_HEADED")]
    pub headed: bool,

    /// 抽出方式: structured または free-text
    #[arg(long, env = "SCRAPER_STRATEGY", default_value = "structured")]
    pub strategy: ExtractionStrategy,

    /// ページ読み込みタイムアウト（秒）
    #[arg(long, env = "SCRAPER_PAGE_TIMEOUT_SECS", default_value_t = 30)]
    pub page_timeout_secs: u64,

    /// 日付間の待機（ミリ秒）
    #[arg(long, env = "SCRAPER_DELAY_MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Chrome/Chromium の実行ファイル
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,
}

impl Cli {
    /// 位置引数が4つ揃っていなければ `Ok(None)`
    pub fn scan_request(&self) -> Result<Option<ScanRequest>, ScraperError> {
        let (Some(url), Some(start), Some(days), Some(types)) = (
            &self.hotel_url,
            &self.start_date,
            &self.days_forward,
            &self.room_types,
        ) else {
            return Ok(None);
        };

        let start_date = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")
            .map_err(|e| ScraperError::InvalidRequest(format!("開始日 {:?}: {}", start, e)))?;
        let days_forward: u32 = days
            .trim()
            .parse()
            .map_err(|e| ScraperError::InvalidRequest(format!("日数 {:?}: {}", days, e)))?;
        let room_types: Vec<RoomType> = serde_json::from_str(types)?;

        let request = ScanRequest::new(url.as_str(), start_date, days_forward, room_types);
        request.validate()?;
        Ok(Some(request))
    }

    pub fn scraper_config(&self) -> ScraperConfig {
        let mut config = ScraperConfig::new()
            .with_headless(!self.headed)
            .with_strategy(self.strategy)
            .with_page_timeout(Duration::from_secs(self.page_timeout_secs))
            .with_request_delay(Duration::from_millis(self.delay_ms));

        if let Some(path) = &self.chrome_path {
            config = config.with_chrome_path(path);
        }
        config
    }
}
