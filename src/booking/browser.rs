use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::extract::{PRICE_SELECTORS, ROOM_BLOCK_SELECTORS, ROOM_DESCRIPTION_SELECTOR};
use crate::traits::PageSource;
use crate::types::PageSnapshot;

/// ページ内で実行するスナップショット取得スクリプト
///
/// 部屋ブロックのセレクタを順に試し、最初にヒットしたものから
/// 上限件数までの説明文と価格テキストをJSON文字列で返す。
const SNAPSHOT_SCRIPT_TEMPLATE: &str = r#"
(() => {
    if (!document.body) {
        return '';
    }
    const blockSelectors = __BLOCK_SELECTORS__;
    const descriptionSelector = __DESCRIPTION_SELECTOR__;
    const priceSelectors = __PRICE_SELECTORS__;
    const textOf = (el) => (el ? (el.innerText || el.textContent || '') : '');

    let blocks = [];
    for (const selector of blockSelectors) {
        blocks = Array.from(document.querySelectorAll(selector));
        if (blocks.length > 0) {
            break;
        }
    }

    const roomBlocks = blocks.slice(0, __MAX_BLOCKS__).map((block) => {
        const priceTexts = [];
        for (const selector of priceSelectors) {
            const el = block.querySelector(selector);
            if (el) {
                priceTexts.push(textOf(el));
            }
        }
        return {
            description: textOf(block.querySelector(descriptionSelector)),
            priceTexts,
        };
    });

    return JSON.stringify({
        bodyText: textOf(document.body),
        roomBlocks,
        totalBlocks: blocks.length,
    });
})()
"#;

pub fn snapshot_script(max_blocks: usize) -> Result<String, ScraperError> {
    Ok(SNAPSHOT_SCRIPT_TEMPLATE
        .replace("__BLOCK_SELECTORS__", &serde_json::to_string(ROOM_BLOCK_SELECTORS)?)
        .replace(
            "__DESCRIPTION_SELECTOR__",
            &serde_json::to_string(ROOM_DESCRIPTION_SELECTOR)?,
        )
        .replace("__PRICE_SELECTORS__", &serde_json::to_string(PRICE_SELECTORS)?)
        .replace("__MAX_BLOCKS__", &max_blocks.to_string()))
}

pub struct BookingBrowser {
    config: ScraperConfig,
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
}

impl BookingBrowser {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            browser: None,
            handler_task: None,
        }
    }

    fn get_browser(&self) -> Result<&Browser, ScraperError> {
        self.browser
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("ブラウザが初期化されていません".into()))
    }

    /// ページ遷移（タイムアウト付き）→ 描画待ち → スナップショット取得
    async fn load_snapshot(&self, page: &Page, url: &str) -> Result<PageSnapshot, ScraperError> {
        let page_timeout = self.config.page_timeout;

        timeout(page_timeout, async {
            page.goto(url)
                .await
                .map_err(|e| ScraperError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| ScraperError::Navigation(e.to_string()))?;
            Ok::<(), ScraperError>(())
        })
        .await
        .map_err(|_| {
            ScraperError::Timeout(format!("{:?} 以内にページが読み込まれませんでした", page_timeout))
        })??;
        debug!("ページ読み込み完了: {}", url);

        // 価格要素の描画を待機
        sleep(self.config.settle_delay).await;

        let script = snapshot_script(self.config.max_room_blocks)?;
        let json: String = page
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::Extraction(e.to_string()))?
            .into_value()?;

        if json.is_empty() {
            return Err(ScraperError::ElementNotFound("document.body".into()));
        }

        let snapshot: PageSnapshot = serde_json::from_str(&json)?;
        debug!(
            "スナップショット: 本文 {} 文字, 部屋ブロック {}/{}",
            snapshot.body_text.len(),
            snapshot.room_blocks.len(),
            snapshot.total_blocks
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl PageSource for BookingBrowser {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        info!("ブラウザを起動中...");

        let (width, height) = self.config.window_size;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg(format!("--user-agent={}", self.config.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if let Some(path) = &self.config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        if !self.config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("ブラウザ設定エラー: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("ブラウザイベントエラー: {:?}", e);
                }
            }
        });

        self.browser = Some(browser);
        self.handler_task = Some(handler_task);

        info!("ブラウザ起動完了");
        Ok(())
    }

    async fn fetch(&mut self, url: &str) -> Result<PageSnapshot, ScraperError> {
        let page = self
            .get_browser()?
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::Navigation(format!("新規ページ作成: {}", e)))?;

        let result = self.load_snapshot(&page, url).await;

        if let Err(e) = page.close().await {
            debug!("ページを閉じられませんでした: {}", e);
        }

        result
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("ブラウザ終了コマンド失敗: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("ブラウザプロセスの終了待機に失敗: {}", e);
            }
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        info!("ブラウザ終了完了");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoomType;

    #[test]
    fn test_booking_browser_new() {
        let browser = BookingBrowser::new(ScraperConfig::default());
        assert!(browser.browser.is_none());
        assert!(browser.handler_task.is_none());
    }

    #[test]
    fn test_snapshot_script_embeds_selectors() {
        let script = snapshot_script(7).unwrap();

        assert!(!script.contains("__"));
        assert!(script.contains("blocks.slice(0, 7)"));
        assert!(script.contains(r#"[data-testid=\"price-and-discounted-price\"]"#));
        assert!(script.contains(".hprt-table tbody tr"));
    }

    #[tokio::test]
    async fn test_fetch_before_initialize() {
        let mut browser = BookingBrowser::new(ScraperConfig::default());
        let result = browser.fetch("https://www.booking.com/hotel/il/sample.html").await;
        assert!(matches!(result, Err(ScraperError::BrowserInit(_))));

        // 未初期化でも close は成功する
        assert!(browser.close().await.is_ok());
    }

    #[tokio::test]
    #[ignore] // 実環境テスト用: cargo test live_booking_scrape -- --ignored --nocapture
    async fn live_booking_scrape() {
        use crate::scraper::DateRangeScraper;
        use crate::types::ScanRequest;

        tracing_subscriber::fmt()
            .with_env_filter("info,booking_scraper=debug")
            .with_writer(std::io::stderr)
            .init();

        let hotel_url = std::env::var("BOOKING_HOTEL_URL").expect("BOOKING_HOTEL_URL not set");
        let start = chrono::Local::now().date_naive() + chrono::Days::new(14);
        let request = ScanRequest::new(
            hotel_url,
            start,
            2,
            [RoomType::RoomOnly, RoomType::WithBreakfast],
        );

        let config = ScraperConfig::default();
        let mut scraper = DateRangeScraper::new(BookingBrowser::new(config.clone()), config);
        let records = scraper.scrape(&request).await;

        println!("{}", serde_json::to_string_pretty(&records).unwrap());
        assert_eq!(records.len(), request.expected_records());
    }
}
