use std::path::PathBuf;
use std::time::Duration;

use crate::extract::ExtractionStrategy;

/// 宿泊人数（URLクエリに付与）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartySize {
    pub adults: u32,
    pub children: u32,
    pub rooms: u32,
}

impl Default for PartySize {
    fn default() -> Self {
        Self {
            adults: 2,
            children: 0,
            rooms: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub headless: bool,
    /// 未指定なら chromiumoxide の自動検出に任せる
    pub chrome_path: Option<PathBuf>,
    pub window_size: (u32, u32),
    pub user_agent: String,
    /// ページ読み込みのタイムアウト
    pub page_timeout: Duration,
    /// 読み込み後、価格要素の描画を待つ時間
    pub settle_delay: Duration,
    /// 日付間の固定待機
    pub request_delay: Duration,
    /// 解析する部屋ブロックの上限
    pub max_room_blocks: usize,
    pub party: PartySize,
    pub strategy: ExtractionStrategy,
    /// 妥当な価格帯（両端を含まない）
    pub min_price: f64,
    pub max_price: f64,
    /// 朝食付き価格の推定倍率（フリーテキスト抽出）
    pub breakfast_markup: f64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            window_size: (1920, 1080),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            page_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            request_delay: Duration::from_secs(1),
            max_room_blocks: 10,
            party: PartySize::default(),
            strategy: ExtractionStrategy::Structured,
            min_price: 50.0,
            max_price: 10000.0,
            breakfast_markup: 1.15,
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_strategy(mut self, strategy: ExtractionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_party(mut self, party: PartySize) -> Self {
        self.party = party;
        self
    }

    pub fn with_max_room_blocks(mut self, max: usize) -> Self {
        self.max_room_blocks = max;
        self
    }

    pub fn with_price_band(mut self, min_price: f64, max_price: f64) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    pub fn with_breakfast_markup(mut self, markup: f64) -> Self {
        self.breakfast_markup = markup;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert!(config.headless);
        assert_eq!(config.page_timeout, Duration::from_secs(30));
        assert_eq!(config.request_delay, Duration::from_secs(1));
        assert_eq!(config.max_room_blocks, 10);
        assert_eq!(config.party, PartySize { adults: 2, children: 0, rooms: 1 });
        assert_eq!(config.strategy, ExtractionStrategy::Structured);
    }

    #[test]
    fn test_config_builder() {
        let config = ScraperConfig::new()
            .with_headless(false)
            .with_chrome_path("/usr/bin/chromium")
            .with_page_timeout(Duration::from_secs(45))
            .with_request_delay(Duration::ZERO)
            .with_strategy(ExtractionStrategy::FreeText)
            .with_price_band(100.0, 5000.0);

        assert!(!config.headless);
        assert_eq!(config.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(config.page_timeout, Duration::from_secs(45));
        assert!(config.request_delay.is_zero());
        assert_eq!(config.strategy, ExtractionStrategy::FreeText);
        assert_eq!(config.min_price, 100.0);
        assert_eq!(config.max_price, 5000.0);
    }

    #[test]
    fn test_extraction_tuning_builders() {
        let party = PartySize {
            adults: 3,
            children: 1,
            rooms: 2,
        };
        let config = ScraperConfig::new()
            .with_settle_delay(Duration::from_millis(500))
            .with_party(party)
            .with_max_room_blocks(4)
            .with_breakfast_markup(1.2);

        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.party, party);
        assert_eq!(config.max_room_blocks, 4);
        assert_eq!(config.breakfast_markup, 1.2);
    }
}
