use async_trait::async_trait;

use crate::error::ScraperError;
use crate::types::PageSnapshot;

/// 日付ループが操作するページ取得元
#[async_trait]
pub trait PageSource: Send + Sync {
    /// ブラウザ初期化
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// URLを開き、本文と部屋ブロックを取得
    async fn fetch(&mut self, url: &str) -> Result<PageSnapshot, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;
}
