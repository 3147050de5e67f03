use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("価格抽出エラー: {0}")]
    Extraction(String),

    #[error("不正なリクエスト: {0}")]
    InvalidRequest(String),

    #[error("JSONエラー: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ScraperError {
    fn from(e: serde_json::Error) -> Self {
        ScraperError::Json(e.to_string())
    }
}
