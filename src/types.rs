//! スキャン要求・価格レコード・ページスナップショットの型定義

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// 部屋タイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    /// 素泊まり
    RoomOnly,
    /// 朝食付き
    WithBreakfast,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::RoomOnly => "room_only",
            RoomType::WithBreakfast => "with_breakfast",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1日分（1泊）の価格レコード
///
/// `available == false` のとき `price` は常に 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub room_type: RoomType,
    pub price: f64,
    pub available: bool,
}

impl PriceRecord {
    pub fn available(date: NaiveDate, room_type: RoomType, price: f64) -> Self {
        Self {
            date,
            room_type,
            price,
            available: true,
        }
    }

    /// 価格不明・空室なしを表すセンチネルレコード
    pub fn unavailable(date: NaiveDate, room_type: RoomType) -> Self {
        Self {
            date,
            room_type,
            price: 0.0,
            available: false,
        }
    }
}

/// 標準出力へ書き出すJSON配列を生成（失敗時は空配列）
pub fn records_to_json(records: &[PriceRecord]) -> String {
    serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string())
}

/// スキャン要求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub hotel_url: String,
    pub start_date: NaiveDate,
    pub days_forward: u32,
    pub room_types: Vec<RoomType>,
}

impl ScanRequest {
    /// 部屋タイプの重複は最初の出現順を保って除去する
    pub fn new(
        hotel_url: impl Into<String>,
        start_date: NaiveDate,
        days_forward: u32,
        room_types: impl IntoIterator<Item = RoomType>,
    ) -> Self {
        let mut unique = Vec::new();
        for room_type in room_types {
            if !unique.contains(&room_type) {
                unique.push(room_type);
            }
        }

        Self {
            hotel_url: hotel_url.into(),
            start_date,
            days_forward,
            room_types: unique,
        }
    }

    pub fn validate(&self) -> Result<(), ScraperError> {
        if self.hotel_url.trim().is_empty() {
            return Err(ScraperError::InvalidRequest("ホテルURLが空です".into()));
        }
        if self.days_forward == 0 {
            return Err(ScraperError::InvalidRequest(
                "日数は1以上が必要です".into(),
            ));
        }
        if self.room_types.is_empty() {
            return Err(ScraperError::InvalidRequest(
                "部屋タイプを1つ以上指定してください".into(),
            ));
        }
        Ok(())
    }

    /// `start_date + offset` のチェックイン日
    pub fn check_in(&self, offset: u32) -> Option<NaiveDate> {
        self.start_date.checked_add_days(Days::new(offset.into()))
    }

    /// 期待されるレコード数（日数 × 部屋タイプ数）
    pub fn expected_records(&self) -> usize {
        (self.days_forward as usize).saturating_mul(self.room_types.len())
    }
}

/// ページから取り出した部屋ブロック
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomBlock {
    /// 部屋名・説明テキスト
    pub description: String,
    /// 価格要素のテキスト（セレクタの優先順）
    pub price_texts: Vec<String>,
}

/// 読み込み済みページのスナップショット
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub body_text: String,
    #[serde(default)]
    pub room_blocks: Vec<RoomBlock>,
    /// 上限で切り詰める前に見つかったブロック数
    #[serde(default)]
    pub total_blocks: usize,
}

impl PageSnapshot {
    pub fn from_text(body_text: impl Into<String>) -> Self {
        Self {
            body_text: body_text.into(),
            ..Default::default()
        }
    }

    pub fn with_block(mut self, description: &str, price_texts: &[&str]) -> Self {
        self.room_blocks.push(RoomBlock {
            description: description.to_string(),
            price_texts: price_texts.iter().map(|s| s.to_string()).collect(),
        });
        self.total_blocks = self.room_blocks.len();
        self
    }
}
