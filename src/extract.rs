//! 価格抽出ロジック
//!
//! ページスナップショットから部屋タイプ別の価格を取り出す。
//! 2つの方式がある:
//! - `Structured`: 部屋ブロックごとに説明文で分類し、価格要素を優先順に探す
//! - `FreeText`: 本文全体から通貨付きの数値を拾い、最安値を素泊まり価格とする

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::types::{PageSnapshot, RoomType};

/// 空室なしを示す文言（小文字で比較）
pub const UNAVAILABLE_MARKERS: &[&str] = &[
    "no availability",
    "sold out",
    "not available",
    "אין זמינות",
    "אזל",
];

/// 部屋説明に含まれる朝食キーワード
pub const BREAKFAST_KEYWORDS: &[&str] = &["breakfast", "ארוחת בוקר", "כולל ארוחה"];

/// 本文中で朝食込みを示す文言
pub const BREAKFAST_PHRASES: &[&str] = &["breakfast included", "with breakfast"];

/// 部屋ブロックのセレクタ（先頭から試し、見つかった時点で採用）
pub const ROOM_BLOCK_SELECTORS: &[&str] = &[
    r#"[data-testid="property-card-container"], .hprt-table-row, [data-block-id]"#,
    ".room-block, .hprt-table tbody tr",
];

pub const ROOM_DESCRIPTION_SELECTOR: &str =
    r#".hprt-roomtype-icon-link, [data-testid="title"], .room-name"#;

/// 価格要素のセレクタ（優先順）
pub const PRICE_SELECTORS: &[&str] = &[
    r#"[data-testid="price-and-discounted-price"]"#,
    ".prco-valign-middle-helper",
    ".bui-price-display__value",
    ".prco-text-nowrap-helper",
    r#"span[aria-hidden="true"]"#,
];

lazy_static! {
    static ref CURRENCY_PRICE_REGEX: Regex =
        Regex::new(r"(?:SGD|ILS|USD|EUR|₪|\$|€)\s*[\d,]+").unwrap();
}

/// 抽出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionStrategy {
    #[default]
    Structured,
    FreeText,
}

impl ExtractionStrategy {
    pub fn extract(
        &self,
        snapshot: &PageSnapshot,
        room_types: &[RoomType],
        config: &ScraperConfig,
    ) -> HashMap<RoomType, f64> {
        match self {
            ExtractionStrategy::Structured => {
                extract_structured(snapshot, room_types, config.max_room_blocks)
            }
            ExtractionStrategy::FreeText => extract_free_text(
                &snapshot.body_text,
                room_types,
                config.min_price,
                config.max_price,
                config.breakfast_markup,
            ),
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStrategy::Structured => f.write_str("structured"),
            ExtractionStrategy::FreeText => f.write_str("free-text"),
        }
    }
}

impl FromStr for ExtractionStrategy {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" => Ok(ExtractionStrategy::Structured),
            "free-text" | "free_text" | "text" => Ok(ExtractionStrategy::FreeText),
            other => Err(ScraperError::InvalidRequest(format!(
                "不明な抽出方式: {}",
                other
            ))),
        }
    }
}

pub fn is_unavailable(text: &str) -> bool {
    let lower = text.to_lowercase();
    UNAVAILABLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// 部屋説明から部屋タイプを判定
pub fn classify_room(description: &str) -> RoomType {
    let lower = description.to_lowercase();
    if BREAKFAST_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        RoomType::WithBreakfast
    } else {
        RoomType::RoomOnly
    }
}

/// 数字と小数点以外を除去して価格に変換
///
/// `"₪ 1,234"` → `1234.0`。数字が残らない場合や小数点が複数ある場合は `None`。
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// 部屋ブロックから価格を抽出（部屋タイプごとに最初に見つかった1件のみ）
pub fn extract_structured(
    snapshot: &PageSnapshot,
    room_types: &[RoomType],
    max_blocks: usize,
) -> HashMap<RoomType, f64> {
    let mut found = HashMap::new();

    for (index, block) in snapshot.room_blocks.iter().take(max_blocks).enumerate() {
        let room_type = classify_room(&block.description);

        if !room_types.contains(&room_type) || found.contains_key(&room_type) {
            continue;
        }

        let Some(price_text) = block
            .price_texts
            .iter()
            .find(|text| text.chars().any(|c| c.is_ascii_digit()))
        else {
            debug!("部屋ブロック {} に価格テキストなし、スキップ", index);
            continue;
        };

        match parse_price(price_text) {
            Some(price) => {
                debug!("部屋ブロック {}: {} = {}", index, room_type, price);
                found.insert(room_type, price);
            }
            None => debug!("部屋ブロック {} の価格 {:?} を解析できません", index, price_text),
        }

        if room_types.iter().all(|rt| found.contains_key(rt)) {
            break;
        }
    }

    found
}

/// 本文に現れる通貨付き数値のうち、価格帯内のものを返す
pub fn find_text_prices(text: &str, min_price: f64, max_price: f64) -> Vec<f64> {
    CURRENCY_PRICE_REGEX
        .find_iter(text)
        .filter_map(|m| {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().ok()
        })
        .map(|p| p as f64)
        .filter(|p| *p > min_price && *p < max_price)
        .collect()
}

/// 朝食込み価格の推定値（四捨五入）
pub fn breakfast_price(room_only: f64, markup: f64) -> f64 {
    (room_only * markup).round()
}

pub fn extract_free_text(
    text: &str,
    room_types: &[RoomType],
    min_price: f64,
    max_price: f64,
    markup: f64,
) -> HashMap<RoomType, f64> {
    let mut found = HashMap::new();

    let prices = find_text_prices(text, min_price, max_price);
    let Some(min) = prices.iter().copied().reduce(f64::min) else {
        debug!("本文中に ({}, {}) の範囲の価格なし", min_price, max_price);
        return found;
    };
    debug!("本文中の価格: {:?}, 最安値 {}", prices, min);

    let lower = text.to_lowercase();
    let has_breakfast = BREAKFAST_PHRASES.iter().any(|p| lower.contains(p));

    for room_type in room_types {
        match room_type {
            RoomType::RoomOnly => {
                found.insert(RoomType::RoomOnly, min);
            }
            RoomType::WithBreakfast if has_breakfast => {
                found.insert(RoomType::WithBreakfast, breakfast_price(min, markup));
            }
            RoomType::WithBreakfast => {}
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: &[RoomType] = &[RoomType::RoomOnly, RoomType::WithBreakfast];

    #[test]
    fn test_unavailable_markers() {
        assert!(is_unavailable("Sorry, this property is SOLD OUT for your dates"));
        assert!(is_unavailable("No availability on our site"));
        assert!(is_unavailable("החדר אזל"));
        assert!(!is_unavailable("Deluxe Double Room ₪ 540"));
    }

    #[test]
    fn test_classify_room() {
        assert_eq!(classify_room("Deluxe Room - Breakfast included"), RoomType::WithBreakfast);
        assert_eq!(classify_room("חדר זוגי כולל ארוחת בוקר"), RoomType::WithBreakfast);
        assert_eq!(classify_room("Standard Double Room"), RoomType::RoomOnly);
        assert_eq!(classify_room(""), RoomType::RoomOnly);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("₪ 1,234"), Some(1234.0));
        assert_eq!(parse_price("S$ 218.50"), Some(218.5));
        assert_eq!(parse_price("Price"), None);
        assert_eq!(parse_price("1.2.3"), None);
    }

    #[test]
    fn test_structured_first_match_per_type() {
        let snapshot = PageSnapshot::from_text("")
            .with_block("Standard Room", &["₪ 400"])
            .with_block("Superior Room", &["₪ 350"])
            .with_block("Standard Room with breakfast", &["", "Prices", "₪ 480"]);

        let found = extract_structured(&snapshot, BOTH, 10);
        assert_eq!(found.get(&RoomType::RoomOnly), Some(&400.0));
        assert_eq!(found.get(&RoomType::WithBreakfast), Some(&480.0));
    }

    #[test]
    fn test_structured_skips_unrequested_and_unpriced() {
        let snapshot = PageSnapshot::from_text("")
            .with_block("Room, breakfast included", &["₪ 500"])
            .with_block("Standard Room", &["Sold"])
            .with_block("Economy Room", &["$ 120"]);

        let found = extract_structured(&snapshot, &[RoomType::RoomOnly], 10);
        assert_eq!(found.len(), 1);
        assert_eq!(found.get(&RoomType::RoomOnly), Some(&120.0));
    }

    #[test]
    fn test_structured_respects_block_cap() {
        let mut snapshot = PageSnapshot::from_text("");
        for _ in 0..10 {
            snapshot = snapshot.with_block("Standard Room", &["n/a"]);
        }
        snapshot = snapshot.with_block("Standard Room", &["₪ 300"]);

        assert!(extract_structured(&snapshot, BOTH, 10).is_empty());
        assert_eq!(
            extract_structured(&snapshot, BOTH, 11).get(&RoomType::RoomOnly),
            Some(&300.0)
        );
    }

    #[test]
    fn test_free_text_minimum_without_breakfast() {
        let text = "Deluxe ₪ 120 | Standard ₪ 80 | Twin ₪ 95";
        let found = extract_free_text(text, BOTH, 50.0, 10000.0, 1.15);

        assert_eq!(found.get(&RoomType::RoomOnly), Some(&80.0));
        assert!(!found.contains_key(&RoomType::WithBreakfast));
    }

    #[test]
    fn test_free_text_breakfast_markup() {
        let text = "Superior room USD 200 - Breakfast included";
        let found = extract_free_text(text, BOTH, 50.0, 10000.0, 1.15);

        assert_eq!(found.get(&RoomType::RoomOnly), Some(&200.0));
        assert_eq!(found.get(&RoomType::WithBreakfast), Some(&230.0));
    }

    #[test]
    fn test_free_text_band_is_exclusive() {
        let prices = find_text_prices("€ 50, € 51, $ 9,999, $ 10,000, ILS 3", 50.0, 10000.0);
        assert_eq!(prices, vec![51.0, 9999.0]);
    }

    #[test]
    fn test_free_text_nothing_in_band() {
        let found = extract_free_text("Taxes € 12", BOTH, 50.0, 10000.0, 1.15);
        assert!(found.is_empty());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("structured".parse::<ExtractionStrategy>().unwrap(), ExtractionStrategy::Structured);
        assert_eq!("free-text".parse::<ExtractionStrategy>().unwrap(), ExtractionStrategy::FreeText);
        assert!("dom".parse::<ExtractionStrategy>().is_err());
    }

    #[test]
    fn test_strategy_dispatch() {
        let snapshot = PageSnapshot::from_text("Room ₪ 300").with_block("Standard Room", &["₪ 310"]);
        let config = ScraperConfig::default();

        let structured = ExtractionStrategy::Structured.extract(&snapshot, BOTH, &config);
        assert_eq!(structured.get(&RoomType::RoomOnly), Some(&310.0));

        let free_text = ExtractionStrategy::FreeText.extract(&snapshot, BOTH, &config);
        assert_eq!(free_text.get(&RoomType::RoomOnly), Some(&300.0));
    }
}
