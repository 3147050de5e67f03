//! 日付範囲スクレイパー
//!
//! 開始日から1日ずつチェックイン日をずらしてページを取得し、
//! 部屋タイプごとの価格レコードを集める。日付単位のエラーは
//! 空室なしレコードに変換して次の日付へ進む。

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::config::{PartySize, ScraperConfig};
use crate::error::ScraperError;
use crate::extract::is_unavailable;
use crate::traits::PageSource;
use crate::types::{PriceRecord, RoomType, ScanRequest};

/// 事前確保するレコード数の上限
const MAX_PREALLOCATED_RECORDS: usize = 1024;

/// チェックイン/チェックアウト日と人数をクエリに付けたURL
pub fn build_listing_url(
    hotel_url: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
    party: &PartySize,
) -> String {
    let separator = if hotel_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}checkin={}&checkout={}&group_adults={}&group_children={}&no_rooms={}",
        hotel_url,
        separator,
        check_in.format("%Y-%m-%d"),
        check_out.format("%Y-%m-%d"),
        party.adults,
        party.children,
        party.rooms
    )
}

pub struct DateRangeScraper<S> {
    source: S,
    config: ScraperConfig,
}

impl<S: PageSource> DateRangeScraper<S> {
    pub fn new(source: S, config: ScraperConfig) -> Self {
        Self { source, config }
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// 全日付をスキャンする。エラーは呼び出し元へ返さない。
    #[instrument(name = "scraper", skip_all, fields(hotel = %request.hotel_url))]
    pub async fn scrape(&mut self, request: &ScanRequest) -> Vec<PriceRecord> {
        info!(
            "スクレイピング開始: {} から {} 日分, 部屋タイプ {:?}",
            request.start_date, request.days_forward, request.room_types
        );

        let mut results =
            Vec::with_capacity(request.expected_records().min(MAX_PREALLOCATED_RECORDS));

        if let Err(e) = self.source.initialize().await {
            error!("ブラウザ初期化エラー: {}", e);
            self.release().await;
            return results;
        }

        for offset in 0..request.days_forward {
            let Some(check_in) = request.check_in(offset) else {
                warn!("日付オフセット {} が範囲外のため終了", offset);
                break;
            };

            info!(
                "日付 {}/{} を取得中: {}",
                offset + 1,
                request.days_forward,
                check_in
            );

            match self.scrape_date(request, check_in).await {
                Ok(prices) => {
                    for room_type in &request.room_types {
                        match prices.get(room_type) {
                            Some(&price) => {
                                info!("価格取得: {} {} = {}", check_in, room_type, price);
                                results.push(PriceRecord::available(check_in, *room_type, price));
                            }
                            None => {
                                warn!(
                                    "{} の {} の価格が見つからないため空室なしとして記録",
                                    check_in, room_type
                                );
                                results.push(PriceRecord::unavailable(check_in, *room_type));
                            }
                        }
                    }
                }
                Err(e) => {
                    if matches!(e, ScraperError::Timeout(_)) {
                        error!("ページ読み込みタイムアウト ({}): {}", check_in, e);
                    } else {
                        error!("スクレイピングエラー ({}): {}", check_in, e);
                    }
                    results.extend(unavailable_day(check_in, &request.room_types));
                }
            }

            if offset + 1 < request.days_forward && !self.config.request_delay.is_zero() {
                sleep(self.config.request_delay).await;
            }
        }

        self.release().await;

        info!("スクレイピング完了: {}件", results.len());
        results
    }

    /// 1日分を取得。空室なしの場合は空のマップを返す。
    async fn scrape_date(
        &mut self,
        request: &ScanRequest,
        check_in: NaiveDate,
    ) -> Result<HashMap<RoomType, f64>, ScraperError> {
        let check_out = check_in
            .checked_add_days(Days::new(1))
            .ok_or_else(|| ScraperError::InvalidRequest(format!("{} の翌日を計算できません", check_in)))?;

        let url = build_listing_url(&request.hotel_url, check_in, check_out, &self.config.party);
        info!("ページへ移動: {}", url);

        let snapshot = self.source.fetch(&url).await?;

        if is_unavailable(&snapshot.body_text) {
            warn!("空室なし: {}", check_in);
            return Ok(HashMap::new());
        }

        info!(
            "部屋ブロック {}件 (抽出方式: {})",
            snapshot.total_blocks, self.config.strategy
        );

        Ok(self
            .config
            .strategy
            .extract(&snapshot, &request.room_types, &self.config))
    }

    async fn release(&mut self) {
        if let Err(e) = self.source.close().await {
            warn!("ブラウザ終了エラー: {}", e);
        }
    }
}

fn unavailable_day(date: NaiveDate, room_types: &[RoomType]) -> Vec<PriceRecord> {
    room_types
        .iter()
        .map(|room_type| PriceRecord::unavailable(date, *room_type))
        .collect()
}
