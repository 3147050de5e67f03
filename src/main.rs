use booking_scraper::{init_tracing, records_to_json, PriceRecord, PriceScanService};
use clap::Parser;
use tower::Service;
use tracing::{error, info, warn};

mod cli;

/// 標準出力には常にJSON配列を1つだけ出し、終了コードは0
#[tokio::main]
async fn main() {
    init_tracing();

    let records = match cli::Cli::try_parse() {
        Ok(args) => run(args).await,
        Err(e) => {
            warn!("引数を解析できません: {}", e);
            Vec::new()
        }
    };

    println!("{}", records_to_json(&records));
}

async fn run(args: cli::Cli) -> Vec<PriceRecord> {
    let request = match args.scan_request() {
        Ok(Some(request)) => request,
        Ok(None) => {
            error!("引数が不足しています");
            return Vec::new();
        }
        Err(e) => {
            error!("引数が不正です: {}", e);
            return Vec::new();
        }
    };

    info!("スクレイパー開始");

    let mut service = PriceScanService::new(args.scraper_config());
    let task = tokio::spawn(service.call(request));

    match task.await {
        Ok(Ok(records)) => {
            info!("取得完了: {}件", records.len());
            records
        }
        Ok(Err(e)) => {
            error!("スキャン要求が拒否されました: {}", e);
            Vec::new()
        }
        Err(e) => {
            error!("スキャンタスクで致命的エラー: {}", e);
            Vec::new()
        }
    }
}
