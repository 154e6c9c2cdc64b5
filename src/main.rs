/// 室内跟踪服务
///
/// 用法: blutrack [配置文件] [区域模型文件]
///
/// 从标准输入逐行读取 JSON 报告，向标准输出逐行写出 JSON 事件；
/// 日志写到标准错误，级别由 RUST_LOG 控制

use blutrack::algorithms::{KnnZoneModel, ZoneClassifier};
use blutrack::stream::{self, write_events};
use blutrack::{run_report_stream, PositionEngine, TrackerConfig, TrackerError};
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => TrackerConfig::from_file(&path)?,
        None => TrackerConfig::default(),
    };
    let classifier_path: PathBuf = args
        .next()
        .map(PathBuf::from)
        .or_else(|| config.classifier_path.clone())
        .ok_or_else(|| TrackerError::ClassifierUnavailable("未指定区域模型文件".to_string()))?;

    let model = KnnZoneModel::from_file(&classifier_path)?;
    let classifier = ZoneClassifier::new(Box::new(model), config.zone_coordinates())?;
    let exemptions = config.exemption_groups()?;
    let engine = stream::shared(PositionEngine::new(&config, classifier, exemptions));

    let (tx, rx) = mpsc::channel(256);
    let printer = tokio::spawn(write_events(rx, tokio::io::stdout()));

    let summary = run_report_stream(engine, BufReader::new(tokio::io::stdin()), tx).await?;
    let written = printer
        .await
        .map_err(|e| TrackerError::Io(std::io::Error::other(e)))??;

    tracing::info!(
        processed = summary.processed,
        rejected = summary.rejected,
        written,
        "服务退出"
    );
    Ok(())
}
