/// 报告流处理
///
/// 上行：按行读取 JSON 报告，串行送入定位引擎
/// 下行：事件通过 mpsc 通道交给输出任务
///
/// 引擎放在 Arc<Mutex<_>> 中，同一时刻只处理一条报告

use crate::error::Result;
use crate::events::TrackerEvent;
use crate::positioning::PositionEngine;
use crate::report::RssiReport;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

/// 共享的定位引擎
pub type SharedEngine = Arc<Mutex<PositionEngine>>;

pub fn shared(engine: PositionEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// 流处理统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// 成功处理的报告
    pub processed: usize,
    /// 解析失败被丢弃的报告
    pub rejected: usize,
    /// 已发出的事件
    pub events: usize,
}

/// 读取报告直到输入结束或事件通道关闭
pub async fn run_report_stream<R>(
    engine: SharedEngine,
    reader: R,
    events: mpsc::Sender<TrackerEvent>,
) -> Result<StreamSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = StreamSummary::default();

    while let Some(raw) = lines.next_line().await? {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let report = match RssiReport::from_json(line) {
            Ok(report) => report,
            Err(e) => {
                summary.rejected += 1;
                tracing::warn!(error = %e, "报告被丢弃");
                continue;
            }
        };

        let outcome = {
            let mut engine = engine.lock().await;
            engine.process(&report)
        };
        summary.processed += 1;

        for event in outcome.events {
            if events.send(event).await.is_err() {
                tracing::info!(processed = summary.processed, "事件通道已关闭，停止读取");
                return Ok(summary);
            }
            summary.events += 1;
        }
    }

    tracing::info!(
        processed = summary.processed,
        rejected = summary.rejected,
        events = summary.events,
        "报告流结束"
    );
    Ok(summary)
}

/// 把事件逐行写成 JSON，直到通道关闭
pub async fn write_events<W>(mut events: mpsc::Receiver<TrackerEvent>, mut writer: W) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(event) = events.recv().await {
        let mut line = event.to_json_line().map_err(std::io::Error::other)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        written += 1;
    }
    Ok(written)
}
