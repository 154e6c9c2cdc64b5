/// 区域训练数据
///
/// 从按区域归档的报告日志（z1.json ... z8.json，每行一条 JSON 报告）
/// 提取指定节点的特征，写成带标签的 CSV：
/// zone,b1,b2,b3,b1r,b2r,b3r
///
/// 最近邻模型就是带标签的样本本身，读回 CSV 即可组装模型文件。

use crate::algorithms::{KnnZoneModel, LabeledSample, ZoneError, ZoneFeatures, ZoneId};
use crate::error::Result;
use crate::report::RssiReport;
use crate::tracking::EntityId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;

/// CSV 表头
pub const CSV_HEADER: &str = "zone,b1,b2,b3,b1r,b2r,b3r";

/// 训练数据错误
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("读取 '{path}' 失败: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("CSV 读写失败: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV 中的一行，字段名即表头
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    zone: ZoneId,
    b1: String,
    b2: String,
    b3: String,
    b1r: f64,
    b2r: f64,
    b3r: f64,
}

impl From<&LabeledRow> for CsvRow {
    fn from(row: &LabeledRow) -> Self {
        let [b1, b2, b3] = row.labels.clone();
        let [b1r, b2r, b3r] = row.strengths;
        CsvRow {
            zone: row.zone,
            b1,
            b2,
            b3,
            b1r,
            b2r,
            b3r,
        }
    }
}

impl From<CsvRow> for LabeledRow {
    fn from(row: CsvRow) -> Self {
        LabeledRow {
            zone: row.zone,
            labels: [row.b1, row.b2, row.b3],
            strengths: [row.b1r, row.b2r, row.b3r],
        }
    }
}

/// 一行带标签的特征
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledRow {
    pub zone: ZoneId,
    pub labels: [String; 3],
    pub strengths: [f64; 3],
}

impl LabeledRow {
    fn from_report(zone: ZoneId, report: &RssiReport) -> Self {
        let features = report.features();
        LabeledRow {
            zone,
            labels: features.labels,
            strengths: features.strengths,
        }
    }

    /// 转换为模型样本
    pub fn to_sample(&self) -> std::result::Result<LabeledSample, ZoneError> {
        let features = ZoneFeatures::new(self.labels.clone(), self.strengths).encode()?;
        Ok(LabeledSample {
            zone: self.zone,
            features,
        })
    }
}

/// 从单个区域日志中提取指定节点的行，格式错误的行跳过
pub fn extract_rows<R: BufRead>(
    zone: ZoneId,
    reader: R,
    entity_id: EntityId,
) -> io::Result<Vec<LabeledRow>> {
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if !line.starts_with('{') {
            continue;
        }
        match RssiReport::from_json(&line) {
            Ok(report) if report.entity_id == entity_id => {
                rows.push(LabeledRow::from_report(zone, &report));
            }
            Ok(_) => {}
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(zone, skipped, "跳过无法解析的日志行");
    }
    Ok(rows)
}

/// 读取目录下 z{n}.json 日志
pub fn extract_zone_logs<P: AsRef<Path>>(
    dir: P,
    zones: impl IntoIterator<Item = ZoneId>,
    entity_id: EntityId,
) -> Result<Vec<LabeledRow>> {
    let mut rows = Vec::new();
    for zone in zones {
        let path = dir.as_ref().join(format!("z{}.json", zone));
        let file = File::open(&path).map_err(|source| DatasetError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        let zone_rows = extract_rows(zone, BufReader::new(file), entity_id)?;
        tracing::info!(zone, rows = zone_rows.len(), "区域日志已提取");
        rows.extend(zone_rows);
    }
    Ok(rows)
}

/// 写出 CSV，表头为 zone,b1,b2,b3,b1r,b2r,b3r
pub fn write_csv<W: Write>(rows: &[LabeledRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(CsvRow::from(row)).map_err(DatasetError::from)?;
    }
    wtr.flush()?;
    Ok(())
}

/// 读回 CSV
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<LabeledRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.deserialize::<CsvRow>() {
        let record = record.map_err(DatasetError::from)?;
        rows.push(LabeledRow::from(record));
    }
    Ok(rows)
}

/// 用带标签的行组装最近邻模型，无法编码的行跳过
pub fn build_model(k: usize, rows: &[LabeledRow]) -> Result<KnnZoneModel> {
    let mut samples = Vec::with_capacity(rows.len());
    for row in rows {
        match row.to_sample() {
            Ok(sample) => samples.push(sample),
            Err(e) => tracing::warn!(zone = row.zone, error = %e, "样本被跳过"),
        }
    }
    KnnZoneModel::from_samples(k, samples)
}
