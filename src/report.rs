/// 上行 RSSI 报告解码
///
/// 报告格式:
/// {"mobile_id": 1, "b1": "A", "b1r": -60.0, "b2": "E", "b2r": -71.0,
///  "b3": "F", "b3r": -80.0, "speed": 2, "direction": 1}

use crate::algorithms::{Heading, ZoneFeatures};
use crate::tracking::EntityId;
use serde::Deserialize;
use thiserror::Error;

/// 报告解析错误，报告被丢弃
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON 格式错误或缺少字段
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 字段取值非法
    #[error("字段 {field} 非法: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
struct RawReport {
    mobile_id: i64,
    b1: String,
    b1r: f64,
    b2: String,
    b2r: f64,
    b3: String,
    b3r: f64,
    speed: i64,
    direction: i64,
}

/// 单个信标读数
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorReading {
    pub label: String,
    /// 信号强度 (dBm)
    pub rssi: f64,
}

impl AnchorReading {
    pub fn new(label: impl Into<String>, rssi: f64) -> Self {
        AnchorReading {
            label: label.into(),
            rssi,
        }
    }
}

/// 已解码的报告，按接收顺序保留三个读数
#[derive(Clone, Debug, PartialEq)]
pub struct RssiReport {
    pub entity_id: EntityId,
    pub readings: [AnchorReading; 3],
    /// 自上次报告以来的步数
    pub steps: u32,
    pub heading: Heading,
}

impl RssiReport {
    pub fn new(
        entity_id: EntityId,
        readings: [AnchorReading; 3],
        steps: u32,
        heading: Heading,
    ) -> Self {
        RssiReport {
            entity_id,
            readings,
            steps,
            heading,
        }
    }

    /// 解码一行 JSON 报告
    pub fn from_json(line: &str) -> Result<Self, ReportError> {
        let raw: RawReport = serde_json::from_str(line.trim())?;
        Self::from_raw(raw)
    }

    /// (标签, RSSI) 迭代
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> {
        self.readings.iter().map(|r| (r.label.as_str(), r.rssi))
    }

    /// 分类器输入
    pub fn features(&self) -> ZoneFeatures {
        ZoneFeatures::new(
            self.readings.clone().map(|r| r.label),
            [
                self.readings[0].rssi,
                self.readings[1].rssi,
                self.readings[2].rssi,
            ],
        )
    }

    fn from_raw(raw: RawReport) -> Result<Self, ReportError> {
        let entity_id = EntityId::try_from(raw.mobile_id).map_err(|_| ReportError::InvalidField {
            field: "mobile_id",
            reason: format!("{} 超出范围", raw.mobile_id),
        })?;
        let steps = u32::try_from(raw.speed).map_err(|_| ReportError::InvalidField {
            field: "speed",
            reason: format!("步数 {} 必须为非负整数", raw.speed),
        })?;
        let heading = Heading::from_code(raw.direction).ok_or_else(|| ReportError::InvalidField {
            field: "direction",
            reason: format!("朝向 {} 不在 0..3 内", raw.direction),
        })?;

        let readings = [
            reading("b1", raw.b1, raw.b1r)?,
            reading("b2", raw.b2, raw.b2r)?,
            reading("b3", raw.b3, raw.b3r)?,
        ];

        Ok(RssiReport::new(entity_id, readings, steps, heading))
    }
}

fn reading(field: &'static str, label: String, rssi: f64) -> Result<AnchorReading, ReportError> {
    if label.trim().is_empty() {
        return Err(ReportError::InvalidField {
            field,
            reason: "信标标签为空".to_string(),
        });
    }
    if !rssi.is_finite() {
        return Err(ReportError::InvalidField {
            field,
            reason: format!("RSSI {} 不是有限值", rssi),
        });
    }
    Ok(AnchorReading::new(label, rssi))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"mobile_id": 2, "b1": "A", "b1r": -60.5, "b2": "E", "b2r": -71, "b3": "static1", "b3r": -80.0, "speed": 3, "direction": 1}"#;

    #[test]
    fn test_parse_report() {
        let report = RssiReport::from_json(SAMPLE).unwrap();
        assert_eq!(report.entity_id, 2);
        assert_eq!(report.readings[0], AnchorReading::new("A", -60.5));
        assert_eq!(report.readings[1], AnchorReading::new("E", -71.0));
        assert_eq!(report.readings[2].label, "static1");
        assert_eq!(report.steps, 3);
        assert_eq!(report.heading, Heading::East);

        let pairs: Vec<_> = report.pairs().collect();
        assert_eq!(pairs, vec![("A", -60.5), ("E", -71.0), ("static1", -80.0)]);
    }

    #[test]
    fn test_missing_field_rejected() {
        let line = r#"{"mobile_id": 2, "b1": "A", "b1r": -60.5, "b2": "E", "b2r": -71, "b3": "F", "speed": 3, "direction": 1}"#;
        assert!(matches!(RssiReport::from_json(line), Err(ReportError::Json(_))));
        assert!(matches!(RssiReport::from_json("garbage"), Err(ReportError::Json(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_direction = SAMPLE.replace(r#""direction": 1"#, r#""direction": 4"#);
        assert!(matches!(
            RssiReport::from_json(&bad_direction),
            Err(ReportError::InvalidField { field: "direction", .. })
        ));

        let negative_steps = SAMPLE.replace(r#""speed": 3"#, r#""speed": -1"#);
        assert!(matches!(
            RssiReport::from_json(&negative_steps),
            Err(ReportError::InvalidField { field: "speed", .. })
        ));

        let negative_id = SAMPLE.replace(r#""mobile_id": 2"#, r#""mobile_id": -2"#);
        assert!(matches!(
            RssiReport::from_json(&negative_id),
            Err(ReportError::InvalidField { field: "mobile_id", .. })
        ));

        let empty_label = SAMPLE.replace(r#""b2": "E""#, r#""b2": " ""#);
        assert!(matches!(
            RssiReport::from_json(&empty_label),
            Err(ReportError::InvalidField { field: "b2", .. })
        ));
    }

    #[test]
    fn test_features() {
        let report = RssiReport::from_json(SAMPLE).unwrap();
        let features = report.features();
        assert_eq!(features.labels[1], "E");
        assert_eq!(features.strengths, [-60.5, -71.0, -80.0]);
    }
}
