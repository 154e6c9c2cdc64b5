/// 接近检测
///
/// 两两比较所有节点，同一豁免组内的节点对（例如同一家庭）不告警

use crate::config::ConfigError;
use crate::events::TrackerEvent;
use crate::tracking::{EntityId, TrackState};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// 豁免组集合：同组节点允许靠近
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExemptionGroups {
    groups: Vec<BTreeSet<EntityId>>,
}

impl ExemptionGroups {
    pub fn new() -> Self {
        ExemptionGroups { groups: Vec::new() }
    }

    pub fn from_groups<I, G>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: IntoIterator<Item = EntityId>,
    {
        ExemptionGroups {
            groups: groups
                .into_iter()
                .map(|g| g.into_iter().collect::<BTreeSet<_>>())
                .filter(|g| !g.is_empty())
                .collect(),
        }
    }

    /// 解析分隔列表：每行一组，逗号/分号/空白分隔，忽略空行和 # 注释
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let separator = Regex::new(r"[,;\s]+").map_err(|e| ConfigError::Serialization {
            message: e.to_string(),
        })?;

        let mut groups = Vec::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let group = separator
                .split(line)
                .filter(|token| !token.is_empty())
                .map(|token| token.parse::<EntityId>())
                .collect::<Result<BTreeSet<_>, _>>()
                .map_err(|_| ConfigError::MalformedExemption {
                    line: index + 1,
                    content: raw.to_string(),
                })?;
            groups.push(group);
        }

        Ok(ExemptionGroups { groups })
    }

    /// 从文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("读取豁免组文件 '{}' 失败: {}", path_str, e),
        })?;
        let groups = Self::parse(&content)?;
        tracing::info!(path = %path_str, groups = groups.len(), "豁免组已加载");
        Ok(groups)
    }

    /// 合并另一组集合
    pub fn extend(&mut self, other: ExemptionGroups) {
        self.groups.extend(other.groups);
    }

    /// 两个节点是否同属某个豁免组
    pub fn are_exempt(&self, a: EntityId, b: EntityId) -> bool {
        self.groups
            .iter()
            .any(|g| g.contains(&a) && g.contains(&b))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// 接近监视器
#[derive(Clone, Debug)]
pub struct ProximityMonitor {
    /// 距离告警阈值
    pub threshold: f64,
    exemptions: ExemptionGroups,
}

impl ProximityMonitor {
    pub fn new(threshold: f64, exemptions: ExemptionGroups) -> Self {
        ProximityMonitor {
            threshold,
            exemptions,
        }
    }

    pub fn exemptions(&self) -> &ExemptionGroups {
        &self.exemptions
    }

    /// 检查所有节点对
    ///
    /// 区域坐标完全相等时触发区域告警；两节点都已定位且距离小于阈值时触发距离告警。
    /// 两种告警可同时触发。节点对按编号升序输出，编号小的在前。
    pub fn check<'a>(
        &self,
        states: impl IntoIterator<Item = &'a TrackState>,
        timestamp: DateTime<Utc>,
    ) -> Vec<TrackerEvent> {
        let mut states: Vec<&TrackState> = states.into_iter().collect();
        states.sort_by_key(|s| s.entity_id);

        let mut alerts = Vec::new();
        for (i, a) in states.iter().enumerate() {
            for b in &states[i + 1..] {
                if a.entity_id == b.entity_id
                    || self.exemptions.are_exempt(a.entity_id, b.entity_id)
                {
                    continue;
                }

                if let (Some(za), Some(zb)) = (a.zone_coordinate(), b.zone_coordinate()) {
                    if za == zb {
                        alerts.push(TrackerEvent::ZoneCollisionAlert {
                            entity_a: a.entity_id,
                            entity_b: b.entity_id,
                            timestamp,
                        });
                    }
                }

                if a.is_tracking()
                    && b.is_tracking()
                    && a.position.distance_to(&b.position) < self.threshold
                {
                    alerts.push(TrackerEvent::PositionCollisionAlert {
                        entity_a: a.entity_id,
                        entity_b: b.entity_id,
                        timestamp,
                    });
                }
            }
        }

        alerts
    }
}
