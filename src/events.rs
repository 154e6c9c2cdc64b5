/// 下行事件：发送给显示和告警模块

use crate::algorithms::{Point2, ZoneId};
use crate::tracking::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 定位引擎输出的事件
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TrackerEvent {
    /// 三边定位位置更新
    PositionUpdated {
        entity_id: EntityId,
        coordinate: Point2,
    },

    /// 分类区域变化
    ZoneUpdated {
        entity_id: EntityId,
        zone_id: ZoneId,
        coordinate: Point2,
    },

    /// 两节点处于同一区域
    ZoneCollisionAlert {
        entity_a: EntityId,
        entity_b: EntityId,
        timestamp: DateTime<Utc>,
    },

    /// 两节点距离低于阈值
    PositionCollisionAlert {
        entity_a: EntityId,
        entity_b: EntityId,
        timestamp: DateTime<Utc>,
    },
}

impl TrackerEvent {
    /// 事件类型名
    pub fn event_type(&self) -> &'static str {
        match self {
            TrackerEvent::PositionUpdated { .. } => "PositionUpdated",
            TrackerEvent::ZoneUpdated { .. } => "ZoneUpdated",
            TrackerEvent::ZoneCollisionAlert { .. } => "ZoneCollisionAlert",
            TrackerEvent::PositionCollisionAlert { .. } => "PositionCollisionAlert",
        }
    }

    /// 是否为告警
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            TrackerEvent::ZoneCollisionAlert { .. } | TrackerEvent::PositionCollisionAlert { .. }
        )
    }

    /// 告警涉及的节点对
    pub fn pair(&self) -> Option<(EntityId, EntityId)> {
        match self {
            TrackerEvent::ZoneCollisionAlert {
                entity_a, entity_b, ..
            }
            | TrackerEvent::PositionCollisionAlert {
                entity_a, entity_b, ..
            } => Some((*entity_a, *entity_b)),
            _ => None,
        }
    }

    /// 序列化为单行 JSON
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for TrackerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerEvent::PositionUpdated {
                entity_id,
                coordinate,
            } => write!(f, "节点 {} 位置 {}", entity_id, coordinate),
            TrackerEvent::ZoneUpdated {
                entity_id,
                zone_id,
                coordinate,
            } => write!(f, "节点 {} 进入区域 {} {}", entity_id, zone_id, coordinate),
            TrackerEvent::ZoneCollisionAlert {
                entity_a,
                entity_b,
                timestamp,
            } => write!(
                f,
                "区域接近告警: {} <-> {} @ {}",
                entity_a,
                entity_b,
                timestamp.format("%H:%M:%S%.3f")
            ),
            TrackerEvent::PositionCollisionAlert {
                entity_a,
                entity_b,
                timestamp,
            } => write!(
                f,
                "距离接近告警: {} <-> {} @ {}",
                entity_a,
                entity_b,
                timestamp.format("%H:%M:%S%.3f")
            ),
        }
    }
}
