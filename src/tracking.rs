/// 每个移动节点的跟踪状态

use crate::algorithms::{Point2, Zone};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// 移动节点编号
pub type EntityId = u32;

/// 跟踪阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackPhase {
    /// 尚未有有效定位，位置为默认值
    Uninitialized,
    /// 至少提交过一次定位
    Tracking,
}

/// 单个节点的状态，首次报告时创建，进程内不销毁
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackState {
    pub entity_id: EntityId,
    /// 当前位置（三边定位 + 航位推算）
    pub position: Point2,
    pub phase: TrackPhase,
    /// 当前区域（分类器输出）
    pub zone: Option<Zone>,
    /// 最近一次报告时间
    pub last_report: Option<DateTime<Utc>>,
}

impl TrackState {
    /// 以默认位置创建
    pub fn new(entity_id: EntityId, default_position: Point2) -> Self {
        TrackState {
            entity_id,
            position: default_position,
            phase: TrackPhase::Uninitialized,
            zone: None,
            last_report: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.phase == TrackPhase::Tracking
    }

    /// 当前区域坐标
    pub fn zone_coordinate(&self) -> Option<Point2> {
        self.zone.map(|z| z.coordinate)
    }

    /// 提交新位置（总是覆盖，无序号检查）
    pub fn commit_position(&mut self, position: Point2) {
        self.position = position;
        self.phase = TrackPhase::Tracking;
    }

    /// 提交区域，只有坐标按值变化时才更新并返回 true
    pub fn commit_zone(&mut self, zone: Zone) -> bool {
        if self.zone_coordinate() == Some(zone.coordinate) {
            return false;
        }
        self.zone = Some(zone);
        true
    }
}

/// 节点编号 -> 状态，按编号有序
#[derive(Clone, Debug, Default)]
pub struct TrackTable {
    tracks: BTreeMap<EntityId, TrackState>,
}

impl TrackTable {
    pub fn new() -> Self {
        TrackTable {
            tracks: BTreeMap::new(),
        }
    }

    /// 获取状态，不存在时以默认位置创建
    pub fn entry(&mut self, entity_id: EntityId, default_position: Point2) -> &mut TrackState {
        self.tracks.entry(entity_id).or_insert_with(|| {
            tracing::info!(entity_id, "新节点开始跟踪");
            TrackState::new(entity_id, default_position)
        })
    }

    pub fn get(&self, entity_id: EntityId) -> Option<&TrackState> {
        self.tracks.get(&entity_id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// 按编号升序迭代
    pub fn iter(&self) -> impl Iterator<Item = &TrackState> {
        self.tracks.values()
    }
}
