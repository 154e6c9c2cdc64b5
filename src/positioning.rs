/// 室内定位引擎
///
/// 每条报告依次经过：
/// - RSSI 转距离、三边定位、航位推算（位置路径）
/// - 区域分类（区域路径，与位置路径互不影响）
/// - 接近检测

use crate::algorithms::{
    AnchorTable, MapBounds, MotionIntegrator, Point2, PositionFix, RangedAnchor, SignalModel,
    Trilateration, UndeterminedReason, Zone, ZoneClassifier, ZoneError,
};
use crate::config::TrackerConfig;
use crate::events::TrackerEvent;
use crate::proximity::{ExemptionGroups, ProximityMonitor};
use crate::report::RssiReport;
use crate::tracking::{EntityId, TrackState, TrackTable};
use chrono::{DateTime, Utc};

/// 本周期位置路径的结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PositionStatus {
    /// 已提交新位置（航位推算之后）
    Updated(Point2),
    /// 无法定位，沿用旧位置
    Undetermined(UndeterminedReason),
    /// 定位结果超出地图，被丢弃
    OutOfBounds(Point2),
}

/// 本周期区域路径的结果
#[derive(Clone, Debug, PartialEq)]
pub enum ZoneStatus {
    /// 区域变化并已提交
    Changed(Zone),
    /// 与上次相同，不产生事件
    Unchanged(Zone),
    /// 分类失败，沿用旧区域
    Unavailable(ZoneError),
}

/// 单条报告的处理结果
#[derive(Clone, Debug, PartialEq)]
pub struct CycleOutcome {
    pub entity_id: EntityId,
    pub position: PositionStatus,
    pub zone: ZoneStatus,
    /// 按产生顺序：位置更新、区域更新、告警
    pub events: Vec<TrackerEvent>,
}

impl CycleOutcome {
    /// 本周期产生的告警
    pub fn alerts(&self) -> impl Iterator<Item = &TrackerEvent> {
        self.events.iter().filter(|e| e.is_alert())
    }
}

/// 定位引擎，独占所有节点状态
pub struct PositionEngine {
    anchors: AnchorTable,
    signal_model: SignalModel,
    motion: MotionIntegrator,
    bounds: MapBounds,
    default_position: Point2,
    classifier: ZoneClassifier,
    monitor: ProximityMonitor,
    tracks: TrackTable,
}

impl PositionEngine {
    /// 由配置、分类器和豁免组创建
    pub fn new(
        config: &TrackerConfig,
        classifier: ZoneClassifier,
        exemptions: ExemptionGroups,
    ) -> Self {
        let monitor = ProximityMonitor::new(config.proximity_threshold, exemptions);
        tracing::info!(
            anchors = config.anchors.len(),
            zones = classifier.coordinates().len(),
            exemption_groups = monitor.exemptions().len(),
            threshold = monitor.threshold,
            model = %config.signal_model,
            "定位引擎初始化"
        );

        PositionEngine {
            anchors: config.anchor_table(),
            signal_model: config.signal_model,
            motion: config.motion_integrator(),
            bounds: config.bounds,
            default_position: config.default_position,
            classifier,
            monitor,
            tracks: TrackTable::new(),
        }
    }

    /// 处理一条报告，告警时间戳取当前时间
    pub fn process(&mut self, report: &RssiReport) -> CycleOutcome {
        self.process_at(report, Utc::now())
    }

    /// 处理一条报告
    pub fn process_at(&mut self, report: &RssiReport, now: DateTime<Utc>) -> CycleOutcome {
        let entity_id = report.entity_id;
        let mut events = Vec::new();

        // 1-3. 位置路径
        let ranged = Trilateration::ranged(&self.anchors, report.pairs(), &self.signal_model);
        let position = self.position_path(report, &ranged, now, &mut events);

        // 4. 区域路径
        let zone = self.zone_path(report, &mut events);

        // 5. 接近检测
        let alerts = self.monitor.check(self.tracks.iter(), now);
        for alert in &alerts {
            tracing::warn!(event = %alert, "接近告警");
        }
        events.extend(alerts);

        CycleOutcome {
            entity_id,
            position,
            zone,
            events,
        }
    }

    fn position_path(
        &mut self,
        report: &RssiReport,
        ranged: &[RangedAnchor],
        now: DateTime<Utc>,
        events: &mut Vec<TrackerEvent>,
    ) -> PositionStatus {
        let entity_id = report.entity_id;
        let track = self.tracks.entry(entity_id, self.default_position);
        track.last_report = Some(now);

        let point = match Trilateration::solve(ranged) {
            PositionFix::Determined(point) => point,
            PositionFix::Undetermined(reason) => {
                tracing::debug!(entity_id, reason = ?reason, "本周期无法定位");
                return PositionStatus::Undetermined(reason);
            }
        };

        if !self.bounds.contains(&point) {
            tracing::debug!(entity_id, fix = %point, "定位结果超出地图，已丢弃");
            return PositionStatus::OutOfBounds(point);
        }

        let corrected = self.motion.integrate(point, report.steps, report.heading);
        track.commit_position(corrected);
        tracing::debug!(
            entity_id,
            fix = %point,
            residual = Trilateration::residual_error(ranged, &point),
            position = %corrected,
            steps = report.steps,
            heading = %report.heading,
            "位置已更新"
        );
        events.push(TrackerEvent::PositionUpdated {
            entity_id,
            coordinate: corrected,
        });
        PositionStatus::Updated(corrected)
    }

    fn zone_path(&mut self, report: &RssiReport, events: &mut Vec<TrackerEvent>) -> ZoneStatus {
        let entity_id = report.entity_id;
        let zone = match self.classifier.classify(&report.features()) {
            Ok(zone) => zone,
            Err(e) => {
                tracing::debug!(entity_id, error = %e, "区域分类跳过");
                return ZoneStatus::Unavailable(e);
            }
        };

        let track = self.tracks.entry(entity_id, self.default_position);
        if !track.commit_zone(zone) {
            return ZoneStatus::Unchanged(zone);
        }

        tracing::debug!(entity_id, zone_id = zone.id, coordinate = %zone.coordinate, "区域已更新");
        events.push(TrackerEvent::ZoneUpdated {
            entity_id,
            zone_id: zone.id,
            coordinate: zone.coordinate,
        });
        ZoneStatus::Changed(zone)
    }

    /// 节点状态
    pub fn track(&self, entity_id: EntityId) -> Option<&TrackState> {
        self.tracks.get(entity_id)
    }

    /// 按编号排序的状态快照
    pub fn snapshot(&self) -> Vec<TrackState> {
        self.tracks.iter().cloned().collect()
    }

    /// 已跟踪的节点数
    pub fn tracked_count(&self) -> usize {
        self.tracks.len()
    }
}
