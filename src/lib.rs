//! 蓝牙 RSSI 室内跟踪
//!
//! 移动节点周期性上报三个最强信标的 RSSI 以及步数和朝向，
//! 服务端据此完成：
//! - 三边定位并用航位推算修正位置
//! - 最近邻区域分类
//! - 节点间的区域冲突和距离冲突告警

pub mod algorithms;
pub mod config;
pub mod dataset;
pub mod error;
pub mod events;
pub mod positioning;
pub mod proximity;
pub mod report;
pub mod stream;
pub mod tracking;

pub use config::{ConfigError, TrackerConfig};
pub use error::{Result, TrackerError};
pub use events::TrackerEvent;
pub use positioning::{CycleOutcome, PositionEngine, PositionStatus, ZoneStatus};
pub use proximity::{ExemptionGroups, ProximityMonitor};
pub use report::{ReportError, RssiReport};
pub use stream::{run_report_stream, SharedEngine, StreamSummary};
pub use tracking::{EntityId, TrackPhase, TrackState};
