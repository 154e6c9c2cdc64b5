/// 部署配置
///
/// 启动时加载一次，之后只读。缺省值即参考部署。

use crate::algorithms::{
    Anchor, AnchorTable, MapBounds, MotionIntegrator, Point2, SignalModel, Zone, ZoneCoordinates,
    ZoneId, DEFAULT_STEP_LENGTH, reference_anchors, reference_zones,
};
use crate::proximity::ExemptionGroups;
use crate::tracking::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 参考部署的接近告警阈值
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 2.0;

/// 配置错误（启动时致命）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// 参数取值非法
    #[error("参数 {parameter} 的值 {value} 非法: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// 文件读写失败
    #[error("配置文件读写失败: {message}")]
    Io { message: String },

    /// JSON 解析失败
    #[error("配置解析失败: {message}")]
    Serialization { message: String },

    /// 信标标签重复
    #[error("信标 '{label}' 重复定义")]
    DuplicateAnchor { label: String },

    /// 区域编号重复
    #[error("区域 {zone_id} 重复定义")]
    DuplicateZone { zone_id: ZoneId },

    /// 区域编号没有坐标
    #[error("区域 {zone_id} 没有配置坐标")]
    UnknownZone { zone_id: ZoneId },

    /// 豁免组列表中无法解析的行
    #[error("豁免组第 {line} 行无法解析: '{content}'")]
    MalformedExemption { line: usize, content: String },
}

/// 系统配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// 固定信标表
    pub anchors: Vec<Anchor>,
    /// 区域坐标表
    pub zones: Vec<Zone>,
    /// 地图边界，超出的定位结果被丢弃
    pub bounds: MapBounds,
    /// 首次定位前的默认位置
    pub default_position: Point2,
    /// 接近告警阈值
    pub proximity_threshold: f64,
    /// RSSI 转距离模型
    pub signal_model: SignalModel,
    /// 航位推算步长
    pub step_length: f64,
    /// 区域模型文件
    pub classifier_path: Option<PathBuf>,
    /// 豁免组列表文件（每行一组）
    pub exemptions_path: Option<PathBuf>,
    /// 内联豁免组
    pub exemptions: Vec<Vec<EntityId>>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            anchors: reference_anchors(),
            zones: reference_zones(),
            bounds: MapBounds::default(),
            default_position: Point2::new(13.5, 7.5),
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            signal_model: SignalModel::default(),
            step_length: DEFAULT_STEP_LENGTH,
            classifier_path: None,
            exemptions_path: None,
            exemptions: Vec::new(),
        }
    }
}

impl TrackerConfig {
    /// 创建配置构建器
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }

    /// 从 JSON 字符串加载并校验
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Serialization {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载并校验
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("读取 '{}' 失败: {}", path_str, e),
        })?;
        Self::from_json_str(&content).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::Serialization {
                message: format!("'{}': {}", path_str, message),
            },
            other => other,
        })
    }

    /// 校验所有参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.signal_model.validate()?;

        if !self.bounds.is_valid() {
            return Err(ConfigError::InvalidParameter {
                parameter: "bounds".to_string(),
                value: format!("{:?}", self.bounds),
                reason: "边界必须有限且 min < max".to_string(),
            });
        }
        if !(self.proximity_threshold.is_finite() && self.proximity_threshold > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "proximity_threshold".to_string(),
                value: self.proximity_threshold.to_string(),
                reason: "阈值必须为正数".to_string(),
            });
        }
        if !(self.step_length.is_finite() && self.step_length >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "step_length".to_string(),
                value: self.step_length.to_string(),
                reason: "步长必须为非负数".to_string(),
            });
        }
        if !self.default_position.is_finite() {
            return Err(ConfigError::InvalidParameter {
                parameter: "default_position".to_string(),
                value: self.default_position.to_string(),
                reason: "默认位置必须是有限值".to_string(),
            });
        }

        let mut labels = BTreeSet::new();
        for anchor in &self.anchors {
            if !anchor.position().is_finite() {
                return Err(ConfigError::InvalidParameter {
                    parameter: format!("anchors.{}", anchor.label),
                    value: anchor.position().to_string(),
                    reason: "信标坐标必须是有限值".to_string(),
                });
            }
            if !labels.insert(anchor.label.as_str()) {
                return Err(ConfigError::DuplicateAnchor {
                    label: anchor.label.clone(),
                });
            }
        }

        let mut zone_ids = BTreeSet::new();
        for zone in &self.zones {
            if !zone_ids.insert(zone.id) {
                return Err(ConfigError::DuplicateZone { zone_id: zone.id });
            }
            if !zone.coordinate.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    parameter: format!("zones.{}", zone.id),
                    value: zone.coordinate.to_string(),
                    reason: "区域坐标必须是有限值".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn anchor_table(&self) -> AnchorTable {
        AnchorTable::from_vec(self.anchors.clone())
    }

    pub fn zone_coordinates(&self) -> ZoneCoordinates {
        ZoneCoordinates::from_zones(self.zones.iter().copied())
    }

    pub fn motion_integrator(&self) -> MotionIntegrator {
        MotionIntegrator::new(self.step_length)
    }

    /// 合并内联豁免组和豁免组文件
    pub fn exemption_groups(&self) -> Result<ExemptionGroups, ConfigError> {
        let mut groups = ExemptionGroups::from_groups(self.exemptions.iter().cloned());
        if let Some(path) = &self.exemptions_path {
            groups.extend(ExemptionGroups::from_file(path)?);
        }
        Ok(groups)
    }
}

/// TrackerConfig 构建器
#[derive(Debug, Default)]
pub struct TrackerConfigBuilder {
    config: TrackerConfig,
}

impl TrackerConfigBuilder {
    /// 替换信标表
    pub fn anchors(mut self, anchors: Vec<Anchor>) -> Self {
        self.config.anchors = anchors;
        self
    }

    /// 替换区域表
    pub fn zones(mut self, zones: Vec<Zone>) -> Self {
        self.config.zones = zones;
        self
    }

    pub fn bounds(mut self, bounds: MapBounds) -> Self {
        self.config.bounds = bounds;
        self
    }

    pub fn default_position(mut self, position: Point2) -> Self {
        self.config.default_position = position;
        self
    }

    pub fn proximity_threshold(mut self, threshold: f64) -> Self {
        self.config.proximity_threshold = threshold;
        self
    }

    pub fn signal_model(mut self, model: SignalModel) -> Self {
        self.config.signal_model = model;
        self
    }

    pub fn step_length(mut self, step_length: f64) -> Self {
        self.config.step_length = step_length;
        self
    }

    /// 添加一个内联豁免组
    pub fn exemption_group(mut self, group: Vec<EntityId>) -> Self {
        self.config.exemptions.push(group);
        self
    }

    /// 构建并校验
    pub fn build(self) -> Result<TrackerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
