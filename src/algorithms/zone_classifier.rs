/// 区域分类器
///
/// 把三个信标的 RSSI 特征映射为离散区域。模型是离线训练好的最近邻模型，
/// 运行时只加载、不训练；区域编号再通过静态表映射到显示坐标。

use crate::algorithms::Point2;
use crate::config::ConfigError;
use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 区域编号
pub type ZoneId = u32;

/// 特征向量 [b1, b2, b3, b1r, b2r, b3r]
pub type FeatureVector = [f64; 6];

/// 默认近邻数
pub const DEFAULT_NEIGHBORS: usize = 5;

/// 区域分类错误（非致命，本周期跳过区域更新）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    /// 标签无法按历史训练格式编码（必须是单个字符）
    #[error("信标标签 '{0}' 无法编码为特征")]
    UnencodableLabel(String),

    /// 模型没有给出预测
    #[error("模型未给出预测")]
    NoPrediction,

    /// 区域编号不在坐标表中
    #[error("区域 {0} 没有对应坐标")]
    UnknownZone(ZoneId),
}

/// 区域及其显示坐标
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub coordinate: Point2,
}

impl Zone {
    pub fn new(id: ZoneId, coordinate: Point2) -> Self {
        Zone { id, coordinate }
    }
}

/// 区域编号 -> 显示坐标
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneCoordinates {
    zones: BTreeMap<ZoneId, Point2>,
}

impl ZoneCoordinates {
    pub fn new() -> Self {
        ZoneCoordinates {
            zones: BTreeMap::new(),
        }
    }

    pub fn from_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        let mut table = ZoneCoordinates::new();
        for zone in zones {
            table.insert(zone);
        }
        table
    }

    /// 参考部署的 8 个区域
    pub fn reference_deployment() -> Self {
        ZoneCoordinates::from_zones(reference_zones())
    }

    pub fn insert(&mut self, zone: Zone) {
        self.zones.insert(zone.id, zone.coordinate);
    }

    /// 查找区域
    pub fn get(&self, id: ZoneId) -> Option<Zone> {
        self.zones.get(&id).map(|&coordinate| Zone::new(id, coordinate))
    }

    pub fn contains(&self, id: ZoneId) -> bool {
        self.zones.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Zone> + '_ {
        self.zones.iter().map(|(&id, &coordinate)| Zone::new(id, coordinate))
    }
}

/// 参考部署的区域坐标
pub fn reference_zones() -> Vec<Zone> {
    vec![
        Zone::new(1, Point2::new(5.0, 8.4)),
        Zone::new(2, Point2::new(9.0, 8.5)),
        Zone::new(3, Point2::new(12.0, 9.0)),
        Zone::new(4, Point2::new(18.0, 8.5)),
        Zone::new(5, Point2::new(23.0, 8.7)),
        Zone::new(6, Point2::new(26.0, 8.6)),
        Zone::new(7, Point2::new(29.0, 8.7)),
        Zone::new(8, Point2::new(35.0, 9.6)),
    ]
}

/// 标签按字符编码（与历史训练数据一致）
pub fn encode_label(label: &str) -> std::result::Result<f64, ZoneError> {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c as u32 as f64),
        _ => Err(ZoneError::UnencodableLabel(label.to_string())),
    }
}

/// 分类输入：三个信标标签和三个信号强度
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneFeatures {
    pub labels: [String; 3],
    pub strengths: [f64; 3],
}

impl ZoneFeatures {
    pub fn new(labels: [String; 3], strengths: [f64; 3]) -> Self {
        ZoneFeatures { labels, strengths }
    }

    /// 编码为 6 维特征向量
    pub fn encode(&self) -> std::result::Result<FeatureVector, ZoneError> {
        let b1 = encode_label(&self.labels[0])?;
        let b2 = encode_label(&self.labels[1])?;
        let b3 = encode_label(&self.labels[2])?;
        let [r1, r2, r3] = self.strengths;
        Ok([b1, b2, b3, r1, r2, r3])
    }
}

/// 冻结的区域模型
pub trait ZoneModel: Send + Sync {
    /// 预测区域编号
    fn predict(&self, features: &FeatureVector) -> Option<ZoneId>;

    /// 模型可能输出的全部区域
    fn zones(&self) -> BTreeSet<ZoneId>;
}

/// 带标签的训练样本
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub zone: ZoneId,
    pub features: FeatureVector,
}

/// k 近邻模型（欧氏距离、多数表决，平票取编号最小的区域）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnnZoneModel {
    #[serde(default = "default_neighbors")]
    pub k: usize,
    pub samples: Vec<LabeledSample>,
}

fn default_neighbors() -> usize {
    DEFAULT_NEIGHBORS
}

impl KnnZoneModel {
    /// 从样本构建并校验
    pub fn from_samples(k: usize, samples: Vec<LabeledSample>) -> Result<Self> {
        let model = KnnZoneModel { k, samples };
        model.check()?;
        Ok(model)
    }

    /// 从 JSON 字符串加载
    pub fn from_json_str(content: &str) -> Result<Self> {
        let model: KnnZoneModel = serde_json::from_str(content)
            .map_err(|e| TrackerError::ClassifierUnavailable(format!("模型解析失败: {}", e)))?;
        model.check()?;
        Ok(model)
    }

    /// 从模型文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = fs::read_to_string(&path).map_err(|e| {
            TrackerError::ClassifierUnavailable(format!("读取模型文件 '{}' 失败: {}", path_str, e))
        })?;
        let model = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path_str,
            k = model.k,
            samples = model.samples.len(),
            "区域模型已加载"
        );
        Ok(model)
    }

    /// 导出为 JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TrackerError::ClassifierUnavailable(format!("模型序列化失败: {}", e)))
    }

    fn check(&self) -> Result<()> {
        if self.k == 0 {
            return Err(TrackerError::ClassifierUnavailable("k 必须至少为 1".to_string()));
        }
        if self.samples.is_empty() {
            return Err(TrackerError::ClassifierUnavailable("模型没有样本".to_string()));
        }
        if let Some(sample) = self
            .samples
            .iter()
            .find(|s| s.features.iter().any(|v| !v.is_finite()))
        {
            return Err(TrackerError::ClassifierUnavailable(format!(
                "区域 {} 的样本包含非有限特征",
                sample.zone
            )));
        }
        Ok(())
    }
}

impl ZoneModel for KnnZoneModel {
    fn predict(&self, features: &FeatureVector) -> Option<ZoneId> {
        let mut neighbors: Vec<(f64, ZoneId)> = self
            .samples
            .iter()
            .map(|sample| (squared_distance(&sample.features, features), sample.zone))
            .collect();
        neighbors.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut votes: BTreeMap<ZoneId, usize> = BTreeMap::new();
        for (_, zone) in neighbors.iter().take(self.k) {
            *votes.entry(*zone).or_insert(0) += 1;
        }

        // 升序遍历，只有票数严格更多才替换，平票保留编号小的
        let mut best: Option<(ZoneId, usize)> = None;
        for (zone, count) in votes {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((zone, count)),
            }
        }
        best.map(|(zone, _)| zone)
    }

    fn zones(&self) -> BTreeSet<ZoneId> {
        self.samples.iter().map(|s| s.zone).collect()
    }
}

fn squared_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// 区域分类器：冻结模型 + 区域坐标表
pub struct ZoneClassifier {
    model: Box<dyn ZoneModel>,
    coordinates: ZoneCoordinates,
}

impl ZoneClassifier {
    /// 组装分类器，模型输出的每个区域都必须有坐标
    pub fn new(
        model: Box<dyn ZoneModel>,
        coordinates: ZoneCoordinates,
    ) -> std::result::Result<Self, ConfigError> {
        if let Some(missing) = model.zones().into_iter().find(|id| !coordinates.contains(*id)) {
            return Err(ConfigError::UnknownZone { zone_id: missing });
        }
        Ok(ZoneClassifier { model, coordinates })
    }

    /// 分类
    pub fn classify(&self, features: &ZoneFeatures) -> std::result::Result<Zone, ZoneError> {
        let vector = features.encode()?;
        let id = self.model.predict(&vector).ok_or(ZoneError::NoPrediction)?;
        self.coordinates.get(id).ok_or(ZoneError::UnknownZone(id))
    }

    pub fn coordinates(&self) -> &ZoneCoordinates {
        &self.coordinates
    }
}
