/// 定位算法模块
///
/// 该模块提供室内定位流水线中的纯计算部分：
/// - RSSI 转距离（对数距离路径损耗模型）
/// - 三边定位（线性化最小二乘）
/// - 航位推算修正
/// - 最近邻区域分类

pub mod beacon;
pub mod motion;
pub mod results;
pub mod rssi_model;
pub mod trilateration;
pub mod zone_classifier;

pub use beacon::*;
pub use motion::*;
pub use results::*;
pub use rssi_model::*;
pub use trilateration::*;
pub use zone_classifier::*;
