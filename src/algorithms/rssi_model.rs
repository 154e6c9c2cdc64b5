/// RSSI 到距离转换模型
///
/// 对数距离路径损耗模型，参数来自部署配置

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 1 米处的默认参考功率 (dBm)
pub const DEFAULT_MEASURED_POWER: f64 = -59.0;

/// 默认路径损耗指数（室内有遮挡）
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 4.0;

/// 对数距离路径损耗模型
///
/// 公式: RSSI(d) = P0 - 10 * n * log10(d)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalModel {
    /// 1 米处的参考功率 P0 (dBm)
    pub measured_power: f64,
    /// 路径损耗指数 n
    pub path_loss_exponent: f64,
}

impl SignalModel {
    /// 创建模型
    pub fn new(measured_power: f64, path_loss_exponent: f64) -> Self {
        SignalModel {
            measured_power,
            path_loss_exponent,
        }
    }

    /// 根据 RSSI 计算距离
    ///
    /// 反解: d = 10^((P0 - RSSI) / (10 * n))
    pub fn distance(&self, rssi: f64) -> f64 {
        let exponent = (self.measured_power - rssi) / (10.0 * self.path_loss_exponent);
        10_f64.powf(exponent)
    }

    /// 根据距离计算期望 RSSI
    pub fn rssi_at(&self, distance: f64) -> f64 {
        if distance <= 0.0 {
            return f64::INFINITY;
        }
        self.measured_power - 10.0 * self.path_loss_exponent * distance.log10()
    }

    /// 验证模型参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.measured_power.is_finite() {
            return Err(ConfigError::InvalidParameter {
                parameter: "signal_model.measured_power".to_string(),
                value: self.measured_power.to_string(),
                reason: "参考功率必须是有限值".to_string(),
            });
        }
        if !(self.path_loss_exponent.is_finite() && self.path_loss_exponent > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "signal_model.path_loss_exponent".to_string(),
                value: self.path_loss_exponent.to_string(),
                reason: "路径损耗指数必须为正数".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SignalModel {
    fn default() -> Self {
        SignalModel::new(DEFAULT_MEASURED_POWER, DEFAULT_PATH_LOSS_EXPONENT)
    }
}

impl fmt::Display for SignalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "路径损耗模型 - P0={:.2} dBm, n={:.2}",
            self.measured_power, self.path_loss_exponent
        )
    }
}
