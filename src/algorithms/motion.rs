/// 航位推算：按步数和朝向修正三边定位结果

use crate::algorithms::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 默认步长
pub const DEFAULT_STEP_LENGTH: f64 = 1.2;

/// 移动节点上报的朝向（编码 0-3）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    /// +Y
    North,
    /// +X
    East,
    /// -Y
    South,
    /// -X
    West,
}

impl Heading {
    /// 从上报编码解析
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Heading::North),
            1 => Some(Heading::East),
            2 => Some(Heading::South),
            3 => Some(Heading::West),
            _ => None,
        }
    }

    /// 上报编码
    pub fn code(&self) -> u8 {
        match self {
            Heading::North => 0,
            Heading::East => 1,
            Heading::South => 2,
            Heading::West => 3,
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Heading::North => "北",
            Heading::East => "东",
            Heading::South => "南",
            Heading::West => "西",
        };
        write!(f, "{}", name)
    }
}

/// 航位推算器
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionIntegrator {
    /// 每步移动距离
    pub step_length: f64,
}

impl MotionIntegrator {
    pub fn new(step_length: f64) -> Self {
        MotionIntegrator { step_length }
    }

    /// 沿朝向移动 steps 步，不做边界裁剪
    pub fn integrate(&self, base: Point2, steps: u32, heading: Heading) -> Point2 {
        if steps == 0 {
            return base;
        }

        let offset = self.step_length * steps as f64;
        match heading {
            Heading::North => Point2::new(base.x, base.y + offset),
            Heading::East => Point2::new(base.x + offset, base.y),
            Heading::South => Point2::new(base.x, base.y - offset),
            Heading::West => Point2::new(base.x - offset, base.y),
        }
    }
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        MotionIntegrator::new(DEFAULT_STEP_LENGTH)
    }
}
