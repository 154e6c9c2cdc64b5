/// 定位结果数据结构
///
/// 平面坐标、三边定位结果以及地图边界

use serde::{Deserialize, Serialize};
use std::fmt;

/// 二维平面坐标（单位与信标配置一致，默认米）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    /// X 坐标
    pub x: f64,
    /// Y 坐标
    pub y: f64,
}

impl Point2 {
    /// 创建新的坐标
    pub const fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }

    /// 获取 (x, y) 元组
    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// 与另一坐标的欧几里得距离
    pub fn distance_to(&self, other: &Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// 两个分量是否都是有限值
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Point2::new(x, y)
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// 无法确定位置的原因
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndeterminedReason {
    /// 报告中坐标已知的信标少于 3 个
    InsufficientAnchors,
    /// 线性方程组奇异或病态（例如三个信标共线）
    DegenerateSolve,
}

impl fmt::Display for UndeterminedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndeterminedReason::InsufficientAnchors => write!(f, "已知信标不足"),
            UndeterminedReason::DegenerateSolve => write!(f, "方程组退化"),
        }
    }
}

/// 三边定位结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PositionFix {
    /// 已求得位置
    Determined(Point2),
    /// 本周期无法定位
    Undetermined(UndeterminedReason),
}

impl PositionFix {
    /// 是否求得位置
    pub fn is_determined(&self) -> bool {
        matches!(self, PositionFix::Determined(_))
    }

    /// 获取坐标（未定位时为 None）
    pub fn point(&self) -> Option<Point2> {
        match self {
            PositionFix::Determined(p) => Some(*p),
            PositionFix::Undetermined(_) => None,
        }
    }
}

impl fmt::Display for PositionFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionFix::Determined(p) => write!(f, "{}", p),
            PositionFix::Undetermined(reason) => write!(f, "未定位 [{}]", reason),
        }
    }
}

/// 地图边界（闭区间）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl MapBounds {
    /// 创建矩形边界
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        MapBounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// 坐标是否落在地图内
    pub fn contains(&self, point: &Point2) -> bool {
        point.is_finite()
            && point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// 边界是否非空
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        // 参考部署的楼层平面图：50 x 35
        MapBounds::new(0.0, 0.0, 50.0, 35.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_position_fix_point() {
        let fix = PositionFix::Determined(Point2::new(1.0, 2.0));
        assert!(fix.is_determined());
        assert_eq!(fix.point(), Some(Point2::new(1.0, 2.0)));

        let none = PositionFix::Undetermined(UndeterminedReason::DegenerateSolve);
        assert!(!none.is_determined());
        assert_eq!(none.point(), None);
    }

    #[test]
    fn test_map_bounds() {
        let bounds = MapBounds::default();
        assert!(bounds.contains(&Point2::new(0.0, 0.0)));
        assert!(bounds.contains(&Point2::new(50.0, 35.0)));
        assert!(!bounds.contains(&Point2::new(-0.1, 10.0)));
        assert!(!bounds.contains(&Point2::new(10.0, 35.5)));
        assert!(!bounds.contains(&Point2::new(f64::NAN, 1.0)));
        assert!(bounds.is_valid());
        assert!(!MapBounds::new(5.0, 0.0, 5.0, 1.0).is_valid());
    }
}
