/// 三边定位
///
/// 以第三个信标为基准，对圆方程两两相减得到 2x2 线性方程组，
/// 用 SVD 最小二乘求解

use crate::algorithms::{AnchorTable, PositionFix, Point2, SignalModel, UndeterminedReason};
use nalgebra::{Matrix2, Vector2};

/// 最小/最大奇异值之比低于此值视为退化
pub const DEGENERATE_TOLERANCE: f64 = 1e-9;

/// 带距离估计的信标
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangedAnchor {
    /// 信标坐标
    pub position: Point2,
    /// 估计距离
    pub distance: f64,
}

impl RangedAnchor {
    pub fn new(position: Point2, distance: f64) -> Self {
        RangedAnchor { position, distance }
    }
}

/// 三边定位求解器
pub struct Trilateration;

impl Trilateration {
    /// 把 (信标, RSSI) 读数转换为带距离的信标
    ///
    /// 未知标签的读数被丢弃，每个距离始终与自己的信标配对
    pub fn ranged<'a>(
        anchors: &AnchorTable,
        readings: impl IntoIterator<Item = (&'a str, f64)>,
        model: &SignalModel,
    ) -> Vec<RangedAnchor> {
        readings
            .into_iter()
            .filter_map(|(label, rssi)| {
                let position = anchors.locate(label)?;
                Some(RangedAnchor::new(position, model.distance(rssi)))
            })
            .collect()
    }

    /// 使用前三个信标求解
    pub fn solve(anchors: &[RangedAnchor]) -> PositionFix {
        if anchors.len() < 3 {
            return PositionFix::Undetermined(UndeterminedReason::InsufficientAnchors);
        }

        let (a, b) = Self::linear_system(&anchors[..3]);
        if !(a.iter().all(|v| v.is_finite()) && b.iter().all(|v| v.is_finite())) {
            return PositionFix::Undetermined(UndeterminedReason::DegenerateSolve);
        }

        let svd = a.svd(true, true);
        let max = svd.singular_values.max();
        let min = svd.singular_values.min();
        if !(max > 0.0) || min / max < DEGENERATE_TOLERANCE {
            return PositionFix::Undetermined(UndeterminedReason::DegenerateSolve);
        }

        match svd.solve(&b, 0.0) {
            Ok(solution) if solution.iter().all(|v| v.is_finite()) => {
                PositionFix::Determined(Point2::new(solution[0], solution[1]))
            }
            _ => PositionFix::Undetermined(UndeterminedReason::DegenerateSolve),
        }
    }

    /// 构造 A·x = b
    ///
    /// 第 i 行 (i = 0, 1):
    /// 2(x2-xi)·X + 2(y2-yi)·Y = di² - d2² - (xi² + yi²) + (x2² + y2²)
    pub fn linear_system(triple: &[RangedAnchor]) -> (Matrix2<f64>, Vector2<f64>) {
        let pivot = triple[2];
        let (x2, y2) = pivot.position.xy();
        let d2 = pivot.distance;

        let row = |anchor: &RangedAnchor| {
            let (xi, yi) = anchor.position.xy();
            let di = anchor.distance;
            (
                2.0 * (x2 - xi),
                2.0 * (y2 - yi),
                di * di - d2 * d2 - (xi * xi + yi * yi) + (x2 * x2 + y2 * y2),
            )
        };

        let (a11, a12, b1) = row(&triple[0]);
        let (a21, a22, b2) = row(&triple[1]);

        (Matrix2::new(a11, a12, a21, a22), Vector2::new(b1, b2))
    }

    /// 均方根距离残差，用于评估定位质量
    pub fn residual_error(anchors: &[RangedAnchor], point: &Point2) -> f64 {
        if anchors.is_empty() {
            return 0.0;
        }

        let sum: f64 = anchors
            .iter()
            .map(|anchor| {
                let error = anchor.position.distance_to(point) - anchor.distance;
                error * error
            })
            .sum();

        (sum / anchors.len() as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranged_from_truth(positions: &[(f64, f64)], truth: Point2) -> Vec<RangedAnchor> {
        positions
            .iter()
            .map(|&(x, y)| {
                let p = Point2::new(x, y);
                RangedAnchor::new(p, p.distance_to(&truth))
            })
            .collect()
    }

    #[test]
    fn test_reference_triple() {
        let anchors = vec![
            RangedAnchor::new(Point2::new(0.0, 0.0), 5.0),
            RangedAnchor::new(Point2::new(10.0, 0.0), 5.0),
            RangedAnchor::new(Point2::new(5.0, 8.0), 5.0),
        ];
        let p = Trilateration::solve(&anchors).point().unwrap();
        assert!((p.x - 5.0).abs() < 1e-6);
        assert!((p.y - 2.4375).abs() < 1e-6);
    }

    #[test]
    fn test_recovers_true_point() {
        let truth = Point2::new(12.3, 9.1);
        let anchors = ranged_from_truth(&[(4.0, 8.5), (14.8, 10.5), (22.0, 7.6)], truth);
        let p = Trilateration::solve(&anchors).point().unwrap();
        assert!(p.distance_to(&truth) < 1e-6);
        assert!(Trilateration::residual_error(&anchors, &p) < 1e-6);
    }

    #[test]
    fn test_insufficient_anchors() {
        let anchors = ranged_from_truth(&[(0.0, 0.0), (1.0, 0.0)], Point2::new(0.5, 0.5));
        assert_eq!(
            Trilateration::solve(&anchors),
            PositionFix::Undetermined(UndeterminedReason::InsufficientAnchors)
        );
    }

    #[test]
    fn test_collinear_is_degenerate() {
        let anchors = vec![
            RangedAnchor::new(Point2::new(0.0, 0.0), 3.0),
            RangedAnchor::new(Point2::new(5.0, 0.0), 4.0),
            RangedAnchor::new(Point2::new(10.0, 0.0), 5.0),
        ];
        assert_eq!(
            Trilateration::solve(&anchors),
            PositionFix::Undetermined(UndeterminedReason::DegenerateSolve)
        );
    }

    #[test]
    fn test_only_first_three_used() {
        let truth = Point2::new(3.0, 4.0);
        let mut anchors = ranged_from_truth(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)], truth);
        anchors.push(RangedAnchor::new(Point2::new(50.0, 50.0), 1000.0));
        let p = Trilateration::solve(&anchors).point().unwrap();
        assert!(p.distance_to(&truth) < 1e-6);
    }

    #[test]
    fn test_unknown_labels_are_dropped() {
        let table = AnchorTable::reference_deployment();
        let model = SignalModel::default();
        let ranged = Trilateration::ranged(
            &table,
            [("A", -60.0), ("Q", -61.0), ("G", -70.0)],
            &model,
        );
        assert_eq!(ranged.len(), 2);
        assert_eq!(ranged[1].position, Point2::new(22.0, 7.6));
        assert!((ranged[1].distance - model.distance(-70.0)).abs() < 1e-12);
        assert_eq!(
            Trilateration::solve(&ranged),
            PositionFix::Undetermined(UndeterminedReason::InsufficientAnchors)
        );
    }
}
