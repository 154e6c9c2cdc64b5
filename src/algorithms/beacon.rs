/// 固定信标（锚点）定义和信标表

use crate::algorithms::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个固定信标
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// 信标标签（例如 "A"、"static1"）
    pub label: String,
    /// X 坐标
    pub x: f64,
    /// Y 坐标
    pub y: f64,
}

impl Anchor {
    /// 创建新的信标
    pub fn new(label: impl Into<String>, x: f64, y: f64) -> Self {
        Anchor {
            label: label.into(),
            x,
            y,
        }
    }

    /// 获取信标的平面坐标
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// 单字符标签的信标是移动节点可上报的主信标；
    /// 多字符标签（static*/base）只参与三边定位
    pub fn is_primary(&self) -> bool {
        self.label.chars().count() == 1
    }
}

/// 信标表：标签 -> 信标，部署期间不可变
#[derive(Clone, Debug, Default)]
pub struct AnchorTable {
    anchors: BTreeMap<String, Anchor>,
}

impl AnchorTable {
    /// 创建空的信标表
    pub fn new() -> Self {
        AnchorTable {
            anchors: BTreeMap::new(),
        }
    }

    /// 从信标向量创建
    pub fn from_vec(anchors: Vec<Anchor>) -> Self {
        let mut table = AnchorTable::new();
        for anchor in anchors {
            table.add_anchor(anchor);
        }
        table
    }

    /// 参考部署的信标布局
    pub fn reference_deployment() -> Self {
        AnchorTable::from_vec(reference_anchors())
    }

    /// 添加信标（同名覆盖）
    pub fn add_anchor(&mut self, anchor: Anchor) {
        self.anchors.insert(anchor.label.clone(), anchor);
    }

    /// 获取信标
    pub fn get(&self, label: &str) -> Option<&Anchor> {
        self.anchors.get(label)
    }

    /// 获取信标坐标
    pub fn locate(&self, label: &str) -> Option<Point2> {
        self.get(label).map(Anchor::position)
    }

    /// 是否包含信标
    pub fn contains(&self, label: &str) -> bool {
        self.anchors.contains_key(label)
    }

    /// 获取信标数量
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// 按标签顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.values()
    }
}

/// 参考部署：6 个主信标、4 个静态信标和基站
pub fn reference_anchors() -> Vec<Anchor> {
    vec![
        Anchor::new("A", 4.0, 8.5),
        Anchor::new("E", 10.5, 8.5),
        Anchor::new("F", 14.8, 10.5),
        Anchor::new("G", 22.0, 7.6),
        Anchor::new("P", 27.0, 10.5),
        Anchor::new("Z", 33.2, 12.0),
        Anchor::new("static1", 7.0, 8.5),
        Anchor::new("static2", 19.7, 8.3),
        Anchor::new("static3", 26.0, 9.3),
        Anchor::new("static4", 31.0, 11.0),
        Anchor::new("base", 13.5, 7.5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_creation() {
        let anchor = Anchor::new("A", 4.0, 8.5);
        assert_eq!(anchor.label, "A");
        assert_eq!(anchor.position(), Point2::new(4.0, 8.5));
        assert!(anchor.is_primary());
        assert!(!Anchor::new("static1", 7.0, 8.5).is_primary());
    }

    #[test]
    fn test_anchor_table() {
        let table = AnchorTable::reference_deployment();
        assert_eq!(table.len(), 11);
        assert_eq!(table.locate("base"), Some(Point2::new(13.5, 7.5)));
        assert!(table.locate("B").is_none());

        let mut table = AnchorTable::new();
        table.add_anchor(Anchor::new("A", 1.0, 1.0));
        table.add_anchor(Anchor::new("A", 2.0, 2.0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.locate("A"), Some(Point2::new(2.0, 2.0)));
    }
}
