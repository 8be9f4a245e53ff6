//! 按象限把混合图元划分到各投影视图。
//!
//! 这是一个空间约定式的启发：假设上游布局已经按第三角画法把视图摆放在
//! 整体包围盒的四个象限中，不做真正的三维投影推断。

use std::fmt;

use autodim_core::document::Entity;
use autodim_core::geometry::Bounds2D;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionView {
    Front,
    Top,
    Right,
    Iso,
}

impl ProjectionView {
    /// 标注优先级：主视图 > 俯视图 > 右视图 > 轴测图。
    pub const PRIORITY: [ProjectionView; 4] = [
        ProjectionView::Front,
        ProjectionView::Top,
        ProjectionView::Right,
        ProjectionView::Iso,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProjectionView::Front => "front",
            ProjectionView::Top => "top",
            ProjectionView::Right => "right",
            ProjectionView::Iso => "iso",
        }
    }

    /// 是否标注水平线。
    #[inline]
    pub fn dimensions_horizontal(self) -> bool {
        matches!(self, ProjectionView::Front | ProjectionView::Top)
    }

    /// 是否标注竖直线。
    #[inline]
    pub fn dimensions_vertical(self) -> bool {
        matches!(self, ProjectionView::Front | ProjectionView::Right)
    }
}

impl fmt::Display for ProjectionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 每个视图一个桶，桶内保持输入顺序。
#[derive(Debug, Clone, Default)]
pub struct ViewBuckets {
    front: Vec<Entity>,
    top: Vec<Entity>,
    right: Vec<Entity>,
    iso: Vec<Entity>,
}

impl ViewBuckets {
    #[inline]
    pub fn get(&self, view: ProjectionView) -> &[Entity] {
        match view {
            ProjectionView::Front => &self.front,
            ProjectionView::Top => &self.top,
            ProjectionView::Right => &self.right,
            ProjectionView::Iso => &self.iso,
        }
    }

    fn bucket_mut(&mut self, view: ProjectionView) -> &mut Vec<Entity> {
        match view {
            ProjectionView::Front => &mut self.front,
            ProjectionView::Top => &mut self.top,
            ProjectionView::Right => &mut self.right,
            ProjectionView::Iso => &mut self.iso,
        }
    }

    pub fn push(&mut self, view: ProjectionView, entity: Entity) {
        self.bucket_mut(view).push(entity);
    }

    /// 按优先级顺序遍历各视图。
    pub fn iter(&self) -> impl Iterator<Item = (ProjectionView, &[Entity])> {
        ProjectionView::PRIORITY
            .into_iter()
            .map(move |view| (view, self.get(view)))
    }

    pub fn total(&self) -> usize {
        self.front.len() + self.top.len() + self.right.len() + self.iso.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryClassifier;

impl GeometryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 以全部图元外包框的中心为原点，按实体中心所在象限归类：
    /// 左下为主视图，左上为俯视图，右下为右视图，其余（含落在分界线上的）归入轴测图。
    pub fn classify(&self, entities: &[Entity]) -> ViewBuckets {
        let mut buckets = ViewBuckets::default();

        let mut bounds = Bounds2D::empty();
        for entity in entities {
            bounds.include_bounds(&entity.envelope());
        }
        if bounds.is_empty() {
            return buckets;
        }

        let center = bounds.center();
        let (cx, cy) = (center.x(), center.y());
        for entity in entities {
            let p = entity.center();
            let view = if p.x() < cx && p.y() < cy {
                ProjectionView::Front
            } else if p.x() < cx && p.y() > cy {
                ProjectionView::Top
            } else if p.x() > cx && p.y() < cy {
                ProjectionView::Right
            } else {
                ProjectionView::Iso
            };
            buckets.push(view, entity.clone());
        }

        debug!(
            front = buckets.front.len(),
            top = buckets.top.len(),
            right = buckets.right.len(),
            iso = buckets.iso.len(),
            "图元视图分类完成"
        );
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodim_core::document::{Circle, Line};
    use autodim_core::geometry::Point2;

    fn circle(x: f64, y: f64) -> Entity {
        Entity::Circle(Circle {
            center: Point2::new(x, y),
            radius: 1.0,
            layer: "0".to_string(),
        })
    }

    #[test]
    fn quadrant_corners_split_evenly() {
        let entities = vec![
            circle(0.0, 0.0),
            circle(0.0, 10.0),
            circle(10.0, 0.0),
            circle(10.0, 10.0),
        ];
        let buckets = GeometryClassifier::new().classify(&entities);
        for view in ProjectionView::PRIORITY {
            assert_eq!(buckets.get(view).len(), 1, "view {view}");
        }
        assert_eq!(buckets.total(), 4);

        match &buckets.get(ProjectionView::Top)[0] {
            Entity::Circle(c) => assert!(c.center.approx_eq(Point2::new(0.0, 10.0), 1e-9)),
            _ => panic!("expected circle"),
        }
    }

    #[test]
    fn entity_on_center_line_goes_to_iso() {
        let entities = vec![
            circle(0.0, 0.0),
            circle(10.0, 10.0),
            Entity::Line(Line {
                start: Point2::new(4.0, 2.0),
                end: Point2::new(6.0, 2.0),
                layer: "0".to_string(),
            }),
        ];
        let buckets = GeometryClassifier::new().classify(&entities);
        assert_eq!(buckets.get(ProjectionView::Iso).len(), 2);
        assert_eq!(buckets.get(ProjectionView::Front).len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_buckets() {
        let buckets = GeometryClassifier::new().classify(&[]);
        assert_eq!(buckets.total(), 0);
        assert_eq!(buckets.iter().count(), 4);
    }

    #[test]
    fn view_line_policy() {
        assert!(ProjectionView::Front.dimensions_horizontal());
        assert!(ProjectionView::Front.dimensions_vertical());
        assert!(ProjectionView::Top.dimensions_horizontal());
        assert!(!ProjectionView::Top.dimensions_vertical());
        assert!(!ProjectionView::Right.dimensions_horizontal());
        assert!(ProjectionView::Right.dimensions_vertical());
        assert!(!ProjectionView::Iso.dimensions_horizontal());
        assert!(!ProjectionView::Iso.dimensions_vertical());
    }
}
