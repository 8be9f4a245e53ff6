//! 标注放置请求：引擎唯一的输出单元，不含任何渲染逻辑。

use autodim_core::geometry::Point2;
use autodim_core::primitives;
use serde::Serialize;

use crate::classifier::ProjectionView;
use crate::errors::PlacementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Linear,
    Angular,
    Radius,
    Diameter,
}

impl DimensionKind {
    pub fn name(self) -> &'static str {
        match self {
            DimensionKind::Linear => "linear",
            DimensionKind::Angular => "angular",
            DimensionKind::Radius => "radius",
            DimensionKind::Diameter => "diameter",
        }
    }
}

/// 各类标注所需的几何输入。角度单位均为度。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DimensionGeometry {
    /// 对齐标注：尺寸线平行于 `p1 → p2`，沿其左法向偏移 `offset`。
    Linear { p1: Point2, p2: Point2, offset: f64 },
    /// 三点角度标注。
    Angular {
        vertex: Point2,
        p1: Point2,
        p2: Point2,
    },
    Radius {
        center: Point2,
        radius: f64,
        angle: f64,
    },
    Diameter {
        center: Point2,
        radius: f64,
        angle: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionRequest {
    pub view: ProjectionView,
    pub style: String,
    #[serde(flatten)]
    pub geometry: DimensionGeometry,
}

impl DimensionRequest {
    pub fn new(view: ProjectionView, style: impl Into<String>, geometry: DimensionGeometry) -> Self {
        Self {
            view,
            style: style.into(),
            geometry,
        }
    }

    #[inline]
    pub fn kind(&self) -> DimensionKind {
        match self.geometry {
            DimensionGeometry::Linear { .. } => DimensionKind::Linear,
            DimensionGeometry::Angular { .. } => DimensionKind::Angular,
            DimensionGeometry::Radius { .. } => DimensionKind::Radius,
            DimensionGeometry::Diameter { .. } => DimensionKind::Diameter,
        }
    }

    /// 标注显示的测量值：长度、角度（度）、半径或直径。
    pub fn measurement(&self) -> f64 {
        match self.geometry {
            DimensionGeometry::Linear { p1, p2, .. } => primitives::distance(p1, p2),
            DimensionGeometry::Angular { vertex, p1, p2 } => {
                primitives::angle_at_vertex(p1, vertex, p2)
            }
            DimensionGeometry::Radius { radius, .. } => radius,
            DimensionGeometry::Diameter { radius, .. } => radius * 2.0,
        }
    }

    /// 拒绝绘图端无法表达的退化几何。
    pub fn validate(&self, tolerance: f64) -> Result<(), PlacementError> {
        match self.geometry {
            DimensionGeometry::Linear { p1, p2, offset } => {
                ensure_finite(&[p1.x(), p1.y(), p2.x(), p2.y(), offset])?;
                if primitives::distance(p1, p2) <= tolerance {
                    return Err(PlacementError::DegenerateGeometry(
                        "linear dimension endpoints coincide".to_string(),
                    ));
                }
            }
            DimensionGeometry::Angular { vertex, p1, p2 } => {
                ensure_finite(&[vertex.x(), vertex.y(), p1.x(), p1.y(), p2.x(), p2.y()])?;
                if primitives::distance(vertex, p1) <= tolerance
                    || primitives::distance(vertex, p2) <= tolerance
                {
                    return Err(PlacementError::DegenerateGeometry(
                        "angular dimension ray has zero length".to_string(),
                    ));
                }
                if primitives::angle_at_vertex(p1, vertex, p2) <= tolerance {
                    return Err(PlacementError::DegenerateGeometry(
                        "angular dimension rays are collinear".to_string(),
                    ));
                }
            }
            DimensionGeometry::Radius {
                center,
                radius,
                angle,
            }
            | DimensionGeometry::Diameter {
                center,
                radius,
                angle,
            } => {
                ensure_finite(&[center.x(), center.y(), radius, angle])?;
                if radius <= tolerance {
                    return Err(PlacementError::DegenerateGeometry(format!(
                        "radius {radius} is not positive"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn ensure_finite(values: &[f64]) -> Result<(), PlacementError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PlacementError::DegenerateGeometry(
            "non-finite coordinate".to_string(),
        ))
    }
}
