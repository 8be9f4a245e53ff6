//! 标注结果汇总：每个视图的成功请求与跳过原因。

use std::fmt;

use serde::Serialize;

use crate::classifier::ProjectionView;
use crate::request::{DimensionKind, DimensionRequest};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// 零长度线段或零半径圆
    Degenerate,
    BelowMinimumLength { length: f64 },
    /// 与已标注特征签名相同
    Duplicate { signature: f64 },
    NoIntersection,
    AngleOutOfRange { angle: f64 },
    /// 绘图端拒绝了该请求
    Rejected { message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Degenerate => f.write_str("degenerate geometry"),
            SkipReason::BelowMinimumLength { length } => {
                write!(f, "length {length:.3} below minimum")
            }
            SkipReason::Duplicate { signature } => write!(f, "duplicate of {signature}"),
            SkipReason::NoIntersection => f.write_str("lines do not intersect"),
            SkipReason::AngleOutOfRange { angle } => write!(f, "angle {angle:.1} out of range"),
            SkipReason::Rejected { message } => write!(f, "rejected: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFeature {
    pub kind: DimensionKind,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewReport {
    pub view: ProjectionView,
    pub entity_count: usize,
    pub placed: Vec<DimensionRequest>,
    pub skipped: Vec<SkippedFeature>,
}

impl ViewReport {
    pub fn new(view: ProjectionView, entity_count: usize) -> Self {
        Self {
            view,
            entity_count,
            placed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    #[inline]
    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn count_of(&self, kind: DimensionKind) -> usize {
        self.placed.iter().filter(|r| r.kind() == kind).count()
    }

    pub(crate) fn skip(&mut self, kind: DimensionKind, reason: SkipReason) {
        self.skipped.push(SkippedFeature { kind, reason });
    }
}

/// 整份文档的标注报告，视图按处理顺序排列。
#[derive(Debug, Clone, Serialize)]
pub struct DimensioningReport {
    pub style: String,
    pub views: Vec<ViewReport>,
}

impl DimensioningReport {
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            views: Vec::new(),
        }
    }

    /// 成功放置的标注总数。
    pub fn total(&self) -> usize {
        self.views.iter().map(ViewReport::placed_count).sum()
    }

    pub fn skipped_total(&self) -> usize {
        self.views.iter().map(|v| v.skipped.len()).sum()
    }

    /// 按放置顺序展开全部请求。
    pub fn requests(&self) -> impl Iterator<Item = &DimensionRequest> {
        self.views.iter().flat_map(|v| v.placed.iter())
    }

    pub fn view(&self, view: ProjectionView) -> Option<&ViewReport> {
        self.views.iter().find(|v| v.view == view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::DimensionGeometry;
    use autodim_core::geometry::Point2;

    #[test]
    fn totals_span_all_views() {
        let mut report = DimensioningReport::new("ISO_STANDARD");
        let mut front = ViewReport::new(ProjectionView::Front, 3);
        front.placed.push(DimensionRequest::new(
            ProjectionView::Front,
            "ISO_STANDARD",
            DimensionGeometry::Radius {
                center: Point2::new(0.0, 0.0),
                radius: 5.0,
                angle: 45.0,
            },
        ));
        front.skip(
            DimensionKind::Linear,
            SkipReason::BelowMinimumLength { length: 1.0 },
        );
        report.views.push(front);
        report.views.push(ViewReport::new(ProjectionView::Top, 0));

        assert_eq!(report.total(), 1);
        assert_eq!(report.skipped_total(), 1);
        assert_eq!(report.requests().count(), 1);
        assert_eq!(
            report
                .view(ProjectionView::Front)
                .map(|v| v.count_of(DimensionKind::Radius)),
            Some(1)
        );
        assert!(report.view(ProjectionView::Iso).is_none());
    }

    #[test]
    fn skip_reason_serializes_flat() {
        let skipped = SkippedFeature {
            kind: DimensionKind::Angular,
            reason: SkipReason::AngleOutOfRange { angle: 175.0 },
        };
        let value = serde_json::to_value(&skipped).expect("serialize skipped feature");
        assert_eq!(value["kind"], "angular");
        assert_eq!(value["reason"], "angle_out_of_range");
        assert_eq!(value["angle"], 175.0);
    }
}
