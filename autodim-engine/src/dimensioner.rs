//! 自动标注的编排层。
//!
//! 视图按 主视图 → 俯视图 → 右视图 → 轴测图 的固定顺序处理，
//! [`DeduplicationState`] 作为折叠累加器在视图之间显式传递。
//! 单个特征的放置失败只记入报告，不会中断整个流程。

use autodim_config::DimensioningConfig;
use autodim_core::document::{Arc, Circle, Entity, Line};
use autodim_core::geometry::{Point2, Segment2};
use autodim_core::primitives;
use tracing::{debug, info, warn};

use crate::classifier::{ProjectionView, ViewBuckets};
use crate::connectivity::EdgeConnectivityAnalyzer;
use crate::dedup::{DeduplicationState, Orientation};
use crate::dimstyle::{DimStyle, StandardDimStyles};
use crate::report::{DimensioningReport, SkipReason, ViewReport};
use crate::request::{DimensionGeometry, DimensionKind, DimensionRequest};
use crate::sink::DimensionSink;

/// 参与角度标注的斜线上限，两两组合最多 10 对。
pub const MAX_ANGLE_CANDIDATES: usize = 5;
/// 可接受的角度开区间（度）。
pub const MIN_ANGLE: f64 = 10.0;
pub const MAX_ANGLE: f64 = 170.0;
/// 直径标注引线的固定角度（度）。
pub const DIAMETER_LEADER_ANGLE: f64 = 45.0;

/// 单个视图内按走向拆分后的直线。
#[derive(Debug, Default)]
struct LineBuckets {
    horizontal: Vec<Segment2>,
    vertical: Vec<Segment2>,
    other: Vec<Segment2>,
}

/// 一次长度标注的候选：单条线段，或合并后的整条链。
#[derive(Debug, Clone, Copy)]
struct LinearFeature {
    start: Point2,
    end: Point2,
    length: f64,
}

pub struct SmartDimensioner<'a> {
    config: &'a DimensioningConfig,
    style: DimStyle,
    analyzer: EdgeConnectivityAnalyzer,
}

impl<'a> SmartDimensioner<'a> {
    pub fn new(config: &'a DimensioningConfig) -> Self {
        let mut style = StandardDimStyles::for_standard(config.standard);
        if let Some(height) = config.text_height {
            style = style.with_text_height(height);
        }
        Self {
            config,
            style,
            analyzer: EdgeConnectivityAnalyzer::new(config.connectivity_tolerance),
        }
    }

    #[inline]
    pub fn style(&self) -> &DimStyle {
        &self.style
    }

    /// 按优先级依次标注四个视图。去重状态从空开始，在视图之间累积。
    pub fn dimension_projections<S>(&self, buckets: &ViewBuckets, sink: &mut S) -> DimensioningReport
    where
        S: DimensionSink + ?Sized,
    {
        let (_, views) = buckets.iter().fold(
            (DeduplicationState::new(), Vec::new()),
            |(mut state, mut views), (view, entities)| {
                views.push(self.dimension_view(view, entities, &mut state, sink));
                (state, views)
            },
        );

        let report = DimensioningReport {
            style: self.style.name.clone(),
            views,
        };
        info!(
            total = report.total(),
            skipped = report.skipped_total(),
            style = %report.style,
            "自动标注完成"
        );
        report
    }

    /// 标注单个视图。顺序为：水平线、竖直线、圆的直径、圆弧半径、斜线夹角。
    pub fn dimension_view<S>(
        &self,
        view: ProjectionView,
        entities: &[Entity],
        state: &mut DeduplicationState,
        sink: &mut S,
    ) -> ViewReport
    where
        S: DimensionSink + ?Sized,
    {
        let mut report = ViewReport::new(view, entities.len());
        if entities.is_empty() {
            info!(view = %view, "视图中没有可标注的图元");
            return report;
        }
        info!(view = %view, entities = entities.len(), "开始标注视图");

        let lines = self.split_lines(entities, &mut report);

        if view.dimensions_horizontal() {
            self.dimension_aligned(
                &lines.horizontal,
                Orientation::Horizontal,
                state,
                sink,
                &mut report,
            );
        }
        if view.dimensions_vertical() {
            self.dimension_aligned(
                &lines.vertical,
                Orientation::Vertical,
                state,
                sink,
                &mut report,
            );
        }

        if self.config.dimension_diameters {
            for circle in entities.iter().filter_map(as_circle) {
                self.dimension_diameter(circle, state, sink, &mut report);
            }
        }
        if self.config.dimension_radii {
            for arc in entities.iter().filter_map(as_arc) {
                self.dimension_radius(arc, state, sink, &mut report);
            }
        }
        if self.config.dimension_angles {
            self.dimension_angles(&lines.other, state, sink, &mut report);
        }

        if report.placed_count() > self.config.max_dimensions_per_view {
            warn!(
                view = %view,
                placed = report.placed_count(),
                limit = self.config.max_dimensions_per_view,
                "视图标注数量超出建议上限"
            );
        }
        info!(
            view = %view,
            placed = report.placed_count(),
            skipped = report.skipped.len(),
            "视图标注完成"
        );
        report
    }

    fn split_lines(&self, entities: &[Entity], report: &mut ViewReport) -> LineBuckets {
        let tolerance = self.config.geometric_tolerance;
        let mut buckets = LineBuckets::default();
        for line in entities.iter().filter_map(as_line) {
            let segment = line.segment();
            if segment.is_degenerate(tolerance) {
                debug!(view = %report.view, "跳过退化线段");
                report.skip(DimensionKind::Linear, SkipReason::Degenerate);
                continue;
            }
            let direction = segment.direction();
            if direction.y().abs() < tolerance {
                buckets.horizontal.push(segment);
            } else if direction.x().abs() < tolerance {
                buckets.vertical.push(segment);
            } else {
                buckets.other.push(segment);
            }
        }
        buckets
    }

    /// 开启链合并时，同一条链只在其首段出现的位置产出一个候选。
    fn linear_features(&self, segments: &[Segment2]) -> Vec<LinearFeature> {
        let single = |segment: &Segment2| LinearFeature {
            start: segment.start,
            end: segment.end,
            length: segment.length(),
        };
        if !self.config.merge_collinear_chains {
            return segments.iter().map(single).collect();
        }

        let mut owner: Vec<Option<usize>> = vec![None; segments.len()];
        let chains = self.analyzer.group_connected_edges(segments);
        for (chain_index, chain) in chains.iter().enumerate() {
            for &i in chain.indices() {
                owner[i] = Some(chain_index);
            }
        }

        let mut emitted = vec![false; chains.len()];
        let mut features = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            match owner[i] {
                None => features.push(single(segment)),
                Some(c) if !emitted[c] => {
                    emitted[c] = true;
                    let chain = &chains[c];
                    let Some((start, end)) = self.analyzer.true_endpoints(chain, segments) else {
                        continue;
                    };
                    // 重叠碎片会让累计长度大于端点距离，以实际标注的距离为准。
                    features.push(LinearFeature {
                        start,
                        end,
                        length: start.distance_to(end),
                    });
                }
                Some(_) => {}
            }
        }
        features
    }

    fn dimension_aligned<S>(
        &self,
        segments: &[Segment2],
        orientation: Orientation,
        state: &mut DeduplicationState,
        sink: &mut S,
        report: &mut ViewReport,
    ) where
        S: DimensionSink + ?Sized,
    {
        for feature in self.linear_features(segments) {
            if feature.length < self.config.min_dimension_length {
                report.skip(
                    DimensionKind::Linear,
                    SkipReason::BelowMinimumLength {
                        length: feature.length,
                    },
                );
                continue;
            }
            if !state.record_length(orientation, feature.length) {
                report.skip(
                    DimensionKind::Linear,
                    SkipReason::Duplicate {
                        signature: round_to(feature.length, 2),
                    },
                );
                continue;
            }

            // 两种走向都取负偏移，竖直线的尺寸线因此落在线段右侧。
            let geometry = DimensionGeometry::Linear {
                p1: feature.start,
                p2: feature.end,
                offset: -self.config.dimension_offset,
            };
            self.place(geometry, sink, report);
        }
    }

    fn dimension_diameter<S>(
        &self,
        circle: &Circle,
        state: &mut DeduplicationState,
        sink: &mut S,
        report: &mut ViewReport,
    ) where
        S: DimensionSink + ?Sized,
    {
        let diameter = circle.radius * 2.0;
        if state.has_diameter(diameter) {
            report.skip(
                DimensionKind::Diameter,
                SkipReason::Duplicate {
                    signature: round_to(diameter, 1),
                },
            );
            return;
        }
        state.record_diameter(diameter);

        let geometry = DimensionGeometry::Diameter {
            center: circle.center,
            radius: circle.radius,
            angle: DIAMETER_LEADER_ANGLE,
        };
        self.place(geometry, sink, report);
    }

    fn dimension_radius<S>(
        &self,
        arc: &Arc,
        state: &mut DeduplicationState,
        sink: &mut S,
        report: &mut ViewReport,
    ) where
        S: DimensionSink + ?Sized,
    {
        if state.has_radius(arc.radius) {
            report.skip(
                DimensionKind::Radius,
                SkipReason::Duplicate {
                    signature: round_to(arc.radius, 1),
                },
            );
            return;
        }
        state.record_radius(arc.radius);

        let geometry = DimensionGeometry::Radius {
            center: arc.center,
            radius: arc.radius,
            angle: arc.mid_angle_degrees(),
        };
        self.place(geometry, sink, report);
    }

    fn dimension_angles<S>(
        &self,
        others: &[Segment2],
        state: &mut DeduplicationState,
        sink: &mut S,
        report: &mut ViewReport,
    ) where
        S: DimensionSink + ?Sized,
    {
        let candidates = &others[..others.len().min(MAX_ANGLE_CANDIDATES)];
        let tolerance = self.config.geometric_tolerance;

        for (i, l1) in candidates.iter().enumerate() {
            for l2 in &candidates[i + 1..] {
                let Some(vertex) = primitives::line_intersection(l1, l2, tolerance) else {
                    report.skip(DimensionKind::Angular, SkipReason::NoIntersection);
                    continue;
                };

                let raw = primitives::direction_angle(l1, l2);
                if !(raw > MIN_ANGLE && raw < MAX_ANGLE) {
                    report.skip(
                        DimensionKind::Angular,
                        SkipReason::AngleOutOfRange { angle: raw },
                    );
                    continue;
                }

                let folded = primitives::angle_between_lines(l1, l2);
                if state.has_angle(report.view, folded) {
                    report.skip(
                        DimensionKind::Angular,
                        SkipReason::Duplicate {
                            signature: round_to(folded, 1),
                        },
                    );
                    continue;
                }

                let geometry = DimensionGeometry::Angular {
                    vertex,
                    p1: farthest_end(l1, vertex),
                    p2: farthest_end(l2, vertex),
                };
                if self.place(geometry, sink, report) {
                    state.record_angle(report.view, folded);
                }
            }
        }
    }

    /// 交给绘图端放置，失败时记录警告并返回 `false`。
    fn place<S>(&self, geometry: DimensionGeometry, sink: &mut S, report: &mut ViewReport) -> bool
    where
        S: DimensionSink + ?Sized,
    {
        let request = DimensionRequest::new(report.view, self.style.name.clone(), geometry);
        let kind = request.kind();
        match sink.place(&request) {
            Ok(()) => {
                debug!(
                    view = %report.view,
                    kind = kind.name(),
                    value = request.measurement(),
                    "已放置标注"
                );
                report.placed.push(request);
                true
            }
            Err(err) => {
                warn!(view = %report.view, kind = kind.name(), error = %err, "标注放置失败，已跳过");
                report.skip(
                    kind,
                    SkipReason::Rejected {
                        message: err.to_string(),
                    },
                );
                false
            }
        }
    }
}

fn as_line(entity: &Entity) -> Option<&Line> {
    match entity {
        Entity::Line(line) => Some(line),
        _ => None,
    }
}

fn as_circle(entity: &Entity) -> Option<&Circle> {
    match entity {
        Entity::Circle(circle) => Some(circle),
        _ => None,
    }
}

fn as_arc(entity: &Entity) -> Option<&Arc> {
    match entity {
        Entity::Arc(arc) => Some(arc),
        _ => None,
    }
}

/// 取线段上离顶点较远的端点作为角度标注的定义点。
fn farthest_end(segment: &Segment2, vertex: Point2) -> Point2 {
    if vertex.distance_to(segment.end) > vertex.distance_to(segment.start) {
        segment.end
    } else {
        segment.start
    }
}

#[inline]
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
