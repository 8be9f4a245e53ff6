//! 标注引擎依赖的基础几何运算。
//!
//! 所有函数都是纯函数。退化输入（零长度向量、平行线）不会报错，
//! 而是返回 `0.0` 或 `None` 表示“无贡献”，因为上游转换产生的微小碎线属于正常噪声。

use crate::geometry::{Point2, Segment2, Vector2};

/// 交点允许落在线段端点之外的最大延伸距离（沿该线段自身方向度量）。
pub const EXTENDED_INTERSECTION_TOLERANCE: f64 = 5.0;

#[inline]
pub fn distance(p1: Point2, p2: Point2) -> f64 {
    p1.distance_to(p2)
}

/// 以 `vertex` 为顶点、指向 `p1` 与 `p2` 的两条射线之间的夹角，单位为度，范围 `[0, 180]`。
/// 任一射线长度为零时返回 0。
pub fn angle_at_vertex(p1: Point2, vertex: Point2, p2: Point2) -> f64 {
    let ray1 = vertex.vector_to(p1);
    let ray2 = vertex.vector_to(p2);
    match (ray1.normalize(), ray2.normalize()) {
        (Some(u1), Some(u2)) => u1.dot(u2).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 0.0,
    }
}

/// 模长低于 `tolerance` 时返回 `None`。
#[inline]
pub fn normalize(v: Vector2, tolerance: f64) -> Option<Vector2> {
    let len = v.length();
    if len < tolerance {
        None
    } else {
        Some(v.scale(1.0 / len))
    }
}

/// 求两条线段的交点。
///
/// 通过方向向量行列式求解参数 `t1`、`t2`；`|det| < tolerance` 视为平行（含共线）。
/// 若交点不在两条线段内部，仍允许它落在每条线段端点之外
/// [`EXTENDED_INTERSECTION_TOLERANCE`] 以内，以兜住几乎相接的制图碎线。
pub fn line_intersection(l1: &Segment2, l2: &Segment2, tolerance: f64) -> Option<Point2> {
    let d1 = l1.direction();
    let d2 = l2.direction();

    let det = d1.cross(d2);
    if det.abs() < tolerance {
        return None;
    }

    let dp = l1.start.vector_to(l2.start);
    let t1 = dp.cross(d2) / det;
    let t2 = dp.cross(d1) / det;

    if (0.0..=1.0).contains(&t1) && (0.0..=1.0).contains(&t2) {
        return Some(l1.point_at(t1));
    }

    let len1 = d1.length();
    let len2 = d2.length();
    if within_extension(t1, len1) && within_extension(t2, len2) {
        return Some(l1.point_at(t1));
    }

    None
}

#[inline]
fn within_extension(t: f64, length: f64) -> bool {
    let along = t * length;
    (-EXTENDED_INTERSECTION_TOLERANCE..=length + EXTENDED_INTERSECTION_TOLERANCE).contains(&along)
}

/// 两条线段方向向量之间未折叠的夹角（度），范围 `[0, 180]`。
/// 任一线段退化时返回 0。
pub fn direction_angle(l1: &Segment2, l2: &Segment2) -> f64 {
    match (l1.direction().normalize(), l2.direction().normalize()) {
        (Some(u1), Some(u2)) => u1.dot(u2).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 0.0,
    }
}

/// 两条直线之间的锐角或直角（度），范围 `[0, 90]`，与线段走向无关。
pub fn angle_between_lines(l1: &Segment2, l2: &Segment2) -> f64 {
    match (l1.direction().normalize(), l2.direction().normalize()) {
        (Some(u1), Some(u2)) => {
            let angle = u1.dot(u2).abs().clamp(0.0, 1.0).acos().to_degrees();
            angle.min(180.0 - angle)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment2 {
        Segment2::new(Point2::new(x1, y1), Point2::new(x2, y2))
    }

    #[test]
    fn distance_is_euclidean() {
        assert!((distance(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn angle_at_vertex_measures_right_angle() {
        let angle = angle_at_vertex(
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 5.0),
        );
        assert!((angle - 90.0).abs() < 1e-9);

        let straight = angle_at_vertex(
            Point2::new(-1.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
        );
        assert!((straight - 180.0).abs() < 1e-9);
    }

    #[test]
    fn angle_at_vertex_returns_zero_for_empty_ray() {
        let vertex = Point2::new(2.0, 2.0);
        assert_eq!(angle_at_vertex(vertex, vertex, Point2::new(5.0, 2.0)), 0.0);
    }

    #[test]
    fn normalize_rejects_short_vectors() {
        assert!(normalize(Vector2::new(1e-9, 0.0), 1e-6).is_none());
        let unit = normalize(Vector2::new(3.0, 4.0), 1e-6).expect("unit vector");
        assert!((unit.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn crossing_segments_intersect_inside() {
        let p = line_intersection(&seg(0.0, 0.0, 10.0, 10.0), &seg(0.0, 10.0, 10.0, 0.0), 1e-6)
            .expect("segments cross");
        assert!(p.approx_eq(Point2::new(5.0, 5.0), 1e-9));
    }

    #[test]
    fn parallel_and_collinear_segments_have_no_intersection() {
        assert!(line_intersection(&seg(0.0, 0.0, 10.0, 0.0), &seg(0.0, 5.0, 10.0, 5.0), 1e-6).is_none());
        assert!(line_intersection(&seg(0.0, 0.0, 10.0, 0.0), &seg(5.0, 0.0, 20.0, 0.0), 1e-6).is_none());
    }

    #[test]
    fn near_miss_within_extension_is_accepted() {
        // 交点位于 (14.9, 0)，超出第一条线段终点 4.9。
        let l1 = seg(0.0, 0.0, 10.0, 0.0);
        let l2 = seg(14.9, 1.0, 14.9, 10.0);
        let p = line_intersection(&l1, &l2, 1e-6).expect("within extension");
        assert!(p.approx_eq(Point2::new(14.9, 0.0), 1e-9));
    }

    #[test]
    fn near_miss_beyond_extension_is_rejected() {
        let l1 = seg(0.0, 0.0, 10.0, 0.0);
        let l2 = seg(15.1, 1.0, 15.1, 10.0);
        assert!(line_intersection(&l1, &l2, 1e-6).is_none());
    }

    #[test]
    fn extension_must_hold_for_both_segments() {
        let l1 = seg(0.0, 0.0, 10.0, 0.0);
        let l2 = seg(12.0, 6.0, 12.0, 20.0);
        assert!(line_intersection(&l1, &l2, 1e-6).is_none());
    }

    #[test]
    fn angle_between_lines_ignores_orientation() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(0.0, 0.0, 10.0, 10.0);
        let reversed = seg(10.0, 10.0, 0.0, 0.0);
        assert!((angle_between_lines(&a, &b) - 45.0).abs() < 1e-9);
        assert!((angle_between_lines(&a, &reversed) - 45.0).abs() < 1e-9);

        let steep = seg(0.0, 0.0, -10.0, 1.0);
        let folded = angle_between_lines(&a, &steep);
        assert!(folded <= 90.0);
        assert!((folded - (1.0f64 / 10.0).atan().to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn direction_angle_keeps_obtuse_values() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(0.0, 0.0, -10.0, 10.0);
        assert!((direction_angle(&a, &b) - 135.0).abs() < 1e-9);
        assert!((angle_between_lines(&a, &b) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_segments_contribute_nothing() {
        let point = seg(1.0, 1.0, 1.0, 1.0);
        let line = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(angle_between_lines(&point, &line), 0.0);
        assert_eq!(direction_angle(&point, &line), 0.0);
        assert!(line_intersection(&point, &line, 1e-6).is_none());
    }
}
