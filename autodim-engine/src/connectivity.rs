//! 端点连通性分析：把离散的线段碎片重建为逻辑上的连续边（链）。

use std::collections::HashMap;

use autodim_core::geometry::{Point2, Segment2};
use autodim_core::primitives;
use tracing::debug;

/// 方向向量归一化点积的下限，约等于 25° 以内视为连续。
pub const CONTINUITY_DOT_THRESHOLD: f64 = 0.9;

const DEFAULT_TOLERANCE: f64 = 1e-3;

/// 以 `round(v / tolerance)` 得到的网格坐标，作为端点的空间桶键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    x: i64,
    y: i64,
}

/// 按网格桶组织的端点索引：容差内的端点落入同一桶。
#[derive(Debug, Clone)]
pub struct EndpointIndex {
    tolerance: f64,
    buckets: HashMap<GridKey, Vec<usize>>,
}

impl EndpointIndex {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            buckets: HashMap::new(),
        }
    }

    /// 为每条线段的两个端点登记其下标。
    pub fn build(segments: &[Segment2], tolerance: f64) -> Self {
        let mut index = Self::new(tolerance);
        for (i, segment) in segments.iter().enumerate() {
            index.insert(segment.start, i);
            index.insert(segment.end, i);
        }
        index
    }

    #[inline]
    pub fn key(&self, point: Point2) -> GridKey {
        GridKey {
            x: (point.x() / self.tolerance).round() as i64,
            y: (point.y() / self.tolerance).round() as i64,
        }
    }

    /// 网格键还原为吸附后的坐标。
    #[inline]
    pub fn snap(&self, key: GridKey) -> Point2 {
        Point2::new(key.x as f64 * self.tolerance, key.y as f64 * self.tolerance)
    }

    pub fn insert(&mut self, point: Point2, segment: usize) {
        let key = self.key(point);
        self.buckets.entry(key).or_default().push(segment);
    }

    #[inline]
    pub fn at(&self, point: Point2) -> &[usize] {
        self.buckets
            .get(&self.key(point))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// 一组首尾相接且方向连续的线段下标。只在单次分析内有效。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    segments: Vec<usize>,
}

impl Chain {
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeConnectivityAnalyzer {
    tolerance: f64,
}

impl Default for EdgeConnectivityAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl EdgeConnectivityAnalyzer {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// 提取全部多于一条线段的链。每个下标至多出现在一条链中。
    pub fn group_connected_edges(&self, segments: &[Segment2]) -> Vec<Chain> {
        if segments.is_empty() {
            return Vec::new();
        }

        let index = EndpointIndex::build(segments, self.tolerance);
        let adjacency: Vec<Vec<usize>> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                index
                    .at(segment.start)
                    .iter()
                    .chain(index.at(segment.end))
                    .copied()
                    .filter(|&j| j != i)
                    .collect()
            })
            .collect();

        let mut visited = vec![false; segments.len()];
        let mut chains = Vec::new();
        for start in 0..segments.len() {
            if visited[start] {
                continue;
            }
            let chain = self.walk(start, segments, &adjacency, &mut visited);
            if chain.len() > 1 {
                chains.push(Chain { segments: chain });
            }
        }

        debug!(
            segments = segments.len(),
            chains = chains.len(),
            "端点连通性分析完成"
        );
        chains
    }

    fn walk(
        &self,
        start: usize,
        segments: &[Segment2],
        adjacency: &[Vec<usize>],
        visited: &mut [bool],
    ) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if visited[current] {
                continue;
            }
            visited[current] = true;
            chain.push(current);

            for &neighbor in &adjacency[current] {
                if !visited[neighbor]
                    && self.is_continuous(&segments[current], &segments[neighbor])
                {
                    stack.push(neighbor);
                }
            }
        }
        chain
    }

    /// 方向相同或相反、夹角约 25° 以内的两条线段视为连续。
    pub fn is_continuous(&self, a: &Segment2, b: &Segment2) -> bool {
        match (
            primitives::normalize(a.direction(), self.tolerance),
            primitives::normalize(b.direction(), self.tolerance),
        ) {
            (Some(u1), Some(u2)) => u1.dot(u2).abs() > CONTINUITY_DOT_THRESHOLD,
            _ => false,
        }
    }

    pub fn total_length(&self, chain: &Chain, segments: &[Segment2]) -> f64 {
        chain
            .indices()
            .iter()
            .map(|&i| segments[i].length())
            .sum()
    }

    /// 链的开口端：在链内只出现一次的吸附端点，按首次出现的顺序取前两个。
    /// 不足两个（如闭合回路）时退化为首段起点与末段终点。
    pub fn true_endpoints(&self, chain: &Chain, segments: &[Segment2]) -> Option<(Point2, Point2)> {
        let first = *chain.indices().first()?;
        let last = *chain.indices().last()?;

        let index = EndpointIndex::new(self.tolerance);
        let mut order: Vec<GridKey> = Vec::new();
        let mut counts: HashMap<GridKey, usize> = HashMap::new();
        for &i in chain.indices() {
            for point in [segments[i].start, segments[i].end] {
                let key = index.key(point);
                let count = counts.entry(key).or_insert(0);
                if *count == 0 {
                    order.push(key);
                }
                *count += 1;
            }
        }

        let mut open_ends = order.into_iter().filter(|key| counts[key] == 1);
        match (open_ends.next(), open_ends.next()) {
            (Some(a), Some(b)) => Some((index.snap(a), index.snap(b))),
            _ => Some((segments[first].start, segments[last].end)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment2 {
        Segment2::new(Point2::new(x1, y1), Point2::new(x2, y2))
    }

    #[test]
    fn collinear_fragments_form_one_chain() {
        let segments = [
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 0.0, 2.0, 0.0),
            seg(2.0, 0.0, 3.0, 0.0),
        ];
        let analyzer = EdgeConnectivityAnalyzer::default();
        let chains = analyzer.group_connected_edges(&segments);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 3);
        assert!((analyzer.total_length(&chains[0], &segments) - 3.0).abs() < 1e-9);

        let (a, b) = analyzer
            .true_endpoints(&chains[0], &segments)
            .expect("chain has endpoints");
        assert!(a.approx_eq(Point2::new(0.0, 0.0), 1e-9));
        assert!(b.approx_eq(Point2::new(3.0, 0.0), 1e-9));
    }

    #[test]
    fn sharp_corner_is_not_merged() {
        let segments = [seg(0.0, 0.0, 10.0, 0.0), seg(10.0, 0.0, 10.0, 10.0)];
        let chains = EdgeConnectivityAnalyzer::default().group_connected_edges(&segments);
        assert!(chains.is_empty());
    }

    #[test]
    fn chain_skips_branch_at_corner() {
        let segments = [
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 0.0, 1.0, 1.0),
            seg(1.0, 0.0, 2.0, 0.0),
        ];
        let chains = EdgeConnectivityAnalyzer::default().group_connected_edges(&segments);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].indices(), &[0, 2]);
    }

    #[test]
    fn endpoints_within_tolerance_are_joined() {
        let segments = [seg(0.0, 0.0, 1.0004, 0.0), seg(0.9998, 0.0, 2.0, 0.0)];
        let chains = EdgeConnectivityAnalyzer::new(1e-3).group_connected_edges(&segments);
        assert_eq!(chains.len(), 1);

        let strict = EdgeConnectivityAnalyzer::new(1e-5).group_connected_edges(&segments);
        assert!(strict.is_empty());
    }

    #[test]
    fn reversed_fragments_still_chain() {
        let segments = [seg(1.0, 0.0, 0.0, 0.0), seg(1.0, 0.0, 2.0, 0.0)];
        let chains = EdgeConnectivityAnalyzer::default().group_connected_edges(&segments);
        assert_eq!(chains.len(), 1);
    }

    #[test]
    fn closed_loop_falls_back_to_first_and_last_segment() {
        let segments = [seg(0.0, 0.0, 5.0, 0.0), seg(5.0, 0.0, 0.0, 0.0)];
        let analyzer = EdgeConnectivityAnalyzer::default();
        let chains = analyzer.group_connected_edges(&segments);
        assert_eq!(chains.len(), 1);
        let (a, b) = analyzer.true_endpoints(&chains[0], &segments).unwrap();
        assert!(a.approx_eq(Point2::new(0.0, 0.0), 1e-9));
        assert!(b.approx_eq(Point2::new(0.0, 0.0), 1e-9));
    }

    #[test]
    fn every_segment_belongs_to_at_most_one_chain() {
        let segments = [
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 0.0, 2.0, 0.0),
            seg(5.0, 5.0, 5.0, 6.0),
            seg(5.0, 6.0, 5.0, 7.0),
            seg(9.0, 9.0, 12.0, 9.0),
        ];
        let chains = EdgeConnectivityAnalyzer::default().group_connected_edges(&segments);
        assert_eq!(chains.len(), 2);
        let mut seen: Vec<usize> = chains.iter().flat_map(|c| c.indices().to_vec()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_input_yields_no_chains() {
        assert!(EdgeConnectivityAnalyzer::default()
            .group_connected_edges(&[])
            .is_empty());
    }
}
