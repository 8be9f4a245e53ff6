//! 去重状态：记录已标注过的长度、半径、直径与角度签名。
//!
//! 状态在整份文档的视图折叠中显式传递，前序视图已标注的特征会抑制后续视图中的同值特征。
//! 角度集合例外，按视图分别记录。

use std::collections::{HashMap, HashSet};

use crate::classifier::ProjectionView;

/// 半径与直径比较时的绝对容差。
pub const RADIAL_TOLERANCE: f64 = 0.2;

/// 线段走向。只有水平与竖直两类参与长度标注。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// 四舍五入后的整数签名，避免直接对浮点数做哈希。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(i64);

impl DedupKey {
    /// 长度保留两位小数。
    #[inline]
    pub fn length(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    /// 角度保留一位小数。
    #[inline]
    pub fn angle(value: f64) -> Self {
        Self((value * 10.0).round() as i64)
    }
}

#[inline]
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Default)]
pub struct DeduplicationState {
    lengths: HashMap<Orientation, HashSet<DedupKey>>,
    radii: Vec<f64>,
    diameters: Vec<f64>,
    angles: HashMap<ProjectionView, HashSet<DedupKey>>,
}

impl DeduplicationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_length(&self, orientation: Orientation, length: f64) -> bool {
        self.lengths
            .get(&orientation)
            .is_some_and(|seen| seen.contains(&DedupKey::length(length)))
    }

    /// 记录长度签名，返回该签名此前是否未出现过。
    pub fn record_length(&mut self, orientation: Orientation, length: f64) -> bool {
        self.lengths
            .entry(orientation)
            .or_default()
            .insert(DedupKey::length(length))
    }

    pub fn has_radius(&self, radius: f64) -> bool {
        near_any(&self.radii, round1(radius))
    }

    pub fn record_radius(&mut self, radius: f64) {
        self.radii.push(round1(radius));
    }

    /// 直径按 `2 × radius` 比较。
    pub fn has_diameter(&self, diameter: f64) -> bool {
        near_any(&self.diameters, round1(diameter))
    }

    pub fn record_diameter(&mut self, diameter: f64) {
        self.diameters.push(round1(diameter));
    }

    pub fn has_angle(&self, view: ProjectionView, angle: f64) -> bool {
        self.angles
            .get(&view)
            .is_some_and(|seen| seen.contains(&DedupKey::angle(angle)))
    }

    pub fn record_angle(&mut self, view: ProjectionView, angle: f64) -> bool {
        self.angles
            .entry(view)
            .or_default()
            .insert(DedupKey::angle(angle))
    }

    pub fn length_count(&self) -> usize {
        self.lengths.values().map(HashSet::len).sum()
    }

    pub fn diameter_count(&self) -> usize {
        self.diameters.len()
    }

    pub fn angle_count(&self) -> usize {
        self.angles.values().map(HashSet::len).sum()
    }
}

fn near_any(seen: &[f64], value: f64) -> bool {
    seen.iter().any(|&v| (v - value).abs() < RADIAL_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_keys_round_to_two_decimals() {
        let mut state = DeduplicationState::new();
        assert!(state.record_length(Orientation::Horizontal, 25.004));
        assert!(state.has_length(Orientation::Horizontal, 24.996));
        assert!(!state.has_length(Orientation::Horizontal, 25.02));
        assert!(!state.has_length(Orientation::Vertical, 25.0));
        assert!(!state.record_length(Orientation::Horizontal, 25.0));
        assert_eq!(state.length_count(), 1);
    }

    #[test]
    fn radii_within_tolerance_are_duplicates() {
        let mut state = DeduplicationState::new();
        state.record_radius(10.05);
        assert!(state.has_radius(10.15));
        assert!(!state.has_radius(10.4));
        assert!(!state.has_diameter(20.1));
    }

    #[test]
    fn diameters_compare_on_rounded_value() {
        let mut state = DeduplicationState::new();
        state.record_diameter(8.0);
        assert!(state.has_diameter(8.14));
        assert!(!state.has_diameter(8.25));
        assert_eq!(state.diameter_count(), 1);
    }

    #[test]
    fn angles_are_tracked_per_view() {
        let mut state = DeduplicationState::new();
        assert!(state.record_angle(ProjectionView::Front, 45.0));
        assert!(state.has_angle(ProjectionView::Front, 45.04));
        assert!(!state.has_angle(ProjectionView::Top, 45.0));
        assert_eq!(state.angle_count(), 1);
    }
}
