//! 按图纸幅面选择标准出图比例。

use autodim_config::PaperSize;
use tracing::debug;

use crate::errors::EngineError;

/// 标准比例阶梯，从小到大。
pub const STANDARD_SCALES: [f64; 8] = [0.1, 0.2, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0];

/// 横向放置时的图纸尺寸（宽, 高），单位毫米。
pub fn paper_dimensions(paper: PaperSize) -> (f64, f64) {
    match paper {
        PaperSize::A0 => (1189.0, 841.0),
        PaperSize::A1 => (841.0, 594.0),
        PaperSize::A2 => (594.0, 420.0),
        PaperSize::A3 => (420.0, 297.0),
        PaperSize::A4 => (297.0, 210.0),
        PaperSize::A5 => (210.0, 148.0),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AutoScaler;

impl AutoScaler {
    /// 向下吸附到标准比例，保证图形一定能放下；小于最小档时取最小档。
    pub fn snap_down(raw: f64) -> f64 {
        STANDARD_SCALES
            .iter()
            .rev()
            .copied()
            .find(|&scale| raw >= scale)
            .unwrap_or(STANDARD_SCALES[0])
    }

    /// `geometry` 为图形包围盒的（宽, 高）。某一方向尺寸为零时该方向的比例按 1.0 计。
    pub fn scale_for(geometry: (f64, f64), paper: PaperSize, margin_ratio: f64) -> f64 {
        let (paper_width, paper_height) = paper_dimensions(paper);
        let usable_width = paper_width * (1.0 - 2.0 * margin_ratio);
        let usable_height = paper_height * (1.0 - 2.0 * margin_ratio);

        let (width, height) = geometry;
        let scale_x = if width > 0.0 { usable_width / width } else { 1.0 };
        let scale_y = if height > 0.0 { usable_height / height } else { 1.0 };
        let raw = scale_x.min(scale_y);
        let snapped = Self::snap_down(raw);

        debug!(
            paper = %paper,
            width,
            height,
            raw,
            scale = snapped,
            "计算出图比例"
        );
        snapped
    }

    /// 按幅面名称计算比例。名称未知时返回 1.0。
    pub fn calculate_optimal_scale(geometry: (f64, f64), paper: &str, margin_ratio: f64) -> f64 {
        match paper.parse::<PaperSize>() {
            Ok(size) => Self::scale_for(geometry, size, margin_ratio),
            Err(_) => 1.0,
        }
    }

    /// 严格版本：未知幅面、非法边距或非法尺寸都返回错误。
    pub fn try_calculate_optimal_scale(
        geometry: (f64, f64),
        paper: &str,
        margin_ratio: f64,
    ) -> Result<f64, EngineError> {
        let size = paper
            .parse::<PaperSize>()
            .map_err(|_| EngineError::UnknownPaperSize(paper.to_string()))?;
        if !margin_ratio.is_finite() || !(0.0..0.5).contains(&margin_ratio) {
            return Err(EngineError::InvalidMargin(margin_ratio));
        }
        let (width, height) = geometry;
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(EngineError::InvalidGeometry { width, height });
        }
        Ok(Self::scale_for(geometry, size, margin_ratio))
    }
}
