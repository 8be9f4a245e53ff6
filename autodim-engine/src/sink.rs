//! 绘图端抽象：引擎只产出 [`DimensionRequest`]，由实现者负责落盘或渲染。

use crate::errors::PlacementError;
use crate::request::DimensionRequest;

const DEFAULT_TOLERANCE: f64 = 1e-6;

pub trait DimensionSink {
    /// 放置单个标注。返回错误表示该标注被拒绝，调用方记录后继续。
    fn place(&mut self, request: &DimensionRequest) -> Result<(), PlacementError>;
}

impl<S: DimensionSink + ?Sized> DimensionSink for &mut S {
    fn place(&mut self, request: &DimensionRequest) -> Result<(), PlacementError> {
        (**self).place(request)
    }
}

/// 只在内存中记录请求的绘图端，拒绝退化几何。
#[derive(Debug, Clone)]
pub struct RecordingSink {
    tolerance: f64,
    requests: Vec<DimensionRequest>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl RecordingSink {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            requests: Vec::new(),
        }
    }

    #[inline]
    pub fn requests(&self) -> &[DimensionRequest] {
        &self.requests
    }

    pub fn into_requests(self) -> Vec<DimensionRequest> {
        self.requests
    }
}

impl DimensionSink for RecordingSink {
    fn place(&mut self, request: &DimensionRequest) -> Result<(), PlacementError> {
        request.validate(self.tolerance)?;
        self.requests.push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ProjectionView;
    use crate::request::DimensionGeometry;
    use autodim_core::geometry::Point2;

    #[test]
    fn recording_sink_keeps_valid_requests_only() {
        let mut sink = RecordingSink::default();
        let good = DimensionRequest::new(
            ProjectionView::Top,
            "ISO_STANDARD",
            DimensionGeometry::Diameter {
                center: Point2::new(0.0, 0.0),
                radius: 2.0,
                angle: 45.0,
            },
        );
        let bad = DimensionRequest::new(
            ProjectionView::Top,
            "ISO_STANDARD",
            DimensionGeometry::Diameter {
                center: Point2::new(0.0, 0.0),
                radius: -1.0,
                angle: 45.0,
            },
        );

        assert!(sink.place(&good).is_ok());
        assert!(sink.place(&bad).is_err());
        assert_eq!(sink.requests().len(), 1);

        let by_ref: &mut RecordingSink = &mut sink;
        let mut forwarded = by_ref;
        assert!(forwarded.place(&good).is_ok());
        assert_eq!(sink.into_requests().len(), 2);
    }
}
