pub mod classifier;
pub mod connectivity;
pub mod dedup;
pub mod dimensioner;
pub mod dimstyle;
pub mod report;
pub mod request;
pub mod scaler;
pub mod sink;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("unknown paper size {0}")]
        UnknownPaperSize(String),
        #[error("margin ratio {0} must lie in [0, 0.5)")]
        InvalidMargin(f64),
        #[error("invalid geometry extent {width} x {height}")]
        InvalidGeometry { width: f64, height: f64 },
    }

    /// 单次标注放置失败的原因。调用方记录后继续处理下一个特征。
    #[derive(Debug, Clone, Error, PartialEq)]
    pub enum PlacementError {
        #[error("degenerate geometry: {0}")]
        DegenerateGeometry(String),
        #[error("drawing sink rejected the dimension: {0}")]
        Rejected(String),
    }
}

pub use classifier::{GeometryClassifier, ProjectionView, ViewBuckets};
pub use connectivity::{Chain, EdgeConnectivityAnalyzer};
pub use dedup::DeduplicationState;
pub use dimensioner::SmartDimensioner;
pub use dimstyle::{DimStyle, StandardDimStyles};
pub use report::{DimensioningReport, SkipReason, SkippedFeature, ViewReport};
pub use request::{DimensionGeometry, DimensionKind, DimensionRequest};
pub use scaler::AutoScaler;
pub use sink::{DimensionSink, RecordingSink};
