//! 读取 → 归零 → 分类 → 标注 → 写出 → 报告。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use autodim_config::{AppConfig, PaperSize};
use autodim_core::document::Document;
use autodim_engine::{
    AutoScaler, DimensioningReport, GeometryClassifier, ProjectionView, SmartDimensioner,
    ViewReport,
};
use autodim_io::{DocumentLoader, DxfDimensionWriter, DxfFacade};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScaleReport {
    pub paper: String,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub report: DimensioningReport,
    pub scale: Option<ScaleReport>,
}

impl RunSummary {
    /// 在标准输出打印各视图与总计的标注数量。
    pub fn print(&self) {
        for view in ProjectionView::PRIORITY {
            let count = self
                .report
                .view(view)
                .map(ViewReport::placed_count)
                .unwrap_or(0);
            println!("{view}: {count}");
        }
        println!("total: {}", self.report.total());
        if let Some(scale) = &self.scale {
            println!("scale ({}): {}", scale.paper, scale.scale);
        }
        println!("output: {}", self.output.display());
    }
}

#[derive(Serialize)]
struct ReportFile<'a> {
    input: &'a Path,
    output: &'a Path,
    style: &'a str,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_offset: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale: Option<&'a ScaleReport>,
    views: &'a [ViewReport],
}

/// `part.dxf` → `part_dimensioned.dxf`，与输入位于同一目录。
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "drawing".to_string());
    input.with_file_name(format!("{stem}_dimensioned.dxf"))
}

pub fn run(config: &AppConfig, options: &RunOptions) -> Result<RunSummary> {
    let mut document = DxfFacade::new()
        .load(&options.input)
        .with_context(|| format!("无法读取输入文件 {}", options.input.display()))?;
    if document.is_empty() {
        warn!(input = %options.input.display(), "输入文件中没有 LINE/CIRCLE/ARC 图元");
    }

    let origin_offset = if config.drawing.normalize_origin {
        document.normalize_to_origin().map(|offset| {
            debug!(dx = offset.x(), dy = offset.y(), "图形已平移到原点");
            [offset.x(), offset.y()]
        })
    } else {
        None
    };

    let buckets = GeometryClassifier::new().classify(&document.entity_list());
    let dimensioner = SmartDimensioner::new(&config.dimensioning);
    let mut writer = DxfDimensionWriter::new(config.dimensioning.geometric_tolerance);
    writer.register_style(dimensioner.style().clone());
    let report = dimensioner.dimension_projections(&buckets, &mut writer);

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&options.input));
    writer
        .save(&document, &output)
        .with_context(|| format!("无法写出 {}", output.display()))?;

    let scale = config
        .drawing
        .paper_size
        .map(|paper| compute_scale(&document, paper, config.drawing.margin_ratio));

    if let Some(path) = &options.report {
        let file = ReportFile {
            input: &options.input,
            output: &output,
            style: &report.style,
            total: report.total(),
            origin_offset,
            scale: scale.as_ref(),
            views: &report.views,
        };
        let json = serde_json::to_string_pretty(&file).context("无法序列化标注报告")?;
        fs::write(path, json).with_context(|| format!("无法写出报告 {}", path.display()))?;
        info!(path = %path.display(), "标注报告已写出");
    }

    Ok(RunSummary {
        output,
        report,
        scale,
    })
}

fn compute_scale(document: &Document, paper: PaperSize, margin_ratio: f64) -> ScaleReport {
    let (width, height) = document
        .bounds()
        .map(|bounds| (bounds.width(), bounds.height()))
        .unwrap_or((0.0, 0.0));
    let scale = AutoScaler::scale_for((width, height), paper, margin_ratio);
    info!(paper = %paper, width, height, scale, "出图比例");
    ScaleReport {
        paper: paper.name().to_string(),
        width,
        height,
        scale,
    }
}
