//! ASCII DXF 写出：原始几何加上自动生成的 DIMENSION 实体。

use std::fmt::{Display, Write as _};
use std::fs;
use std::path::Path;

use autodim_core::document::{Document, Entity};
use autodim_core::geometry::{Point2, Vector2};
use autodim_engine::dimstyle::DimTextVertical;
use autodim_engine::errors::PlacementError;
use autodim_engine::{DimStyle, DimensionGeometry, DimensionRequest, DimensionSink, StandardDimStyles};
use tracing::{debug, info};

use crate::IoError;

/// 标注实体统一放置的图层。
pub const DIMENSION_LAYER: &str = "DIMENSIONS";

const DEFAULT_TOLERANCE: f64 = 1e-6;

/// 图层引用的线型，在 LTYPE 表中定义。
const CONTINUOUS_LTYPE: &str = "CONTINUOUS";

/// DIMENSION 实体的类型组码（70）。
mod dim_type {
    pub const ALIGNED: i32 = 1;
    pub const DIAMETER: i32 = 3;
    pub const RADIUS: i32 = 4;
    pub const ANGULAR_3P: i32 = 5;
}

/// 作为绘图端收集标注请求，最后连同源几何一起写成 DXF。
#[derive(Debug, Clone)]
pub struct DxfDimensionWriter {
    tolerance: f64,
    styles: Vec<DimStyle>,
    dimensions: Vec<DimensionRequest>,
}

impl Default for DxfDimensionWriter {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl DxfDimensionWriter {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            styles: Vec::new(),
            dimensions: Vec::new(),
        }
    }

    /// 登记标注样式。同名样式以后登记的为准。
    pub fn register_style(&mut self, style: DimStyle) {
        self.styles.retain(|existing| existing.name != style.name);
        self.styles.push(style);
    }

    #[inline]
    pub fn dimensions(&self) -> &[DimensionRequest] {
        &self.dimensions
    }

    #[inline]
    pub fn styles(&self) -> &[DimStyle] {
        &self.styles
    }

    fn resolve_style(&mut self, name: &str) -> Result<(), PlacementError> {
        if self.styles.iter().any(|style| style.name == name) {
            return Ok(());
        }
        let preset = StandardDimStyles::by_name(name)
            .ok_or_else(|| PlacementError::Rejected(format!("unknown dimension style {name}")))?;
        self.styles.push(preset);
        Ok(())
    }

    pub fn to_dxf_string(&self, document: &Document) -> String {
        let mut out = String::new();

        pair(&mut out, 0, "SECTION");
        pair(&mut out, 2, "HEADER");
        pair(&mut out, 9, "$ACADVER");
        pair(&mut out, 1, "AC1009");
        pair(&mut out, 0, "ENDSEC");

        self.write_tables(&mut out, document);

        pair(&mut out, 0, "SECTION");
        pair(&mut out, 2, "ENTITIES");
        for (_, entity) in document.entities() {
            write_entity(&mut out, entity);
        }
        for request in &self.dimensions {
            write_dimension(&mut out, request);
        }
        pair(&mut out, 0, "ENDSEC");
        pair(&mut out, 0, "EOF");
        out
    }

    pub fn save(&self, document: &Document, path: &Path) -> Result<(), IoError> {
        let content = self.to_dxf_string(document);
        fs::write(path, content).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            entities = document.len(),
            dimensions = self.dimensions.len(),
            "DXF 已写出"
        );
        Ok(())
    }

    fn write_tables(&self, out: &mut String, document: &Document) {
        let mut layers: Vec<&str> = document.layers().map(|layer| layer.name.as_str()).collect();
        if !self.dimensions.is_empty() && !layers.contains(&DIMENSION_LAYER) {
            layers.push(DIMENSION_LAYER);
        }
        layers.sort_unstable();

        pair(out, 0, "SECTION");
        pair(out, 2, "TABLES");

        pair(out, 0, "TABLE");
        pair(out, 2, "LTYPE");
        pair(out, 70, 1);
        pair(out, 0, "LTYPE");
        pair(out, 2, CONTINUOUS_LTYPE);
        pair(out, 70, 0);
        pair(out, 3, "Solid line");
        pair(out, 72, 65);
        pair(out, 73, 0);
        pair(out, 40, 0.0);
        pair(out, 0, "ENDTAB");

        pair(out, 0, "TABLE");
        pair(out, 2, "LAYER");
        pair(out, 70, layers.len());
        for name in layers {
            pair(out, 0, "LAYER");
            pair(out, 2, name);
            pair(out, 70, 0);
            pair(out, 62, 7);
            pair(out, 6, CONTINUOUS_LTYPE);
        }
        pair(out, 0, "ENDTAB");

        pair(out, 0, "TABLE");
        pair(out, 2, "DIMSTYLE");
        pair(out, 70, self.styles.len());
        for style in &self.styles {
            write_dimstyle(out, style);
        }
        pair(out, 0, "ENDTAB");

        pair(out, 0, "ENDSEC");
    }
}

impl DimensionSink for DxfDimensionWriter {
    fn place(&mut self, request: &DimensionRequest) -> Result<(), PlacementError> {
        request.validate(self.tolerance)?;
        self.resolve_style(&request.style)?;
        debug!(kind = request.kind().name(), view = %request.view, "记录 DIMENSION 实体");
        self.dimensions.push(request.clone());
        Ok(())
    }
}

fn pair(out: &mut String, code: i32, value: impl Display) {
    // 写入 String 不会失败。
    let _ = write!(out, "{code:>3}\n{value}\n");
}

fn point(out: &mut String, base: i32, p: Point2) {
    pair(out, base, p.x());
    pair(out, base + 10, p.y());
    pair(out, base + 20, 0.0);
}

fn write_entity(out: &mut String, entity: &Entity) {
    match entity {
        Entity::Line(line) => {
            pair(out, 0, "LINE");
            pair(out, 8, &line.layer);
            point(out, 10, line.start);
            point(out, 11, line.end);
        }
        Entity::Circle(circle) => {
            pair(out, 0, "CIRCLE");
            pair(out, 8, &circle.layer);
            point(out, 10, circle.center);
            pair(out, 40, circle.radius);
        }
        Entity::Arc(arc) => {
            pair(out, 0, "ARC");
            pair(out, 8, &arc.layer);
            point(out, 10, arc.center);
            pair(out, 40, arc.radius);
            pair(out, 50, arc.start_angle.to_degrees());
            pair(out, 51, arc.end_angle.to_degrees());
        }
    }
}

fn write_dimstyle(out: &mut String, style: &DimStyle) {
    pair(out, 0, "DIMSTYLE");
    pair(out, 2, &style.name);
    pair(out, 70, 0);
    pair(out, 140, style.text_height);
    pair(out, 41, style.arrow_size);
    pair(out, 44, style.extension_line_extension);
    pair(out, 42, style.extension_line_offset);
    pair(out, 147, style.text_gap);
    let tad = match style.text_vertical {
        DimTextVertical::Above => 1,
        DimTextVertical::Centered => 0,
    };
    pair(out, 77, tad);
    pair(out, 73, i32::from(style.text_inside_horizontal));
    pair(out, 74, i32::from(style.text_outside_horizontal));
}

fn polar(center: Point2, radius: f64, degrees: f64) -> Point2 {
    let radians = degrees.to_radians();
    center.translate(Vector2::new(radius * radians.cos(), radius * radians.sin()))
}

fn write_dimension(out: &mut String, request: &DimensionRequest) {
    pair(out, 0, "DIMENSION");
    pair(out, 8, DIMENSION_LAYER);
    pair(out, 3, &request.style);

    match request.geometry {
        DimensionGeometry::Linear { p1, p2, offset } => {
            // 尺寸线沿 p1→p2 的左法向偏移 offset。
            let shift = p1
                .vector_to(p2)
                .normalize()
                .map(|dir| dir.perp().scale(offset))
                .unwrap_or(Vector2::new(0.0, 0.0));
            let line_end = p2.translate(shift);
            let text = p1.midpoint(p2).translate(shift);
            pair(out, 70, dim_type::ALIGNED);
            point(out, 10, line_end);
            point(out, 11, text);
            point(out, 13, p1);
            point(out, 14, p2);
        }
        DimensionGeometry::Angular { vertex, p1, p2 } => {
            let reach = vertex.distance_to(p1).min(vertex.distance_to(p2)) * 0.5;
            let bisector = vertex
                .vector_to(p1)
                .normalize()
                .zip(vertex.vector_to(p2).normalize())
                .and_then(|(u1, u2)| Vector2::new(u1.x() + u2.x(), u1.y() + u2.y()).normalize())
                .unwrap_or(Vector2::new(1.0, 0.0));
            let arc_point = vertex.translate(bisector.scale(reach));
            pair(out, 70, dim_type::ANGULAR_3P);
            point(out, 10, arc_point);
            point(out, 11, arc_point);
            point(out, 13, p1);
            point(out, 14, p2);
            point(out, 15, vertex);
        }
        DimensionGeometry::Diameter {
            center,
            radius,
            angle,
        } => {
            let near = polar(center, radius, angle);
            let far = polar(center, radius, angle + 180.0);
            pair(out, 70, dim_type::DIAMETER);
            point(out, 10, far);
            point(out, 11, center);
            point(out, 15, near);
        }
        DimensionGeometry::Radius {
            center,
            radius,
            angle,
        } => {
            let on_arc = polar(center, radius, angle);
            pair(out, 70, dim_type::RADIUS);
            point(out, 10, center);
            point(out, 11, center.midpoint(on_arc));
            point(out, 15, on_arc);
        }
    }

    // 角度的实测值（42）以弧度记录。
    let measurement = match request.geometry {
        DimensionGeometry::Angular { .. } => request.measurement().to_radians(),
        _ => request.measurement(),
    };
    pair(out, 42, measurement);
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodim_engine::ProjectionView;

    fn diameter(style: &str) -> DimensionRequest {
        DimensionRequest::new(
            ProjectionView::Front,
            style,
            DimensionGeometry::Diameter {
                center: Point2::new(5.0, 5.0),
                radius: 2.0,
                angle: 45.0,
            },
        )
    }

    #[test]
    fn unknown_style_is_rejected() {
        let mut writer = DxfDimensionWriter::default();
        assert!(matches!(
            writer.place(&diameter("Standard")),
            Err(PlacementError::Rejected(_))
        ));
        assert!(writer.place(&diameter("ISO_STANDARD")).is_ok());
        assert_eq!(writer.styles().len(), 1);
    }

    #[test]
    fn registered_style_overrides_preset() {
        let mut writer = DxfDimensionWriter::default();
        writer.register_style(StandardDimStyles::iso().with_text_height(5.0));
        writer.place(&diameter("ISO_STANDARD")).expect("placed");
        let text = writer.to_dxf_string(&Document::new());
        assert!(text.contains("140\n5\n"));
        assert!(text.contains("DIMSTYLE\n  2\nISO_STANDARD\n"));
    }

    #[test]
    fn aligned_dimension_offsets_along_left_normal() {
        let mut writer = DxfDimensionWriter::default();
        writer
            .place(&DimensionRequest::new(
                ProjectionView::Front,
                "ISO_STANDARD",
                DimensionGeometry::Linear {
                    p1: Point2::new(0.0, 0.0),
                    p2: Point2::new(10.0, 0.0),
                    offset: -15.0,
                },
            ))
            .expect("placed");
        let text = writer.to_dxf_string(&Document::new());
        // 定义点 (10, -15)
        assert!(text.contains(" 10\n10\n 20\n-15\n"));
        assert!(text.contains(" 70\n1\n"));
        assert!(text.contains(" 42\n10\n"));
        assert!(text.contains("  8\nDIMENSIONS\n"));
    }

    #[test]
    fn angular_measurement_is_written_in_radians() {
        let mut writer = DxfDimensionWriter::default();
        writer
            .place(&DimensionRequest::new(
                ProjectionView::Iso,
                "ISO_STANDARD",
                DimensionGeometry::Angular {
                    vertex: Point2::new(0.0, 0.0),
                    p1: Point2::new(10.0, 10.0),
                    p2: Point2::new(10.0, -10.0),
                },
            ))
            .expect("placed");
        let text = writer.to_dxf_string(&Document::new());
        let value: f64 = text
            .rsplit_once(" 42\n")
            .and_then(|(_, rest)| rest.lines().next())
            .and_then(|line| line.trim().parse().ok())
            .expect("group 42 present");
        assert!((value - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!(text.contains(" 70\n5\n"));
    }

    #[test]
    fn tables_stay_within_r12_codes() {
        let mut writer = DxfDimensionWriter::default();
        writer.register_style(StandardDimStyles::ansi());
        let mut doc = Document::new();
        doc.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), "OUTLINE");
        let text = writer.to_dxf_string(&doc);

        assert!(!text.contains("\n271\n"));
        let ltype = text.find("  2\nLTYPE\n").expect("LTYPE table");
        let layer = text.find("  2\nLAYER\n").expect("LAYER table");
        assert!(ltype < layer);
        assert!(text.contains("  0\nLTYPE\n  2\nCONTINUOUS\n"));
        assert!(text.contains("  6\nCONTINUOUS\n"));
    }
}
