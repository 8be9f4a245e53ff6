use std::f64::consts::FRAC_PI_2;
use std::fs;
use std::path::PathBuf;

use autodim_config::DimensioningConfig;
use autodim_core::document::Entity;
use autodim_core::geometry::Point2;
use autodim_engine::{DimensionKind, GeometryClassifier, ProjectionView, SmartDimensioner};
use autodim_io::{DocumentLoader, DocumentSaver, DxfDimensionWriter, DxfFacade, IoError};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

fn count_kind(doc: &autodim_core::document::Document, kind: &str) -> usize {
    doc.entities()
        .filter(|(_, entity)| entity.kind_name() == kind)
        .count()
}

#[test]
fn load_three_views_keeps_supported_entities_only() {
    let doc = DxfFacade::new()
        .load(&fixture("three_views.dxf"))
        .expect("读取 DXF 失败");

    assert_eq!(count_kind(&doc, "LINE"), 14);
    assert_eq!(count_kind(&doc, "CIRCLE"), 2);
    assert_eq!(count_kind(&doc, "ARC"), 1);
    assert_eq!(doc.len(), 17);
    assert!(doc.layers().all(|layer| layer.name != "NOTES"));

    let arc = doc
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::Arc(arc) => Some(arc),
            _ => None,
        })
        .expect("未找到圆弧实体");
    assert!(arc.start_angle.abs() < 1e-12);
    assert!((arc.end_angle - FRAC_PI_2).abs() < 1e-12);
    assert_eq!(arc.layer, "VIEW_RIGHT");
}

#[test]
fn missing_file_is_a_read_error() {
    let err = DxfFacade::new()
        .load(&fixture("does_not_exist.dxf"))
        .expect_err("不存在的文件应当失败");
    assert!(matches!(err, IoError::ReadError { .. }));
}

#[test]
fn structural_errors_are_invalid_document() {
    let facade = DxfFacade::new();

    let bad_code = "0\nSECTION\n2\nENTITIES\nabc\nLINE\n0\nENDSEC\n0\nEOF\n";
    assert!(matches!(
        facade.parse_str(bad_code),
        Err(IoError::InvalidDocument(_))
    ));

    let missing_radius =
        "0\nSECTION\n2\nENTITIES\n0\nCIRCLE\n8\n0\n10\n1\n20\n1\n0\nENDSEC\n0\nEOF\n";
    match facade.parse_str(missing_radius) {
        Err(IoError::InvalidDocument(message)) => assert!(message.contains("半径")),
        other => panic!("unexpected result {other:?}"),
    }

    let unterminated = "0\nSECTION\n2\nENTITIES\n0\nLINE\n10\n0\n20\n0\n11\n5\n21\n0\n";
    assert!(facade.parse_str(unterminated).is_err());
}

#[test]
fn dimensioned_drawing_round_trips_through_writer() {
    let facade = DxfFacade::new();
    let doc = facade
        .load(&fixture("three_views.dxf"))
        .expect("读取 DXF 失败");

    let config = DimensioningConfig::default();
    let dimensioner = SmartDimensioner::new(&config);
    let mut writer = DxfDimensionWriter::new(config.geometric_tolerance);
    writer.register_style(dimensioner.style().clone());

    let buckets = GeometryClassifier::new().classify(&doc.entity_list());
    let report = dimensioner.dimension_projections(&buckets, &mut writer);

    // 主视图：长、高、孔径；俯视图与右视图的同值尺寸被抑制；右视图圆弧半径；轴测图一个夹角。
    assert_eq!(report.total(), 5);
    let front = report.view(ProjectionView::Front).expect("front report");
    assert_eq!(front.placed_count(), 3);
    assert_eq!(
        report.view(ProjectionView::Top).map(|v| v.placed_count()),
        Some(0)
    );
    let right = report.view(ProjectionView::Right).expect("right report");
    assert_eq!(right.count_of(DimensionKind::Radius), 1);
    let iso = report.view(ProjectionView::Iso).expect("iso report");
    assert_eq!(iso.count_of(DimensionKind::Angular), 1);
    assert!((iso.placed[0].measurement() - 45.0).abs() < 1e-9);
    assert_eq!(writer.dimensions().len(), report.total());

    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let output = dir.path().join("dimensioned.dxf");
    writer.save(&doc, &output).expect("写出 DXF 失败");

    let text = fs::read_to_string(&output).expect("读取输出失败");
    assert_eq!(text.matches("\nDIMENSION\n").count(), 5);
    assert!(text.contains("ISO_STANDARD"));
    assert!(text.trim_end().ends_with("EOF"));

    let reloaded = facade.load(&output).expect("重新读取输出失败");
    assert_eq!(reloaded.len(), doc.len());
    assert!(reloaded.layers().any(|layer| layer.name == "VIEW_ISO"));

    let original = doc.bounds().expect("bounds");
    let round_trip = reloaded.bounds().expect("bounds");
    assert!(original.min().approx_eq(round_trip.min(), 1e-9));
    assert!(original.max().approx_eq(round_trip.max(), 1e-9));
}

#[test]
fn facade_saves_plain_geometry() {
    let mut doc = autodim_core::document::Document::new();
    doc.add_line(Point2::new(0.0, 0.0), Point2::new(25.0, 0.0), "OUTLINE");
    doc.add_arc(Point2::new(5.0, 5.0), 2.0, 0.0, FRAC_PI_2, "OUTLINE");

    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("plain.dxf");
    DxfFacade::new().save(&doc, &path).expect("写出 DXF 失败");

    let text = fs::read_to_string(&path).expect("读取输出失败");
    assert!(!text.contains("\nDIMENSION\n"));
    assert!(!text.contains("DIMENSIONS"));

    let reloaded = DxfFacade::new().load(&path).expect("重新读取失败");
    assert_eq!(reloaded.len(), 2);
    let arc = reloaded
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::Arc(arc) => Some(arc),
            _ => None,
        })
        .expect("未找到圆弧实体");
    assert!((arc.end_angle - FRAC_PI_2).abs() < 1e-9);
}
