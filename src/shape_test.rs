#![allow(clippy::float_cmp)]

use super::*;

// --- ColorValue wire shape ---

#[test]
fn color_value_null_is_unset() {
    let c: ColorValue = serde_json::from_str("null").unwrap();
    assert_eq!(c, ColorValue::Unset);
}

#[test]
fn color_value_number_is_int() {
    let c: ColorValue = serde_json::from_str("16711680").unwrap();
    assert_eq!(c, ColorValue::Int(0x00FF_0000));
}

#[test]
fn color_value_string_is_encoded() {
    let c: ColorValue = serde_json::from_str("\"#00ff00\"").unwrap();
    assert_eq!(c, ColorValue::Encoded("#00ff00".into()));
}

#[test]
fn color_value_serializes_untagged() {
    assert_eq!(serde_json::to_string(&ColorValue::Unset).unwrap(), "null");
    assert_eq!(serde_json::to_string(&ColorValue::Int(7)).unwrap(), "7");
    assert_eq!(serde_json::to_string(&ColorValue::Encoded("abc".into())).unwrap(), "\"abc\"");
}

// --- ColorValue::to_rgb ---

#[test]
fn to_rgb_masks_alpha_from_int() {
    assert_eq!(ColorValue::Int(0x7F11_2233).to_rgb(), Some(0x0011_2233));
}

#[test]
fn to_rgb_parses_hex_with_or_without_hash() {
    assert_eq!(ColorValue::Encoded("#0000ff".into()).to_rgb(), Some(0x0000_00FF));
    assert_eq!(ColorValue::Encoded("ff0000".into()).to_rgb(), Some(0x00FF_0000));
}

#[test]
fn to_rgb_rejects_malformed_strings() {
    assert_eq!(ColorValue::Encoded("#fff".into()).to_rgb(), None);
    assert_eq!(ColorValue::Encoded("zzzzzz".into()).to_rgb(), None);
    assert_eq!(ColorValue::Unset.to_rgb(), None);
}

// --- Component ---

#[test]
fn component_deserializes_collection_fields() {
    let json = serde_json::json!({
        "_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
        "shape": "circle",
        "left": 1.0,
        "top": 2.0,
        "right": 3.0,
        "bottom": 4.0,
        "strokeWidth": 2.5,
        "strokeColor": 255,
        "fillColor": null
    });
    let c: Component = serde_json::from_value(json).unwrap();
    assert_eq!(c.shape, ShapeKind::Circle);
    assert_eq!(c.stroke_width, 2.5);
    assert_eq!(c.stroke_color, ColorValue::Int(255));
    assert_eq!(c.fill_color, ColorValue::Unset);
    assert!(c.points.is_empty());
    assert_eq!(c.bounds(), BoundingBox::new(1.0, 2.0, 3.0, 4.0));
}

#[test]
fn unknown_shape_kind_falls_back() {
    let kind: ShapeKind = serde_json::from_str("\"hexagon\"").unwrap();
    assert_eq!(kind, ShapeKind::Unknown);
}

#[test]
fn fit_to_points_covers_every_point() {
    let mut c = Component::rectangle(0.0, 0.0, 0.0, 0.0);
    c.shape = ShapeKind::Path;
    c.points = vec![Point::new(5.0, -3.0), Point::new(-2.0, 8.0), Point::new(1.0, 1.0)];
    c.fit_to_points();
    assert_eq!(c.bounds(), BoundingBox::new(-2.0, -3.0, 5.0, 8.0));
}

#[test]
fn fit_to_points_without_points_is_noop() {
    let mut c = Component::rectangle(1.0, 2.0, 3.0, 4.0);
    c.fit_to_points();
    assert_eq!(c.bounds(), BoundingBox::new(1.0, 2.0, 3.0, 4.0));
}
