//! Comprehensive tests for BoundingBox operations.

use overlay_common::bbox::BoundingBox;

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.min_x, -180.0);
    assert_eq!(bbox.min_y, -90.0);
    assert_eq!(bbox.max_x, 180.0);
    assert_eq!(bbox.max_y, 90.0);
}

#[test]
fn test_bbox_clone() {
    let bbox1 = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let bbox2 = bbox1;
    assert_eq!(bbox1, bbox2);
}

#[test]
fn test_bbox_from_point_is_degenerate() {
    let bbox = BoundingBox::from_point(3.5, -2.0);
    assert_eq!(bbox.width(), 0.0);
    assert_eq!(bbox.height(), 0.0);
    assert!(bbox.contains_point(3.5, -2.0));
}

// ============================================================================
// from_points / extend tests
// ============================================================================

#[test]
fn test_from_points_corner_order_irrelevant() {
    let a = BoundingBox::from_points([(10.0, 0.0), (0.0, 10.0)]).unwrap();
    let b = BoundingBox::from_points([(0.0, 10.0), (10.0, 0.0)]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn test_from_points_all_non_finite() {
    let bbox = BoundingBox::from_points([(f64::NAN, 1.0), (f64::INFINITY, 2.0)]);
    assert!(bbox.is_none());
}

#[test]
fn test_extend_grows_only() {
    let mut bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    bbox.extend(5.0, 5.0);
    assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    bbox.extend(-5.0, 20.0);
    assert_eq!(bbox, BoundingBox::new(-5.0, 0.0, 10.0, 20.0));
}

// ============================================================================
// Dimension tests
// ============================================================================

#[test]
fn test_bbox_dimensions() {
    let bbox = BoundingBox::new(-125.0, 24.0, -66.0, 50.0);
    assert!((bbox.width() - 59.0).abs() < 1e-10);
    assert!((bbox.height() - 26.0).abs() < 1e-10);
}

#[test]
fn test_bbox_center() {
    let bbox = BoundingBox::new(-20037508.34, -20037508.34, 20037508.34, 20037508.34);
    let (cx, cy) = bbox.center();
    assert!(cx.abs() < 1e-6);
    assert!(cy.abs() < 1e-6);
}

// ============================================================================
// Intersection tests
// ============================================================================

#[test]
fn test_touching_boxes_do_not_intersect() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    assert!(!a.intersects(&b));
    assert!(a.intersection(&b).is_none());
}

#[test]
fn test_contained_box_intersection_is_inner() {
    let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
    let inner = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
    assert_eq!(outer.intersection(&inner), Some(inner));
    assert_eq!(inner.intersection(&outer), Some(inner));
}

#[test]
fn test_contains_point_edges() {
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(1.0, 1.0));
    assert!(!bbox.contains_point(1.0001, 0.5));
}
