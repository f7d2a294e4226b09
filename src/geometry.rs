//! Geometry helpers for turning annotations into crop-able regions.
//!
//! - [`reduce_to_quad`] collapses an arbitrary text polygon to the minimum
//!   area rotated rectangle, ordered to follow the polygon's own corners.
//! - [`rectify_crop`] un-warps a quadrilateral region into an upright crop.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::geometry::convex_hull;

use crate::constants::{MIN_RECTIFY_AREA, VERTICAL_CROP_RATIO};
use crate::model::Point;

/// Four corners of a text region.
pub type Quad = [Point; 4];

/// Signed shoelace area of a ring.
///
/// Positive for rings that run clockwise on screen (y pointing down).
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice as f64 / 2.0
}

/// Axis-aligned bounding box `[min_x, min_y, max_x, max_y]`.
pub fn bounding_box(points: &[Point]) -> Option<[i32; 4]> {
    let first = points.first()?;
    Some(points.iter().fold(
        [first.x, first.y, first.x, first.y],
        |[min_x, min_y, max_x, max_y], p| {
            [min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y)]
        },
    ))
}

/// Whether a closed ring has no two non-adjacent edges properly crossing.
pub fn is_simple_polygon(points: &[Point]) -> bool {
    let n = points.len();
    if n < 4 {
        return true;
    }
    for i in 0..n {
        let a1 = points[i];
        let a2 = points[(i + 1) % n];
        for j in (i + 2)..n {
            // First and last edges share the closing vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = points[j];
            let b2 = points[(j + 1) % n];
            if segments_cross(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

fn orientation(o: Point, a: Point, b: Point) -> i64 {
    let cross = i64::from(a.x - o.x) * i64::from(b.y - o.y)
        - i64::from(a.y - o.y) * i64::from(b.x - o.x);
    cross.signum()
}

fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);
    o1 * o2 < 0 && o3 * o4 < 0
}

/// Reduce a polygon to a quad suitable for cropping.
///
/// Quads are returned unchanged. Any other ring is replaced by its minimum
/// area bounding rectangle; of the rectangle's four cyclic orderings the one
/// closest to the polygon's first, middle-minus-one, middle and last points
/// is chosen, so a polygon traced along the top edge and back along the
/// bottom keeps its reading direction. Coordinates are truncated.
///
/// Returns `None` only for an empty polygon.
pub fn reduce_to_quad(polygon: &[Point]) -> Option<Quad> {
    let n = polygon.len();
    match n {
        0 => None,
        4 => Some([polygon[0], polygon[1], polygon[2], polygon[3]]),
        _ => {
            let rect = min_area_rect(polygon);
            let anchors = [
                polygon[0],
                polygon[(n / 2).saturating_sub(1)],
                polygon[n / 2],
                polygon[n - 1],
            ];

            let mut first_idx = 0;
            let mut min_dist = f64::INFINITY;
            for i in 0..4 {
                let dist: f64 = anchors
                    .iter()
                    .enumerate()
                    .map(|(k, anchor)| {
                        let (x, y) = rect[(i + k) % 4];
                        (x - f64::from(anchor.x)).hypot(y - f64::from(anchor.y))
                    })
                    .sum();
                if dist < min_dist {
                    min_dist = dist;
                    first_idx = i;
                }
            }

            Some(std::array::from_fn(|k| {
                let (x, y) = rect[(first_idx + k) % 4];
                Point::new(truncate(x), truncate(y))
            }))
        }
    }
}

/// Truncate toward zero, snapping values that are integral up to float noise.
fn truncate(v: f64) -> i32 {
    let rounded = v.round();
    if (v - rounded).abs() < 1e-6 {
        rounded as i32
    } else {
        v.trunc() as i32
    }
}

/// Minimum area rotated rectangle around a point set (rotating calipers).
///
/// Corners are returned in clockwise screen order. Collinear or tiny inputs
/// fall back to the axis-aligned bounding box.
fn min_area_rect(points: &[Point]) -> [(f64, f64); 4] {
    let input: Vec<imageproc::point::Point<i32>> = points
        .iter()
        .map(|p| imageproc::point::Point::new(p.x, p.y))
        .collect();
    let hull: Vec<(f64, f64)> = convex_hull(input.as_slice())
        .into_iter()
        .map(|p| (f64::from(p.x), f64::from(p.y)))
        .collect();

    if hull.len() < 3 {
        return axis_aligned_corners(points);
    }

    let n = hull.len();
    let mut best: Option<(f64, [(f64, f64); 4])> = None;

    // Try each edge of the hull as the base
    for i in 0..n {
        let (x1, y1) = hull[i];
        let (x2, y2) = hull[(i + 1) % n];
        let edge_len = (x2 - x1).hypot(y2 - y1);
        if edge_len < 1e-10 {
            continue;
        }

        let (ux, uy) = ((x2 - x1) / edge_len, (y2 - y1) / edge_len);
        let (vx, vy) = (-uy, ux);

        let mut min_u = f64::MAX;
        let mut max_u = f64::MIN;
        let mut min_v = f64::MAX;
        let mut max_v = f64::MIN;
        for &(px, py) in &hull {
            let (dx, dy) = (px - x1, py - y1);
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
            let corner = |u: f64, v: f64| (x1 + u * ux + v * vx, y1 + u * uy + v * vy);
            best = Some((
                area,
                [
                    corner(min_u, min_v),
                    corner(max_u, min_v),
                    corner(max_u, max_v),
                    corner(min_u, max_v),
                ],
            ));
        }
    }

    best.map_or_else(|| axis_aligned_corners(points), |(_, corners)| corners)
}

fn axis_aligned_corners(points: &[Point]) -> [(f64, f64); 4] {
    let [min_x, min_y, max_x, max_y] = bounding_box(points).unwrap_or([0; 4]);
    let (x0, y0, x1, y1) = (
        f64::from(min_x),
        f64::from(min_y),
        f64::from(max_x),
        f64::from(max_y),
    );
    [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
}

/// Perspective-crop the region bounded by `quad` into an upright image.
///
/// The crop is as wide as the longer of the top/bottom edges and as tall as
/// the longer of the left/right edges. Counter-clockwise quads are
/// re-ordered first so the crop is never mirrored, and crops at least
/// [`VERTICAL_CROP_RATIO`] times taller than wide are rotated to read
/// horizontally.
///
/// Returns `None` when the quad is degenerate (near-zero area or a
/// collapsed side) or when a side is longer than the image diagonal, which
/// only happens for quads reaching far outside the image.
pub fn rectify_crop(image: &RgbImage, quad: &Quad) -> Option<RgbImage> {
    let area = signed_area(quad);
    if area.abs() < f64::from(MIN_RECTIFY_AREA) {
        return None;
    }

    let mut pts: [(f32, f32); 4] = quad.map(|p| (p.x as f32, p.y as f32));
    if area < 0.0 {
        pts.swap(1, 3);
    }

    let dist = |a: (f32, f32), b: (f32, f32)| (a.0 - b.0).hypot(a.1 - b.1);
    let width = dist(pts[0], pts[1]).max(dist(pts[2], pts[3])) as u32;
    let height = dist(pts[0], pts[3]).max(dist(pts[1], pts[2])) as u32;
    if width == 0 || height == 0 {
        return None;
    }
    let diagonal = (image.width() as f32).hypot(image.height() as f32).ceil() as u32;
    if width > diagonal || height > diagonal {
        return None;
    }

    let (w, h) = (width as f32, height as f32);
    let target = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let projection = Projection::from_control_points(pts, target)?;

    let mut crop = RgbImage::new(width, height);
    warp_into(
        image,
        &projection,
        Interpolation::Bicubic,
        Rgb([0, 0, 0]),
        &mut crop,
    );

    if h / w >= VERTICAL_CROP_RATIO {
        crop = image::imageops::rotate270(&crop);
    }
    Some(crop)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_reduce_keeps_quads() {
        let quad = pts(&[(5, 5), (60, 8), (58, 30), (4, 28)]);
        let reduced = reduce_to_quad(&quad).unwrap();
        assert_eq!(reduced.to_vec(), quad);
    }

    #[test]
    fn test_reduce_rectangle_polygon() {
        // Traced along the top edge then back along the bottom edge
        let polygon = pts(&[(0, 0), (50, 0), (100, 0), (100, 40), (50, 40), (0, 40)]);
        let quad = reduce_to_quad(&polygon).unwrap();
        assert_eq!(quad.to_vec(), pts(&[(0, 0), (100, 0), (100, 40), (0, 40)]));
    }

    #[test]
    fn test_reduce_follows_polygon_start() {
        // Same rectangle, but the ring starts at the bottom-right corner
        let polygon = pts(&[(100, 40), (50, 40), (0, 40), (0, 0), (50, 0), (100, 0)]);
        let quad = reduce_to_quad(&polygon).unwrap();
        assert_eq!(quad[0], Point::new(100, 40));
        assert_eq!(quad[2], Point::new(0, 0));
    }

    #[test]
    fn test_reduce_encloses_polygon() {
        let polygon = pts(&[
            (10, 12),
            (40, 8),
            (80, 10),
            (120, 14),
            (121, 40),
            (80, 44),
            (40, 42),
            (9, 39),
        ]);
        let quad = reduce_to_quad(&polygon).unwrap();
        let [min_x, min_y, max_x, max_y] = bounding_box(&quad).unwrap();
        assert!(min_x <= 10 && max_x >= 120);
        assert!(min_y <= 9 && max_y >= 43);
        assert!(signed_area(&quad).abs() >= 0.9 * signed_area(&polygon).abs());
    }

    #[test]
    fn test_reduce_empty() {
        assert!(reduce_to_quad(&[]).is_none());
    }

    #[test]
    fn test_simple_polygon_detection() {
        assert!(is_simple_polygon(&pts(&[(0, 0), (10, 0), (10, 10), (0, 10)])));
        assert!(!is_simple_polygon(&pts(&[(0, 0), (10, 10), (10, 0), (0, 10)])));
    }

    #[test]
    fn test_bounding_box() {
        let bbox = bounding_box(&pts(&[(3, 9), (-2, 4), (7, 1)])).unwrap();
        assert_eq!(bbox, [-2, 1, 7, 9]);
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_rectify_axis_aligned() {
        let image = RgbImage::from_pixel(100, 50, Rgb([200, 10, 10]));
        let quad = [
            Point::new(10, 10),
            Point::new(70, 10),
            Point::new(70, 30),
            Point::new(10, 30),
        ];
        let crop = rectify_crop(&image, &quad).unwrap();
        assert_eq!(crop.dimensions(), (60, 20));
        assert_eq!(crop.get_pixel(30, 10), &Rgb([200, 10, 10]));
    }

    #[test]
    fn test_rectify_counter_clockwise_same_size() {
        let image = RgbImage::new(100, 50);
        let quad = [
            Point::new(10, 10),
            Point::new(10, 30),
            Point::new(70, 30),
            Point::new(70, 10),
        ];
        let crop = rectify_crop(&image, &quad).unwrap();
        assert_eq!(crop.dimensions(), (60, 20));
    }

    #[test]
    fn test_rectify_vertical_text_is_rotated() {
        let image = RgbImage::new(100, 100);
        let quad = [
            Point::new(10, 10),
            Point::new(20, 10),
            Point::new(20, 60),
            Point::new(10, 60),
        ];
        let crop = rectify_crop(&image, &quad).unwrap();
        assert_eq!(crop.dimensions(), (50, 10));
    }

    #[test]
    fn test_rectify_collinear_is_degenerate() {
        let image = RgbImage::new(100, 100);
        let quad = [
            Point::new(0, 0),
            Point::new(10, 10),
            Point::new(20, 20),
            Point::new(30, 30),
        ];
        assert!(rectify_crop(&image, &quad).is_none());
    }

    #[test]
    fn test_rectify_rejects_quad_larger_than_image() {
        let image = RgbImage::new(40, 30);
        let quad = [
            Point::new(-100_000, 0),
            Point::new(100_000, 0),
            Point::new(100_000, 20),
            Point::new(-100_000, 20),
        ];
        assert!(rectify_crop(&image, &quad).is_none());

        // A quad spanning the whole image still fits
        let full = [
            Point::new(0, 0),
            Point::new(40, 0),
            Point::new(40, 30),
            Point::new(0, 30),
        ];
        assert_eq!(rectify_crop(&image, &full).unwrap().dimensions(), (40, 30));
    }
}
