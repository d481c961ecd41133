//! Exact ring/cell intersection.
//!
//! Each ring is clipped against the cell's axis-aligned square with
//! Sutherland–Hodgman. The clip window is convex, so the result's area is
//! exact for any simple ring, convex or not.

use albedo_common::BoundingBox;

use crate::polygon::{shoelace, BoundaryPolygon, Point, Polygon, Ring};
use crate::union::union_area;

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Bottom(f64),
    Top(f64),
}

impl Edge {
    fn inside(&self, p: Point) -> bool {
        match *self {
            Edge::Left(x) => p.0 >= x,
            Edge::Right(x) => p.0 <= x,
            Edge::Bottom(y) => p.1 >= y,
            Edge::Top(y) => p.1 <= y,
        }
    }

    fn crossing(&self, a: Point, b: Point) -> Point {
        match *self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a.0) / (b.0 - a.0);
                (x, a.1 + t * (b.1 - a.1))
            }
            Edge::Bottom(y) | Edge::Top(y) => {
                let t = (y - a.1) / (b.1 - a.1);
                (a.0 + t * (b.0 - a.0), y)
            }
        }
    }
}

/// Clip a ring to a rectangle. Returns the (open) clipped vertex list.
pub fn clip_ring(ring: &Ring, rect: &BoundingBox) -> Vec<Point> {
    let points = ring.points();
    // Drop the closing duplicate; the algorithm wraps around on its own.
    let mut output: Vec<Point> = match points.split_last() {
        Some((last, rest)) if rest.first() == Some(last) => rest.to_vec(),
        _ => points.to_vec(),
    };

    for edge in [
        Edge::Left(rect.min_x),
        Edge::Right(rect.max_x),
        Edge::Bottom(rect.min_y),
        Edge::Top(rect.max_y),
    ] {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        for &current in &input {
            match (edge.inside(prev), edge.inside(current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(edge.crossing(prev, current)),
                (false, true) => {
                    output.push(edge.crossing(prev, current));
                    output.push(current);
                }
                (false, false) => {}
            }
            prev = current;
        }
    }

    output
}

/// Area of the part of `ring` inside `rect`.
pub fn ring_intersection_area(ring: &Ring, rect: &BoundingBox) -> f64 {
    let ring_box = ring.bbox();
    if !ring_box.intersects(rect) {
        return 0.0;
    }
    // Ring fully inside the cell: no clipping needed.
    if ring_box.min_x >= rect.min_x
        && ring_box.max_x <= rect.max_x
        && ring_box.min_y >= rect.min_y
        && ring_box.max_y <= rect.max_y
    {
        return ring.area();
    }
    shoelace(&clip_ring(ring, rect)).abs()
}

/// Area of a polygon (exterior minus holes) inside `rect`.
pub fn polygon_intersection_area(polygon: &Polygon, rect: &BoundingBox) -> f64 {
    let exterior = ring_intersection_area(&polygon.exterior, rect);
    if exterior <= 0.0 {
        return 0.0;
    }
    let holes: f64 = polygon
        .holes
        .iter()
        .map(|hole| ring_intersection_area(hole, rect))
        .sum();
    (exterior - holes).max(0.0)
}

impl BoundaryPolygon {
    /// Area of the boundary inside `rect`, clamped to the rectangle's own
    /// area. Ground shared by overlapping parts is counted once.
    pub fn intersection_area(&self, rect: &BoundingBox) -> f64 {
        let total = if self.has_overlapping_parts() {
            union_area(self.parts(), rect)
        } else {
            self.parts()
                .iter()
                .map(|part| polygon_intersection_area(part, rect))
                .sum()
        };
        total.clamp(0.0, rect.area())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[Point]) -> Ring {
        Ring::new(points.to_vec())
    }

    #[test]
    fn test_ring_inside_cell() {
        let r = ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)]);
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((ring_intersection_area(&r, &rect) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cell_inside_ring() {
        let r = ring(&[(-5.0, -5.0), (15.0, -5.0), (15.0, 15.0), (-5.0, 15.0)]);
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((ring_intersection_area(&r, &rect) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_overlap() {
        // Covers the left 30% of the cell
        let r = ring(&[(-5.0, -5.0), (3.0, -5.0), (3.0, 15.0), (-5.0, 15.0)]);
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((ring_intersection_area(&r, &rect) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_corner() {
        let r = ring(&[(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)]);
        let rect = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        // Region of the square below x + y = 20: half of the square
        assert!((ring_intersection_area(&r, &rect) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_concave_ring_clipped_exactly() {
        // U shape whose notch runs through the cell
        let r = ring(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (7.0, 10.0),
            (7.0, 3.0),
            (3.0, 3.0),
            (3.0, 10.0),
            (0.0, 10.0),
        ]);
        // Left half of the U: 5x10 minus the notch strip x in [3, 5], y in [3, 10]
        let rect = BoundingBox::new(0.0, 0.0, 5.0, 10.0);
        assert!((ring_intersection_area(&r, &rect) - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_and_touching() {
        let r = ring(&[(10.0, 0.0), (20.0, 0.0), (20.0, 10.0), (10.0, 10.0)]);
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(ring_intersection_area(&r, &rect), 0.0);
    }

    #[test]
    fn test_overlapping_parts_counted_once_per_cell() {
        let square = |x0: f64| {
            Polygon::from_rings(vec![vec![(x0, 0.0), (x0 + 10.0, 0.0), (x0 + 10.0, 10.0), (x0, 10.0)]])
                .unwrap()
        };
        let boundary = BoundaryPolygon::new(vec![square(0.0), square(5.0)]).unwrap();
        assert!(boundary.has_overlapping_parts());

        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((boundary.intersection_area(&rect) - 100.0).abs() < 1e-9);
        let east = BoundingBox::new(5.0, 0.0, 20.0, 10.0);
        assert!((boundary.intersection_area(&east) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hole_subtracted() {
        let polygon = Polygon::from_rings(vec![
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0)],
        ])
        .unwrap();
        let rect = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        assert!((polygon_intersection_area(&polygon, &rect) - 21.0).abs() < 1e-9);
    }
}
