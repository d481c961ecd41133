//! Area covered by overlapping boundary parts.
//!
//! Summing per-part areas counts an overlap twice. Instead the window is cut
//! into vertical slabs at every vertex, every crossing of two edges and every
//! crossing of an edge with the window's top or bottom. No edge order changes
//! inside a slab, so the covered height is linear in x there and its value on
//! the slab's mid line gives the slab's area exactly.

use albedo_common::BoundingBox;

use crate::polygon::{Point, Polygon};

type Segment = (Point, Point);

/// Area of the union of `parts` inside `rect`.
pub(crate) fn union_area(parts: &[Polygon], rect: &BoundingBox) -> f64 {
    // Per part, every edge that spans some x inside the window. Edges above or
    // below the window still decide which side of a crossing is inside.
    let edges: Vec<Vec<Segment>> = parts
        .iter()
        .filter(|part| part.bbox().intersects(rect))
        .map(|part| {
            part.rings()
                .flat_map(|ring| ring.points().windows(2).map(|w| (w[0], w[1])))
                .filter(|(a, b)| a.0.max(b.0) > rect.min_x && a.0.min(b.0) < rect.max_x)
                .collect()
        })
        .collect();
    if edges.is_empty() {
        return 0.0;
    }

    let cuts = slab_cuts(&edges, rect);

    let mut area = 0.0;
    let mut crossings = Vec::new();
    let mut intervals = Vec::new();
    for pair in cuts.windows(2) {
        let (x0, x1) = (pair[0], pair[1]);
        if x1 - x0 <= 0.0 {
            continue;
        }
        let mid = 0.5 * (x0 + x1);

        intervals.clear();
        for part in &edges {
            crossings.clear();
            crossings.extend(part.iter().filter_map(|&(a, b)| y_at(a, b, mid)));
            crossings.sort_by(f64::total_cmp);
            // Even-odd: exterior and holes alternate along the mid line
            for span in crossings.chunks_exact(2) {
                let lo = span[0].max(rect.min_y);
                let hi = span[1].min(rect.max_y);
                if hi > lo {
                    intervals.push((lo, hi));
                }
            }
        }

        area += covered_length(&mut intervals) * (x1 - x0);
    }
    area
}

/// Sorted x positions where the covered height can stop being linear.
fn slab_cuts(edges: &[Vec<Segment>], rect: &BoundingBox) -> Vec<f64> {
    let all: Vec<Segment> = edges.iter().flatten().copied().collect();
    let mut cuts = vec![rect.min_x, rect.max_x];

    for &(a, b) in &all {
        cuts.push(a.0);
        cuts.push(b.0);
        for y in [rect.min_y, rect.max_y] {
            if let Some(x) = x_at(a, b, y) {
                cuts.push(x);
            }
        }
    }

    // Only crossings inside the window's y range change the clipped height.
    let near: Vec<Segment> = all
        .into_iter()
        .filter(|(a, b)| a.1.max(b.1) >= rect.min_y && a.1.min(b.1) <= rect.max_y)
        .collect();
    let west = |(a, b): Segment| a.0.min(b.0);
    let mut order: Vec<usize> = (0..near.len()).collect();
    order.sort_by(|&i, &j| west(near[i]).total_cmp(&west(near[j])));
    for (k, &i) in order.iter().enumerate() {
        let (a, b) = near[i];
        let east = a.0.max(b.0);
        for &j in &order[k + 1..] {
            if west(near[j]) > east {
                break;
            }
            let (c, d) = near[j];
            if let Some(x) = crossing_x(a, b, c, d) {
                cuts.push(x);
            }
        }
    }

    cuts.retain(|&x| x >= rect.min_x && x <= rect.max_x);
    cuts.sort_by(f64::total_cmp);
    cuts.dedup();
    cuts
}

/// Total length covered by a set of intervals.
fn covered_length(intervals: &mut [(f64, f64)]) -> f64 {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut total = 0.0;
    let mut current: Option<(f64, f64)> = None;
    for &(lo, hi) in intervals.iter() {
        match current {
            Some((start, end)) if lo <= end => current = Some((start, end.max(hi))),
            Some((start, end)) => {
                total += end - start;
                current = Some((lo, hi));
            }
            None => current = Some((lo, hi)),
        }
    }
    if let Some((start, end)) = current {
        total += end - start;
    }
    total
}

/// y of a non-vertical segment at `x`, strictly inside its x extent.
fn y_at(a: Point, b: Point, x: f64) -> Option<f64> {
    if a.0.min(b.0) < x && x < a.0.max(b.0) {
        Some(a.1 + (x - a.0) * (b.1 - a.1) / (b.0 - a.0))
    } else {
        None
    }
}

/// x where a segment crosses the horizontal line `y`.
fn x_at(a: Point, b: Point, y: f64) -> Option<f64> {
    if a.1.min(b.1) < y && y < a.1.max(b.1) {
        Some(a.0 + (y - a.1) * (b.0 - a.0) / (b.1 - a.1))
    } else {
        None
    }
}

/// x of the crossing point of two non-parallel segments.
fn crossing_x(a: Point, b: Point, c: Point, d: Point) -> Option<f64> {
    let r = (b.0 - a.0, b.1 - a.1);
    let s = (d.0 - c.0, d.1 - c.1);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom == 0.0 {
        return None;
    }
    let q = (c.0 - a.0, c.1 - a.1);
    let t = (q.0 * s.1 - q.1 * s.0) / denom;
    let u = (q.0 * r.1 - q.1 * r.0) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a.0 + t * r.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_polygon(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::from_rings(vec![vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]]).unwrap()
    }

    fn window() -> BoundingBox {
        BoundingBox::new(-100.0, -100.0, 100.0, 100.0)
    }

    #[test]
    fn test_single_part_matches_shoelace() {
        let part = Polygon::from_rings(vec![vec![(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)]]).unwrap();
        assert!((union_area(&[part], &window()) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_parts_count_once() {
        let part = rect_polygon(0.0, 0.0, 10.0, 10.0);
        let area = union_area(&[part.clone(), part], &window());
        assert!((area - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_overlap() {
        let parts = [rect_polygon(0.0, 0.0, 10.0, 10.0), rect_polygon(5.0, 5.0, 15.0, 15.0)];
        assert!((union_area(&parts, &window()) - 175.0).abs() < 1e-9);
        // window around the shared square only
        let shared = BoundingBox::new(5.0, 5.0, 10.0, 10.0);
        assert!((union_area(&parts, &shared) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_crossing_triangles() {
        // Two triangles whose slanted edges cross inside the window
        let up = Polygon::from_rings(vec![vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]]).unwrap();
        let down = Polygon::from_rings(vec![vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]]).unwrap();
        // union = 100 - the top wedge between the diagonals (25)
        assert!((union_area(&[up, down], &window()) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_hole_stays_uncovered_unless_another_part_fills_it() {
        let donut = Polygon::from_rings(vec![
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            vec![(3.0, 3.0), (7.0, 3.0), (7.0, 7.0), (3.0, 7.0)],
        ])
        .unwrap();
        assert!((union_area(&[donut.clone()], &window()) - 84.0).abs() < 1e-9);

        let plug = rect_polygon(2.0, 2.0, 8.0, 8.0);
        assert!((union_area(&[donut, plug], &window()) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_clips_edges_outside_it() {
        let parts = [rect_polygon(-50.0, -50.0, 50.0, 50.0), rect_polygon(0.0, 0.0, 60.0, 60.0)];
        let cell = BoundingBox::new(40.0, 40.0, 55.0, 55.0);
        assert!((union_area(&parts, &cell) - 225.0).abs() < 1e-9);
        assert_eq!(union_area(&parts, &BoundingBox::new(70.0, 70.0, 80.0, 80.0)), 0.0);
    }

    #[test]
    fn test_covered_length_merges_overlaps() {
        let mut spans = vec![(4.0, 6.0), (0.0, 2.0), (1.0, 3.0), (6.0, 7.0)];
        assert!((covered_length(&mut spans) - 6.0).abs() < 1e-12);
    }
}
