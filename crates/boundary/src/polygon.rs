//! Boundary polygon model and validation.

use albedo_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::{BoundaryError, BoundaryResult};
use crate::union::union_area;

/// A coordinate pair in map units.
pub type Point = (f64, f64);

/// A closed ring. The first point is repeated at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Point>", into = "Vec<Point>")]
pub struct Ring(Vec<Point>);

impl Ring {
    /// Wrap a point list, dropping repeated consecutive vertices and closing
    /// it if the last point differs from the first.
    pub fn new(mut points: Vec<Point>) -> Self {
        points.dedup();
        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
            if first != last {
                points.push(first);
            }
        }
        Self(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Number of points including the closing point.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shoelace area, positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        shoelace(&self.0)
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for &(x, y) in &self.0 {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox
    }

    /// Check if a point is inside the ring using ray casting.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let n = self.0.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;

        for i in 0..n {
            let (xi, yi) = self.0[i];
            let (xj, yj) = self.0[j];

            if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    /// A pair of non-adjacent edges that touch or cross, if any, lower
    /// index first.
    ///
    /// Edges are swept west to east, so only pairs whose x extents overlap
    /// are tested.
    pub fn find_self_intersection(&self) -> Option<(usize, usize)> {
        let edges = self.0.len().saturating_sub(1);
        let edge = |i: usize| (self.0[i], self.0[i + 1]);
        let west = |i: usize| self.0[i].0.min(self.0[i + 1].0);

        let mut order: Vec<usize> = (0..edges).collect();
        order.sort_by(|&i, &j| west(i).total_cmp(&west(j)));

        for (k, &i) in order.iter().enumerate() {
            let (a, b) = edge(i);
            let east = a.0.max(b.0);
            let (south, north) = (a.1.min(b.1), a.1.max(b.1));
            for &j in &order[k + 1..] {
                if west(j) > east {
                    break;
                }
                let (lo, hi) = (i.min(j), i.max(j));
                // neighbours share a vertex, as do the first and last edge
                if hi - lo == 1 || (lo == 0 && hi == edges - 1) {
                    continue;
                }
                let (c, d) = edge(j);
                if c.1.max(d.1) < south || c.1.min(d.1) > north {
                    continue;
                }
                if segments_intersect(a, b, c, d) {
                    return Some((lo, hi));
                }
            }
        }
        None
    }

    fn validate(&self, index: usize) -> BoundaryResult<()> {
        if self.0.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(BoundaryError::NonFinite { ring: index });
        }
        if self.0.len() < 4 {
            return Err(BoundaryError::TooFewPoints {
                ring: index,
                points: self.0.len(),
            });
        }
        if let Some((first, second)) = self.find_self_intersection() {
            return Err(BoundaryError::SelfIntersecting {
                ring: index,
                first,
                second,
            });
        }
        if self.area() <= f64::EPSILON {
            return Err(BoundaryError::ZeroArea { ring: index });
        }
        Ok(())
    }
}

impl From<Vec<Point>> for Ring {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl From<Ring> for Vec<Point> {
    fn from(ring: Ring) -> Self {
        ring.0
    }
}

/// One polygon: an exterior ring and zero or more holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Ring,
    #[serde(default)]
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Build from raw rings; the first is the exterior.
    pub fn from_rings(rings: Vec<Vec<Point>>) -> BoundaryResult<Self> {
        let mut rings = rings.into_iter().map(Ring::new);
        let exterior = rings.next().ok_or(BoundaryError::Empty)?;
        Ok(Self::new(exterior, rings.collect()))
    }

    /// Exterior area minus hole areas.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(Ring::area).sum();
        (self.exterior.area() - holes).max(0.0)
    }

    pub fn bbox(&self) -> BoundingBox {
        self.exterior.bbox()
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.exterior.contains_point(x, y) && !self.holes.iter().any(|h| h.contains_point(x, y))
    }

    pub(crate) fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }
}

/// The region of interest: one or more polygons, validated on construction.
///
/// Parts may overlap, as when a feature collection lists the same outline
/// twice. Area is always that of the covered region, so shared ground is
/// counted once both here and per cell (see [`Self::intersection_area`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundaryParts", into = "BoundaryParts")]
pub struct BoundaryPolygon {
    parts: Vec<Polygon>,
    area: f64,
    overlapping: bool,
}

/// Serialized form: just the parts. Derived state is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct BoundaryParts {
    parts: Vec<Polygon>,
}

impl TryFrom<BoundaryParts> for BoundaryPolygon {
    type Error = BoundaryError;

    fn try_from(raw: BoundaryParts) -> BoundaryResult<Self> {
        Self::new(raw.parts)
    }
}

impl From<BoundaryPolygon> for BoundaryParts {
    fn from(boundary: BoundaryPolygon) -> Self {
        Self {
            parts: boundary.parts,
        }
    }
}

impl BoundaryPolygon {
    /// Validate and wrap a set of polygons.
    pub fn new(parts: Vec<Polygon>) -> BoundaryResult<Self> {
        if parts.is_empty() {
            return Err(BoundaryError::Empty);
        }
        for (index, ring) in parts.iter().flat_map(Polygon::rings).enumerate() {
            ring.validate(index)?;
        }

        let summed: f64 = parts.iter().map(Polygon::area).sum();
        let (area, overlapping) = if parts_may_overlap(&parts) {
            let extent = bbox_of(&parts);
            let union = union_area(&parts, &extent);
            if union < summed * (1.0 - 1e-9) {
                (union, true)
            } else {
                (summed, false)
            }
        } else {
            (summed, false)
        };

        Ok(Self {
            parts,
            area,
            overlapping,
        })
    }

    pub fn parts(&self) -> &[Polygon] {
        &self.parts
    }

    pub fn ring_count(&self) -> usize {
        self.parts.iter().map(|p| 1 + p.holes.len()).sum()
    }

    /// Area of the region covered by at least one part.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Whether some parts share ground.
    pub fn has_overlapping_parts(&self) -> bool {
        self.overlapping
    }

    pub fn bbox(&self) -> BoundingBox {
        bbox_of(&self.parts)
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.parts.iter().any(|p| p.contains_point(x, y))
    }

    /// Upper bound on the number of cells this boundary can meaningfully
    /// contain: `floor(area / cell_area) + 1`.
    pub fn max_cell_count(&self, cell_area: f64) -> usize {
        if cell_area <= 0.0 {
            return 0;
        }
        (self.area() / cell_area).floor() as usize + 1
    }
}

fn bbox_of(parts: &[Polygon]) -> BoundingBox {
    parts
        .iter()
        .map(Polygon::bbox)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0))
}

/// Whether any two parts' extents overlap with positive area.
fn parts_may_overlap(parts: &[Polygon]) -> bool {
    let boxes: Vec<BoundingBox> = parts.iter().map(Polygon::bbox).collect();
    boxes
        .iter()
        .enumerate()
        .any(|(i, a)| boxes[i + 1..].iter().any(|b| a.intersects(b)))
}

/// Shoelace formula over a closed or open point list.
pub(crate) fn shoelace(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let (x1, y1) = points[i];
        let (x2, y2) = points[(i + 1) % n];
        sum += x1 * y2 - x2 * y1;
    }
    sum / 2.0
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let d1 = orientation(p3, p4, p1);
    let d2 = orientation(p3, p4, p2);
    let d3 = orientation(p1, p2, p3);
    let d4 = orientation(p1, p2, p4);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(p3, p4, p1))
        || (d2 == 0.0 && on_segment(p3, p4, p2))
        || (d3 == 0.0 && on_segment(p1, p2, p3))
        || (d4 == 0.0 && on_segment(p1, p2, p4))
}
