//! WKT `POLYGON` / `MULTIPOLYGON` parsing.
//!
//! Accepts formats:
//! - `POLYGON((x1 y1, x2 y2, x3 y3, x1 y1), (hole...))`
//! - `MULTIPOLYGON(((ring1)),((ring2), (hole2)))`
//! - either of the above with an EWKT `SRID=...;` prefix
//!
//! A third ordinate (Z) is accepted and dropped.

use crate::error::{BoundaryError, BoundaryResult};
use crate::polygon::{Point, Polygon};

/// Parse WKT text into polygons.
pub fn parse_wkt(text: &str) -> BoundaryResult<Vec<Polygon>> {
    let text = strip_srid(text.trim());
    let upper = text.to_uppercase();

    if let Some(rest) = keyword_body(text, &upper, "MULTIPOLYGON") {
        let polygons = split_groups(strip_outer(rest)?)?
            .into_iter()
            .map(parse_polygon_body)
            .collect::<BoundaryResult<Vec<_>>>()?;
        if polygons.is_empty() {
            return Err(BoundaryError::InvalidWkt(
                "MULTIPOLYGON must contain at least one polygon".to_string(),
            ));
        }
        return Ok(polygons);
    }

    if let Some(rest) = keyword_body(text, &upper, "POLYGON") {
        return Ok(vec![parse_polygon_body(strip_outer(rest)?)?]);
    }

    Err(BoundaryError::InvalidWkt(
        "Expected POLYGON or MULTIPOLYGON format".to_string(),
    ))
}

fn strip_srid(text: &str) -> &str {
    if text.to_uppercase().starts_with("SRID=") {
        if let Some(idx) = text.find(';') {
            return text[idx + 1..].trim();
        }
    }
    text
}

/// Text after `keyword`, if `upper` starts with it.
fn keyword_body<'a>(text: &'a str, upper: &str, keyword: &str) -> Option<&'a str> {
    upper
        .starts_with(keyword)
        .then(|| text[keyword.len()..].trim())
}

/// Remove one pair of enclosing parentheses.
fn strip_outer(s: &str) -> BoundaryResult<&str> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("EMPTY") {
        return Err(BoundaryError::Empty);
    }
    if !s.starts_with('(') || !s.ends_with(')') || s.len() < 2 {
        return Err(BoundaryError::InvalidWkt(format!(
            "Expected parenthesized list, got '{}'",
            s
        )));
    }
    Ok(&s[1..s.len() - 1])
}

/// Contents of each top-level parenthesized group in a comma-separated list.
fn split_groups(s: &str) -> BoundaryResult<Vec<&str>> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(BoundaryError::InvalidWkt(
                        "Unbalanced closing parenthesis".to_string(),
                    ));
                }
                depth -= 1;
                if depth == 0 {
                    groups.push(&s[start..i]);
                }
            }
            ',' if depth == 0 => {}
            c if depth == 0 && !c.is_whitespace() => {
                return Err(BoundaryError::InvalidWkt(format!(
                    "Unexpected '{}' between groups",
                    c
                )));
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(BoundaryError::InvalidWkt(
            "Missing closing parenthesis".to_string(),
        ));
    }
    Ok(groups)
}

fn parse_polygon_body(body: &str) -> BoundaryResult<Polygon> {
    let rings = split_groups(body)?
        .into_iter()
        .map(parse_ring)
        .collect::<BoundaryResult<Vec<_>>>()?;
    Polygon::from_rings(rings)
}

/// Parse a single ring from its coordinate string.
fn parse_ring(coords_str: &str) -> BoundaryResult<Vec<Point>> {
    coords_str
        .split(',')
        .map(|pair| {
            let pair = pair.trim();
            let parts: Vec<&str> = pair.split_whitespace().collect();
            if parts.len() < 2 || parts.len() > 3 {
                return Err(BoundaryError::InvalidWkt(format!(
                    "Expected 'x y' format, got '{}'",
                    pair
                )));
            }

            let x: f64 = parts[0]
                .parse()
                .map_err(|_| BoundaryError::InvalidCoordinate(parts[0].to_string()))?;
            let y: f64 = parts[1]
                .parse()
                .map_err(|_| BoundaryError::InvalidCoordinate(parts[1].to_string()))?;
            Ok((x, y))
        })
        .collect()
}
