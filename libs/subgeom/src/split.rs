//! Decomposition of rectilinear polygons into rectangles.

use super::{Point, Polygon, Rect, Span};

/// Splits a rectilinear polygon into non-overlapping rectangles.
///
/// The polygon is cut into horizontal slabs at every distinct vertex y-coordinate.
/// Within a slab, the vertical edges crossing it are paired up using the even-odd rule.
/// Vertically adjacent slab pieces with identical horizontal extents are merged.
///
/// Returns an empty vector if the polygon is not rectilinear.
pub fn split_rectilinear(poly: &Polygon) -> Vec<Rect> {
    let points = dedup_closed(&poly.points);
    let poly = Polygon { points };
    if !poly.is_rectilinear() {
        return Vec::new();
    }

    let verticals: Vec<(i64, Span)> = poly
        .edges()
        .filter(|(a, b)| a.x == b.x && a.y != b.y)
        .map(|(a, b)| (a.x, Span::new(a.y, b.y)))
        .collect();

    let mut ys: Vec<i64> = poly.points.iter().map(|p| p.y).collect();
    ys.sort_unstable();
    ys.dedup();

    let mut out: Vec<Rect> = Vec::new();
    // Rectangles from the previous slab that may still grow upwards.
    let mut open: Vec<usize> = Vec::new();

    for w in ys.windows(2) {
        let slab = Span::new(w[0], w[1]);
        let mut xs: Vec<i64> = verticals
            .iter()
            .filter(|(_, span)| span.start() <= slab.start() && span.stop() >= slab.stop())
            .map(|(x, _)| *x)
            .collect();
        xs.sort_unstable();

        let mut next_open = Vec::with_capacity(xs.len() / 2);
        for pair in xs.chunks_exact(2) {
            let hspan = Span::new(pair[0], pair[1]);
            if hspan.length() == 0 {
                continue;
            }
            let grown = open.iter().copied().find(|&i| {
                let r: &Rect = &out[i];
                r.hspan() == hspan && r.top() == slab.start()
            });
            match grown {
                Some(i) => {
                    out[i].p1.y = slab.stop();
                    next_open.push(i);
                }
                None => {
                    out.push(Rect::from_spans(hspan, slab));
                    next_open.push(out.len() - 1);
                }
            }
        }
        open = next_open;
    }

    out
}

/// Removes consecutive duplicate points, including a repeated closing point.
fn dedup_closed(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}
