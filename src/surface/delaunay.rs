//! Incremental Delaunay triangulation (Bowyer-Watson).
//!
//! Points are inserted one at a time into a large enclosing triangle. For
//! each point the triangle containing it is found by walking from the last
//! triangle created, then the cavity of triangles whose circumcircle contains
//! the point is grown through edge neighbours, removed, and re-filled with a
//! fan around the new point. Triangles touching the enclosing vertices are
//! dropped at the end, leaving a triangulation of the convex hull.
//!
//! Callers are expected to pass distinct points scaled to a unit box; the
//! enclosing triangle is sized for that range.

use std::collections::{HashMap, HashSet};

use nalgebra::{Matrix2, Point2};

/// Half-width of the enclosing triangle relative to the unit box.
const ENCLOSING_SCALE: f64 = 1e3;

/// Barycentric slack for point-in-triangle tests on shared edges.
const BARYCENTRIC_TOL: f64 = 1e-10;

/// Twice the signed area below which a triangle is treated as degenerate.
const MIN_DOUBLE_AREA: f64 = 1e-14;

/// Directed edge; a counter-clockwise triangle owns its three edges.
type Edge = (usize, usize);

#[derive(Debug, Clone, Copy)]
struct Triangle {
    /// Vertex indices in counter-clockwise order.
    v: [usize; 3],
    center: Point2<f64>,
    radius_sq: f64,
}

impl Triangle {
    fn new(points: &[Point2<f64>], v: [usize; 3]) -> Option<Self> {
        let (center, radius_sq) = circumcircle(points[v[0]], points[v[1]], points[v[2]])?;
        Some(Self {
            v,
            center,
            radius_sq,
        })
    }

    fn in_circumcircle(&self, p: Point2<f64>) -> bool {
        (p - self.center).norm_squared() < self.radius_sq
    }
}

/// Edges of `v` in counter-clockwise order; edge `k` is opposite
/// vertex `(k + 2) % 3`.
fn edges(v: [usize; 3]) -> [Edge; 3] {
    [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])]
}

/// Twice the signed area of `(a, b, c)`; positive when counter-clockwise.
fn orient(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn circumcircle(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Option<(Point2<f64>, f64)> {
    let (bx, by) = (b.x - a.x, b.y - a.y);
    let (cx, cy) = (c.x - a.x, c.y - a.y);
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < MIN_DOUBLE_AREA {
        return None;
    }
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (cy * b_sq - by * c_sq) / d;
    let uy = (bx * c_sq - cx * b_sq) / d;
    Some((Point2::new(a.x + ux, a.y + uy), ux * ux + uy * uy))
}

/// Barycentric weights of `p` in triangle `(a, b, c)`.
pub(crate) fn barycentric(
    a: Point2<f64>,
    b: Point2<f64>,
    c: Point2<f64>,
    p: Point2<f64>,
) -> Option<[f64; 3]> {
    let m = Matrix2::new(b.x - a.x, c.x - a.x, b.y - a.y, c.y - a.y);
    let w = m.lu().solve(&(p - a))?;
    Some([1.0 - w.x - w.y, w.x, w.y])
}

fn inside(weights: &[f64; 3]) -> bool {
    weights.iter().all(|&w| w >= -BARYCENTRIC_TOL)
}

/// Working triangulation during insertion.
///
/// Freed slots are reused; `edges` maps each directed edge to the slot of
/// the triangle that owns it, so the neighbour across `(a, b)` owns `(b, a)`.
struct Mesh {
    points: Vec<Point2<f64>>,
    slots: Vec<Option<Triangle>>,
    free: Vec<usize>,
    edges: HashMap<Edge, usize>,
}

impl Mesh {
    fn add(&mut self, v: [usize; 3]) -> Option<usize> {
        let tri = Triangle::new(&self.points, v)?;
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(tri);
                slot
            }
            None => {
                self.slots.push(Some(tri));
                self.slots.len() - 1
            }
        };
        for e in edges(v) {
            self.edges.insert(e, slot);
        }
        Some(slot)
    }

    fn remove(&mut self, slot: usize) {
        if let Some(tri) = self.slots.get_mut(slot).and_then(Option::take) {
            for e in edges(tri.v) {
                self.edges.remove(&e);
            }
            self.free.push(slot);
        }
    }

    fn get(&self, slot: usize) -> Option<&Triangle> {
        self.slots.get(slot)?.as_ref()
    }

    fn neighbour(&self, (a, b): Edge) -> Option<usize> {
        self.edges.get(&(b, a)).copied()
    }

    fn contains(&self, tri: &Triangle, p: Point2<f64>) -> bool {
        edges(tri.v)
            .iter()
            .all(|&(a, b)| orient(self.points[a], self.points[b], p) >= 0.0)
    }

    /// Slot of a triangle containing `p`, walking from `start`.
    ///
    /// `None` when the walk leaves the mesh, i.e. `p` lies outside the
    /// enclosing triangle.
    fn find_containing(&self, p: Point2<f64>, start: usize) -> Option<usize> {
        let mut current = match self.get(start) {
            Some(_) => start,
            None => self.slots.iter().position(Option::is_some)?,
        };
        for _ in 0..self.slots.len() {
            let tri = self.get(current)?;
            let exit = edges(tri.v)
                .into_iter()
                .find(|&(a, b)| orient(self.points[a], self.points[b], p) < 0.0);
            match exit {
                None => return Some(current),
                Some(e) => current = self.neighbour(e)?,
            }
        }
        // Rounding can make the walk cycle on near-degenerate input.
        self.slots
            .iter()
            .position(|t| t.as_ref().is_some_and(|t| self.contains(t, p)))
    }

    /// Insert point `i`, whose containing triangle is `seed`.
    ///
    /// Returns the slot of one of the new triangles.
    fn insert(&mut self, i: usize, seed: usize) -> Option<usize> {
        let p = self.points[i];
        let seed_tri = *self.get(seed)?;
        if seed_tri.v.iter().any(|&k| self.points[k] == p) {
            return None;
        }

        let mut cavity = vec![seed];
        let mut in_cavity = HashSet::from([seed]);
        let mut boundary = Vec::new();
        let mut next = 0;
        while let Some(&ti) = cavity.get(next) {
            next += 1;
            let Some(tri) = self.get(ti).copied() else {
                continue;
            };
            for e in edges(tri.v) {
                match self.neighbour(e) {
                    Some(nj) if in_cavity.contains(&nj) => {}
                    Some(nj) if self.get(nj).is_some_and(|t| t.in_circumcircle(p)) => {
                        in_cavity.insert(nj);
                        cavity.push(nj);
                    }
                    _ => boundary.push(e),
                }
            }
        }

        for &ti in &cavity {
            self.remove(ti);
        }
        let mut created = None;
        for (a, b) in boundary {
            if orient(self.points[a], self.points[b], p) > MIN_DOUBLE_AREA
                && let Some(slot) = self.add([a, b, i])
            {
                created = Some(slot);
            }
        }
        created
    }
}

/// Delaunay triangulation of a 2-D point set.
#[derive(Debug, Clone)]
pub(crate) struct Triangulation {
    points: Vec<Point2<f64>>,
    triangles: Vec<[usize; 3]>,
    /// `neighbours[t][k]` is the triangle across edge `k` of triangle `t`.
    neighbours: Vec<[Option<usize>; 3]>,
    lower: Point2<f64>,
    upper: Point2<f64>,
}

impl Triangulation {
    /// Triangulate `points`.
    ///
    /// Returns `None` when no non-degenerate triangle exists (fewer than three
    /// points, or all points collinear). A point outside the enclosing
    /// triangle is left out.
    pub(crate) fn new(points: &[Point2<f64>]) -> Option<Self> {
        let n = points.len();
        if n < 3 {
            return None;
        }

        let mut all = points.to_vec();
        all.push(Point2::new(0.5 - 2.0 * ENCLOSING_SCALE, 0.5 - ENCLOSING_SCALE));
        all.push(Point2::new(0.5 + 2.0 * ENCLOSING_SCALE, 0.5 - ENCLOSING_SCALE));
        all.push(Point2::new(0.5, 0.5 + 2.0 * ENCLOSING_SCALE));

        let mut mesh = Mesh {
            points: all,
            slots: Vec::with_capacity(2 * n + 1),
            free: Vec::new(),
            edges: HashMap::with_capacity(6 * n + 3),
        };
        let mut hint = mesh.add([n, n + 1, n + 2])?;

        for (i, &p) in points.iter().enumerate() {
            let Some(seed) = mesh.find_containing(p, hint) else {
                #[cfg(feature = "logging")]
                tracing::debug!(
                    index = i,
                    x = p.x,
                    y = p.y,
                    "point outside enclosing triangle, left out of triangulation"
                );
                continue;
            };
            if let Some(slot) = mesh.insert(i, seed) {
                hint = slot;
            }
        }

        let triangles: Vec<[usize; 3]> = mesh
            .slots
            .into_iter()
            .flatten()
            .map(|t| t.v)
            .filter(|v| v.iter().all(|&idx| idx < n))
            .collect();
        if triangles.is_empty() {
            return None;
        }

        let owner: HashMap<Edge, usize> = triangles
            .iter()
            .enumerate()
            .flat_map(|(ti, &v)| edges(v).map(|e| (e, ti)))
            .collect();
        let neighbours = triangles
            .iter()
            .map(|&v| edges(v).map(|(a, b)| owner.get(&(b, a)).copied()))
            .collect();

        let mut lower = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut upper = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in triangles.iter().flatten().map(|&k| points[k]) {
            lower = Point2::new(lower.x.min(p.x), lower.y.min(p.y));
            upper = Point2::new(upper.x.max(p.x), upper.y.max(p.y));
        }

        Some(Self {
            points: points.to_vec(),
            triangles,
            neighbours,
            lower,
            upper,
        })
    }

    pub(crate) fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    fn weights(&self, t: usize, p: Point2<f64>) -> Option<[f64; 3]> {
        let v = self.triangles[t];
        barycentric(self.points[v[0]], self.points[v[1]], self.points[v[2]], p)
    }

    /// Triangle containing `p` and the barycentric weights of `p` in it.
    pub(crate) fn locate(&self, p: Point2<f64>) -> Option<([usize; 3], [f64; 3])> {
        let (t, w) = self.locate_from(p, 0)?;
        Some((self.triangles[t], w))
    }

    /// Index of the triangle containing `p` and the weights of `p` in it.
    ///
    /// Walks from triangle `start` towards `p`, stepping across the edge
    /// opposite the most negative weight. Nearby queries should pass the
    /// index returned for the previous one.
    pub(crate) fn locate_from(&self, p: Point2<f64>, start: usize) -> Option<(usize, [f64; 3])> {
        if p.x < self.lower.x - BARYCENTRIC_TOL
            || p.x > self.upper.x + BARYCENTRIC_TOL
            || p.y < self.lower.y - BARYCENTRIC_TOL
            || p.y > self.upper.y + BARYCENTRIC_TOL
        {
            return None;
        }

        let mut current = start.min(self.triangles.len() - 1);
        for _ in 0..self.triangles.len() {
            let Some(w) = self.weights(current, p) else {
                break;
            };
            if inside(&w) {
                return Some((current, w));
            }
            let mut k = 0;
            for j in 1..3 {
                if w[j] < w[k] {
                    k = j;
                }
            }
            match self.neighbours[current][(k + 1) % 3] {
                Some(next) => current = next,
                None => break,
            }
        }
        self.scan(p)
    }

    /// Exhaustive search, used when the walk leaves the hull or stalls.
    fn scan(&self, p: Point2<f64>) -> Option<(usize, [f64; 3])> {
        self.triangles.iter().enumerate().find_map(|(t, &v)| {
            let (a, b, c) = (self.points[v[0]], self.points[v[1]], self.points[v[2]]);
            let (lo_x, hi_x) = (a.x.min(b.x).min(c.x), a.x.max(b.x).max(c.x));
            let (lo_y, hi_y) = (a.y.min(b.y).min(c.y), a.y.max(b.y).max(c.y));
            if p.x < lo_x - BARYCENTRIC_TOL
                || p.x > hi_x + BARYCENTRIC_TOL
                || p.y < lo_y - BARYCENTRIC_TOL
                || p.y > hi_y + BARYCENTRIC_TOL
            {
                return None;
            }
            let w = barycentric(a, b, c, p)?;
            inside(&w).then_some((t, w))
        })
    }
}
