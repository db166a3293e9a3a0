//! Hole detection and filling.
//!
//! A hole is a closed loop of boundary edges (edges with only one adjacent
//! face). Boundary edges are grouped into connected components; a component
//! whose every vertex has exactly two boundary neighbours is a simple loop,
//! anything else is reported as a complex boundary and never filled.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex};
//! use mesh_repair::{MeshAdjacency, holes::{detect_holes, fill_holes}};
//!
//! // A flat quad: its outline is one 4-vertex hole
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//! mesh.faces.push([0, 2, 3]);
//!
//! let adjacency = MeshAdjacency::for_mesh(&mesh).unwrap();
//! let boundary = detect_holes(&mesh, &adjacency);
//! assert_eq!(boundary.loops.len(), 1);
//! assert_eq!(boundary.loops[0].edge_count(), 4);
//!
//! let report = fill_holes(&mut mesh, None).unwrap();
//! assert_eq!(report.filled, 1);
//! assert_eq!(mesh.faces.len(), 4);
//! ```

use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, Point3, Vector3};
use tracing::{debug, info, warn};

use crate::adjacency::{Edge, MeshAdjacency, face_edges};
use crate::error::RepairResult;
use crate::issue::{Issue, IssueKind};

/// Below this |cos| between the adjacent-face normal and the loop's own
/// normal, the adjacent-face average is considered edge-on.
const EDGE_ON_COSINE: f64 = 0.1;

/// A boundary loop representing a hole in the mesh.
///
/// Vertices are ordered along the winding of the faces that own the
/// boundary edges, starting at the smallest index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLoop {
    /// Ordered list of vertex indices forming the loop.
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges (and vertices) in the loop.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    /// Iterate over the loop's edges in order, closing back to the start.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// Boundary structure of a mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryAnalysis {
    /// Simple closed loops, sorted by their first vertex.
    pub loops: Vec<BoundaryLoop>,
    /// Vertex sets (sorted) of branching boundary components.
    pub complex: Vec<Vec<u32>>,
    /// Number of isolated triangles whose own outline was skipped.
    pub isolated_triangles: usize,
}

impl BoundaryAnalysis {
    /// `hole` issues, one per loop.
    #[must_use]
    pub fn hole_issues(&self) -> Vec<Issue> {
        self.loops.iter().map(hole_issue).collect()
    }

    /// `complex_boundary` issues, one per branching component.
    #[must_use]
    pub fn complex_issues(&self) -> Vec<Issue> {
        self.complex.iter().map(|vertices| complex_issue(vertices)).collect()
    }
}

/// Detect all boundary loops (holes) in the mesh.
///
/// The three-edge outline of a triangle that shares no edge with any other
/// face is not a hole: it is counted in
/// [`BoundaryAnalysis::isolated_triangles`] and left alone.
///
/// The walk is iterative with a visited set, so adversarial inputs with
/// many small loops cannot exhaust the stack.
#[must_use]
pub fn detect_holes(mesh: &IndexedMesh, adjacency: &MeshAdjacency) -> BoundaryAnalysis {
    // Directed boundary edges, oriented along their owning face
    let mut directed: HashSet<(u32, u32)> = HashSet::new();
    let mut owner: HashMap<Edge, usize> = HashMap::new();
    let mut neighbours: HashMap<u32, Vec<u32>> = HashMap::new();

    for ((a, b), face) in adjacency.boundary_edges() {
        let forward = face_edges(mesh.faces[face]).contains(&(a, b));
        directed.insert(if forward { (a, b) } else { (b, a) });
        owner.insert((a, b), face);
        neighbours.entry(a).or_default().push(b);
        neighbours.entry(b).or_default().push(a);
    }

    if neighbours.is_empty() {
        return BoundaryAnalysis::default();
    }

    debug!(boundary_edges = owner.len(), "Grouping boundary edges");

    let mut starts: Vec<u32> = neighbours.keys().copied().collect();
    starts.sort_unstable();

    let mut visited: HashSet<u32> = HashSet::with_capacity(starts.len());
    let mut analysis = BoundaryAnalysis::default();

    for &start in &starts {
        if visited.contains(&start) {
            continue;
        }

        let component = collect_component(start, &neighbours, &mut visited);
        let simple = component
            .iter()
            .all(|v| neighbours.get(v).is_some_and(|n| n.len() == 2));

        if !simple {
            let mut sorted = component;
            sorted.sort_unstable();
            analysis.complex.push(sorted);
            continue;
        }

        // `start` is the smallest vertex of its component
        let vertices = walk_loop(start, &neighbours, &directed);
        let boundary = BoundaryLoop { vertices };

        if is_isolated_triangle(&boundary, &owner) {
            analysis.isolated_triangles += 1;
        } else {
            analysis.loops.push(boundary);
        }
    }

    info!(
        holes = analysis.loops.len(),
        complex = analysis.complex.len(),
        sizes = ?analysis.loops.iter().map(BoundaryLoop::edge_count).collect::<Vec<_>>(),
        "Detected boundary loops"
    );

    analysis
}

/// Breadth-first collection of one boundary component.
fn collect_component(
    start: u32,
    neighbours: &HashMap<u32, Vec<u32>>,
    visited: &mut HashSet<u32>,
) -> Vec<u32> {
    let mut component = vec![start];
    visited.insert(start);
    let mut cursor = 0;

    while let Some(&v) = component.get(cursor) {
        cursor += 1;
        for &n in ring(neighbours, v) {
            if visited.insert(n) {
                component.push(n);
            }
        }
    }

    component
}

/// Walk a simple cycle starting at `start`, following face winding.
fn walk_loop(
    start: u32,
    neighbours: &HashMap<u32, Vec<u32>>,
    directed: &HashSet<(u32, u32)>,
) -> Vec<u32> {
    let first = match ring(neighbours, start) {
        [a, b] => {
            if directed.contains(&(start, *a)) {
                *a
            } else if directed.contains(&(start, *b)) {
                *b
            } else {
                // Inconsistent winding around this loop
                (*a).min(*b)
            }
        }
        _ => return vec![start],
    };

    let mut vertices = vec![start];
    let mut prev = start;
    let mut current = first;

    while current != start {
        vertices.push(current);
        let Some(&next) = ring(neighbours, current).iter().find(|&&n| n != prev) else {
            break;
        };
        prev = current;
        current = next;
    }

    vertices
}

fn ring(neighbours: &HashMap<u32, Vec<u32>>, v: u32) -> &[u32] {
    neighbours.get(&v).map_or(&[], Vec::as_slice)
}

/// A three-edge loop whose edges all belong to the same face.
fn is_isolated_triangle(boundary: &BoundaryLoop, owner: &HashMap<Edge, usize>) -> bool {
    if boundary.edge_count() != 3 {
        return false;
    }

    let mut faces = boundary.edges().map(|(a, b)| {
        let key = if a < b { (a, b) } else { (b, a) };
        owner.get(&key).copied()
    });

    match faces.next().flatten() {
        Some(face) => faces.all(|f| f == Some(face)),
        None => false,
    }
}

fn hole_issue(boundary: &BoundaryLoop) -> Issue {
    Issue::new(
        IssueKind::Hole,
        format!("hole with {} boundary vertices", boundary.edge_count()),
    )
    .with_vertices(boundary.vertices.clone())
}

fn complex_issue(vertices: &[u32]) -> Issue {
    Issue::new(
        IssueKind::ComplexBoundary,
        format!("branching boundary through {} vertices", vertices.len()),
    )
    .with_vertices(vertices.to_vec())
}

/// Why a hole could not be triangulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangulationFailure {
    /// The loop has no well-defined plane (all points collinear or coincident).
    DegeneratePlane,
    /// The projected loop crosses itself.
    SelfIntersecting,
    /// Ear clipping found no valid ear.
    NoEar,
}

impl TriangulationFailure {
    /// Short description used in issue messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::DegeneratePlane => "loop has no supporting plane",
            Self::SelfIntersecting => "loop is self-intersecting in projection",
            Self::NoEar => "ear clipping found no valid ear",
        }
    }
}

/// Triangulate one hole by ear clipping on its best-fit plane.
///
/// The plane normal is the average normal of the faces that own the loop's
/// edges, replaced by the loop's own (Newell) normal when that average is
/// degenerate or nearly edge-on. New triangles are wound opposite to the
/// loop so they agree with the surrounding faces.
///
/// # Errors
///
/// Returns a [`TriangulationFailure`] for loops that are degenerate,
/// self-intersecting in projection, or that ear clipping cannot finish.
pub fn triangulate_hole(
    mesh: &IndexedMesh,
    adjacency: &MeshAdjacency,
    boundary: &BoundaryLoop,
) -> Result<Vec<[u32; 3]>, TriangulationFailure> {
    // Fill faces run against the loop direction
    let ring: Vec<u32> = boundary.vertices.iter().rev().copied().collect();
    let positions: Vec<Point3<f64>> = ring
        .iter()
        .map(|&idx| mesh.vertices[idx as usize].position)
        .collect();

    let normal = hole_plane_normal(mesh, adjacency, boundary, &positions)
        .ok_or(TriangulationFailure::DegeneratePlane)?;
    let projected = project_to_plane(&positions, &normal);

    let area = signed_area(&projected);
    let scale = bbox_extent_sq(&projected);
    if area.abs() <= f64::EPSILON * scale {
        return Err(TriangulationFailure::DegeneratePlane);
    }
    if is_self_intersecting(&projected) {
        return Err(TriangulationFailure::SelfIntersecting);
    }

    let orientation = area.signum();
    let corners = ear_clip(&projected, orientation)?;

    let triangles = corners
        .into_iter()
        .map(|[a, b, c]| [ring[a], ring[b], ring[c]])
        .collect::<Vec<_>>();

    debug!(
        edges = boundary.edge_count(),
        triangles = triangles.len(),
        "Triangulated hole"
    );

    Ok(triangles)
}

/// Plane normal for a hole, oriented like the reversed loop.
fn hole_plane_normal(
    mesh: &IndexedMesh,
    adjacency: &MeshAdjacency,
    boundary: &BoundaryLoop,
    ring_positions: &[Point3<f64>],
) -> Option<Vector3<f64>> {
    let own = newell_normal(ring_positions)?;

    let mut seen = HashSet::new();
    let mut adjacent = Vector3::zeros();
    for (a, b) in boundary.edges() {
        for &face in adjacency.faces_for_edge(a, b).unwrap_or(&[]) {
            if seen.insert(face) {
                if let Some(n) = mesh.face_triangle(mesh.faces[face]).normal() {
                    adjacent += n;
                }
            }
        }
    }

    let adjacent_len = adjacent.norm();
    if adjacent_len > f64::EPSILON * seen.len().max(1) as f64 {
        let adjacent = adjacent / adjacent_len;
        if adjacent.dot(&own).abs() >= EDGE_ON_COSINE {
            return Some(adjacent);
        }
    }

    Some(own)
}

/// Newell's method: area-weighted normal of a closed polygon.
fn newell_normal(positions: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let n = positions.len();
    let mut normal = Vector3::<f64>::zeros();
    for i in 0..n {
        let p = positions[i];
        let q = positions[(i + 1) % n];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }

    let len = normal.norm();
    (len.is_finite() && len > 0.0).then(|| normal / len)
}

/// Project points into 2D coordinates on the plane through the origin with `normal`.
fn project_to_plane(positions: &[Point3<f64>], normal: &Vector3<f64>) -> Vec<[f64; 2]> {
    let helper = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = normal.cross(&helper).normalize();
    let w = normal.cross(&u);

    positions
        .iter()
        .map(|p| {
            let v = p.coords;
            [v.dot(&u), v.dot(&w)]
        })
        .collect()
}

/// Twice the signed area of a 2D polygon (positive when counter-clockwise).
fn signed_area(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let [x0, y0] = points[i];
            let [x1, y1] = points[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum()
}

fn bbox_extent_sq(points: &[[f64; 2]]) -> f64 {
    let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
    for p in points {
        for axis in 0..2 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    let dx = max[0] - min[0];
    let dy = max[1] - min[1];
    dx * dx + dy * dy
}

fn cross_2d(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Whether any two non-adjacent edges of the closed polygon intersect.
fn is_self_intersecting(points: &[[f64; 2]]) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }

    for i in 0..n {
        let (a0, a1) = (points[i], points[(i + 1) % n]);
        for j in (i + 2)..n {
            // Edges i and j share a vertex when j wraps around to i
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b0, b1) = (points[j], points[(j + 1) % n]);
            if segments_intersect(a0, a1, b0, b1) {
                return true;
            }
        }
    }

    false
}

fn segments_intersect(a0: [f64; 2], a1: [f64; 2], b0: [f64; 2], b1: [f64; 2]) -> bool {
    let d1 = cross_2d(b0, b1, a0);
    let d2 = cross_2d(b0, b1, a1);
    let d3 = cross_2d(a0, a1, b0);
    let d4 = cross_2d(a0, a1, b1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b0, b1, a0))
        || (d2 == 0.0 && on_segment(b0, b1, a1))
        || (d3 == 0.0 && on_segment(a0, a1, b0))
        || (d4 == 0.0 && on_segment(a0, a1, b1))
}

fn on_segment(s0: [f64; 2], s1: [f64; 2], p: [f64; 2]) -> bool {
    p[0] >= s0[0].min(s1[0])
        && p[0] <= s0[0].max(s1[0])
        && p[1] >= s0[1].min(s1[1])
        && p[1] <= s0[1].max(s1[1])
}

/// Ear clipping over a simple polygon; returns corner index triples.
fn ear_clip(points: &[[f64; 2]], orientation: f64) -> Result<Vec<[usize; 3]>, TriangulationFailure> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let prev = remaining[(i + m - 1) % m];
            let curr = remaining[i];
            let next = remaining[(i + 1) % m];
            is_ear(points, &remaining, [prev, curr, next], orientation)
        });

        let Some(i) = ear else {
            warn!(remaining = m, "Ear clipping stuck");
            return Err(TriangulationFailure::NoEar);
        };

        triangles.push([remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]]);
        remaining.remove(i);
    }

    if let [a, b, c] = remaining[..] {
        if cross_2d(points[a], points[b], points[c]) * orientation <= 0.0 {
            return Err(TriangulationFailure::NoEar);
        }
        triangles.push([a, b, c]);
    }

    Ok(triangles)
}

/// A convex corner whose triangle contains no other remaining vertex.
fn is_ear(points: &[[f64; 2]], remaining: &[usize], [prev, curr, next]: [usize; 3], orientation: f64) -> bool {
    let (a, b, c) = (points[prev], points[curr], points[next]);

    if cross_2d(a, b, c) * orientation <= 0.0 {
        return false;
    }

    remaining
        .iter()
        .filter(|&&idx| idx != prev && idx != curr && idx != next)
        .all(|&idx| !point_in_triangle_2d(points[idx], a, b, c))
}

fn point_in_triangle_2d(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    let d1 = cross_2d(a, b, p);
    let d2 = cross_2d(b, c, p);
    let d3 = cross_2d(c, a, p);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_neg && has_pos)
}

/// Outcome of a hole-filling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoleFillReport {
    /// Number of holes closed.
    pub filled: usize,
    /// Number of faces appended.
    pub faces_added: usize,
    /// Boundary problems left in place: untriangulable loops, branching
    /// components, and holes above the size limit.
    pub unrepaired: Vec<Issue>,
}

/// Fill every simple hole in the mesh.
///
/// Holes with more than `max_hole_edges` edges are skipped and reported as
/// `hole` issues. Loops that cannot be triangulated become
/// `unrepairable_hole` issues and complex components become
/// `complex_boundary` issues; the remaining holes are still filled.
///
/// # Errors
///
/// Returns [`RepairError::InvalidTopology`](crate::RepairError::InvalidTopology)
/// if a face references a missing vertex.
pub fn fill_holes(mesh: &mut IndexedMesh, max_hole_edges: Option<usize>) -> RepairResult<HoleFillReport> {
    let adjacency = MeshAdjacency::for_mesh(mesh)?;
    let boundary = detect_holes(mesh, &adjacency);

    let mut report = HoleFillReport {
        unrepaired: boundary.complex_issues(),
        ..HoleFillReport::default()
    };
    let mut new_faces = Vec::new();

    for hole in &boundary.loops {
        if let Some(limit) = max_hole_edges.filter(|&limit| hole.edge_count() > limit) {
            warn!(edges = hole.edge_count(), limit, "Skipping large hole");
            report.unrepaired.push(hole_issue(hole));
            continue;
        }

        match triangulate_hole(mesh, &adjacency, hole) {
            Ok(triangles) => {
                report.filled += 1;
                report.faces_added += triangles.len();
                new_faces.extend(triangles);
            }
            Err(failure) => {
                warn!(
                    edges = hole.edge_count(),
                    reason = failure.describe(),
                    "Leaving hole open"
                );
                report.unrepaired.push(
                    Issue::new(
                        IssueKind::UnrepairableHole,
                        format!(
                            "hole with {} boundary vertices: {}",
                            hole.edge_count(),
                            failure.describe()
                        ),
                    )
                    .with_vertices(hole.vertices.clone()),
                );
            }
        }
    }

    mesh.faces.extend(new_faces);
    crate::issue::sort_issues(&mut report.unrepaired);

    if report.filled > 0 {
        info!(
            filled = report.filled,
            faces_added = report.faces_added,
            "Filled holes"
        );
    }

    Ok(report)
}
