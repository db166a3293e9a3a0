//! Face and vertex normals.

use mesh_types::{IndexedMesh, Vector3};
use rayon::prelude::*;
use tracing::debug;

/// Geometric unit normal of every face, in face order.
///
/// `None` for faces whose normal is undefined (repeated indices,
/// collinear points).
#[must_use]
pub fn face_normals(mesh: &IndexedMesh) -> Vec<Option<Vector3<f64>>> {
    mesh.faces
        .par_iter()
        .map(|&face| mesh.face_triangle(face).normal())
        .collect()
}

/// The normal a face carries through its vertices.
///
/// Sum of the three vertex normals, normalized. `None` unless all three
/// vertices carry a normal and the sum does not cancel out.
#[must_use]
pub fn stored_face_normal(mesh: &IndexedMesh, [a, b, c]: [u32; 3]) -> Option<Vector3<f64>> {
    let na = mesh.vertices[a as usize].attributes.normal?;
    let nb = mesh.vertices[b as usize].attributes.normal?;
    let nc = mesh.vertices[c as usize].attributes.normal?;
    (na + nb + nc).try_normalize(0.0)
}

/// Slack allowed when testing a candidate normal against an incident face.
const ORIENTATION_SLACK: f64 = 1e-12;

/// Recompute every vertex normal from the faces around it.
///
/// Each vertex gets the normalized, area-weighted sum of its incident face
/// normals when that sum lies on the front side of every incident face.
/// Where incident faces disagree on winding, the vertex instead gets the
/// unit direction closest to that sum that no incident face sees from
/// behind, or the zero vector when no such direction exists. Every face
/// with a geometric normal therefore ends up with a stored normal that
/// does not oppose it.
///
/// Vertices with no usable incident face keep the normal they carried,
/// or get +Z, so every vertex has a normal afterwards. The result depends
/// only on positions, faces and those kept normals, so running it twice
/// is a no-op.
///
/// # Example
///
/// ```
/// use mesh_types::unit_cube;
/// use mesh_repair::compute_vertex_normals;
///
/// let mut cube = unit_cube();
/// compute_vertex_normals(&mut cube);
///
/// let n = cube.vertices[0].normal().unwrap();
/// assert!(n.x < 0.0 && n.y < 0.0 && n.z < 0.0);
/// ```
pub fn compute_vertex_normals(mesh: &mut IndexedMesh) {
    // Unnormalized cross products carry twice the face area
    let weighted: Vec<Vector3<f64>> = mesh
        .faces
        .par_iter()
        .map(|&face| mesh.face_triangle(face).normal_unnormalized())
        .collect();
    let unit = face_normals(mesh);

    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); mesh.vertices.len()];
    for (idx, face) in mesh.faces.iter().enumerate() {
        if unit[idx].is_none() {
            continue;
        }
        for &v in face {
            incident[v as usize].push(idx);
        }
    }

    let chosen: Vec<Option<Vector3<f64>>> = incident
        .par_iter()
        .map(|faces| {
            if faces.is_empty() {
                return None;
            }
            let sum: Vector3<f64> = faces.iter().map(|&f| weighted[f]).sum();
            let planes: Vec<Vector3<f64>> = faces.iter().filter_map(|&f| unit[f]).collect();
            Some(oriented_normal(&sum, &planes))
        })
        .collect();

    let mut fallback = 0_usize;
    let mut unresolved = 0_usize;
    for (vertex, normal) in mesh.vertices.iter_mut().zip(chosen) {
        match normal {
            Some(n) => {
                unresolved += usize::from(n == Vector3::zeros());
                vertex.attributes.normal = Some(n);
            }
            None => {
                fallback += 1;
                if vertex.attributes.normal.is_none() {
                    vertex.attributes.normal = Some(Vector3::z());
                }
            }
        }
    }

    debug!(
        vertices = mesh.vertices.len(),
        fallback, unresolved, "Computed vertex normals"
    );
}

/// A normal facing no plane in `planes` from behind, as close to `sum` as possible.
///
/// Candidates are the normalized sum, each plane normal, the sum projected
/// onto each plane, and both directions along each pair of planes. In
/// three dimensions one of them is feasible whenever any nonzero feasible
/// direction exists; otherwise the result is the zero vector.
fn oriented_normal(sum: &Vector3<f64>, planes: &[Vector3<f64>]) -> Vector3<f64> {
    let faces_all = |n: &Vector3<f64>| planes.iter().all(|g| n.dot(g) >= -ORIENTATION_SLACK);
    let unit = |v: Vector3<f64>| v.try_normalize(0.0).filter(|n| n.iter().all(|c| c.is_finite()));

    let preferred = unit(*sum).or_else(|| unit(planes.iter().sum()));
    if let Some(n) = preferred.filter(|n| faces_all(n)) {
        return n;
    }

    let mut candidates: Vec<Vector3<f64>> = Vec::new();
    for (i, g) in planes.iter().enumerate() {
        candidates.push(*g);
        if let Some(p) = preferred {
            candidates.extend(unit(p - g * p.dot(g)));
        }
        for h in &planes[i + 1..] {
            if let Some(edge) = unit(g.cross(h)) {
                candidates.push(edge);
                candidates.push(-edge);
            }
        }
    }
    // All planes parallel: anything in the common plane works
    if let Some(g) = planes.first() {
        let helper = if g.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        candidates.extend(unit(g.cross(&helper)));
    }

    let score = |n: &Vector3<f64>| preferred.map_or(0.0, |p| n.dot(&p));
    candidates
        .into_iter()
        .filter(|n| faces_all(n))
        .fold(None, |best: Option<Vector3<f64>>, n| match best {
            Some(b) if score(&b) >= score(&n) => Some(b),
            _ => Some(n),
        })
        .unwrap_or_else(Vector3::zeros)
}

/// Whether a face's stored normal opposes its geometric normal by more than `epsilon`.
///
/// Faces without a stored or geometric normal are never inverted.
#[must_use]
pub fn is_inverted(mesh: &IndexedMesh, face: [u32; 3], epsilon: f64) -> bool {
    let geometric = mesh.face_triangle(face).normal();
    match (stored_face_normal(mesh, face), geometric) {
        (Some(stored), Some(geometric)) => stored.dot(&geometric) < -epsilon,
        _ => false,
    }
}
