//! Core mesh repair operations.
//!
//! Vertex deduplication, degenerate face removal and orphan compaction.
//! Each operation is idempotent: a second run changes nothing.

use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, MeshBounds, Point3, Triangle};
use rayon::prelude::*;
use tracing::debug;

use crate::adjacency::{has_repeated_index, validate_indices};
use crate::error::{RepairError, RepairResult};

/// Default merge distance for vertex deduplication.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default degenerate-area ratio, relative to the squared bounding-box diagonal.
pub const DEFAULT_DEGENERATE_AREA_RATIO: f64 = 1e-10;

/// Indices of faces that repeat a vertex or have negligible area.
///
/// A face is degenerate when its area is at most
/// `area_ratio * diagonal²`, with `diagonal` the bounding-box diagonal of
/// all vertices, or when its area is exactly zero. Squaring the diagonal
/// keeps the test independent of mesh units.
#[must_use]
pub fn degenerate_faces(mesh: &IndexedMesh, area_ratio: f64) -> Vec<usize> {
    let diagonal = mesh.diagonal();
    let threshold = area_ratio * diagonal * diagonal;

    mesh.faces
        .par_iter()
        .enumerate()
        .filter(|&(_, &face)| {
            has_repeated_index(face) || mesh.face_triangle(face).is_degenerate(threshold)
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Remove degenerate faces.
///
/// Uses the same test as [`degenerate_faces`]. Vertices are left untouched,
/// even those no longer referenced by any face.
///
/// Returns the number of faces removed.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::remove_degenerate_faces;
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(10.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 10.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(5.0, 0.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([0, 3, 1]); // Collinear
/// mesh.faces.push([2, 2, 1]); // Repeated index
///
/// let removed = remove_degenerate_faces(&mut mesh, 1e-10);
/// assert_eq!(removed, 2);
/// assert_eq!(mesh.vertices.len(), 4);
/// ```
pub fn remove_degenerate_faces(mesh: &mut IndexedMesh, area_ratio: f64) -> usize {
    let degenerate: HashSet<usize> = degenerate_faces(mesh, area_ratio).into_iter().collect();
    if degenerate.is_empty() {
        return 0;
    }

    let original_count = mesh.faces.len();
    let mut idx = 0;
    mesh.faces.retain(|_| {
        let keep = !degenerate.contains(&idx);
        idx += 1;
        keep
    });

    let removed = original_count - mesh.faces.len();
    debug!(removed, "Removed degenerate faces");
    removed
}

/// Merge vertices within `tolerance` of each other.
///
/// Uses a uniform grid with cell size equal to `tolerance`, so any pair
/// within range lies in neighbouring cells and only the 3x3x3 block around
/// each vertex is searched. The lowest index of a group survives; faces are
/// remapped to it, merged vertices are dropped and the survivors compacted
/// in their original order, attributes included. Faces that collapse onto
/// a repeated index are kept for degenerate removal to deal with.
///
/// Survivors are pairwise farther apart than `tolerance`, so a second run
/// merges nothing.
///
/// Returns the number of vertices merged away. The mesh is unchanged when
/// an error is returned.
///
/// # Errors
///
/// - [`RepairError::InvalidTolerance`] if `tolerance` is not finite and positive
/// - [`RepairError::InvalidTopology`] if a face references a missing vertex
/// - [`RepairError::DegenerateInput`] if the mesh has faces but fewer than
///   three non-collinear vertices survive
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::merge_duplicate_vertices;
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0000001, 0.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([0, 3, 2]);
///
/// let merged = merge_duplicate_vertices(&mut mesh, 1e-6).unwrap();
/// assert_eq!(merged, 1);
/// assert_eq!(mesh.vertices.len(), 3);
/// assert_eq!(mesh.faces[1], [0, 1, 2]);
/// ```
pub fn merge_duplicate_vertices(mesh: &mut IndexedMesh, tolerance: f64) -> RepairResult<usize> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(RepairError::InvalidTolerance(tolerance));
    }
    validate_indices(&mesh.faces, mesh.vertices.len())?;

    let representative = find_representatives(&mesh.vertices, tolerance);

    // Survivors keep their relative order
    let mut new_index: Vec<u32> = vec![u32::MAX; mesh.vertices.len()];
    let mut survivors = Vec::with_capacity(mesh.vertices.len());
    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        if representative[idx] as usize == idx {
            new_index[idx] = u32::try_from(survivors.len()).unwrap_or(u32::MAX);
            survivors.push(vertex.clone());
        }
    }

    if !mesh.faces.is_empty() && !has_usable_extent(survivors.iter().map(|v| &v.position)) {
        return Err(RepairError::DegenerateInput {
            surviving: survivors.len(),
        });
    }

    let merged = mesh.vertices.len() - survivors.len();
    if merged == 0 {
        return Ok(0);
    }

    for face in &mut mesh.faces {
        for v in face.iter_mut() {
            *v = new_index[representative[*v as usize] as usize];
        }
    }
    mesh.vertices = survivors;

    debug!(merged, tolerance, "Merged duplicate vertices");
    Ok(merged)
}

/// For every vertex, the index of the vertex it merges into (itself if it survives).
fn find_representatives(vertices: &[mesh_types::Vertex], tolerance: f64) -> Vec<u32> {
    let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, vertex) in vertices.iter().enumerate() {
        let idx = u32::try_from(idx).unwrap_or(u32::MAX);
        grid.entry(pos_to_cell(&vertex.position, tolerance))
            .or_default()
            .push(idx);
    }

    let mut representative: Vec<u32> = (0..vertices.len())
        .map(|i| u32::try_from(i).unwrap_or(u32::MAX))
        .collect();

    for (idx, vertex) in vertices.iter().enumerate() {
        if representative[idx] as usize != idx {
            continue;
        }
        let root = representative[idx];
        let cell = pos_to_cell(&vertex.position, tolerance);

        // Check 3x3x3 neighborhood
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbour = (
                        cell.0.saturating_add(dx),
                        cell.1.saturating_add(dy),
                        cell.2.saturating_add(dz),
                    );
                    let Some(candidates) = grid.get(&neighbour) else {
                        continue;
                    };

                    for &other in candidates {
                        let other_idx = other as usize;
                        if other_idx <= idx || representative[other_idx] != other {
                            continue;
                        }
                        let dist = (vertex.position - vertices[other_idx].position).norm();
                        if dist <= tolerance {
                            representative[other_idx] = root;
                        }
                    }
                }
            }
        }
    }

    representative
}

/// Convert position to spatial hash cell.
#[allow(clippy::cast_possible_truncation)]
fn pos_to_cell(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Whether the points contain three that are not collinear.
pub(crate) fn has_usable_extent<'a>(mut points: impl Iterator<Item = &'a Point3<f64>> + Clone) -> bool {
    let Some(&origin) = points.next() else {
        return false;
    };

    let far = points
        .clone()
        .max_by(|a, b| (*a - origin).norm_squared().total_cmp(&(*b - origin).norm_squared()));
    let Some(&far) = far else {
        return false;
    };

    points.any(|&p| Triangle::new(origin, far, p).normal().is_some())
}

/// Remove vertices referenced by no face and compact the rest.
///
/// Survivors keep their relative order and attributes. Returns the number
/// of vertices removed.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::remove_unreferenced_vertices;
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(100.0, 100.0, 100.0)); // Unreferenced
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([1, 2, 3]);
///
/// let removed = remove_unreferenced_vertices(&mut mesh);
/// assert_eq!(removed, 1);
/// assert_eq!(mesh.faces[0], [0, 1, 2]);
/// ```
pub fn remove_unreferenced_vertices(mesh: &mut IndexedMesh) -> usize {
    let original_count = mesh.vertices.len();

    let mut referenced = vec![false; original_count];
    for face in &mesh.faces {
        for &v in face {
            referenced[v as usize] = true;
        }
    }

    if referenced.iter().all(|&r| r) {
        return 0;
    }

    let mut remap = vec![u32::MAX; original_count];
    let mut next = 0_u32;
    for (old, &keep) in referenced.iter().enumerate() {
        if keep {
            remap[old] = next;
            next += 1;
        }
    }

    let mut idx = 0;
    mesh.vertices.retain(|_| {
        let keep = referenced[idx];
        idx += 1;
        keep
    });

    for face in &mut mesh.faces {
        for v in face.iter_mut() {
            *v = remap[*v as usize];
        }
    }

    let removed = original_count - mesh.vertices.len();
    debug!(removed, "Removed unreferenced vertices");
    removed
}

/// Indices of vertices referenced by no face.
#[must_use]
pub fn unreferenced_vertices(mesh: &IndexedMesh) -> Vec<u32> {
    let mut referenced = vec![false; mesh.vertices.len()];
    for face in &mesh.faces {
        for &v in face {
            if let Some(slot) = referenced.get_mut(v as usize) {
                *slot = true;
            }
        }
    }

    referenced
        .iter()
        .enumerate()
        .filter(|&(_, &r)| !r)
        .map(|(idx, _)| u32::try_from(idx).unwrap_or(u32::MAX))
        .collect()
}

/// Faces whose vertex set matches an earlier face, in any rotation or winding.
#[must_use]
pub fn duplicate_faces(faces: &[[u32; 3]]) -> Vec<usize> {
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(faces.len());

    faces
        .iter()
        .enumerate()
        .filter_map(|(idx, &face)| {
            let mut key = face;
            key.sort_unstable();
            (!seen.insert(key)).then_some(idx)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{Vector3, Vertex, unit_cube};

    fn simple_mesh() -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(10.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 10.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh
    }

    #[test]
    fn remove_degenerate_collinear() {
        let mut mesh = simple_mesh();
        mesh.vertices.push(Vertex::from_coords(5.0, 0.0, 0.0));
        mesh.faces.push([0, 3, 1]); // Collinear = zero area

        let removed = remove_degenerate_faces(&mut mesh, DEFAULT_DEGENERATE_AREA_RATIO);
        assert_eq!(removed, 1);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn remove_degenerate_keeps_valid() {
        let mut mesh = simple_mesh();

        let removed = remove_degenerate_faces(&mut mesh, DEFAULT_DEGENERATE_AREA_RATIO);
        assert_eq!(removed, 0);
        assert_eq!(mesh.faces.len(), 1);
    }

    #[test]
    fn degenerate_test_is_scale_invariant() {
        // A sliver that is tiny in absolute terms but fine relative to its mesh
        let mut small = simple_mesh();
        for v in &mut small.vertices {
            v.position *= 1e-6;
        }
        assert!(degenerate_faces(&small, DEFAULT_DEGENERATE_AREA_RATIO).is_empty());

        // A sliver that is thin relative to a large mesh
        let mut sliver = simple_mesh();
        sliver.vertices.push(Vertex::from_coords(5.0, 1e-10, 0.0));
        sliver.faces.push([0, 1, 3]);
        assert_eq!(degenerate_faces(&sliver, DEFAULT_DEGENERATE_AREA_RATIO), vec![1]);
    }

    #[test]
    fn merge_near_vertices() {
        let mut mesh = simple_mesh();
        mesh.vertices.push(Vertex::from_coords(10.001, 0.0, 0.0)); // Near vertex 1
        mesh.faces.push([0, 3, 2]);

        let merged = merge_duplicate_vertices(&mut mesh, 0.01).unwrap();
        assert_eq!(merged, 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces[1], [0, 1, 2]);
    }

    #[test]
    fn merge_keeps_lowest_index_and_its_attributes() {
        let mut mesh = simple_mesh();
        mesh.vertices[1].attributes.uv = Some((0.5, 0.5));
        mesh.vertices
            .insert(1, Vertex::with_normal(Point3::new(3.0, 3.0, 0.0), Vector3::z()));
        mesh.faces = vec![[0, 2, 3]];
        mesh.vertices.push(Vertex::from_coords(3.0, 3.0, 0.0));
        mesh.faces.push([0, 4, 2]);

        let merged = merge_duplicate_vertices(&mut mesh, 1e-6).unwrap();
        assert_eq!(merged, 1);
        assert_eq!(mesh.faces, vec![[0, 2, 3], [0, 1, 2]]);
        assert_eq!(mesh.vertices[1].normal(), Some(Vector3::z()));
        assert_eq!(mesh.vertices[2].uv(), Some((0.5, 0.5)));
    }

    #[test]
    fn merge_distance_is_inclusive() {
        let mut mesh = simple_mesh();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.5));
        mesh.faces.push([3, 1, 2]);

        assert_eq!(merge_duplicate_vertices(&mut mesh.clone(), 0.49).unwrap(), 0);
        assert_eq!(merge_duplicate_vertices(&mut mesh, 0.5).unwrap(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut mesh = simple_mesh();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 10.0, 1e-9));
        mesh.faces.push([3, 1, 4]);

        assert_eq!(merge_duplicate_vertices(&mut mesh, 1e-6).unwrap(), 2);
        let once = mesh.clone();
        assert_eq!(merge_duplicate_vertices(&mut mesh, 1e-6).unwrap(), 0);
        assert_eq!(mesh, once);
    }

    #[test]
    fn merge_rejects_bad_tolerance() {
        let mut mesh = simple_mesh();
        for tolerance in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = merge_duplicate_vertices(&mut mesh, tolerance).unwrap_err();
            assert!(matches!(err, RepairError::InvalidTolerance(_)));
        }
    }

    #[test]
    fn merge_rejects_collapse() {
        let mut mesh = simple_mesh();
        for v in &mut mesh.vertices {
            v.position *= 1e-9;
        }
        let before = mesh.clone();

        let err = merge_duplicate_vertices(&mut mesh, 1e-6).unwrap_err();
        assert_eq!(err, RepairError::DegenerateInput { surviving: 1 });
        assert_eq!(mesh, before);
    }

    #[test]
    fn merge_rejects_collinear_survivors() {
        let mut mesh = IndexedMesh::new();
        for x in 0..4 {
            mesh.vertices.push(Vertex::from_coords(f64::from(x), 0.0, 0.0));
        }
        mesh.faces.push([0, 1, 2]);

        let err = merge_duplicate_vertices(&mut mesh, 1e-6).unwrap_err();
        assert_eq!(err, RepairError::DegenerateInput { surviving: 4 });
    }

    #[test]
    fn merge_handles_coordinates_beyond_grid_range() {
        let mut mesh = IndexedMesh::new();
        for &x in &[1e13, -1e13] {
            mesh.vertices.push(Vertex::from_coords(x, 0.0, 0.0));
            mesh.vertices.push(Vertex::from_coords(x, 1.0, 0.0));
            mesh.vertices.push(Vertex::from_coords(x, 0.0, 1.0));
            mesh.vertices.push(Vertex::from_coords(x, 0.0, 0.0));
        }
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([3, 1, 2]);
        mesh.faces.push([4, 5, 6]);
        mesh.faces.push([7, 5, 6]);

        assert_eq!(merge_duplicate_vertices(&mut mesh, 1e-6).unwrap(), 2);
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 1, 2], [3, 4, 5], [3, 4, 5]]);
    }

    #[test]
    fn merge_empty_mesh() {
        let mut mesh = IndexedMesh::new();
        assert_eq!(merge_duplicate_vertices(&mut mesh, 0.01).unwrap(), 0);
    }

    #[test]
    fn merge_is_noop_on_cube() {
        let mut cube = unit_cube();
        assert_eq!(merge_duplicate_vertices(&mut cube, 1e-3).unwrap(), 0);
        assert_eq!(cube, unit_cube());
    }

    #[test]
    fn remove_unreferenced() {
        let mut mesh = simple_mesh();
        mesh.vertices.push(Vertex::from_coords(100.0, 100.0, 100.0));
        assert_eq!(unreferenced_vertices(&mesh), vec![3]);

        let removed = remove_unreferenced_vertices(&mut mesh);
        assert_eq!(removed, 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert!(unreferenced_vertices(&mesh).is_empty());
    }

    #[test]
    fn remove_unreferenced_none() {
        let mut mesh = simple_mesh();
        assert_eq!(remove_unreferenced_vertices(&mut mesh), 0);
    }

    #[test]
    fn duplicate_faces_any_rotation_or_winding() {
        let faces = [[0, 1, 2], [1, 2, 0], [0, 2, 1], [0, 1, 3]];
        assert_eq!(duplicate_faces(&faces), vec![1, 2]);
    }
}
