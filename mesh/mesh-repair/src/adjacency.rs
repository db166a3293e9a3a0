//! Mesh adjacency data structures.
//!
//! Provides edge-to-face and vertex-to-face lookups. Adjacency is always
//! derived from the current face list and never updated in place: any
//! operation that changes faces builds a fresh one.

use hashbrown::HashMap;
use mesh_types::IndexedMesh;

use crate::error::{RepairError, RepairResult};

/// Undirected edge key, normalized so that `.0 < .1`.
pub type Edge = (u32, u32);

/// Adjacency information for a mesh.
///
/// Provides efficient lookups for:
/// - Faces adjacent to an edge
/// - Faces adjacent to a vertex
/// - Boundary edges (edges with only one adjacent face)
/// - Non-manifold edges (edges with more than two adjacent faces)
///
/// Faces that repeat a vertex index have no well-defined edges. They are
/// listed under their vertices but contribute nothing to the edge map.
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    /// Maps edge (v0, v1) to the faces using it, in face order. v0 < v1.
    edge_to_faces: HashMap<Edge, Vec<usize>>,
    /// Maps vertex index to the faces using it, in face order.
    vertex_to_faces: HashMap<u32, Vec<usize>>,
}

impl MeshAdjacency {
    /// Build adjacency information from a list of faces.
    ///
    /// This is the single place where face indices are range-checked.
    ///
    /// # Errors
    ///
    /// Returns [`RepairError::InvalidTopology`] for the first face that
    /// references a vertex `>= vertex_count`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_repair::MeshAdjacency;
    ///
    /// let faces = vec![[0, 1, 2], [1, 3, 2]];
    /// let adj = MeshAdjacency::build(&faces, 4).unwrap();
    ///
    /// assert_eq!(adj.boundary_edge_count(), 4);
    /// assert!(MeshAdjacency::build(&faces, 3).is_err());
    /// ```
    pub fn build(faces: &[[u32; 3]], vertex_count: usize) -> RepairResult<Self> {
        validate_indices(faces, vertex_count)?;

        let mut edge_to_faces: HashMap<Edge, Vec<usize>> = HashMap::with_capacity(faces.len() * 3 / 2);
        let mut vertex_to_faces: HashMap<u32, Vec<usize>> = HashMap::with_capacity(vertex_count);

        for (face_idx, &face) in faces.iter().enumerate() {
            for &v in &face {
                let incident = vertex_to_faces.entry(v).or_default();
                if incident.last() != Some(&face_idx) {
                    incident.push(face_idx);
                }
            }

            if has_repeated_index(face) {
                continue;
            }

            for edge in face_edges(face) {
                edge_to_faces.entry(normalize_edge(edge.0, edge.1)).or_default().push(face_idx);
            }
        }

        Ok(Self {
            edge_to_faces,
            vertex_to_faces,
        })
    }

    /// Build adjacency for a mesh.
    ///
    /// # Errors
    ///
    /// See [`MeshAdjacency::build`].
    pub fn for_mesh(mesh: &IndexedMesh) -> RepairResult<Self> {
        Self::build(&mesh.faces, mesh.vertices.len())
    }

    /// Get faces adjacent to an edge.
    ///
    /// Returns `None` if the edge doesn't exist in the mesh.
    #[must_use]
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[usize]> {
        let edge = normalize_edge(v0, v1);
        self.edge_to_faces.get(&edge).map(Vec::as_slice)
    }

    /// Get faces adjacent to a vertex, in ascending face order.
    ///
    /// Returns an empty slice if the vertex has no adjacent faces.
    #[must_use]
    pub fn faces_for_vertex(&self, v: u32) -> &[usize] {
        self.vertex_to_faces.get(&v).map_or(&[], Vec::as_slice)
    }

    /// Iterate over every edge with its owning faces, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = (Edge, &[usize])> + '_ {
        self.edge_to_faces
            .iter()
            .map(|(&edge, faces)| (edge, faces.as_slice()))
    }

    /// Iterate over all boundary edges (edges with exactly one adjacent face).
    ///
    /// Boundary edges indicate holes in the mesh surface.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (Edge, usize)> + '_ {
        self.edge_to_faces
            .iter()
            .filter_map(|(&edge, faces)| match faces.as_slice() {
                [face] => Some((edge, *face)),
                _ => None,
            })
    }

    /// Count the number of boundary edges.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Iterate over all non-manifold edges (edges with more than two adjacent faces).
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = (Edge, &[usize])> + '_ {
        self.edges().filter(|(_, faces)| faces.len() > 2)
    }

    /// Count the number of non-manifold edges.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() > 2)
            .count()
    }

    /// Check if the mesh is manifold (all edges have at most 2 adjacent faces).
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() <= 2)
    }

    /// Check if the mesh is watertight (no boundary edges).
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() >= 2)
    }

    /// Get the total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    /// Get the number of vertices referenced by at least one face.
    #[must_use]
    pub fn referenced_vertex_count(&self) -> usize {
        self.vertex_to_faces.len()
    }

    /// Whether a vertex is referenced by any face.
    #[must_use]
    pub fn is_referenced(&self, v: u32) -> bool {
        self.vertex_to_faces.contains_key(&v)
    }
}

/// Check that every face index is below `vertex_count`.
///
/// # Errors
///
/// Returns [`RepairError::InvalidTopology`] naming the first offending face.
pub fn validate_indices(faces: &[[u32; 3]], vertex_count: usize) -> RepairResult<()> {
    for (face, indices) in faces.iter().enumerate() {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(RepairError::InvalidTopology {
                face,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

/// Whether a face uses the same vertex index twice.
#[inline]
#[must_use]
pub fn has_repeated_index([a, b, c]: [u32; 3]) -> bool {
    a == b || b == c || a == c
}

/// The three directed edges of a face, following its winding.
#[inline]
pub(crate) fn face_edges([a, b, c]: [u32; 3]) -> [(u32, u32); 3] {
    [(a, b), (b, c), (c, a)]
}

/// Normalize edge direction so v0 < v1.
#[inline]
pub(crate) fn normalize_edge(v0: u32, v1: u32) -> Edge {
    if v0 < v1 { (v0, v1) } else { (v1, v0) }
}
