//! Plain mesh data exchanged with loaders and serializers.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MeshDataError, MeshDataResult};
use crate::{IndexedMesh, Vertex, VertexAttributes};

/// Flat, format-agnostic mesh arrays.
///
/// This is the shape file loaders hand over and serializers take back.
/// Optional attribute arrays must match the vertex count when present;
/// an empty array is treated the same as an absent one.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, MeshData};
///
/// let data = MeshData {
///     vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     faces: vec![[0, 1, 2]],
///     normals: None,
///     uvs: None,
/// };
///
/// let mesh = IndexedMesh::from_data(&data).unwrap();
/// assert_eq!(mesh.vertices.len(), 3);
/// assert_eq!(mesh.to_data(), data);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshData {
    /// Vertex positions.
    pub vertices: Vec<[f64; 3]>,
    /// Triangles as vertex index triples.
    pub faces: Vec<[u32; 3]>,
    /// Per-vertex normals.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub normals: Option<Vec<[f64; 3]>>,
    /// Per-vertex texture coordinates.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub uvs: Option<Vec<[f64; 2]>>,
}

impl IndexedMesh {
    /// Build a mesh from boundary data.
    ///
    /// # Errors
    ///
    /// - [`MeshDataError::NonFinitePosition`] if a coordinate is NaN or infinite
    /// - [`MeshDataError::AttributeLengthMismatch`] if `normals` or `uvs` is
    ///   non-empty and its length differs from the vertex count
    pub fn from_data(data: &MeshData) -> MeshDataResult<Self> {
        let vertex_count = data.vertices.len();
        let normals = present(data.normals.as_deref());
        let uvs = present(data.uvs.as_deref());

        if let Some(normals) = normals {
            check_len("normals", vertex_count, normals.len())?;
        }
        if let Some(uvs) = uvs {
            check_len("uvs", vertex_count, uvs.len())?;
        }

        let mut vertices = Vec::with_capacity(vertex_count);
        for (index, &[x, y, z]) in data.vertices.iter().enumerate() {
            let mut vertex = Vertex::from_coords(x, y, z);
            if !vertex.is_finite() {
                return Err(MeshDataError::NonFinitePosition { index });
            }
            vertex.attributes = VertexAttributes {
                normal: normals.map(|n| {
                    let [nx, ny, nz] = n[index];
                    Vector3::new(nx, ny, nz)
                }),
                uv: uvs.map(|uv| (uv[index][0], uv[index][1])),
            };
            vertices.push(vertex);
        }

        Ok(Self::from_parts(vertices, data.faces.clone()))
    }

    /// Flatten the mesh back into boundary data.
    ///
    /// An attribute array is emitted only when every vertex carries that
    /// attribute; partial attributes cannot be expressed in flat form.
    #[must_use]
    pub fn to_data(&self) -> MeshData {
        let vertices = self.vertices.iter().map(|v| point_array(&v.position)).collect();

        let normals = self
            .vertices
            .iter()
            .map(|v| v.attributes.normal.map(|n| [n.x, n.y, n.z]))
            .collect::<Option<Vec<_>>>()
            .filter(|n| !n.is_empty());

        let uvs = self
            .vertices
            .iter()
            .map(|v| v.attributes.uv.map(|(u, v)| [u, v]))
            .collect::<Option<Vec<_>>>()
            .filter(|uv| !uv.is_empty());

        MeshData {
            vertices,
            faces: self.faces.clone(),
            normals,
            uvs,
        }
    }
}

impl TryFrom<&MeshData> for IndexedMesh {
    type Error = MeshDataError;

    fn try_from(data: &MeshData) -> MeshDataResult<Self> {
        Self::from_data(data)
    }
}

fn present<T>(values: Option<&[T]>) -> Option<&[T]> {
    values.filter(|v| !v.is_empty())
}

fn check_len(attribute: &'static str, expected: usize, actual: usize) -> MeshDataResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(MeshDataError::AttributeLengthMismatch {
            attribute,
            expected,
            actual,
        })
    }
}

fn point_array(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}
