//! Non-manifold edge and vertex detection.

use hashbrown::HashMap;
use mesh_types::IndexedMesh;
use rayon::prelude::*;

use crate::adjacency::{MeshAdjacency, has_repeated_index};
use crate::issue::{Issue, IssueKind};

/// One issue per edge shared by three or more faces.
///
/// Each issue lists the edge's vertex pair and its owning faces.
#[must_use]
pub fn non_manifold_edge_issues(adjacency: &MeshAdjacency) -> Vec<Issue> {
    let mut issues: Vec<Issue> = adjacency
        .non_manifold_edges()
        .map(|((a, b), faces)| {
            Issue::new(
                IssueKind::NonManifoldEdge,
                format!("edge ({a}, {b}) is shared by {} faces", faces.len()),
            )
            .with_vertices(vec![a, b])
            .with_faces(faces.to_vec())
        })
        .collect();

    // Edge map iteration order is arbitrary
    issues.sort_by_key(|issue| (issue.vertices.first().copied(), issue.vertices.get(1).copied()));
    issues
}

/// One issue per vertex whose faces split into more than one fan.
///
/// Faces around a vertex belong to the same fan when they are connected
/// through edges that contain the vertex. Faces with repeated indices
/// are ignored.
#[must_use]
pub fn non_manifold_vertex_issues(mesh: &IndexedMesh, adjacency: &MeshAdjacency) -> Vec<Issue> {
    let vertex_count = u32::try_from(mesh.vertices.len()).unwrap_or(u32::MAX);

    (0..vertex_count)
        .into_par_iter()
        .filter_map(|v| {
            let fans = fan_count(&mesh.faces, adjacency.faces_for_vertex(v), v);
            (fans > 1).then(|| {
                let faces = adjacency
                    .faces_for_vertex(v)
                    .iter()
                    .copied()
                    .filter(|&f| !has_repeated_index(mesh.faces[f]))
                    .collect();
                Issue::new(
                    IssueKind::NonManifoldVertex,
                    format!("vertex {v} joins {fans} separate fans"),
                )
                .with_vertices(vec![v])
                .with_faces(faces)
            })
        })
        .collect()
}

/// Number of edge-connected face groups around `v`.
fn fan_count(faces: &[[u32; 3]], incident: &[usize], v: u32) -> usize {
    let local: Vec<[u32; 3]> = incident
        .iter()
        .map(|&f| faces[f])
        .filter(|&face| !has_repeated_index(face))
        .collect();

    if local.len() < 2 {
        return local.len();
    }

    // Spoke vertex -> positions in `local` of faces containing edge (v, spoke)
    let mut spokes: HashMap<u32, Vec<usize>> = HashMap::new();
    for (pos, face) in local.iter().enumerate() {
        for &u in face {
            if u != v {
                spokes.entry(u).or_default().push(pos);
            }
        }
    }

    let mut visited = vec![false; local.len()];
    let mut stack = Vec::new();
    let mut fans = 0;

    for start in 0..local.len() {
        if visited[start] {
            continue;
        }
        fans += 1;
        visited[start] = true;
        stack.push(start);

        while let Some(pos) = stack.pop() {
            for &u in &local[pos] {
                if u == v {
                    continue;
                }
                for &next in spokes.get(&u).map_or(&[][..], Vec::as_slice) {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }
        }
    }

    fans
}
