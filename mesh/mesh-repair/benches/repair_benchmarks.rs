//! Benchmarks for mesh-repair operations.
//!
//! Run with: cargo bench -p mesh-repair
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-repair -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-repair -- --baseline main

#![allow(
    missing_docs,
    clippy::cast_possible_truncation,
    clippy::assigning_clones,
    clippy::significant_drop_tightening
)]

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use mesh_repair::{
    MeshAdjacency, RepairParams, compute_vertex_normals, diagnose_mesh, fill_holes,
    merge_duplicate_vertices, repair_mesh,
};
use mesh_types::{IndexedMesh, Vertex};
use std::collections::HashMap;

// =============================================================================
// Test Mesh Generation
// =============================================================================

/// Create an icosphere mesh with specified subdivision level.
fn create_sphere(subdivisions: u32) -> IndexedMesh {
    let mut mesh = IndexedMesh::new();

    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let a = 1.0;
    let b = 1.0 / phi;

    let ico_verts = [
        [0.0, b, -a],
        [b, a, 0.0],
        [-b, a, 0.0],
        [0.0, b, a],
        [0.0, -b, a],
        [-a, 0.0, b],
        [0.0, -b, -a],
        [a, 0.0, -b],
        [a, 0.0, b],
        [-a, 0.0, -b],
        [b, -a, 0.0],
        [-b, -a, 0.0],
    ];

    for v in &ico_verts {
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        mesh.vertices
            .push(Vertex::from_coords(v[0] / len, v[1] / len, v[2] / len));
    }

    let ico_faces: [[u32; 3]; 20] = [
        [0, 1, 2],
        [3, 2, 1],
        [3, 4, 5],
        [3, 8, 4],
        [0, 6, 7],
        [0, 9, 6],
        [4, 10, 11],
        [6, 11, 10],
        [2, 5, 9],
        [11, 9, 5],
        [1, 7, 8],
        [10, 8, 7],
        [3, 5, 2],
        [3, 1, 8],
        [0, 2, 9],
        [0, 7, 1],
        [6, 9, 11],
        [6, 10, 7],
        [4, 11, 5],
        [4, 8, 10],
    ];

    for f in &ico_faces {
        mesh.faces.push(*f);
    }

    for _ in 0..subdivisions {
        mesh = subdivide_sphere(&mesh);
    }

    mesh
}

fn subdivide_sphere(mesh: &IndexedMesh) -> IndexedMesh {
    let mut new_mesh = IndexedMesh::new();
    new_mesh.vertices = mesh.vertices.clone();

    let mut edge_midpoints: HashMap<(u32, u32), u32> = HashMap::new();

    for face in &mesh.faces {
        let v0 = face[0];
        let v1 = face[1];
        let v2 = face[2];

        let m01 = get_midpoint(v0, v1, &mut new_mesh.vertices, &mut edge_midpoints);
        let m12 = get_midpoint(v1, v2, &mut new_mesh.vertices, &mut edge_midpoints);
        let m20 = get_midpoint(v2, v0, &mut new_mesh.vertices, &mut edge_midpoints);

        new_mesh.faces.push([v0, m01, m20]);
        new_mesh.faces.push([v1, m12, m01]);
        new_mesh.faces.push([v2, m20, m12]);
        new_mesh.faces.push([m01, m12, m20]);
    }

    new_mesh
}

fn get_midpoint(
    v1: u32,
    v2: u32,
    vertices: &mut Vec<Vertex>,
    edge_midpoints: &mut HashMap<(u32, u32), u32>,
) -> u32 {
    let key = if v1 < v2 { (v1, v2) } else { (v2, v1) };

    if let Some(&idx) = edge_midpoints.get(&key) {
        return idx;
    }

    let p1 = &vertices[v1 as usize];
    let p2 = &vertices[v2 as usize];

    let mx = (p1.position.x + p2.position.x) / 2.0;
    let my = (p1.position.y + p2.position.y) / 2.0;
    let mz = (p1.position.z + p2.position.z) / 2.0;
    let len = (mx * mx + my * my + mz * mz).sqrt();

    let idx = vertices.len() as u32;
    vertices.push(Vertex::from_coords(mx / len, my / len, mz / len));
    edge_midpoints.insert(key, idx);
    idx
}

/// Every face gets its own three vertices, as in an unindexed triangle soup.
fn to_soup(mesh: &IndexedMesh) -> IndexedMesh {
    let mut soup = IndexedMesh::with_capacity(mesh.faces.len() * 3, mesh.faces.len());
    for face in &mesh.faces {
        let base = soup.vertices.len() as u32;
        for &v in face {
            soup.vertices.push(mesh.vertices[v as usize].clone());
        }
        soup.faces.push([base, base + 1, base + 2]);
    }
    soup
}

/// Remove every face touching vertex 0, leaving one hole.
fn with_hole(mut mesh: IndexedMesh) -> IndexedMesh {
    mesh.faces.retain(|face| !face.contains(&0));
    mesh
}

// =============================================================================
// Diagnostics Benchmarks
// =============================================================================

fn bench_diagnostics(c: &mut Criterion) {
    let mut group = c.benchmark_group("Diagnostics");

    let test_cases = [
        ("sphere_80tri", create_sphere(1)),
        ("sphere_320tri", create_sphere(2)),
        ("sphere_1280tri", create_sphere(3)),
        ("sphere_5120tri", create_sphere(4)),
    ];

    for (name, mesh) in &test_cases {
        group.throughput(Throughput::Elements(mesh.faces.len() as u64));

        group.bench_with_input(BenchmarkId::new("adjacency", name), mesh, |b, mesh| {
            b.iter(|| MeshAdjacency::for_mesh(black_box(mesh)))
        });

        let mut with_normals = mesh.clone();
        compute_vertex_normals(&mut with_normals);
        group.bench_with_input(
            BenchmarkId::new("diagnose", name),
            &with_normals,
            |b, mesh| b.iter(|| diagnose_mesh(black_box(mesh))),
        );
    }

    group.finish();
}

// =============================================================================
// Repair Benchmarks
// =============================================================================

fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("Repair");

    let test_cases = [
        ("sphere_320tri", create_sphere(2)),
        ("sphere_1280tri", create_sphere(3)),
        ("sphere_5120tri", create_sphere(4)),
    ];

    for (name, mesh) in &test_cases {
        group.throughput(Throughput::Elements(mesh.faces.len() as u64));

        let soup = to_soup(mesh);
        group.bench_with_input(BenchmarkId::new("dedup_soup", name), &soup, |b, soup| {
            b.iter_batched(
                || soup.clone(),
                |mut m| merge_duplicate_vertices(&mut m, 1e-6),
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("full_repair", name), mesh, |b, mesh| {
            let params = RepairParams::default();
            b.iter(|| repair_mesh(black_box(mesh), &params))
        });

        let holed = with_hole(mesh.clone());
        group.bench_with_input(
            BenchmarkId::new("aggressive_repair", name),
            &holed,
            |b, mesh| {
                let params = RepairParams::aggressive();
                b.iter(|| repair_mesh(black_box(mesh), &params))
            },
        );
    }

    group.finish();
}

// =============================================================================
// Hole Filling Benchmarks
// =============================================================================

fn bench_hole_filling(c: &mut Criterion) {
    let mut group = c.benchmark_group("HoleFilling");

    for subdivisions in [2, 3, 4] {
        let holed = with_hole(create_sphere(subdivisions));
        group.bench_with_input(
            BenchmarkId::new("fill_holes_sphere", subdivisions),
            &holed,
            |b, mesh| {
                b.iter_batched(
                    || mesh.clone(),
                    |mut m| fill_holes(&mut m, None),
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_diagnostics, bench_repair, bench_hole_filling);

criterion_main!(benches);
