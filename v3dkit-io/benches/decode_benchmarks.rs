//! Benchmarks for decoding and flattening V3D scenes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use v3dkit_core::{GeometryRecord, Point3f, SceneHeader, TriangleGroup, Vector3f};
use v3dkit_io::{Precision, SceneFile, SceneWriter};

/// Generate a grid-shaped triangle group with `side * side` vertices
fn generate_grid_scene(side: u32, precision: Precision) -> Vec<u8> {
    let positions: Vec<Point3f> = (0..side * side)
        .map(|k| {
            let (x, y) = ((k % side) as f32, (k / side) as f32);
            Point3f::new(x, y, (x * 0.1).sin() * (y * 0.1).cos())
        })
        .collect();
    let mut triangles = Vec::new();
    for y in 0..side - 1 {
        for x in 0..side - 1 {
            let a = y * side + x;
            triangles.push([a, a + 1, a + side + 1]);
            triangles.push([a, a + side + 1, a + side]);
        }
    }
    let group = TriangleGroup {
        normals: vec![Vector3f::z(); positions.len()],
        positions,
        normal_indices: triangles.clone(),
        color_indices: triangles.clone(),
        position_indices: triangles,
        ..Default::default()
    };

    SceneWriter::new(precision)
        .with_header(SceneHeader::default())
        .with_record(GeometryRecord::TriangleGroup(group))
        .to_bytes()
        .expect("Failed to encode scene")
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_triangle_group");
    for side in [32u32, 128, 256] {
        for precision in [Precision::Single, Precision::Double] {
            let bytes = generate_grid_scene(side, precision);
            group.throughput(Throughput::Bytes(bytes.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", precision), side),
                &bytes,
                |b, bytes| b.iter(|| SceneFile::from_bytes(black_box(bytes)).expect("decode failed")),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
