//! Vertex layouts and mesh builders for everything the scene draws.

use bytemuck::{Pod, Zeroable};
use std::collections::BTreeSet;

/// Lit mesh vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Unlit vertex carrying only a position.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

/// Grid line vertex. `moveable` is 1.0 for vertices that scroll with time.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub moveable: f32,
}

/// Line list for a square grid of side `size` with `divisions` cells per side.
///
/// Each of the `divisions + 1` steps emits four vertices: a line along X at
/// that z (both ends moveable), then a line along Z at that x (both static).
/// The middle line gets `center_color`, every other line `line_color`.
pub fn grid_lines(
    size: f32,
    divisions: u32,
    center_color: [f32; 4],
    line_color: [f32; 4],
) -> Vec<GridVertex> {
    let divisions = divisions.max(1);
    let half = size / 2.0;
    let step = size / divisions as f32;
    let center = divisions / 2;
    let mut vertices = Vec::with_capacity(4 * (divisions as usize + 1));
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i == center { center_color } else { line_color };
        let line = |position: [f32; 3], moveable: f32| GridVertex {
            position,
            color,
            moveable,
        };
        vertices.push(line([-half, 0.0, k], 1.0));
        vertices.push(line([half, 0.0, k], 1.0));
        vertices.push(line([k, 0.0, -half], 0.0));
        vertices.push(line([k, 0.0, half], 0.0));
    }
    vertices
}

/// Unit cube centred on the origin, 24 vertices with flat normals,
/// counter-clockwise when seen from outside.
pub fn unit_box() -> (Vec<Vertex>, Vec<u16>) {
    // (normal, u, v) with u x v = normal.
    #[rustfmt::skip]
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([ 1.0,  0.0,  0.0], [ 0.0, 0.0, -1.0], [0.0, 1.0,  0.0]),
        ([-1.0,  0.0,  0.0], [ 0.0, 0.0,  1.0], [0.0, 1.0,  0.0]),
        ([ 0.0,  1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0, -1.0]),
        ([ 0.0, -1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0,  1.0]),
        ([ 0.0,  0.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
        ([ 0.0,  0.0, -1.0], [-1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let base = vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = std::array::from_fn(|k| 0.5 * (normal[k] + su * u[k] + sv * v[k]));
            vertices.push(Vertex { position, normal });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// Square plane in the XY plane, `segments` x `segments` quads, centred on
/// the origin. Rows run from +y to -y.
///
/// Indices are `u32`, so `segments` must stay at or below
/// [`neoleon_common::MAX_GROUND_SEGMENTS`]; callers validate through `SceneConfig`.
pub fn plane_xy(size: f32, segments: u32) -> (Vec<PositionVertex>, Vec<u32>) {
    let segments = segments.max(1);
    let half = size / 2.0;
    let step = size / segments as f32;
    let row = segments + 1;
    let side = row as usize;

    let mut vertices = Vec::with_capacity(side * side);
    for iy in 0..row {
        let y = half - iy as f32 * step;
        for ix in 0..row {
            let x = -half + ix as f32 * step;
            vertices.push(PositionVertex {
                position: [x, y, 0.0],
            });
        }
    }

    let cells = segments as usize;
    let mut indices = Vec::with_capacity(cells * cells * 6);
    for iy in 0..segments {
        for ix in 0..segments {
            let a = ix + row * iy;
            let b = ix + row * (iy + 1);
            let c = ix + 1 + row * (iy + 1);
            let d = ix + 1 + row * iy;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    (vertices, indices)
}

/// Horizontal quad covering `[-half, half]` on X and Z at height `y`,
/// facing up.
pub fn floor_quad(half: f32, y: f32) -> (Vec<PositionVertex>, Vec<u16>) {
    let corner = |x: f32, z: f32| PositionVertex {
        position: [x, y, z],
    };
    let vertices = vec![
        corner(-half, half),
        corner(half, half),
        corner(half, -half),
        corner(-half, -half),
    ];
    (vertices, vec![0, 1, 2, 2, 3, 0])
}

/// Unique triangle edges as a line list, in ascending `(lo, hi)` order.
pub fn wireframe_edges(triangles: &[u32]) -> Vec<u32> {
    let mut edges = BTreeSet::new();
    for tri in triangles.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if a != b {
                edges.insert((a.min(b), a.max(b)));
            }
        }
    }
    edges.into_iter().flat_map(|(a, b)| [a, b]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use neoleon_common::MAX_GROUND_SEGMENTS;
    use glam::Vec3;

    const CENTER: [f32; 4] = [0.0, 0.9, 0.8, 1.0];
    const LINE: [f32; 4] = [0.0, 0.9, 0.8, 1.0];

    #[test]
    fn grid_line_count_and_flags() {
        let lines = grid_lines(200.0, 20, CENTER, LINE);
        assert_eq!(lines.len(), 21 * 4);
        for quad in lines.chunks_exact(4) {
            let flags: Vec<f32> = quad.iter().map(|v| v.moveable).collect();
            assert_eq!(flags, vec![1.0, 1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn grid_spans_the_boundary() {
        let lines = grid_lines(200.0, 20, CENTER, LINE);
        let zs: Vec<f32> = lines.iter().map(|v| v.position[2]).collect();
        let min = zs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = zs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!((min, max), (-100.0, 100.0));
        assert!(lines.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn grid_centre_line_uses_centre_color() {
        let lines = grid_lines(10.0, 2, [1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(lines[4].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(lines[4].position[2], 0.0);
        assert_eq!(lines[0].color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn box_faces_wind_outward() {
        let (vertices, indices) = unit_box();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vec3::from_array(vertices[tri[k] as usize].position));
            let face = (b - a).cross(c - a).normalize();
            let normal = Vec3::from_array(vertices[tri[0] as usize].normal);
            assert!((face - normal).length() < 1e-5, "{face} vs {normal}");
        }
        assert!(vertices.iter().all(|v| v.position.iter().all(|c| c.abs() == 0.5)));
    }

    #[test]
    fn plane_covers_its_size() {
        let (vertices, indices) = plane_xy(1024.0, 4);
        assert_eq!(vertices.len(), 25);
        assert_eq!(indices.len(), 4 * 4 * 6);
        assert_eq!(vertices[0].position, [-512.0, 512.0, 0.0]);
        assert_eq!(vertices[24].position, [512.0, -512.0, 0.0]);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn plane_at_segment_limit_indexes_every_vertex() {
        let (vertices, indices) = plane_xy(1024.0, MAX_GROUND_SEGMENTS);
        let row = MAX_GROUND_SEGMENTS as usize + 1;
        assert_eq!(vertices.len(), row * row);
        assert_eq!(indices.len(), (MAX_GROUND_SEGMENTS as usize).pow(2) * 6);
        assert_eq!(indices.iter().copied().max(), Some((row * row - 1) as u32));
    }

    #[test]
    fn floor_faces_up() {
        let (vertices, indices) = floor_quad(100.0, 0.0);
        let [a, b, c] = [0, 1, 2].map(|k| Vec3::from_array(vertices[indices[k] as usize].position));
        assert!((b - a).cross(c - a).y > 0.0);
    }

    #[test]
    fn shared_edges_are_deduplicated() {
        // Two triangles sharing the 1-2 edge.
        let edges = wireframe_edges(&[0, 1, 2, 2, 1, 3]);
        assert_eq!(edges.len(), 5 * 2);
        assert_eq!(&edges[..4], &[0, 1, 0, 2]);
    }

    #[test]
    fn degenerate_edges_are_dropped() {
        assert!(wireframe_edges(&[4, 4, 4]).is_empty());
    }
}
