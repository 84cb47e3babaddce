// Shape generators - CPU-side triangle lists for the demos
//
// Every shape is a plain triangle list (3 points per triangle, no indices),
// ready for `Primitive::Triangles`.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

/// Unit quad in the z = 0 plane spanning -1..1, as two triangles.
pub fn quad() -> Vec<Vec3> {
    let (a, b, c, d) = (
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
    );
    vec![a, b, c, a, c, d]
}

/// Axis-aligned box centred on the origin, 36 points.
pub fn box_shape(width: f32, height: f32, depth: f32) -> Vec<Vec3> {
    let h = Vec3::new(width, height, depth) * 0.5;
    let corner = |x: f32, y: f32, z: f32| Vec3::new(x * h.x, y * h.y, z * h.z);

    // Each face as its four corners, counter-clockwise seen from outside
    let faces = [
        [(-1., -1., 1.), (1., -1., 1.), (1., 1., 1.), (-1., 1., 1.)],
        [(1., -1., -1.), (-1., -1., -1.), (-1., 1., -1.), (1., 1., -1.)],
        [(1., -1., 1.), (1., -1., -1.), (1., 1., -1.), (1., 1., 1.)],
        [(-1., -1., -1.), (-1., -1., 1.), (-1., 1., 1.), (-1., 1., -1.)],
        [(-1., 1., 1.), (1., 1., 1.), (1., 1., -1.), (-1., 1., -1.)],
        [(-1., -1., -1.), (1., -1., -1.), (1., -1., 1.), (-1., -1., 1.)],
    ];

    let mut points = Vec::with_capacity(36);
    for face in faces {
        let [a, b, c, d] = face.map(|(x, y, z)| corner(x, y, z));
        points.extend_from_slice(&[a, b, c, a, c, d]);
    }
    points
}

/// UV sphere of `wedges` longitudinal slices and `layers` latitudinal
/// bands; 6 points per (wedge, layer) cell.
pub fn sphere(wedges: usize, layers: usize, radius: f32) -> Vec<Vec3> {
    let point = |wedge: usize, layer: usize| {
        let theta = TAU * wedge as f32 / wedges as f32;
        let phi = PI * layer as f32 / layers as f32;
        Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()) * radius
    };
    grid_cells(wedges, layers, point)
}

/// Texture coordinates matching [`sphere`] cell for cell.
pub fn uv_grid(wedges: usize, layers: usize) -> Vec<Vec2> {
    let uv = |wedge: usize, layer: usize| {
        Vec2::new(wedge as f32 / wedges as f32, layer as f32 / layers as f32)
    };
    grid_cells(wedges, layers, uv)
}

fn grid_cells<T: Copy>(columns: usize, rows: usize, at: impl Fn(usize, usize) -> T) -> Vec<T> {
    let mut out = Vec::with_capacity(columns * rows * 6);
    for row in 0..rows {
        for column in 0..columns {
            let a = at(column, row);
            let b = at(column + 1, row);
            let c = at(column + 1, row + 1);
            let d = at(column, row + 1);
            out.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_counts() {
        assert_eq!(quad().len(), 6);
        assert_eq!(box_shape(1.0, 2.0, 3.0).len(), 36);
        assert_eq!(sphere(10, 5, 1.0).len(), 300);
        assert_eq!(uv_grid(10, 5).len(), sphere(10, 5, 1.0).len());
    }

    #[test]
    fn sphere_points_lie_on_radius() {
        for p in sphere(12, 7, 2.5) {
            assert!((p.length() - 2.5).abs() < 1e-4, "{:?}", p);
        }
    }

    #[test]
    fn box_extents_are_halved_dimensions() {
        let points = box_shape(2.0, 4.0, 6.0);
        let max = points.iter().fold(Vec3::splat(f32::MIN), |m, p| m.max(*p));
        let min = points.iter().fold(Vec3::splat(f32::MAX), |m, p| m.min(*p));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(min, -max);
    }

    #[test]
    fn uv_grid_spans_unit_square() {
        let uvs = uv_grid(4, 4);
        assert!(uvs.iter().all(|uv| (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)));
        assert!(uvs.contains(&Vec2::ONE));
        assert_eq!(uvs[0], Vec2::ZERO);
    }
}
