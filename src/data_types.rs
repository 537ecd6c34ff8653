use bytemuck::{Pod, Zeroable};
use nalgebra::{Matrix4, Orthographic3, Point2, Vector2, Vector3, Vector4};

/// Vertex layout shared by chunk meshes and debug lines.
///
/// Field order is fixed by the pipeline: location 0 = depth, 1 = uv,
/// 2 = position, 3 = color.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TileVertex {
    pub depth: f32,
    pub uv: Vector2<f32>,
    pub position: Vector2<f32>,
    pub color: Vector4<f32>,
}

impl TileVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32,
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32x4
    ];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn new(depth: f32, uv: [f32; 2], position: [f32; 2], color: Vector4<f32>) -> Self {
        Self {
            depth,
            uv: uv.into(),
            position: position.into(),
            color,
        }
    }
}

/// Emits two counter-clockwise triangles covering the axis aligned rectangle
/// `min..max`.
pub fn push_quad(
    out: &mut Vec<TileVertex>,
    min: Point2<f32>,
    max: Point2<f32>,
    color: Vector4<f32>,
    depth: f32,
) {
    let bl = TileVertex::new(depth, [0.0, 0.0], [min.x, min.y], color);
    let br = TileVertex::new(depth, [1.0, 0.0], [max.x, min.y], color);
    let tr = TileVertex::new(depth, [1.0, 1.0], [max.x, max.y], color);
    let tl = TileVertex::new(depth, [0.0, 1.0], [min.x, max.y], color);

    out.extend_from_slice(&[bl, br, tr, bl, tr, tl]);
}

/// Expands a segment into a quad `thickness` wide. Degenerate segments
/// produce nothing.
pub fn push_line(
    out: &mut Vec<TileVertex>,
    start: Point2<f32>,
    end: Point2<f32>,
    thickness: f32,
    color: Vector4<f32>,
    depth: f32,
) {
    let dir = end - start;
    let len = dir.norm();
    if len <= f32::EPSILON {
        return;
    }
    let normal = Vector2::new(-dir.y, dir.x) * (thickness * 0.5 / len);

    let a = TileVertex::new(depth, [0.0, 0.0], (start + normal).coords.into(), color);
    let b = TileVertex::new(depth, [0.0, 1.0], (start - normal).coords.into(), color);
    let c = TileVertex::new(depth, [1.0, 1.0], (end - normal).coords.into(), color);
    let d = TileVertex::new(depth, [1.0, 0.0], (end + normal).coords.into(), color);

    out.extend_from_slice(&[a, b, c, a, c, d]);
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Camera {
    pub view_projection: Matrix4<f32>,
}

impl Camera {
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;
}

/// Orthographic camera in world pixels, centred on `center`.
#[derive(Clone, Debug)]
pub struct Camera2d {
    pub center: Point2<f32>,
    pub viewport: Vector2<f32>,
    pub zoom: f32,
}

impl Camera2d {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            center: Point2::origin(),
            viewport: Vector2::new(viewport_width, viewport_height),
            zoom: 1.0,
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        // a minimised window reports 0x0; keep at least one pixel so the
        // projection never collapses
        let viewport = self.viewport.map(|v| v.max(1.0));
        let half = viewport * (0.5 / self.zoom.max(f32::EPSILON));
        // depth is carried per vertex, z only needs to pass through
        let projection = Orthographic3::new(-half.x, half.x, -half.y, half.y, -1.0, 1.0).to_homogeneous();
        projection * Matrix4::new_translation(&Vector3::new(-self.center.x, -self.center.y, 0.0))
    }

    pub fn to_uniform(&self) -> Camera {
        Camera {
            view_projection: self.view_projection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point4;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<TileVertex>(), 9 * 4);
        let attrs = TileVertex::ATTRIBUTES;
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 4);
        assert_eq!(attrs[2].offset, 12);
        assert_eq!(attrs[3].offset, 20);
        for (i, attr) in attrs.iter().enumerate() {
            assert_eq!(attr.shader_location, i as u32);
        }
    }

    #[test]
    fn quad_covers_rectangle() {
        let mut out = Vec::new();
        push_quad(
            &mut out,
            Point2::new(16.0, 32.0),
            Point2::new(32.0, 48.0),
            Vector4::new(1.0, 0.0, 0.0, 1.0),
            5.0,
        );
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|v| v.depth == 5.0));
        let xs: Vec<f32> = out.iter().map(|v| v.position.x).collect();
        assert!(xs.iter().all(|x| *x == 16.0 || *x == 32.0));
        assert_eq!(out[2].position, Vector2::new(32.0, 48.0));
    }

    #[test]
    fn line_has_requested_thickness() {
        let mut out = Vec::new();
        push_line(
            &mut out,
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            2.0,
            Vector4::new(1.0, 1.0, 1.0, 1.0),
            0.0,
        );
        assert_eq!(out.len(), 6);
        assert_eq!(out[0].position, Vector2::new(0.0, 1.0));
        assert_eq!(out[1].position, Vector2::new(0.0, -1.0));

        let mut empty = Vec::new();
        push_line(
            &mut empty,
            Point2::new(3.0, 3.0),
            Point2::new(3.0, 3.0),
            2.0,
            Vector4::zeros(),
            0.0,
        );
        assert!(empty.is_empty());
    }

    #[test]
    fn camera_maps_center_to_origin() {
        let mut camera = Camera2d::new(200.0, 100.0);
        camera.center = Point2::new(50.0, 50.0);
        let clip = camera.view_projection() * Point4::new(50.0, 50.0, 0.0, 1.0);
        assert!(clip.x.abs() < 1e-6 && clip.y.abs() < 1e-6);
        let edge = camera.view_projection() * Point4::new(150.0, 100.0, 0.0, 1.0);
        assert!((edge.x - 1.0).abs() < 1e-6);
        assert!((edge.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn collapsed_viewport_still_projects() {
        let mut camera = Camera2d::new(0.0, 0.0);
        camera.center = Point2::new(1.0e6, -3.0e5);
        camera.zoom = 0.0;
        let m = camera.view_projection();
        assert!(m.iter().all(|v| v.is_finite()));

        let centre = m * Point4::new(1.0e6, -3.0e5, 0.0, 1.0);
        assert!(centre.x.abs() < 1e-3);
        assert!(centre.y.abs() < 1e-3);
    }
}
