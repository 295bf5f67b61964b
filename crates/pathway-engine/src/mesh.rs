//! Tube tessellation of 3D curves and scoped ownership of the uploaded
//! geometry.
//!
//! Roads and the stop path are drawn as tubes around their curves.
//! [`TubeMesh::from_curve`] produces plain vertex/index buffers; a
//! rendering backend turns them into a resource that it does not free on
//! its own. [`RetainedGeometry`] ties that resource to a Rust value: it
//! uploads on construction, releases exactly once on drop, and releases
//! the old resource before uploading a new one on
//! [`rebuild`](RetainedGeometry::rebuild).

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::types::Point3;

/// Tube tessellation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeParams {
    pub radius: f64,
    /// Rings along the curve.
    pub tubular_segments: u32,
    /// Vertices around each ring (plus one seam duplicate).
    pub radial_segments: u32,
}

impl TubeParams {
    pub const DEFAULT_TUBULAR_SEGMENTS: u32 = 200;
    pub const DEFAULT_RADIAL_SEGMENTS: u32 = 16;

    /// Default tessellation at the given radius.
    #[must_use]
    pub fn with_radius(radius: f64) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tubular_segments: Self::DEFAULT_TUBULAR_SEGMENTS,
            radial_segments: Self::DEFAULT_RADIAL_SEGMENTS,
        }
    }
}

/// Moving frame along a curve: unit normal and binormal per ring.
#[derive(Debug, Clone)]
struct Frames {
    normals: Vec<Point3>,
    binormals: Vec<Point3>,
}

impl Frames {
    /// Parallel-transport frames at `segments + 1` evenly spaced arc-length
    /// fractions. Closed curves are twisted back so the last frame meets
    /// the first.
    #[allow(clippy::cast_precision_loss)]
    fn along(curve: &Curve<Point3>, segments: u32) -> Self {
        let count = segments as usize + 1;
        let tangents: Vec<Point3> = (0..count)
            .map(|i| curve.tangent_at(i as f64 / f64::from(segments)))
            .collect();

        let first = tangents[0];
        let axis = least_aligned_axis(first);
        let side = first.cross(axis).normalize();
        let mut normals = Vec::with_capacity(count);
        let mut binormals = Vec::with_capacity(count);
        normals.push(first.cross(side));
        binormals.push(first.cross(normals[0]));

        for i in 1..count {
            let mut normal = normals[i - 1];
            let bend = tangents[i - 1].cross(tangents[i]);
            if bend.magnitude() > f64::EPSILON {
                let angle = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
                normal = normal.rotate_around(bend.normalize(), angle);
            }
            normals.push(normal);
            binormals.push(tangents[i].cross(normal));
        }

        if curve.is_closed() {
            let last = count - 1;
            let mut twist = normals[0].dot(normals[last]).clamp(-1.0, 1.0).acos()
                / f64::from(segments);
            if tangents[0].dot(normals[0].cross(normals[last])) > 0.0 {
                twist = -twist;
            }
            for i in 1..count {
                normals[i] = normals[i].rotate_around(tangents[i], twist * i as f64);
                binormals[i] = tangents[i].cross(normals[i]);
            }
        }

        Self { normals, binormals }
    }
}

/// The unit axis along which `v` has the smallest component (ties go to
/// the last axis).
fn least_aligned_axis(v: Point3) -> Point3 {
    let (x, y, z) = (v.x.abs(), v.y.abs(), v.z.abs());
    let mut min = f64::MAX;
    let mut axis = Point3::new(1.0, 0.0, 0.0);
    if x <= min {
        min = x;
    }
    if y <= min {
        min = y;
        axis = Point3::new(0.0, 1.0, 0.0);
    }
    if z <= min {
        axis = Point3::new(0.0, 0.0, 1.0);
    }
    axis
}

/// Vertex and index buffers of a tube around a curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeMesh {
    pub vertices: Vec<Point3>,
    /// Unit outward normal per vertex.
    pub normals: Vec<Point3>,
    /// `(along, around)` texture coordinates per vertex, each in `[0, 1]`.
    pub uvs: Vec<[f64; 2]>,
    /// Triangle list, counter-clockwise seen from outside.
    pub indices: Vec<u32>,
}

impl TubeMesh {
    /// Tessellate a tube of `params.radius` around `curve`.
    ///
    /// Produces `(tubular + 1) * (radial + 1)` vertices; the last ring of a
    /// closed curve coincides with the first. Segment counts are raised to
    /// at least 1 along and 3 around.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_curve(curve: &Curve<Point3>, params: &TubeParams) -> Self {
        let tubular = params.tubular_segments.max(1);
        let radial = params.radial_segments.max(3);
        let frames = Frames::along(curve, tubular);

        let ring = radial as usize + 1;
        let total = (tubular as usize + 1) * ring;
        let mut vertices = Vec::with_capacity(total);
        let mut normals = Vec::with_capacity(total);
        let mut uvs = Vec::with_capacity(total);

        for i in 0..=tubular {
            // Closed tubes reuse the start point so the seam is exact.
            let ring_index = if curve.is_closed() && i == tubular { 0 } else { i };
            let fraction = f64::from(ring_index) / f64::from(tubular);
            let center = curve.point_at(fraction);
            let n = frames.normals[ring_index as usize];
            let b = frames.binormals[ring_index as usize];
            for j in 0..=radial {
                let v = f64::from(j) / f64::from(radial) * TAU;
                let (sin, cos) = v.sin_cos();
                let normal = (n * -cos + b * sin).normalize();
                vertices.push(center + normal * params.radius);
                normals.push(normal);
                uvs.push([f64::from(i) / f64::from(tubular), f64::from(j) / f64::from(radial)]);
            }
        }

        let stride = radial + 1;
        let mut indices = Vec::with_capacity(tubular as usize * radial as usize * 6);
        for j in 1..=tubular {
            for i in 1..=radial {
                let a = stride * (j - 1) + (i - 1);
                let b = stride * j + (i - 1);
                let c = stride * j + i;
                let d = stride * (j - 1) + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        tracing::trace!(
            vertices = vertices.len(),
            triangles = indices.len() / 3,
            "tessellated tube"
        );

        Self {
            vertices,
            normals,
            uvs,
            indices,
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A rendering backend that owns GPU-side (or otherwise unmanaged)
/// geometry.
///
/// Methods take `&self` so several guards can share one backend; backends
/// with mutable state use interior mutability.
pub trait GeometryBackend {
    /// Backend-specific resource identifier.
    type Handle;

    /// Create a resource from mesh buffers.
    fn upload(&self, mesh: &TubeMesh) -> Self::Handle;

    /// Free a resource. Called exactly once per handle by
    /// [`RetainedGeometry`].
    fn release(&self, handle: Self::Handle);
}

impl<B: GeometryBackend + ?Sized> GeometryBackend for &B {
    type Handle = B::Handle;

    fn upload(&self, mesh: &TubeMesh) -> Self::Handle {
        (**self).upload(mesh)
    }

    fn release(&self, handle: Self::Handle) {
        (**self).release(handle);
    }
}

impl<B: GeometryBackend + ?Sized> GeometryBackend for std::rc::Rc<B> {
    type Handle = B::Handle;

    fn upload(&self, mesh: &TubeMesh) -> Self::Handle {
        (**self).upload(mesh)
    }

    fn release(&self, handle: Self::Handle) {
        (**self).release(handle);
    }
}

/// Scoped ownership of one uploaded mesh.
///
/// The handle is released when the guard is dropped, on every exit path.
#[derive(Debug)]
pub struct RetainedGeometry<B: GeometryBackend> {
    backend: B,
    handle: Option<B::Handle>,
    vertex_count: usize,
}

impl<B: GeometryBackend> RetainedGeometry<B> {
    /// Upload `mesh` and take ownership of the resulting handle.
    #[must_use]
    pub fn acquire(backend: B, mesh: &TubeMesh) -> Self {
        let handle = backend.upload(mesh);
        Self {
            backend,
            handle: Some(handle),
            vertex_count: mesh.vertex_count(),
        }
    }

    /// Tessellate `curve` and upload the result.
    #[must_use]
    pub fn from_curve(backend: B, curve: &Curve<Point3>, params: &TubeParams) -> Self {
        Self::acquire(backend, &TubeMesh::from_curve(curve, params))
    }

    /// Replace the retained mesh. The old handle is released before the new
    /// mesh is uploaded.
    pub fn rebuild(&mut self, mesh: &TubeMesh) {
        if let Some(old) = self.handle.take() {
            self.backend.release(old);
        }
        self.handle = Some(self.backend.upload(mesh));
        self.vertex_count = mesh.vertex_count();
    }

    /// The live handle. `None` only while a rebuild is in progress.
    #[must_use]
    pub const fn handle(&self) -> Option<&B::Handle> {
        self.handle.as_ref()
    }

    /// Vertex count of the retained mesh.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

impl<B: GeometryBackend> Drop for RetainedGeometry<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.release(handle);
        }
    }
}
