use gl::types::*;
use std::f32::consts::PI;
use std::mem;
use std::ptr;

/// Floats per vertex: position (3) + normal (3).
const STRIDE: usize = 6;

pub struct Mesh {
    vao: GLuint,
    vbo: GLuint,
    ebo: GLuint,
    pub index_count: i32,
}

impl Mesh {
    pub fn draw(&self) {
        unsafe {
            gl::BindVertexArray(self.vao);
            gl::DrawElements(gl::TRIANGLES, self.index_count, gl::UNSIGNED_INT, ptr::null());
            gl::BindVertexArray(0);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteBuffers(1, &self.ebo);
        }
    }
}

/// CPU-side interleaved geometry, uploaded by `MeshData::upload`.
#[derive(Default)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn vertex_count(&self) -> u32 {
        (self.vertices.len() / STRIDE) as u32
    }

    fn push_vertex(&mut self, p: [f32; 3], n: [f32; 3]) {
        self.vertices.extend_from_slice(&p);
        self.vertices.extend_from_slice(&n);
    }

    pub fn upload(&self) -> Mesh {
        upload_mesh(&self.vertices, &self.indices)
    }
}

fn upload_mesh(vertices: &[f32], indices: &[u32]) -> Mesh {
    let mut vao = 0;
    let mut vbo = 0;
    let mut ebo = 0;

    unsafe {
        gl::GenVertexArrays(1, &mut vao);
        gl::GenBuffers(1, &mut vbo);
        gl::GenBuffers(1, &mut ebo);

        gl::BindVertexArray(vao);

        gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
        gl::BufferData(
            gl::ARRAY_BUFFER,
            (vertices.len() * mem::size_of::<f32>()) as GLsizeiptr,
            vertices.as_ptr() as *const _,
            gl::STATIC_DRAW,
        );

        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ebo);
        gl::BufferData(
            gl::ELEMENT_ARRAY_BUFFER,
            (indices.len() * mem::size_of::<u32>()) as GLsizeiptr,
            indices.as_ptr() as *const _,
            gl::STATIC_DRAW,
        );

        let stride = (STRIDE * mem::size_of::<f32>()) as GLsizei;

        // position attribute (location 0)
        gl::VertexAttribPointer(0, 3, gl::FLOAT, gl::FALSE, stride, ptr::null());
        gl::EnableVertexAttribArray(0);

        // normal attribute (location 1)
        gl::VertexAttribPointer(
            1,
            3,
            gl::FLOAT,
            gl::FALSE,
            stride,
            (3 * mem::size_of::<f32>()) as *const _,
        );
        gl::EnableVertexAttribArray(1);

        gl::BindVertexArray(0);
    }

    Mesh {
        vao,
        vbo,
        ebo,
        index_count: indices.len() as i32,
    }
}

pub fn sphere_data(radius: f32, stacks: u32, sectors: u32) -> MeshData {
    let mut data = MeshData::default();

    for i in 0..=stacks {
        let stack_angle = PI / 2.0 - (i as f32) * PI / (stacks as f32);
        let ring = stack_angle.cos();
        let y = stack_angle.sin();

        for j in 0..=sectors {
            let sector_angle = 2.0 * PI * (j as f32) / (sectors as f32);
            let n = [ring * sector_angle.cos(), y, ring * sector_angle.sin()];
            data.push_vertex([n[0] * radius, n[1] * radius, n[2] * radius], n);
        }
    }

    for i in 0..stacks {
        for j in 0..sectors {
            let first = i * (sectors + 1) + j;
            let second = first + sectors + 1;
            data.indices
                .extend_from_slice(&[first, first + 1, second, first + 1, second + 1, second]);
        }
    }

    data
}

pub fn box_data(width: f32, height: f32, depth: f32) -> MeshData {
    let (hw, hh, hd) = (width * 0.5, height * 0.5, depth * 0.5);
    let mut data = MeshData::default();

    // (normal, four corners counter-clockwise seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0], [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]]),
        ([0.0, 0.0, -1.0], [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]]),
        ([0.0, 1.0, 0.0], [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]]),
        ([0.0, -1.0, 0.0], [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]]),
        ([1.0, 0.0, 0.0], [[hw, -hh, hd], [hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd]]),
        ([-1.0, 0.0, 0.0], [[-hw, -hh, -hd], [-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd]]),
    ];

    for (normal, corners) in faces {
        let base = data.vertex_count();
        for corner in corners {
            data.push_vertex(corner, normal);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    data
}

/// Flat square in the XZ plane facing +Y, subdivided so per-vertex lighting
/// has enough samples.
pub fn plane_data(size: f32, divisions: u32) -> MeshData {
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;
    let mut data = MeshData::default();

    for row in 0..=divisions {
        for col in 0..=divisions {
            let x = -half + col as f32 * step;
            let z = -half + row as f32 * step;
            data.push_vertex([x, 0.0, z], [0.0, 1.0, 0.0]);
        }
    }

    let row_len = divisions + 1;
    for row in 0..divisions {
        for col in 0..divisions {
            let a = row * row_len + col;
            let b = a + row_len;
            data.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    data
}

pub fn cylinder_data(radius: f32, height: f32, segments: u32) -> MeshData {
    let mut data = MeshData::default();
    let half_h = height * 0.5;

    for i in 0..=segments {
        let angle = 2.0 * PI * (i as f32) / (segments as f32);
        let (nx, nz) = (angle.cos(), angle.sin());
        data.push_vertex([radius * nx, -half_h, radius * nz], [nx, 0.0, nz]);
        data.push_vertex([radius * nx, half_h, radius * nz], [nx, 0.0, nz]);
    }
    for i in 0..segments {
        let bot = i * 2;
        data.indices
            .extend_from_slice(&[bot, bot + 1, bot + 2, bot + 1, bot + 3, bot + 2]);
    }

    for (y, ny) in [(half_h, 1.0), (-half_h, -1.0)] {
        let center = data.vertex_count();
        data.push_vertex([0.0, y, 0.0], [0.0, ny, 0.0]);
        let ring = data.vertex_count();
        for i in 0..=segments {
            let angle = 2.0 * PI * (i as f32) / (segments as f32);
            data.push_vertex([radius * angle.cos(), y, radius * angle.sin()], [0.0, ny, 0.0]);
        }
        for i in 0..segments {
            if ny > 0.0 {
                data.indices
                    .extend_from_slice(&[center, ring + i + 1, ring + i]);
            } else {
                data.indices
                    .extend_from_slice(&[center, ring + i, ring + i + 1]);
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn vertex(data: &MeshData, i: u32) -> (Vec3, Vec3) {
        let at = i as usize * STRIDE;
        let v = &data.vertices[at..at + STRIDE];
        (Vec3::new(v[0], v[1], v[2]), Vec3::new(v[3], v[4], v[5]))
    }

    /// Every triangle winds counter-clockwise when seen from the side its
    /// normals face, so back-face culling keeps the outside.
    fn assert_outward_winding(data: &MeshData) {
        for tri in data.indices.chunks(3) {
            let (a, n) = vertex(data, tri[0]);
            let (b, _) = vertex(data, tri[1]);
            let (c, _) = vertex(data, tri[2]);
            let face = (b - a).cross(c - a);
            if face.length_squared() > 1e-10 {
                assert!(face.dot(n) > 0.0, "triangle {tri:?} winds inward");
            }
        }
    }

    #[test]
    fn geometry_indices_are_in_bounds() {
        for data in [
            sphere_data(1.0, 8, 12),
            box_data(1.0, 2.0, 3.0),
            plane_data(10.0, 4),
            cylinder_data(0.5, 2.0, 10),
        ] {
            let count = data.vertex_count();
            assert_eq!(data.vertices.len() % STRIDE, 0);
            assert_eq!(data.indices.len() % 3, 0);
            assert!(data.indices.iter().all(|&i| i < count));
        }
    }

    #[test]
    fn every_shape_winds_outward() {
        assert_outward_winding(&box_data(2.0, 1.0, 3.0));
        assert_outward_winding(&plane_data(4.0, 2));
        assert_outward_winding(&sphere_data(1.0, 6, 8));
        assert_outward_winding(&cylinder_data(1.0, 2.0, 8));
    }

    #[test]
    fn sphere_normals_are_unit_and_radial() {
        let data = sphere_data(2.5, 6, 8);
        for i in 0..data.vertex_count() {
            let (p, n) = vertex(&data, i);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(p.abs_diff_eq(n * 2.5, 1e-5));
        }
    }
}
