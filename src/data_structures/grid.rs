//! Line geometry for the grid helper.

use wgpu::util::DeviceExt;

use crate::data_structures::{color::linear_from_hex, model::Vertex};

pub const CENTER_LINE_COLOR: u32 = 0x444444;
pub const GRID_COLOR: u32 = 0x888888;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Line list for a `size` x `size` grid with `divisions` cells per side.
///
/// Every division contributes one line along X and one along Z. The middle
/// pair is drawn in the darker centre colour.
pub fn grid_vertices(size: f32, divisions: u32) -> Vec<LineVertex> {
    let divisions = divisions.max(1);
    let center = divisions / 2;
    let step = size / divisions as f32;
    let half = size / 2.0;
    let center_color = linear_from_hex(CENTER_LINE_COLOR);
    let grid_color = linear_from_hex(GRID_COLOR);

    let mut vertices = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i == center { center_color } else { grid_color };
        vertices.push(LineVertex { position: [-half, 0.0, k], color });
        vertices.push(LineVertex { position: [half, 0.0, k], color });
        vertices.push(LineVertex { position: [k, 0.0, -half], color });
        vertices.push(LineVertex { position: [k, 0.0, half], color });
    }
    vertices
}

#[derive(Debug)]
pub struct GridMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub num_vertices: u32,
}

impl GridMesh {
    pub fn new(device: &wgpu::Device, size: f32, divisions: u32) -> Self {
        let vertices = grid_vertices(size, divisions);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            num_vertices: vertices.len() as u32,
        }
    }
}
