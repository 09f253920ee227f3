//! Placement of a displayed model.
//!
//! The viewer shows one model at a time, centred where the asset put it. The
//! only transform applied on top of the baked vertex data is the uniform unit
//! normalisation chosen at load time, uploaded as a single instance.

use crate::data_structures::model;

/// Uniform scale of a drawn model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub scale: f32,
}

impl Instance {
    pub fn scaled(scale: f32) -> Self {
        Self { scale }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_scale(self.scale)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            // Uniform scaling leaves normal directions untouched
            normal: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::scaled(1.0)
    }
}

/// Instance data as laid out in the vertex buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    // Model matrix columns at 5..=8, normal matrix columns at 9..=11
    const ATTRIBS: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x3,
        10 => Float32x3,
        11 => Float32x3,
    ];
}

impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_instance_scales_points() {
        let m = Instance::scaled(0.01).to_matrix();
        let p = m * cgmath::Vector4::new(100.0, 200.0, -50.0, 1.0);
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!((p.y - 2.0).abs() < 1e-6);
        assert!((p.z + 0.5).abs() < 1e-6);
        assert_eq!(p.w, 1.0);
    }
}
