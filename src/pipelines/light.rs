use wgpu::util::DeviceExt;

use crate::data_structures::{color::linear_from_hex, scene::Light};

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Upload new light values if they differ from what the GPU has.
    pub fn update(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

// vec4 slots keep the 16 byte uniform alignment without padding fields
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 4],
    /// Unit vector from the origin towards the directional light.
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

impl LightUniform {
    /// Collapse the scene lights into what the model shader consumes.
    ///
    /// Ambient lights add up. The first directional light wins; without one
    /// only ambient light reaches the model.
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut ambient = [0.0f32; 3];
        let mut directional = None;
        for light in lights {
            match *light {
                Light::Ambient { color, intensity } => {
                    let c = linear_from_hex(color);
                    for (a, c) in ambient.iter_mut().zip(c) {
                        *a += c * intensity;
                    }
                }
                Light::Directional {
                    color,
                    intensity,
                    position,
                } if directional.is_none() => directional = Some((color, intensity, position)),
                Light::Directional { .. } => {
                    log::debug!("Only the first directional light is used");
                }
            }
        }

        let (direction, color) = match directional {
            Some((color, intensity, [x, y, z])) => {
                let len = (x * x + y * y + z * z).sqrt();
                let direction = if len > 0.0 {
                    [x / len, y / len, z / len, 0.0]
                } else {
                    [0.0, 1.0, 0.0, 0.0]
                };
                let [r, g, b] = linear_from_hex(color).map(|c| c * intensity);
                (direction, [r, g, b, 1.0])
            }
            None => ([0.0, 1.0, 0.0, 0.0], [0.0; 4]),
        };
        Self {
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
            direction,
            color,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
