//! Per-frame uniforms shared by every scene pass: camera and light.

use bytemuck::{Pod, Zeroable};

use crate::coords::{ColorRgba, Vec2};

use super::common::uniform_entry;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub dimension: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            dimension: [1.0, 1.0],
            _pad: [0.0; 2],
        }
    }
}

/// Point light made available to mesh group shaders.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub position: Vec2,
    pub color: ColorRgba,
    pub attenuation: f32,
    /// Minimum brightness applied to unlit surfaces.
    pub ambient: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec2::zero(),
            color: ColorRgba::white(),
            attenuation: 0.0,
            ambient: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct LightUniform {
    position: [f32; 4],
    color: [f32; 4],
    params: [f32; 4], // x = attenuation, y = ambient
}

impl From<Light> for LightUniform {
    fn from(l: Light) -> Self {
        Self {
            position: [l.position.x, l.position.y, 0.0, 1.0],
            color: [l.color.r, l.color.g, l.color.b, l.color.a],
            params: [l.attenuation, l.ambient, 0.0, 0.0],
        }
    }
}

/// Bind group 0 for scene and overlay groups.
///
/// binding 0: camera, binding 1: light. Both are written once per frame
/// before any pass is recorded.
pub struct FrameGlobals {
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    camera_ubo: wgpu::Buffer,
    light_ubo: wgpu::Buffer,
}

impl FrameGlobals {
    pub fn new(device: &wgpu::Device) -> Self {
        let visibility = wgpu::ShaderStages::VERTEX_FRAGMENT;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nergal globals bgl"),
            entries: &[
                uniform_entry::<CameraUniform>(0, visibility, false),
                uniform_entry::<LightUniform>(1, visibility, false),
            ],
        });

        let camera_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nergal camera ubo"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nergal light ubo"),
            size: std::mem::size_of::<LightUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nergal globals bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_ubo.as_entire_binding(),
                },
            ],
        });

        Self {
            layout,
            bind_group,
            camera_ubo,
            light_ubo,
        }
    }

    #[inline]
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    #[inline]
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub(crate) fn write(&self, queue: &wgpu::Queue, camera: &CameraUniform, light: Light) {
        queue.write_buffer(&self.camera_ubo, 0, bytemuck::bytes_of(camera));
        queue.write_buffer(&self.light_ubo, 0, bytemuck::bytes_of(&LightUniform::from(light)));
    }
}
