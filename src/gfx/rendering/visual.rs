//! GPU-side representation of a scene visual
//!
//! Each visual owns its vertex and index buffers plus a per-object uniform
//! (model matrix and material) bound at group 1 together with its texture.

use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::gfx::backend::{MaterialDesc, TextureHandle, Transform, VisualDesc};
use crate::gfx::resources::TextureResource;
use crate::wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc, UniformBuffer};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    /// x: roughness, y: metalness, z: receives shadows, w: textured
    pub material: [f32; 4],
}

impl ObjectUniform {
    pub fn new(transform: &Transform, material: &MaterialDesc, receive_shadow: bool) -> Self {
        let model = transform.to_matrix();
        let normal_matrix = model
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);

        Self {
            model: model.into(),
            normal_matrix: normal_matrix.into(),
            base_color: material.base_color,
            material: [
                material.roughness,
                material.metalness,
                if receive_shadow { 1.0 } else { 0.0 },
                if material.texture.is_some() { 1.0 } else { 0.0 },
            ],
        }
    }
}

pub struct GpuVisual {
    pub label: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform: UniformBuffer<ObjectUniform>,
    bind_group: wgpu::BindGroup,
    pub transform: Transform,
    pub material: MaterialDesc,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl GpuVisual {
    pub fn new(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        desc: VisualDesc,
        texture: &TextureResource,
    ) -> Self {
        let vertices = desc.geometry.to_vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", desc.label)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", desc.label)),
            contents: bytemuck::cast_slice(&desc.geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform = UniformBuffer::new_with_data(
            device,
            &ObjectUniform::new(&desc.transform, &desc.material, desc.receive_shadow),
        );
        let bind_group = Self::create_bind_group(device, layout, &uniform, texture, &desc.label);

        Self {
            index_count: desc.geometry.indices.len() as u32,
            label: desc.label,
            vertex_buffer,
            index_buffer,
            uniform,
            bind_group,
            transform: desc.transform,
            material: desc.material,
            cast_shadow: desc.cast_shadow,
            receive_shadow: desc.receive_shadow,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        uniform: &UniformBuffer<ObjectUniform>,
        texture: &TextureResource,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .resource(uniform.binding_resource())
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, &format!("{} Bind Group", label))
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.material.texture
    }

    pub fn set_transform(&mut self, queue: &wgpu::Queue, transform: Transform) {
        self.transform = transform;
        self.upload(queue);
    }

    /// Rebinds the visual to `texture`
    pub fn set_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        handle: TextureHandle,
        texture: &TextureResource,
    ) {
        self.material.texture = Some(handle);
        self.bind_group = Self::create_bind_group(device, layout, &self.uniform, texture, &self.label);
        self.upload(queue);
    }

    fn upload(&mut self, queue: &wgpu::Queue) {
        let content = ObjectUniform::new(&self.transform, &self.material, self.receive_shadow);
        self.uniform.update_content(queue, content);
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Releases the GPU buffers immediately
    pub fn destroy(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.uniform.destroy();
    }
}

pub trait DrawVisual<'a> {
    fn draw_visual(&mut self, visual: &'a GpuVisual);
}

impl<'a, 'b> DrawVisual<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_visual(&mut self, visual: &'b GpuVisual) {
        if visual.index_count == 0 {
            return;
        }
        self.set_bind_group(1, visual.bind_group(), &[]);
        self.set_vertex_buffer(0, visual.vertex_buffer.slice(..));
        self.set_index_buffer(visual.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..visual.index_count, 0, 0..1);
    }
}
