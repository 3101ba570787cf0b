use std::sync::Arc;

use crate::error::{GpuError, GpuResult};

use super::BindingLayout;

/// Vertex input layout for one vertex buffer.
#[derive(Debug, Clone)]
pub struct VertexLayout {
    pub stride: u64,
    pub step_mode: wgpu::VertexStepMode,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

/// Rasterizer state.
#[derive(Debug, Clone)]
pub struct RasterizerDesc {
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
}

impl Default for RasterizerDesc {
    fn default() -> Self {
        Self {
            cull_mode: Some(wgpu::Face::Back),
            front_face: wgpu::FrontFace::Ccw,
        }
    }
}

/// Depth-stencil state. Absent means depth testing is disabled and the
/// pipeline renders without a depth attachment.
#[derive(Debug, Clone)]
pub struct DepthStencilDesc {
    pub format: wgpu::TextureFormat,
    pub depth_write: bool,
    pub compare: wgpu::CompareFunction,
}

impl Default for DepthStencilDesc {
    fn default() -> Self {
        Self {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write: true,
            compare: wgpu::CompareFunction::Less,
        }
    }
}

/// Accumulates pipeline state; `build` may be called repeatedly.
///
/// Deriving a sibling configuration (same layout/shaders with depth disabled,
/// blending enabled, ...) is done by mutating one field and rebuilding — the
/// built configurations stay independently valid.
#[derive(Clone, Default)]
pub struct PipelineBuilder {
    label: String,
    layout: Option<Arc<BindingLayout>>,
    vertex_shader: Option<(Arc<wgpu::ShaderModule>, String)>,
    pixel_shader: Option<(Arc<wgpu::ShaderModule>, String)>,
    vertex_layout: Option<VertexLayout>,
    topology: Option<wgpu::PrimitiveTopology>,
    color_format: Option<wgpu::TextureFormat>,
    blend: Option<wgpu::BlendState>,
    rasterizer: Option<RasterizerDesc>,
    depth: Option<DepthStencilDesc>,
}

impl PipelineBuilder {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            ..Self::default()
        }
    }

    pub fn binding_layout(&mut self, layout: Arc<BindingLayout>) -> &mut Self {
        self.layout = Some(layout);
        self
    }

    pub fn vertex_shader(&mut self, module: Arc<wgpu::ShaderModule>, entry: &str) -> &mut Self {
        self.vertex_shader = Some((module, entry.to_owned()));
        self
    }

    pub fn pixel_shader(&mut self, module: Arc<wgpu::ShaderModule>, entry: &str) -> &mut Self {
        self.pixel_shader = Some((module, entry.to_owned()));
        self
    }

    pub fn vertex_layout(&mut self, layout: VertexLayout) -> &mut Self {
        self.vertex_layout = Some(layout);
        self
    }

    pub fn topology(&mut self, topology: wgpu::PrimitiveTopology) -> &mut Self {
        self.topology = Some(topology);
        self
    }

    pub fn render_target_format(&mut self, format: wgpu::TextureFormat) -> &mut Self {
        self.color_format = Some(format);
        self
    }

    pub fn blend_state(&mut self, blend: Option<wgpu::BlendState>) -> &mut Self {
        self.blend = blend;
        self
    }

    pub fn rasterizer_state(&mut self, rasterizer: RasterizerDesc) -> &mut Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn depth_stencil_state(&mut self, depth: Option<DepthStencilDesc>) -> &mut Self {
        self.depth = depth;
        self
    }

    /// Compiles and validates the accumulated state.
    ///
    /// Idempotent for unchanged state; a missing binding layout, vertex
    /// shader or render-target format surfaces a single build failure.
    pub fn build(&self, device: &wgpu::Device) -> GpuResult<PipelineConfiguration> {
        let layout = self
            .layout
            .as_ref()
            .ok_or_else(|| self.missing("binding layout"))?;
        let (vs_module, vs_entry) = self
            .vertex_shader
            .as_ref()
            .ok_or_else(|| self.missing("vertex shader"))?;
        let color_format = self
            .color_format
            .ok_or_else(|| self.missing("render target format"))?;

        let buffers: Vec<wgpu::VertexBufferLayout> = self
            .vertex_layout
            .as_ref()
            .map(|v| {
                vec![wgpu::VertexBufferLayout {
                    array_stride: v.stride,
                    step_mode: v.step_mode,
                    attributes: &v.attributes,
                }]
            })
            .unwrap_or_default();

        let rasterizer = self.rasterizer.clone().unwrap_or_default();

        let targets = [Some(wgpu::ColorTargetState {
            format: color_format,
            blend: self.blend,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&self.label),
            layout: Some(layout.pipeline_layout()),

            vertex: wgpu::VertexState {
                module: vs_module,
                entry_point: Some(vs_entry),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: self.pixel_shader.as_ref().map(|(module, entry)| {
                wgpu::FragmentState {
                    module,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &targets,
                }
            }),

            primitive: wgpu::PrimitiveState {
                topology: self.topology.unwrap_or(wgpu::PrimitiveTopology::TriangleList),
                strip_index_format: None,
                front_face: rasterizer.front_face,
                cull_mode: rasterizer.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: self.depth.as_ref().map(|d| wgpu::DepthStencilState {
                format: d.format,
                depth_write_enabled: d.depth_write,
                depth_compare: d.compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        log::debug!("built pipeline '{}'", self.label);
        Ok(PipelineConfiguration {
            label: self.label.clone(),
            pipeline,
            layout: Arc::clone(layout),
            depth_format: self.depth.as_ref().map(|d| d.format),
        })
    }

    fn missing(&self, what: &str) -> GpuError {
        GpuError::contract(format!("pipeline '{}' built without a {what}", self.label))
    }
}

/// Immutable, shareable pipeline configuration.
#[derive(Debug)]
pub struct PipelineConfiguration {
    label: String,
    pipeline: wgpu::RenderPipeline,
    layout: Arc<BindingLayout>,
    depth_format: Option<wgpu::TextureFormat>,
}

impl PipelineConfiguration {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn layout(&self) -> &Arc<BindingLayout> {
        &self.layout
    }

    /// Depth attachment format this pipeline expects, if depth testing is on.
    pub fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        self.depth_format
    }

    /// Binds the pipeline and, if present, its static-sampler group.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        if let Some((index, group)) = self.layout.sampler_group() {
            pass.set_bind_group(index, group, &[]);
        }
    }
}
