use crate::descriptor::DescriptorKind;
use crate::error::{GpuError, GpuResult};
use crate::resource::GpuResource;

/// Which shader stages a parameter is visible to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderVisibility {
    All,
    Vertex,
    Pixel,
}

impl ShaderVisibility {
    pub fn stages(self) -> wgpu::ShaderStages {
        match self {
            ShaderVisibility::All => wgpu::ShaderStages::VERTEX_FRAGMENT,
            ShaderVisibility::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderVisibility::Pixel => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

/// Static sampler description baked into a binding layout.
#[derive(Debug, Clone)]
pub struct SamplerDesc {
    pub filter: wgpu::FilterMode,
    pub address_mode: wgpu::AddressMode,
    pub compare: Option<wgpu::CompareFunction>,
    pub visibility: ShaderVisibility,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            filter: wgpu::FilterMode::Linear,
            address_mode: wgpu::AddressMode::Repeat,
            compare: None,
            visibility: ShaderVisibility::Pixel,
        }
    }
}

/// One parameter slot of a binding layout.
///
/// `base_slot`/`space` carry the register assignment for bookkeeping; groups
/// are indexed by parameter order.
#[derive(Debug, Clone)]
pub enum BindingParam {
    DescriptorTable {
        kind: DescriptorKind,
        count: u32,
        base_slot: u32,
        space: u32,
        visibility: ShaderVisibility,
    },
    InlineConstantBuffer {
        slot: u32,
        space: u32,
        visibility: ShaderVisibility,
    },
}

/// Accumulates binding-layout parameters in call order.
#[derive(Default)]
pub struct BindingLayoutBuilder {
    params: Vec<BindingParam>,
    samplers: Vec<SamplerDesc>,
}

impl BindingLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor-table parameter referencing `count` contiguous heap
    /// entries.
    pub fn descriptor_table(
        &mut self,
        kind: DescriptorKind,
        count: u32,
        base_slot: u32,
        space: u32,
        visibility: ShaderVisibility,
    ) -> &mut Self {
        self.params.push(BindingParam::DescriptorTable {
            kind,
            count,
            base_slot,
            space,
            visibility,
        });
        self
    }

    /// Adds an inline constant-buffer parameter bound directly by address.
    pub fn inline_constant_buffer(
        &mut self,
        slot: u32,
        space: u32,
        visibility: ShaderVisibility,
    ) -> &mut Self {
        self.params.push(BindingParam::InlineConstantBuffer {
            slot,
            space,
            visibility,
        });
        self
    }

    /// Adds a static sampler. All static samplers land in one extra group
    /// after the last parameter.
    pub fn static_sampler(&mut self, desc: SamplerDesc) -> &mut Self {
        self.samplers.push(desc);
        self
    }

    pub fn params(&self) -> &[BindingParam] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Serializes the accumulated parameters into an immutable layout.
    pub fn build(&self, device: &wgpu::Device) -> GpuResult<BindingLayout> {
        let mut group_layouts = Vec::with_capacity(self.params.len() + 1);

        for (index, param) in self.params.iter().enumerate() {
            group_layouts.push(group_layout_for_param(device, index, param)?);
        }

        let sampler_group_index = if self.samplers.is_empty() {
            None
        } else {
            Some(group_layouts.len() as u32)
        };

        let mut sampler_bind_group = None;
        if sampler_group_index.is_some() {
            let (layout, group) = build_sampler_group(device, &self.samplers);
            group_layouts.push(layout);
            sampler_bind_group = Some(group);
        }

        let refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("binding layout"),
            bind_group_layouts: &refs,
            // Newer wgpu uses immediate constants; inline CBVs cover that role.
            immediate_size: 0,
        });

        Ok(BindingLayout {
            params: self.params.clone(),
            group_layouts,
            pipeline_layout,
            sampler_group_index,
            sampler_bind_group,
        })
    }
}

fn group_layout_for_param(
    device: &wgpu::Device,
    index: usize,
    param: &BindingParam,
) -> GpuResult<wgpu::BindGroupLayout> {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = match *param {
        BindingParam::DescriptorTable {
            kind,
            count,
            visibility,
            ..
        } => {
            if count == 0 {
                return Err(GpuError::contract(format!(
                    "descriptor table at parameter {index} has zero entries"
                )));
            }
            if !kind.bindable() {
                return Err(GpuError::contract(format!(
                    "descriptor table at parameter {index} uses non-bindable kind {kind:?}"
                )));
            }
            (0..count)
                .map(|binding| wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: visibility.stages(),
                    ty: match kind {
                        DescriptorKind::ShaderResource => wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        DescriptorKind::ConstantBuffer => wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        DescriptorKind::Sampler => {
                            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                        }
                        // Filtered out by `bindable` above.
                        DescriptorKind::RenderTarget | DescriptorKind::DepthStencil => {
                            unreachable!("non-bindable descriptor kind")
                        }
                    },
                    count: None,
                })
                .collect()
        }
        BindingParam::InlineConstantBuffer { visibility, .. } => {
            vec![wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: visibility.stages(),
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }]
        }
    };

    Ok(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("binding layout parameter"),
        entries: &entries,
    }))
}

fn build_sampler_group(
    device: &wgpu::Device,
    descs: &[SamplerDesc],
) -> (wgpu::BindGroupLayout, wgpu::BindGroup) {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = descs
        .iter()
        .enumerate()
        .map(|(binding, desc)| wgpu::BindGroupLayoutEntry {
            binding: binding as u32,
            visibility: desc.visibility.stages(),
            ty: wgpu::BindingType::Sampler(if desc.compare.is_some() {
                wgpu::SamplerBindingType::Comparison
            } else {
                wgpu::SamplerBindingType::Filtering
            }),
            count: None,
        })
        .collect();

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("static samplers"),
        entries: &entries,
    });

    let samplers: Vec<wgpu::Sampler> = descs
        .iter()
        .map(|desc| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("static sampler"),
                address_mode_u: desc.address_mode,
                address_mode_v: desc.address_mode,
                address_mode_w: desc.address_mode,
                mag_filter: desc.filter,
                min_filter: desc.filter,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                compare: desc.compare,
                ..Default::default()
            })
        })
        .collect();

    let group_entries: Vec<wgpu::BindGroupEntry> = samplers
        .iter()
        .enumerate()
        .map(|(binding, sampler)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: wgpu::BindingResource::Sampler(sampler),
        })
        .collect();

    let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("static samplers"),
        layout: &layout,
        entries: &group_entries,
    });

    (layout, group)
}

/// Immutable resource-binding layout.
///
/// Parameter order is fixed at build time and must match the order draw-time
/// bindings are issued in: parameter `i` binds at group index `i`, with the
/// static-sampler group (if any) appended after the last parameter.
#[derive(Debug)]
pub struct BindingLayout {
    params: Vec<BindingParam>,
    group_layouts: Vec<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
    sampler_group_index: Option<u32>,
    sampler_bind_group: Option<wgpu::BindGroup>,
}

impl BindingLayout {
    pub fn params(&self) -> &[BindingParam] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn pipeline_layout(&self) -> &wgpu::PipelineLayout {
        &self.pipeline_layout
    }

    /// Bind-group layout for parameter `index`; used to realize descriptor
    /// heaps and inline constant buffers.
    pub fn group_layout(&self, index: usize) -> GpuResult<&wgpu::BindGroupLayout> {
        self.group_layouts.get(index).ok_or_else(|| {
            GpuError::contract(format!(
                "parameter index {index} out of range ({} parameters)",
                self.params.len()
            ))
        })
    }

    /// The appended static-sampler group, if any samplers were declared.
    pub fn sampler_group(&self) -> Option<(u32, &wgpu::BindGroup)> {
        match (self.sampler_group_index, &self.sampler_bind_group) {
            (Some(index), Some(group)) => Some((index, group)),
            _ => None,
        }
    }

    /// Builds the bind group for an inline constant-buffer parameter.
    pub fn constant_buffer_bind_group(
        &self,
        device: &wgpu::Device,
        index: usize,
        buffer: &GpuResource,
    ) -> GpuResult<wgpu::BindGroup> {
        match self.params.get(index) {
            Some(BindingParam::InlineConstantBuffer { .. }) => {}
            Some(other) => {
                return Err(GpuError::contract(format!(
                    "parameter {index} is {other:?}, not an inline constant buffer"
                )));
            }
            None => {
                return Err(GpuError::contract(format!(
                    "parameter index {index} out of range ({} parameters)",
                    self.params.len()
                )));
            }
        }

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("inline constant buffer"),
            layout: self.group_layout(index)?,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.buffer()?.as_entire_binding(),
            }],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── call order defines parameter indices ──────────────────────────────

    #[test]
    fn params_keep_call_order() {
        let mut builder = BindingLayoutBuilder::new();
        builder
            .descriptor_table(DescriptorKind::ShaderResource, 2, 0, 0, ShaderVisibility::Pixel)
            .inline_constant_buffer(0, 0, ShaderVisibility::Vertex)
            .descriptor_table(DescriptorKind::ConstantBuffer, 1, 1, 0, ShaderVisibility::All);

        assert_eq!(builder.param_count(), 3);
        assert!(matches!(
            builder.params()[0],
            BindingParam::DescriptorTable { count: 2, .. }
        ));
        assert!(matches!(
            builder.params()[1],
            BindingParam::InlineConstantBuffer { slot: 0, .. }
        ));
        assert!(matches!(
            builder.params()[2],
            BindingParam::DescriptorTable { count: 1, .. }
        ));
    }

    #[test]
    fn visibility_maps_to_stages() {
        assert_eq!(
            ShaderVisibility::All.stages(),
            wgpu::ShaderStages::VERTEX_FRAGMENT
        );
        assert_eq!(ShaderVisibility::Vertex.stages(), wgpu::ShaderStages::VERTEX);
        assert_eq!(ShaderVisibility::Pixel.stages(), wgpu::ShaderStages::FRAGMENT);
    }
}
