mod common;

use nergal_gpu::GpuError;
use nergal_gpu::descriptor::{DescriptorHeap, DescriptorKind, DescriptorView};
use nergal_gpu::offscreen::{RenderTargetManager, TargetState};
use nergal_gpu::pipeline::{BindingLayoutBuilder, PipelineBuilder, SamplerDesc, ShaderVisibility};
use nergal_gpu::resource::UsageState;
use std::sync::Arc;

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// Fullscreen triangle sampling one bound texture.
const BLIT_SHADER: &str = r#"
struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VsOut {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VsOut;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@group(0) @binding(0) var source: texture_2d<f32>;
@group(1) @binding(0) var source_sampler: sampler;

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(source, source_sampler, in.uv);
}
"#;

#[test]
fn begin_end_walks_the_state_machine() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let mut manager = RenderTargetManager::new();
    let handle = manager.create(&ctx.device, 256, 256, FORMAT)?;
    assert!(handle.is_valid());
    assert_eq!(manager.state_of(handle)?, TargetState::Created);
    assert_eq!(
        manager.texture_resource(handle)?.state(),
        UsageState::ShaderResource
    );

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
        let _pass = manager.begin_render(handle, &mut encoder)?;
    }
    assert_eq!(manager.state_of(handle)?, TargetState::Rendering);
    assert_eq!(
        manager.texture_resource(handle)?.state(),
        UsageState::RenderTarget
    );

    manager.end_render(handle)?;
    assert_eq!(manager.state_of(handle)?, TargetState::Created);
    assert_eq!(
        manager.texture_resource(handle)?.state(),
        UsageState::ShaderResource
    );

    ctx.queue.submit(Some(encoder.finish()));
    Ok(())
}

#[test]
fn double_begin_is_rejected() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let mut manager = RenderTargetManager::new();
    let handle = manager.create(&ctx.device, 64, 64, FORMAT)?;

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
        let _pass = manager.begin_render(handle, &mut encoder)?;
    }
    // The pass is closed but end_render was never called: still rendering.
    let err = manager.begin_render(handle, &mut encoder).unwrap_err();
    assert!(matches!(err, GpuError::Contract(_)));

    manager.end_render(handle)?;
    Ok(())
}

#[test]
fn end_without_begin_is_rejected() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let mut manager = RenderTargetManager::new();
    let handle = manager.create(&ctx.device, 64, 64, FORMAT)?;
    let err = manager.end_render(handle).unwrap_err();
    assert!(matches!(err, GpuError::Contract(_)));
    Ok(())
}

#[test]
fn destroyed_handle_goes_stale() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let mut manager = RenderTargetManager::new();
    let handle = manager.create(&ctx.device, 64, 64, FORMAT)?;
    assert_eq!(manager.live_count(), 1);

    manager.destroy(handle)?;
    assert_eq!(manager.live_count(), 0);
    assert!(manager.shader_view(handle).is_err());
    assert!(manager.destroy(handle).is_err());

    // The slot is reused; the new handle is valid again.
    let again = manager.create(&ctx.device, 64, 64, FORMAT)?;
    assert_eq!(again, handle);
    assert!(manager.shader_view(again).is_ok());
    Ok(())
}

#[test]
fn rendered_target_samples_in_a_later_pass() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let mut manager = RenderTargetManager::new();
    let source = manager.create(&ctx.device, 256, 256, FORMAT)?;
    let destination = manager.create(&ctx.device, 256, 256, FORMAT)?;
    manager.set_clear_color(
        source,
        wgpu::Color {
            r: 1.0,
            g: 0.5,
            b: 0.25,
            a: 1.0,
        },
    )?;

    let mut builder = BindingLayoutBuilder::new();
    builder
        .descriptor_table(DescriptorKind::ShaderResource, 1, 0, 0, ShaderVisibility::Pixel)
        .static_sampler(SamplerDesc::default());
    let layout = Arc::new(builder.build(&ctx.device)?);

    let module = Arc::new(
        ctx.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("blit"),
                source: wgpu::ShaderSource::Wgsl(BLIT_SHADER.into()),
            }),
    );
    let config = PipelineBuilder::new("blit")
        .binding_layout(Arc::clone(&layout))
        .vertex_shader(Arc::clone(&module), "vs_main")
        .pixel_shader(Arc::clone(&module), "fs_main")
        .render_target_format(FORMAT)
        .build(&ctx.device)?;

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

    // Pass 1: clear the source.
    {
        let _pass = manager.begin_render(source, &mut encoder)?;
    }
    manager.end_render(source)?;

    // Pass 2: sample the source while drawing into the destination.
    let mut heap = DescriptorHeap::allocate(1, DescriptorKind::ShaderResource, true)?;
    heap.write_view(0, DescriptorView::Texture(manager.shader_view(source)?.clone()))?;
    let table = heap.bind_group(&ctx.device, layout.group_layout(0)?)?;

    {
        let mut pass = manager.begin_render(destination, &mut encoder)?;
        config.bind(&mut pass);
        pass.set_bind_group(0, &table, &[]);
        pass.draw(0..3, 0..1);
    }
    manager.end_render(destination)?;

    ctx.queue.submit(Some(encoder.finish()));
    ctx.device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| anyhow::anyhow!("poll failed: {e}"))?;
    Ok(())
}
