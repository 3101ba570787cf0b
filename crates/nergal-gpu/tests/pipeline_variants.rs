mod common;

use nergal_gpu::GpuError;
use nergal_gpu::device::{DeviceInit, FrameController};
use nergal_gpu::offscreen::RenderTargetManager;
use nergal_gpu::pipeline::{
    BindingLayoutBuilder, DepthStencilDesc, PipelineBuilder, PipelineLibrary, ShaderVisibility,
    VertexLayout,
};
use nergal_gpu::resource::{TypedBuffer, UsageState};
use nergal_gpu::upload::UploadEngine;
use std::sync::Arc;

// One tinted triangle fed from a vertex buffer and a uniform.
const TINT_SHADER: &str = r#"
struct Params {
    tint: vec4<f32>,
};

@group(0) @binding(0) var<uniform> params: Params;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.5, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return params.tint;
}
"#;

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct Params {
    tint: [f32; 4],
}

#[test]
fn build_without_layout_fails_once() {
    let Some(ctx) = common::test_context() else {
        return;
    };
    let err = PipelineBuilder::new("incomplete").build(&ctx.device).unwrap_err();
    assert!(matches!(err, GpuError::Contract(_)));
}

#[test]
fn sibling_variants_stay_independently_valid() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let mut controller = FrameController::headless(&ctx, DeviceInit::default())?;
    let engine = UploadEngine::new(&ctx);

    let mut builder = BindingLayoutBuilder::new();
    builder.inline_constant_buffer(0, 0, ShaderVisibility::All);
    let layout = Arc::new(builder.build(&ctx.device)?);

    let module = Arc::new(
        ctx.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("tint"),
                source: wgpu::ShaderSource::Wgsl(TINT_SHADER.into()),
            }),
    );

    let mut builder = PipelineBuilder::new("tint");
    builder
        .binding_layout(Arc::clone(&layout))
        .vertex_shader(Arc::clone(&module), "vs_main")
        .pixel_shader(Arc::clone(&module), "fs_main")
        .vertex_layout(VertexLayout {
            stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: wgpu::vertex_attr_array![0 => Float32x2].to_vec(),
        })
        .render_target_format(controller.backbuffer_format())
        .depth_stencil_state(Some(DepthStencilDesc::default()));
    let with_depth = Arc::new(builder.build(&ctx.device)?);
    assert_eq!(
        with_depth.depth_format(),
        Some(controller.depth_format())
    );

    // Same builder, depth disabled, retargeted at an offscreen format. The
    // first configuration must survive the rebuild untouched.
    builder
        .depth_stencil_state(None)
        .render_target_format(wgpu::TextureFormat::Rgba8Unorm);
    let without_depth = Arc::new(builder.build(&ctx.device)?);
    assert_eq!(without_depth.depth_format(), None);
    assert_eq!(with_depth.depth_format(), Some(wgpu::TextureFormat::Depth32Float));

    let mut library = PipelineLibrary::new();
    library.insert("tint", Arc::clone(&with_depth));
    library.insert("tint_no_depth", Arc::clone(&without_depth));
    assert_eq!(library.len(), 2);

    let vertices: [[f32; 2]; 3] = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]];
    let vertex_buffer = engine.upload_buffer(
        bytemuck::cast_slice(&vertices),
        UsageState::VertexBuffer,
        "triangle",
    )?;

    let params = TypedBuffer::<Params>::new(&ctx.device, "tint params")?;
    params.update(
        &ctx.queue,
        &Params {
            tint: [0.0, 1.0, 0.0, 1.0],
        },
    )?;
    let param_group = layout.constant_buffer_bind_group(&ctx.device, 0, params.resource())?;

    // Depth variant draws inside the frame pass (color + depth attachments).
    let mut frame = controller.begin_frame()?;
    {
        let mut pass = frame.begin_pass(wgpu::Color::BLACK);
        let config = library.require("tint")?;
        config.bind(&mut pass);
        pass.set_bind_group(0, &param_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.buffer()?.slice(..));
        pass.draw(0..3, 0..1);
    }
    controller.end_frame(frame)?;

    // No-depth variant draws into an offscreen pass (color only).
    let mut manager = RenderTargetManager::new();
    let target = manager.create(&ctx.device, 128, 128, wgpu::TextureFormat::Rgba8Unorm)?;
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
        let mut pass = manager.begin_render(target, &mut encoder)?;
        let config = library.require("tint_no_depth")?;
        config.bind(&mut pass);
        pass.set_bind_group(0, &param_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.buffer()?.slice(..));
        pass.draw(0..3, 0..1);
    }
    manager.end_render(target)?;
    ctx.queue.submit(Some(encoder.finish()));
    ctx.device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| anyhow::anyhow!("poll failed: {e}"))?;
    Ok(())
}
