mod common;

use nergal_gpu::resource::{ResourceKind, UsageState};
use nergal_gpu::upload::{TextureUploadDesc, UploadEngine};

#[test]
fn buffer_upload_round_trips_exactly() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let engine = UploadEngine::new(&ctx);

    let bytes: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();
    let resource = engine.upload_buffer(&bytes, UsageState::VertexBuffer, "test vertices")?;

    assert_eq!(resource.kind(), ResourceKind::Buffer);
    assert_eq!(resource.state(), UsageState::VertexBuffer);
    assert_eq!(resource.size_bytes(), bytes.len() as u64);

    let read = engine.read_back_buffer(&resource)?;
    assert_eq!(read, bytes);
    Ok(())
}

#[test]
fn unaligned_length_round_trips_exactly() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let engine = UploadEngine::new(&ctx);

    // 13 bytes: copy padding must never leak into the read-back.
    let bytes = vec![7u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
    let resource = engine.upload_buffer(&bytes, UsageState::IndexBuffer, "odd bytes")?;
    assert_eq!(engine.read_back_buffer(&resource)?, bytes);
    Ok(())
}

#[test]
fn empty_upload_is_an_upload_error() {
    let Some(ctx) = common::test_context() else {
        return;
    };
    let engine = UploadEngine::new(&ctx);
    let err = engine
        .upload_buffer(&[], UsageState::VertexBuffer, "empty")
        .unwrap_err();
    assert!(matches!(err, nergal_gpu::GpuError::Upload(_)));
}

#[test]
fn render_target_is_not_a_buffer_upload_state() {
    let Some(ctx) = common::test_context() else {
        return;
    };
    let engine = UploadEngine::new(&ctx);
    let err = engine
        .upload_buffer(&[0u8; 16], UsageState::RenderTarget, "bad state")
        .unwrap_err();
    assert!(matches!(err, nergal_gpu::GpuError::Contract(_)));
}

#[test]
fn texture_upload_ends_shader_readable() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let engine = UploadEngine::new(&ctx);

    // 3x3: the unpadded row is well below the copy alignment, so the staging
    // repack path is exercised.
    let desc = TextureUploadDesc {
        width: 3,
        height: 3,
        format: wgpu::TextureFormat::Rgba8Unorm,
    };
    let bytes = vec![0xABu8; 3 * 3 * 4];
    let resource = engine.upload_texture(&desc, &bytes, "test texture")?;

    assert_eq!(resource.kind(), ResourceKind::Texture);
    assert_eq!(resource.state(), UsageState::ShaderResource);
    Ok(())
}

#[test]
fn texture_upload_rejects_wrong_byte_count() {
    let Some(ctx) = common::test_context() else {
        return;
    };
    let engine = UploadEngine::new(&ctx);
    let desc = TextureUploadDesc {
        width: 4,
        height: 4,
        format: wgpu::TextureFormat::Rgba8Unorm,
    };
    let err = engine
        .upload_texture(&desc, &[0u8; 10], "short texture")
        .unwrap_err();
    assert!(matches!(err, nergal_gpu::GpuError::Upload(_)));
}
