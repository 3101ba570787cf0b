mod common;

use nergal_gpu::GpuError;
use nergal_gpu::sync::FenceCounter;

#[test]
fn wait_is_a_noop_once_completed() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let mut fence = FenceCounter::new(ctx.device.clone());

    fence.signal(&ctx.queue, 1)?;
    fence.wait(1)?;
    assert!(fence.completed_value() >= 1);

    // Already satisfied: must return immediately without arming a wait.
    fence.wait(1)?;
    Ok(())
}

#[test]
fn signaled_value_never_decreases() {
    let Some(ctx) = common::test_context() else {
        return;
    };
    let mut fence = FenceCounter::new(ctx.device.clone());
    fence.signal(&ctx.queue, 5).unwrap();
    let err = fence.signal(&ctx.queue, 3).unwrap_err();
    assert!(matches!(err, GpuError::Contract(_)));
    assert_eq!(fence.last_signaled(), 5);
}

#[test]
fn waiting_past_the_signaled_value_fails_loudly() {
    let Some(ctx) = common::test_context() else {
        return;
    };
    let mut fence = FenceCounter::new(ctx.device.clone());
    fence.signal(&ctx.queue, 1).unwrap();

    // A wait on 2 would never fire; that is a bug in the caller.
    let err = fence.wait(2).unwrap_err();
    assert!(matches!(err, GpuError::Contract(_)));
}

#[test]
fn waits_can_skip_intermediate_values() -> anyhow::Result<()> {
    let Some(ctx) = common::test_context() else {
        return Ok(());
    };
    let mut fence = FenceCounter::new(ctx.device.clone());
    fence.signal(&ctx.queue, 1)?;
    fence.signal(&ctx.queue, 2)?;
    fence.signal(&ctx.queue, 3)?;

    fence.wait(3)?;
    assert!(fence.completed_value() >= 3);
    // Earlier values are covered by the later wait.
    fence.wait(1)?;
    fence.wait(2)?;
    Ok(())
}
