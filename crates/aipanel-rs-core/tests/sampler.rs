//! Sampler integration tests.

use aipanel_rs_core::Sampler;
use aipanel_rs_protocol::ResourceKind;
use aipanel_rs_test_utils::StaticProbe;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn gpu_samples_are_flagged_simulated() {
    let sampler = Sampler::new(Arc::new(StaticProbe::new(10.0, 20.0, 30.0)), 30);
    let [cpu, memory, gpu] = sampler.sample_once();

    assert_eq!((cpu.kind, cpu.value, cpu.simulated), (ResourceKind::Cpu, 10.0, false));
    assert_eq!(
        (memory.kind, memory.value, memory.simulated),
        (ResourceKind::Memory, 20.0, false)
    );
    assert_eq!(gpu.kind, ResourceKind::Gpu);
    assert!(gpu.simulated);
    assert!((0.0..=100.0).contains(&gpu.value));
}

#[test]
fn buffers_never_exceed_capacity() {
    let sampler = Sampler::new(Arc::new(StaticProbe::default()), 30);
    for _ in 0..45 {
        sampler.sample_once();
    }
    let buffers = sampler.buffers();
    let buffers = buffers.lock();
    for kind in ResourceKind::ALL {
        assert_eq!(buffers.buffer(kind).len(), 30);
    }
}

#[test]
fn readings_outside_percent_range_are_clamped() {
    let sampler = Sampler::new(Arc::new(StaticProbe::new(140.0, -3.0, 0.0)), 5);
    let [cpu, memory, _] = sampler.sample_once();
    assert_eq!(cpu.value, 100.0);
    assert_eq!(memory.value, 0.0);
}

#[tokio::test(start_paused = true)]
async fn spawned_sampler_ticks_on_interval() {
    let sampler = Arc::new(Sampler::new(Arc::new(StaticProbe::default()), 30));
    let buffers = sampler.buffers();
    let task = sampler.spawn(Duration::from_secs(1));

    tokio::time::sleep(Duration::from_millis(3500)).await;
    task.abort();

    // Immediate first tick plus one per elapsed second.
    assert_eq!(buffers.lock().buffer(ResourceKind::Cpu).len(), 4);
}
