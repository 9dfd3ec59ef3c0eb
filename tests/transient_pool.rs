use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use wendy::renderer::{
    BufferId, ColorVertex, DeviceCall, IndexType, SlotInfo, TransientBufferPool, Vertex,
    VertexRange,
};
use wendy::{RecordingDevice, RenderError, RenderSettings, Renderer};

#[test]
fn oversized_request_gets_its_own_slot() {
    let mut device = RecordingDevice::new();
    let mut pool = TransientBufferPool::new(1024);

    let large = pool
        .allocate_vertices(&mut device, 1200, &Vertex::format())
        .unwrap();
    let info = pool.slot_for(large.buffer).unwrap();
    assert_eq!(info.capacity, 1200);
    assert_eq!(info.available, 0);

    let next = pool
        .allocate_vertices(&mut device, 1, &Vertex::format())
        .unwrap();
    assert_ne!(next.buffer, large.buffer);
    assert_eq!(pool.vertex_slot_count(), 2);
    assert_eq!(
        pool.slot_for(next.buffer),
        Some(SlotInfo {
            buffer: next.buffer,
            capacity: 1024,
            available: 1023
        })
    );
}

#[test]
fn random_allocations_never_overlap() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mut device = RecordingDevice::new();
    let mut pool = TransientBufferPool::new(256);
    let mut ranges: Vec<VertexRange> = Vec::new();

    for _ in 0..200 {
        let count = rng.gen_range(1..=300);
        ranges.push(
            pool.allocate_vertices(&mut device, count, &Vertex::format())
                .unwrap(),
        );
    }

    for range in &ranges {
        let slot = pool.slot_for(range.buffer).unwrap();
        assert!(range.end() <= slot.capacity);
    }
    for (i, a) in ranges.iter().enumerate() {
        for b in &ranges[i + 1..] {
            if a.buffer == b.buffer {
                assert!(
                    a.end() <= b.start || b.end() <= a.start,
                    "{:?} overlaps {:?}",
                    a,
                    b
                );
            }
        }
    }

    let slots_before = pool.vertex_slot_count();
    pool.reset();
    assert!(pool.vertex_slots().all(|slot| slot.available == slot.capacity));

    let reused = pool
        .allocate_vertices(&mut device, 10, &Vertex::format())
        .unwrap();
    assert_eq!(reused.start, 0);
    assert_eq!(pool.vertex_slot_count(), slots_before);
}

#[test]
fn finishing_a_frame_recycles_transient_buffers() {
    let mut renderer = Renderer::new(RecordingDevice::new(), RenderSettings::default()).unwrap();

    renderer.begin_frame().unwrap();
    let first = renderer.allocate_indices(600, IndexType::U16).unwrap();
    renderer.allocate_indices(400, IndexType::U16).unwrap();
    renderer.finish_frame().unwrap();

    renderer.begin_frame().unwrap();
    let again = renderer.allocate_indices(600, IndexType::U16).unwrap();
    renderer.finish_frame().unwrap();

    assert_eq!(again.buffer, first.buffer);
    assert_eq!(again.start, 0);
    assert_eq!(renderer.pool().index_slot_count(), 1);
}

#[test]
fn allocation_failure_is_reported() {
    let mut renderer = Renderer::new(RecordingDevice::new(), RenderSettings::default()).unwrap();
    renderer.device_mut().set_buffer_creation_failing(true);

    let result = renderer.allocate_vertices(3, &Vertex::format());

    assert!(matches!(
        result,
        Err(RenderError::BufferCreation { kind: "vertex", .. })
    ));
}

#[test]
fn vertex_writes_must_fit_the_range() {
    let mut renderer = Renderer::new(RecordingDevice::new(), RenderSettings::default()).unwrap();
    let range = renderer.allocate_vertices(2, &Vertex::format()).unwrap();
    let vertex = Vertex {
        pos: [0.0; 3],
        normal: [0.0, 0.0, 1.0],
        uv: [0.0; 2],
    };

    assert!(matches!(
        renderer.write_vertices(&range, &[vertex; 3]),
        Err(RenderError::RangeOverflow {
            count: 3,
            capacity: 2
        })
    ));
    renderer.write_vertices(&range, &[vertex; 2]).unwrap();
}

#[test]
fn vertex_writes_must_match_the_slot_format() {
    let mut renderer = Renderer::new(RecordingDevice::new(), RenderSettings::default()).unwrap();
    let first = renderer.allocate_vertices(10, &Vertex::format()).unwrap();
    let second = renderer.allocate_vertices(10, &Vertex::format()).unwrap();
    assert_eq!(first.buffer, second.buffer);
    renderer.device_mut().clear();

    let colored = ColorVertex {
        pos: [0.0; 3],
        color: [1.0; 4],
    };
    assert!(matches!(
        renderer.write_vertices(&second, &[colored; 10]),
        Err(RenderError::VertexSizeMismatch {
            expected: 32,
            actual: 28
        })
    ));
    assert!(renderer.device().calls().is_empty());

    let vertex = Vertex {
        pos: [0.0; 3],
        normal: [0.0, 0.0, 1.0],
        uv: [0.0; 2],
    };
    renderer.write_vertices(&second, &[vertex; 10]).unwrap();
    assert_eq!(
        renderer.device().calls(),
        [DeviceCall::WriteBuffer {
            buffer: second.buffer,
            byte_offset: 320,
            len: 320
        }]
    );
}

#[test]
fn vertex_writes_reject_ranges_from_elsewhere() {
    let mut renderer = Renderer::new(RecordingDevice::new(), RenderSettings::default()).unwrap();
    let foreign = VertexRange::new(BufferId(99), 0, 4);
    let vertex = Vertex {
        pos: [0.0; 3],
        normal: [0.0, 0.0, 1.0],
        uv: [0.0; 2],
    };

    assert!(matches!(
        renderer.write_vertices(&foreign, &[vertex; 4]),
        Err(RenderError::ForeignRange(BufferId(99)))
    ));
}
