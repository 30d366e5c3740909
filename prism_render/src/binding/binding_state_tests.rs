use super::*;
use crate::binding::mock_binding::{BlockCall, MockBlock, RecordingDirectives};

// ============================================================================
// Helpers
// ============================================================================

fn setup(max_bindings: u32) -> (BlockBindingState, RecordingDirectives) {
    (BlockBindingState::new(max_bindings), RecordingDirectives::new())
}

// ============================================================================
// Basic binding tests
// ============================================================================

#[test]
fn test_sequential_bind() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();
    let b = MockBlock::storage();
    let c = MockBlock::uniform();

    assert_eq!(state.bind(&a.as_block(), &mut sink).unwrap(), 0);
    assert_eq!(state.bind(&b.as_block(), &mut sink).unwrap(), 1);
    assert_eq!(state.bind(&c.as_block(), &mut sink).unwrap(), 2);
    assert_eq!(state.bound_count(), 3);
    assert_eq!(state.next_binding(), 3);
    assert!(sink.directives.is_empty());
}

#[test]
fn test_new_is_empty() {
    let state = BlockBindingState::new(4);
    assert_eq!(state.bound_count(), 0);
    assert_eq!(state.next_binding(), 0);
    assert_eq!(state.max_bindings(), 4);
    assert!(state.bound_name(0).is_none());
    assert!(!state.is_used(0));
}

#[test]
fn test_bind_issues_driver_bind_and_marks_used() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();

    let slot = state.bind(&a.as_block(), &mut sink).unwrap();

    assert_eq!(a.calls(), vec![BlockCall::Bind(slot)]);
    assert!(state.is_used(slot));
    assert_eq!(state.binding_of(a.id), Some(slot));
}

#[test]
fn test_rebind_keeps_slot_but_binds_again() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();
    let handle = a.as_block();

    let first = state.bind(&handle, &mut sink).unwrap();
    let second = state.bind(&handle, &mut sink).unwrap();

    assert_eq!(first, second);
    assert_eq!(state.bound_count(), 1);
    assert_eq!(a.calls(), vec![BlockCall::Bind(0), BlockCall::Bind(0)]);
}

#[test]
fn test_separate_handles_to_same_block_share_slot() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();

    let first = state.bind(&a.as_block(), &mut sink).unwrap();
    let second = state.bind(&a.as_block(), &mut sink).unwrap();

    assert_eq!(first, second);
    assert_eq!(state.bound_count(), 1);
}

#[test]
fn test_slots_are_unique() {
    let (mut state, mut sink) = setup(64);
    let blocks: Vec<_> = (0..40).map(|_| MockBlock::uniform()).collect();
    let mut seen = std::collections::HashSet::new();

    for block in &blocks {
        let slot = state.bind(&block.as_block(), &mut sink).unwrap();
        assert!(seen.insert(slot), "duplicate binding: {}", slot);
    }
    assert_eq!(seen.len(), 40);
}

// ============================================================================
// Unsupported kind tests
// ============================================================================

#[test]
fn test_bind_unsupported_target_fails() {
    let (mut state, mut sink) = setup(8);
    // GL_ARRAY_BUFFER
    let vbo = MockBlock::with_target(0x8892);

    let result = state.bind(&vbo.as_block(), &mut sink);

    assert_eq!(result, Err(Error::UnsupportedKind { target: 0x8892 }));
    assert_eq!(state.bound_count(), 0);
    assert!(vbo.calls().is_empty());
}

#[test]
fn test_bind_named_unsupported_target_fails() {
    let (mut state, mut sink) = setup(8);
    let vbo = MockBlock::with_target(0x8892);

    let result = state.bind_named("Vertices", &vbo.as_block(), &mut sink);

    assert!(matches!(result, Err(Error::UnsupportedKind { .. })));
    assert!(sink.directives.is_empty());
}

#[test]
fn test_unbind_unsupported_target_fails() {
    let (mut state, mut sink) = setup(8);
    let vbo = MockBlock::with_target(0);

    assert!(state.unbind(&vbo.as_block(), &mut sink).is_err());
}

// ============================================================================
// Named binding tests
// ============================================================================

#[test]
fn test_bind_named_emits_directive_per_kind() {
    let (mut state, mut sink) = setup(8);
    let camera = MockBlock::uniform();
    let lights = MockBlock::storage();

    state.bind_named("CameraMatrices", &camera.as_block(), &mut sink).unwrap();
    state.bind_named("LightData", &lights.as_block(), &mut sink).unwrap();

    assert_eq!(
        sink.directives,
        vec![
            BlockDirective::new(BlockKind::Uniform, "CameraMatrices", 0),
            BlockDirective::new(BlockKind::Storage, "LightData", 1),
        ]
    );
    assert_eq!(state.bound_name(0), Some("CameraMatrices"));
    assert_eq!(state.bound_name(1), Some("LightData"));
}

#[test]
fn test_bind_named_same_name_is_deduplicated() {
    let (mut state, mut sink) = setup(8);
    let camera = MockBlock::uniform();
    let handle = camera.as_block();

    state.bind_named("CameraMatrices", &handle, &mut sink).unwrap();
    state.bind_named("CameraMatrices", &handle, &mut sink).unwrap();

    assert_eq!(sink.directives.len(), 1);
    // Driver bind still happens every time
    assert_eq!(camera.bind_count(), 2);
}

#[test]
fn test_bind_named_new_name_on_same_slot_resends() {
    let (mut state, mut sink) = setup(8);
    let block = MockBlock::uniform();
    let handle = block.as_block();

    state.bind_named("Fog", &handle, &mut sink).unwrap();
    state.bind_named("Atmosphere", &handle, &mut sink).unwrap();

    assert_eq!(sink.directives.len(), 2);
    assert_eq!(sink.directives[1], BlockDirective::new(BlockKind::Uniform, "Atmosphere", 0));
    assert_eq!(state.bound_name(0), Some("Atmosphere"));
}

#[test]
fn test_queue_upload_forces_resend() {
    let (mut state, mut sink) = setup(8);
    let camera = MockBlock::uniform();
    let handle = camera.as_block();

    state.bind_named("CameraMatrices", &handle, &mut sink).unwrap();
    state.queue_upload();
    state.bind_named("CameraMatrices", &handle, &mut sink).unwrap();

    assert_eq!(sink.directives.len(), 2);
    assert_eq!(sink.directives[0], sink.directives[1]);
    // Assignment untouched
    assert_eq!(state.binding_of(camera.id), Some(0));
    assert_eq!(state.bound_count(), 1);
}

#[test]
fn test_queue_upload_keeps_assignments() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    state.bind_named("A", &a.as_block(), &mut sink).unwrap();
    state.bind_named("B", &b.as_block(), &mut sink).unwrap();

    state.queue_upload();

    assert!(state.bound_name(0).is_none());
    assert!(state.bound_name(1).is_none());
    assert_eq!(state.binding_of(a.id), Some(0));
    assert_eq!(state.binding_of(b.id), Some(1));
    assert!(a.unbind_count() == 0 && b.unbind_count() == 0);
}

// ============================================================================
// Unbind tests
// ============================================================================

#[test]
fn test_unbind_releases_slot_and_clears_name() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::storage();
    let handle = a.as_block();
    state.bind_named("Particles", &handle, &mut sink).unwrap();

    state.unbind(&handle, &mut sink).unwrap();

    assert_eq!(a.calls(), vec![BlockCall::Bind(0), BlockCall::Unbind(0)]);
    assert_eq!(state.binding_of(a.id), None);
    assert!(state.bound_name(0).is_none());
    assert!(!state.is_used(0));
    assert_eq!(
        sink.directives.last(),
        Some(&BlockDirective::new(BlockKind::Storage, "Particles", 0))
    );
}

#[test]
fn test_unbind_unnamed_emits_no_directive() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();
    let handle = a.as_block();
    state.bind(&handle, &mut sink).unwrap();

    state.unbind(&handle, &mut sink).unwrap();

    assert!(sink.directives.is_empty());
    assert_eq!(a.unbind_count(), 1);
}

#[test]
fn test_unbind_unknown_block_is_noop() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();

    state.unbind(&a.as_block(), &mut sink).unwrap();

    assert!(a.calls().is_empty());
    assert!(sink.directives.is_empty());
}

#[test]
fn test_unbind_fills_gap_with_lowest_slot() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    let c = MockBlock::uniform();
    let d = MockBlock::uniform();
    state.bind(&a.as_block(), &mut sink).unwrap();
    state.bind(&b.as_block(), &mut sink).unwrap();
    state.bind(&c.as_block(), &mut sink).unwrap();

    state.unbind(&b.as_block(), &mut sink).unwrap();
    assert_eq!(state.next_binding(), 1);

    assert_eq!(state.bind(&d.as_block(), &mut sink).unwrap(), 1);
    // Cursor skips the slots still held by A, D and C
    assert_eq!(state.next_binding(), 3);
}

#[test]
fn test_unbind_above_cursor_keeps_cursor() {
    let (mut state, mut sink) = setup(8);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    let c = MockBlock::uniform();
    state.bind(&a.as_block(), &mut sink).unwrap();
    state.bind(&b.as_block(), &mut sink).unwrap();
    state.bind(&c.as_block(), &mut sink).unwrap();
    state.unbind(&a.as_block(), &mut sink).unwrap();
    assert_eq!(state.next_binding(), 0);

    state.unbind(&c.as_block(), &mut sink).unwrap();

    assert_eq!(state.next_binding(), 0);
}

// ============================================================================
// Reclamation tests
// ============================================================================

#[test]
fn test_reclaims_first_unused_in_table_order() {
    let (mut state, mut sink) = setup(2);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    let c = MockBlock::uniform();
    state.bind_named("A", &a.as_block(), &mut sink).unwrap();
    state.bind_named("B", &b.as_block(), &mut sink).unwrap();
    state.clear();

    let slot = state.bind(&c.as_block(), &mut sink).unwrap();

    assert_eq!(slot, 0);
    assert_eq!(a.calls(), vec![BlockCall::Bind(0), BlockCall::Unbind(0)]);
    assert_eq!(b.unbind_count(), 0);
    assert_eq!(state.binding_of(a.id), None);
    assert_eq!(state.binding_of(c.id), Some(0));
    assert!(state.bound_name(0).is_none());
    assert_eq!(
        sink.directives.last(),
        Some(&BlockDirective::new(BlockKind::Uniform, "A", 0))
    );
}

#[test]
fn test_reclaim_skips_blocks_used_this_frame() {
    let (mut state, mut sink) = setup(2);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    let c = MockBlock::uniform();
    state.bind(&a.as_block(), &mut sink).unwrap();
    state.bind(&b.as_block(), &mut sink).unwrap();
    state.clear();
    // A is drawn with again this frame, B is stale
    state.bind(&a.as_block(), &mut sink).unwrap();

    let slot = state.bind(&c.as_block(), &mut sink).unwrap();

    assert_eq!(slot, 1);
    assert_eq!(b.calls(), vec![BlockCall::Bind(1), BlockCall::Unbind(1)]);
    assert_eq!(state.binding_of(a.id), Some(0));
}

#[test]
fn test_table_order_not_slot_order() {
    let (mut state, mut sink) = setup(2);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    let c = MockBlock::uniform();
    let d = MockBlock::uniform();
    state.bind(&a.as_block(), &mut sink).unwrap(); // 0
    state.bind(&b.as_block(), &mut sink).unwrap(); // 1
    state.unbind(&a.as_block(), &mut sink).unwrap();
    state.bind(&c.as_block(), &mut sink).unwrap(); // 0, appended after B
    state.clear();

    // B (slot 1) comes first in the table even though C holds the lower slot
    assert_eq!(state.bind(&d.as_block(), &mut sink).unwrap(), 1);
    assert_eq!(state.binding_of(b.id), None);
    assert_eq!(state.binding_of(c.id), Some(0));
}

#[test]
fn test_exhausted_when_all_used_this_frame() {
    let (mut state, mut sink) = setup(1);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    state.bind(&a.as_block(), &mut sink).unwrap();

    let result = state.bind(&b.as_block(), &mut sink);

    assert_eq!(result, Err(Error::BindingsExhausted { max_bindings: 1, requested: 2 }));
    assert!(b.calls().is_empty());
    assert_eq!(state.binding_of(a.id), Some(0));
    assert_eq!(a.unbind_count(), 0);
}

#[test]
fn test_zero_limit_is_exhausted_immediately() {
    let (mut state, mut sink) = setup(0);
    let a = MockBlock::uniform();

    assert!(matches!(
        state.bind(&a.as_block(), &mut sink),
        Err(Error::BindingsExhausted { max_bindings: 0, requested: 1 })
    ));
}

#[test]
fn test_clear_makes_slots_reclaimable_again() {
    let (mut state, mut sink) = setup(1);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    state.bind(&a.as_block(), &mut sink).unwrap();
    assert!(state.bind(&b.as_block(), &mut sink).is_err());

    state.clear();

    assert_eq!(state.bind(&b.as_block(), &mut sink).unwrap(), 0);
    assert_eq!(state.binding_of(a.id), None);
}

#[test]
fn test_frames_cycle_through_more_blocks_than_slots() {
    let (mut state, mut sink) = setup(4);
    let blocks: Vec<_> = (0..12).map(|_| MockBlock::uniform()).collect();

    for frame in blocks.chunks(4) {
        let mut seen = std::collections::HashSet::new();
        for block in frame {
            let slot = state.bind(&block.as_block(), &mut sink).unwrap();
            assert!(slot < 4);
            assert!(seen.insert(slot));
        }
        state.clear();
    }
    assert_eq!(state.bound_count(), 4);
}

// ============================================================================
// Limit tests
// ============================================================================

#[test]
fn test_raising_limit_avoids_reclamation() {
    let (mut state, mut sink) = setup(1);
    let a = MockBlock::uniform();
    let b = MockBlock::uniform();
    state.bind(&a.as_block(), &mut sink).unwrap();

    state.set_max_bindings(2, &mut sink);

    assert_eq!(state.bind(&b.as_block(), &mut sink).unwrap(), 1);
    assert_eq!(a.unbind_count(), 0);
}

#[test]
fn test_lowering_limit_evicts_slots_above_it() {
    let (mut state, mut sink) = setup(4);
    let blocks: Vec<_> = (0..4).map(|_| MockBlock::uniform()).collect();
    for block in &blocks {
        state.bind(&block.as_block(), &mut sink).unwrap();
    }
    state.clear();
    state.bind(&blocks[0].as_block(), &mut sink).unwrap();
    state.bind(&blocks[1].as_block(), &mut sink).unwrap();

    state.set_max_bindings(2, &mut sink);

    assert_eq!(state.bound_count(), 2);
    assert_eq!(state.binding_of(blocks[2].id), None);
    assert_eq!(state.binding_of(blocks[3].id), None);
    assert_eq!(blocks[2].calls().last(), Some(&BlockCall::Unbind(2)));
    assert_eq!(blocks[3].calls().last(), Some(&BlockCall::Unbind(3)));
    assert_eq!(state.next_binding(), 2);
}

#[test]
fn test_bind_after_lowering_limit_stays_below_it() {
    let (mut state, mut sink) = setup(4);
    let blocks: Vec<_> = (0..4).map(|_| MockBlock::uniform()).collect();
    for block in &blocks {
        state.bind(&block.as_block(), &mut sink).unwrap();
    }
    state.clear();
    state.bind(&blocks[0].as_block(), &mut sink).unwrap();
    state.bind(&blocks[1].as_block(), &mut sink).unwrap();
    state.set_max_bindings(2, &mut sink);
    let extra = MockBlock::uniform();

    // Both remaining slots were used this frame
    let result = state.bind(&extra.as_block(), &mut sink);
    assert_eq!(result, Err(Error::BindingsExhausted { max_bindings: 2, requested: 3 }));
    assert!(extra.calls().is_empty());

    state.clear();
    let slot = state.bind(&extra.as_block(), &mut sink).unwrap();
    assert_eq!(slot, 0);
    assert!(slot < state.max_bindings());
    assert_eq!(state.binding_of(blocks[0].id), None);
    assert_eq!(state.binding_of(blocks[1].id), Some(1));
}

#[test]
fn test_lowering_limit_clears_evicted_name() {
    let (mut state, mut sink) = setup(4);
    let a = MockBlock::uniform();
    let fog = MockBlock::uniform();
    state.bind(&a.as_block(), &mut sink).unwrap();
    state.bind_named("Fog", &fog.as_block(), &mut sink).unwrap();

    state.set_max_bindings(1, &mut sink);

    assert!(state.bound_name(1).is_none());
    assert!(!state.is_used(1));
    assert_eq!(
        sink.directives.last(),
        Some(&BlockDirective::new(BlockKind::Uniform, "Fog", 0))
    );
    assert_eq!(state.binding_of(a.id), Some(0));
}

#[test]
fn test_failed_driver_bind_is_propagated() {
    let (mut state, mut sink) = setup(4);
    let broken = MockBlock::failing();

    let result = state.bind(&broken.as_block(), &mut sink);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(!state.is_used(0));
}

#[test]
fn test_failed_driver_bind_releases_new_assignment() {
    let (mut state, mut sink) = setup(4);
    let a = MockBlock::uniform();
    let broken = MockBlock::failing();
    state.bind(&a.as_block(), &mut sink).unwrap();

    assert!(state.bind(&broken.as_block(), &mut sink).is_err());

    assert_eq!(state.binding_of(broken.id), None);
    assert_eq!(state.bound_count(), 1);
    assert_eq!(state.next_binding(), 1);

    let b = MockBlock::uniform();
    assert_eq!(state.bind(&b.as_block(), &mut sink).unwrap(), 1);
}
