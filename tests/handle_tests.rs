//! Resource Handle Tests
//!
//! Tests for:
//! - GlHandle: allocation, unique ids while live, delete-once on drop/release
//! - Shared: last owner deletes, try_unwrap
//! - Allocation failures surface as errors instead of id 0

use std::collections::HashSet;

use pretty_assertions::assert_eq;

use glazy::backend::recording::Call;
use glazy::{
    Buffer, BufferUsage, Context, GlHandle, GlazyError, RecordingBackend, ResourceKind, Shared,
    Texture, VertexArray,
};

fn setup() -> (RecordingBackend, Context) {
    let gl = RecordingBackend::new();
    let ctx = Context::new(gl.clone());
    (gl, ctx)
}

fn deletes(gl: &RecordingBackend) -> Vec<(ResourceKind, u32)> {
    gl.calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Delete { kind, id } => Some((kind, id)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// GlHandle Tests
// ============================================================================

#[test]
fn live_handles_never_share_an_id() {
    let (_gl, ctx) = setup();
    let handles: Vec<GlHandle> = (0..32)
        .map(|_| GlHandle::new(&ctx, ResourceKind::Buffer).unwrap())
        .collect();
    let ids: HashSet<u32> = handles.iter().map(GlHandle::id).collect();
    assert_eq!(ids.len(), handles.len());
    assert!(!ids.contains(&0));
}

#[test]
fn ids_are_reused_only_after_delete() {
    let (gl, ctx) = setup();
    let first = GlHandle::new(&ctx, ResourceKind::Texture).unwrap();
    let first_id = first.id();
    let second = GlHandle::new(&ctx, ResourceKind::Texture).unwrap();
    assert_ne!(first_id, second.id());

    drop(first);
    assert_eq!(deletes(&gl), vec![(ResourceKind::Texture, first_id)]);
    let third = GlHandle::new(&ctx, ResourceKind::Texture).unwrap();
    assert_eq!(third.id(), first_id);
}

#[test]
fn release_deletes_once() {
    let (gl, ctx) = setup();
    let mut handle = GlHandle::new(&ctx, ResourceKind::Sampler).unwrap();
    let id = handle.id();
    handle.release();
    assert!(handle.is_released());
    handle.release();
    drop(handle);
    assert_eq!(deletes(&gl), vec![(ResourceKind::Sampler, id)]);
}

#[test]
fn moving_a_handle_moves_ownership() {
    let (gl, ctx) = setup();
    let vao = VertexArray::new(&ctx).unwrap();
    let id = vao.id();
    let mut owners = vec![vao];
    assert!(deletes(&gl).is_empty());
    owners.clear();
    assert_eq!(deletes(&gl), vec![(ResourceKind::VertexArray, id)]);
}

#[test]
fn allocation_failure_is_an_error() {
    let (gl, ctx) = setup();
    gl.fail_allocations(true);
    let err = Buffer::<f32>::new(&ctx).unwrap_err();
    match err {
        GlazyError::Allocation { kind, .. } => assert_eq!(kind, ResourceKind::Buffer),
        other => panic!("expected allocation error, got {:?}", other),
    }
    gl.fail_allocations(false);
    assert!(Buffer::<f32>::new(&ctx).is_ok());
}

// ============================================================================
// Shared Tests
// ============================================================================

#[test]
fn shared_resource_is_deleted_by_last_owner() {
    let (gl, ctx) = setup();
    let texture = Texture::new(&ctx, &[[0u8; 4]; 4], 2, 2, false).unwrap();
    let id = texture.id();
    let a = Shared::new(texture);
    let b = a.clone();
    let c = b.clone();
    assert_eq!(Shared::owners(&a), 3);

    drop(a);
    drop(c);
    assert!(deletes(&gl).is_empty());
    assert_eq!(b.width(), 2);

    drop(b);
    assert_eq!(deletes(&gl), vec![(ResourceKind::Texture, id)]);
}

#[test]
fn try_unwrap_needs_sole_ownership() {
    let (gl, ctx) = setup();
    let buffer = Buffer::with_data(&ctx, &[1u16, 2, 3], BufferUsage::StaticDraw).unwrap();
    let shared = Shared::new(buffer);
    let other = shared.clone();

    let shared = Shared::try_unwrap(shared).unwrap_err();
    drop(other);
    let buffer = Shared::try_unwrap(shared).unwrap();
    assert_eq!(buffer.len(), 3);
    assert!(deletes(&gl).is_empty());
}
