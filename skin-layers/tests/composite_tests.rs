//! Tests for compositing, merge-down, the influence limit and batch scopes

use approx::assert_relative_eq;
use skin_layers::{Influence, LayerStore, MeshContext, PaintTarget, Vector3D};

fn test_store(vertex_count: usize, influence_count: usize) -> LayerStore {
    let influences = (0..influence_count)
        .map(|i| Influence::new(i, format!("|root|joint{}", i), Vector3D::ZERO))
        .collect();
    let mut store = LayerStore::new(MeshContext::new(vertex_count).with_influences(influences));
    store.init_layers();
    store
}

fn assert_slices_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-5);
    }
}

#[test]
fn test_single_layer_composites_exactly() {
    let mut store = test_store(3, 1);
    let base = store.create_layer("Base", true).unwrap();
    store
        .set_influence_weights(base, PaintTarget::Influence(0), &[1.0, 0.5, 0.0])
        .unwrap();

    let composite = store.composite().unwrap();
    assert_eq!(composite.influence_weights(0), &[1.0, 0.5, 0.0]);
    assert_eq!(composite.vertex_count(), 3);
    assert_eq!(composite.influence_count(), 1);
}

#[test]
fn test_disabled_layer_does_not_contribute() {
    let mut store = test_store(2, 1);
    let base = store.create_layer("base", true).unwrap();
    store
        .set_influence_weights(base, PaintTarget::Influence(0), &[0.5, 0.5])
        .unwrap();
    let top = store.create_layer("top", true).unwrap();
    store
        .set_influence_weights(top, PaintTarget::Influence(0), &[1.0, 1.0])
        .unwrap();
    store.set_layer_enabled(top, false).unwrap();

    let composite = store.composite().unwrap();
    assert_eq!(composite.influence_weights(0), &[0.5, 0.5]);
}

#[test]
fn test_opacity_and_mask_modulate_contribution() {
    let mut store = test_store(2, 1);
    let base = store.create_layer("base", true).unwrap();
    store
        .set_influence_weights(base, PaintTarget::Influence(0), &[1.0, 1.0])
        .unwrap();
    let top = store.create_layer("top", true).unwrap();
    store
        .set_influence_weights(top, PaintTarget::Influence(0), &[0.0, 0.0])
        .unwrap();
    store.set_layer_opacity(top, 0.5).unwrap();
    store.set_layer_mask(top, &[1.0, 0.0]).unwrap();

    let composite = store.composite().unwrap();
    // Vertex 0: half-blend towards 0.0, vertex 1: mask gates the layer out
    assert_slices_close(composite.influence_weights(0), &[0.5, 1.0]);
}

#[test]
fn test_merge_down_preserves_flattened_output() {
    let mut store = test_store(3, 2);
    let below = store.create_layer("below", true).unwrap();
    store
        .set_influence_weights(below, PaintTarget::Influence(0), &[0.2, 0.4, 0.6])
        .unwrap();
    store
        .set_influence_weights(below, PaintTarget::Influence(1), &[0.8, 0.6, 0.4])
        .unwrap();
    store.set_layer_opacity(below, 0.5).unwrap();

    let above = store.create_layer("above", true).unwrap();
    store
        .set_influence_weights(above, PaintTarget::Influence(0), &[1.0, 0.0, 0.5])
        .unwrap();
    store.set_layer_opacity(above, 0.8).unwrap();
    store.set_layer_mask(above, &[1.0, 0.5, 0.0]).unwrap();

    let before = store.composite().unwrap().clone();
    store.merge_down(above).unwrap();
    let after = store.composite().unwrap().clone();

    assert_eq!(store.list_layers().unwrap().len(), 1);
    for slot in 0..2 {
        assert_slices_close(after.influence_weights(slot), before.influence_weights(slot));
    }
}

#[test]
fn test_merge_down_full_opacity_replaces_below() {
    let mut store = test_store(2, 1);
    let below = store.create_layer("below", true).unwrap();
    store
        .set_influence_weights(below, PaintTarget::Influence(0), &[0.25, 0.25])
        .unwrap();
    let above = store.create_layer("above", true).unwrap();
    store
        .set_influence_weights(above, PaintTarget::Influence(0), &[1.0, 0.0])
        .unwrap();

    let before = store.composite().unwrap().clone();
    store.merge_down(above).unwrap();
    let after = store.composite().unwrap().clone();
    assert_slices_close(after.influence_weights(0), before.influence_weights(0));
    assert_slices_close(after.influence_weights(0), &[1.0, 0.0]);
}

#[test]
fn test_merge_down_disabled_layer_keeps_below() {
    let mut store = test_store(2, 1);
    let below = store.create_layer("below", true).unwrap();
    store
        .set_influence_weights(below, PaintTarget::Influence(0), &[0.25, 0.75])
        .unwrap();
    let above = store.create_layer("above", true).unwrap();
    store
        .set_influence_weights(above, PaintTarget::Influence(0), &[1.0, 1.0])
        .unwrap();
    store.set_layer_enabled(above, false).unwrap();

    store.merge_down(above).unwrap();
    let composite = store.composite().unwrap();
    assert_slices_close(composite.influence_weights(0), &[0.25, 0.75]);
}

#[test]
fn test_merge_down_without_lower_sibling_fails() {
    let mut store = test_store(2, 1);
    let only = store.create_layer("only", true).unwrap();
    assert!(store.merge_down(only).is_err());
}

#[test]
fn test_merge_down_flattens_children() {
    let mut store = test_store(2, 1);
    let below = store.create_layer("below", true).unwrap();
    store
        .set_influence_weights(below, PaintTarget::Influence(0), &[0.1, 0.1])
        .unwrap();
    let group = store.create_layer("group", true).unwrap();
    store
        .set_influence_weights(group, PaintTarget::Influence(0), &[0.0, 0.0])
        .unwrap();
    let child = store.create_layer("child", true).unwrap();
    store.set_layer_parent(child, Some(group)).unwrap();
    store
        .set_influence_weights(child, PaintTarget::Influence(0), &[1.0, 1.0])
        .unwrap();

    let before = store.composite().unwrap().clone();
    store.merge_down(group).unwrap();
    let after = store.composite().unwrap().clone();

    assert_slices_close(after.influence_weights(0), before.influence_weights(0));
    // The group and its child are gone
    assert_eq!(store.list_layers().unwrap().len(), 1);
}

#[test]
fn test_influence_limit_truncates_and_renormalizes() {
    let mut store = test_store(1, 3);
    let layer = store.create_layer("layer", true).unwrap();
    store
        .set_influence_weights(layer, PaintTarget::Influence(0), &[0.5])
        .unwrap();
    store
        .set_influence_weights(layer, PaintTarget::Influence(1), &[0.3])
        .unwrap();
    store
        .set_influence_weights(layer, PaintTarget::Influence(2), &[0.2])
        .unwrap();

    store.set_influence_limit(2).unwrap();
    let composite = store.composite().unwrap();
    assert_eq!(composite.influence_weights(2), &[0.0]);
    let total: f32 = (0..3).map(|s| composite.influence_weights(s)[0]).sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-5);

    // Removing the limit restores the full set
    store.set_influence_limit(0).unwrap();
    let composite = store.composite().unwrap();
    assert_relative_eq!(composite.influence_weights(2)[0], 0.2, epsilon = 1e-6);
}

#[test]
fn test_batch_scope_recomposites_once() {
    let mut store = test_store(2, 1);
    let layer = store.create_layer("layer", true).unwrap();

    let before = store.recompute_count();
    store
        .batch_update(|store| {
            store.batch_update(|store| {
                store.set_influence_weights(layer, PaintTarget::Influence(0), &[1.0, 0.0])
            })?;
            store.set_influence_weights(layer, PaintTarget::Influence(0), &[0.0, 1.0])?;
            store.set_layer_opacity(layer, 0.5)
        })
        .unwrap();
    let after = store.recompute_count();

    // begin, begin, set, end, set, end: one recompute after the outer end
    assert_eq!(after, before + 1);
}

#[test]
fn test_batch_scope_releases_on_error() {
    let mut store = test_store(2, 1);
    let layer = store.create_layer("layer", true).unwrap();

    let result = store.batch_update(|store| {
        store.set_influence_weights(layer, PaintTarget::Influence(0), &[1.0])
    });
    assert!(result.is_err());

    // The suspension is released: a later mutation recomputes immediately
    let before = store.recompute_count();
    store
        .set_influence_weights(layer, PaintTarget::Influence(0), &[1.0, 0.0])
        .unwrap();
    assert_eq!(store.recompute_count(), before + 1);
}

#[test]
fn test_mutations_inside_scope_are_readable() {
    let mut store = test_store(2, 1);
    let layer = store.create_layer("layer", true).unwrap();

    store
        .batch_update(|store| {
            store.set_influence_weights(layer, PaintTarget::Influence(0), &[1.0, 0.0])?;
            // The write is visible to reads inside the scope
            assert_eq!(
                store
                    .influence_weights(layer, PaintTarget::Influence(0))
                    .unwrap(),
                &[1.0, 0.0]
            );
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_dq_channel_composites_independently() {
    let mut store = test_store(2, 1);
    let base = store.create_layer("base", true).unwrap();
    store
        .set_influence_weights(base, PaintTarget::Influence(0), &[1.0, 1.0])
        .unwrap();
    store.set_dual_quaternion_weights(base, &[1.0, 0.0]).unwrap();

    let composite = store.composite().unwrap();
    assert!(composite.has_dual_quaternion());
    assert_eq!(composite.dual_quaternion_weights(), &[1.0, 0.0]);
}
