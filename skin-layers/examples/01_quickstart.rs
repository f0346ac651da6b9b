//! Quickstart: build a small layer stack and flatten it.
//!
//! Run with: cargo run --example 01_quickstart

use skin_layers::{Influence, LayerStore, MeshContext, PaintTarget, Vector3D};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mesh = MeshContext::new(4).with_influences(vec![
        Influence::new(0, "|root|hip", Vector3D::ZERO),
        Influence::new(1, "|root|spine", Vector3D::new(0.0, 1.0, 0.0)),
    ]);
    let mut store = LayerStore::new(mesh);
    store.init_layers();

    let base = store.create_layer("Base", true)?;
    store.set_influence_weights(base, PaintTarget::Influence(0), &[1.0, 0.75, 0.25, 0.0])?;
    store.set_influence_weights(base, PaintTarget::Influence(1), &[0.0, 0.25, 0.75, 1.0])?;

    // A half-strength tweak layer limited to the first two vertices
    let tweak = store.create_layer("Tweak", true)?;
    store.set_influence_weights(tweak, PaintTarget::Influence(0), &[0.0, 0.0, 0.0, 0.0])?;
    store.set_layer_opacity(tweak, 0.5)?;
    store.set_layer_mask(tweak, &[1.0, 1.0, 0.0, 0.0])?;

    let composite = store.composite()?;
    for slot in 0..composite.influence_count() {
        println!("influence {}: {:?}", slot, composite.influence_weights(slot));
    }

    for info in store.list_layers()? {
        println!(
            "layer {} '{}' opacity={} enabled={}",
            info.id, info.name, info.opacity, info.enabled
        );
    }

    Ok(())
}
