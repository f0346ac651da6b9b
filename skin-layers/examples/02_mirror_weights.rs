//! Mirror painted weights from one side of a mesh to the other.
//!
//! Run with: cargo run --example 02_mirror_weights

use skin_layers::{
    Influence, LayerStore, MeshContext, MirrorAxis, MirrorDirection, MirrorOptions, PaintTarget,
    Vector3D,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A strip of vertices symmetric about the YZ plane
    let positions = vec![
        Vector3D::new(-1.0, 0.0, 0.0),
        Vector3D::new(-0.5, 0.0, 0.0),
        Vector3D::new(0.0, 0.0, 0.0),
        Vector3D::new(0.5, 0.0, 0.0),
        Vector3D::new(1.0, 0.0, 0.0),
    ];
    let mesh = MeshContext::new(5)
        .with_positions(positions)?
        .with_influences(vec![
            Influence::new(0, "|root|spine", Vector3D::new(0.0, 1.0, 0.0)),
            Influence::new(1, "|root|arm_L", Vector3D::new(0.75, 1.0, 0.0)),
            Influence::new(2, "|root|arm_R", Vector3D::new(-0.75, 1.0, 0.0)),
        ]);
    let mut store = LayerStore::new(mesh);
    store.init_layers();

    // Paint the left arm on the positive side only
    let layer = store.create_layer("arms", true)?;
    store.set_influence_weights(layer, PaintTarget::Influence(1), &[0.0, 0.0, 0.0, 0.6, 1.0])?;

    let options = MirrorOptions::new(MirrorAxis::X)
        .with_direction(MirrorDirection::PositiveToNegative)
        .with_width(0.1);
    let summary = store.mirror_layer(layer, &options)?;
    println!(
        "mirrored {} vertices, {} without counterpart",
        summary.mirrored, summary.unmatched
    );

    // arm_L weights arrive on arm_R on the negative side
    println!(
        "arm_R: {:?}",
        store.influence_weights(layer, PaintTarget::Influence(2))?
    );

    Ok(())
}
