//! Export a layer setup to compressed JSON and rebuild it on another mesh.
//!
//! Run with: cargo run --example 03_transfer

use skin_layers::{
    export_layers, Influence, LayerStore, LayersTransfer, MeshContext, PaintTarget,
    SceneDescription, Vector3D,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let influences = vec![
        Influence::new(0, "|root|hip", Vector3D::ZERO),
        Influence::new(1, "|root|spine", Vector3D::new(0.0, 1.0, 0.0)),
    ];
    let mut source = LayerStore::new(MeshContext::new(3).with_influences(influences));
    source.init_layers();
    let base = source.create_layer("base", true)?;
    source.set_influence_weights(base, PaintTarget::Influence(0), &[1.0, 0.5, 0.0])?;
    source.set_influence_weights(base, PaintTarget::Influence(1), &[0.0, 0.5, 1.0])?;

    let path = std::env::temp_dir().join("skin_layers_demo.json.gz");
    let document = export_layers(&source)?;
    skin_layers::write_document_to_path(&document, &path)?;
    println!("wrote {}", path.display());

    // Check which exported joints exist before binding anything
    let scene = SceneDescription::from_objects(["|root|hip", "|root|spine", "|root|arm_L"]);
    let loaded = LayersTransfer::load_from_path(&path)?;
    let joints = skin_layers::resolve_influence_paths(loaded.source(), &scene)?;
    println!("joints to bind: {:?}", joints);

    // Rebuild the layers on a freshly bound mesh
    let influences = vec![
        Influence::new(0, "|root|spine", Vector3D::new(0.0, 1.0, 0.0)),
        Influence::new(1, "|root|hip", Vector3D::ZERO),
    ];
    let mut target = LayerStore::new(MeshContext::new(3).with_influences(influences));
    target.init_layers();
    loaded.execute(&mut target)?;

    for info in target.list_layers()? {
        println!("transferred layer '{}'", info.name);
    }
    println!(
        "hip weights on target: {:?}",
        target.influence_weights(target.list_layers()?[0].id, PaintTarget::Influence(1))?
    );

    Ok(())
}
