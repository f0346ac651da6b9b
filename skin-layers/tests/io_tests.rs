//! Tests for document export/import, compression and layer transfer

use skin_layers::{
    export_layers, read_document, read_document_from_path, resolve_influence_paths,
    write_document, write_document_to_path, Error, FileFormat, Influence, LayerStore,
    LayersTransfer, MeshContext, PaintTarget, SceneDescription, Vector3D,
};

fn source_store() -> LayerStore {
    let influences = vec![
        Influence::new(0, "|root|hip", Vector3D::new(0.0, 1.0, 0.0)),
        Influence::new(1, "|root|leg_L", Vector3D::new(0.5, 0.5, 0.0)),
    ];
    let mut store = LayerStore::new(MeshContext::new(3).with_influences(influences));
    store.init_layers();

    let base = store.create_layer("base", true).unwrap();
    store
        .set_influence_weights(base, PaintTarget::Influence(0), &[1.0, 0.5, 0.0])
        .unwrap();
    store
        .set_influence_weights(base, PaintTarget::Influence(1), &[0.0, 0.5, 1.0])
        .unwrap();

    let detail = store.create_layer("detail", true).unwrap();
    store
        .set_influence_weights(detail, PaintTarget::Influence(0), &[0.0, 0.0, 1.0])
        .unwrap();
    store.set_layer_opacity(detail, 0.5).unwrap();
    store.set_layer_mask(detail, &[1.0, 1.0, 0.0]).unwrap();
    store
        .set_dual_quaternion_weights(detail, &[0.0, 1.0, 0.0])
        .unwrap();

    store
}

#[test]
fn test_export_captures_layers_and_influences() {
    let store = source_store();
    let document = export_layers(&store).unwrap();

    assert_eq!(document.vertex_count, 3);
    assert_eq!(document.influences.len(), 2);
    assert_eq!(document.influences[1].path, "|root|leg_L");
    assert_eq!(document.layers.len(), 2);
    assert_eq!(document.layers[0].name, "base");
    assert_eq!(document.layers[0].weights.len(), 2);
    assert_eq!(document.layers[1].opacity, 0.5);
    assert_eq!(document.layers[1].mask, vec![1.0, 1.0, 0.0]);
    assert_eq!(document.layers[1].dq, vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_json_round_trip_in_memory() {
    let document = export_layers(&source_store()).unwrap();

    let mut plain = Vec::new();
    write_document(&document, &mut plain, FileFormat::Json).unwrap();
    let read_back = read_document(plain.as_slice(), FileFormat::Json).unwrap();
    assert_eq!(read_back, document);

    let mut compressed = Vec::new();
    write_document(&document, &mut compressed, FileFormat::CompressedJson).unwrap();
    assert_ne!(compressed, plain);
    let read_back = read_document(compressed.as_slice(), FileFormat::CompressedJson).unwrap();
    assert_eq!(read_back, document);
}

#[test]
fn test_path_round_trip_picks_format_from_extension() {
    let document = export_layers(&source_store()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let plain_path = dir.path().join("weights.json");
    write_document_to_path(&document, &plain_path).unwrap();
    assert_eq!(read_document_from_path(&plain_path).unwrap(), document);

    let gz_path = dir.path().join("weights.json.gz");
    write_document_to_path(&document, &gz_path).unwrap();
    assert_eq!(read_document_from_path(&gz_path).unwrap(), document);

    // The compressed file is not readable as plain JSON
    let plain = std::fs::read(&plain_path).unwrap();
    let compressed = std::fs::read(&gz_path).unwrap();
    assert_ne!(plain, compressed);
}

#[test]
fn test_resolve_against_scene() {
    let document = export_layers(&source_store()).unwrap();

    let scene = SceneDescription::from_objects(["|root|hip", "|root|leg_L", "|root|spine"]);
    let matched = resolve_influence_paths(&document, &scene).unwrap();
    assert_eq!(matched.len(), 2);

    let partial = SceneDescription::from_objects(["|root|hip"]);
    let matched = resolve_influence_paths(&document, &partial).unwrap();
    assert_eq!(matched, vec!["|root|hip".to_string()]);

    let empty = SceneDescription::from_objects(["|unrelated"]);
    assert!(matches!(
        resolve_influence_paths(&document, &empty),
        Err(Error::NoMatchingInfluences)
    ));
}

#[test]
fn test_transfer_rebuilds_layers() {
    let source = source_store();
    let document = export_layers(&source).unwrap();

    let influences = vec![
        Influence::new(0, "|root|hip", Vector3D::new(0.0, 1.0, 0.0)),
        Influence::new(1, "|root|leg_L", Vector3D::new(0.5, 0.5, 0.0)),
    ];
    let mut target = LayerStore::new(MeshContext::new(3).with_influences(influences));
    target.init_layers();

    LayersTransfer::new(document).execute(&mut target).unwrap();

    let layers = target.list_layers().unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].name, "base");
    assert_eq!(layers[1].name, "detail");
    assert_eq!(layers[1].opacity, 0.5);

    assert_eq!(
        target
            .influence_weights(layers[0].id, PaintTarget::Influence(0))
            .unwrap(),
        &[1.0, 0.5, 0.0]
    );
    assert_eq!(target.layer_mask(layers[1].id).unwrap(), &[1.0, 1.0, 0.0]);
    assert_eq!(
        target.dual_quaternion_weights(layers[1].id).unwrap(),
        &[0.0, 1.0, 0.0]
    );
}

#[test]
fn test_transfer_routes_weights_by_path_on_permuted_influences() {
    let source = source_store();
    let document = export_layers(&source).unwrap();

    // The target lists the same joints in the opposite order
    let influences = vec![
        Influence::new(0, "|root|leg_L", Vector3D::new(0.5, 0.5, 0.0)),
        Influence::new(1, "|root|hip", Vector3D::new(0.0, 1.0, 0.0)),
    ];
    let mut target = LayerStore::new(MeshContext::new(3).with_influences(influences));
    target.init_layers();

    LayersTransfer::new(document).execute(&mut target).unwrap();

    let layers = target.list_layers().unwrap();
    // Hip weights from source slot 0 land on target slot 1
    assert_eq!(
        target
            .influence_weights(layers[0].id, PaintTarget::Influence(1))
            .unwrap(),
        &[1.0, 0.5, 0.0]
    );
    assert_eq!(
        target
            .influence_weights(layers[0].id, PaintTarget::Influence(0))
            .unwrap(),
        &[0.0, 0.5, 1.0]
    );
}

#[test]
fn test_transfer_skips_unknown_influences() {
    let source = source_store();
    let document = export_layers(&source).unwrap();

    // Target only knows the hip; leg weights are dropped with a warning
    let influences = vec![Influence::new(0, "|root|hip", Vector3D::new(0.0, 1.0, 0.0))];
    let mut target = LayerStore::new(MeshContext::new(3).with_influences(influences));
    target.init_layers();

    LayersTransfer::new(document).execute(&mut target).unwrap();
    let layers = target.list_layers().unwrap();
    assert_eq!(
        target
            .influence_weights(layers[0].id, PaintTarget::Influence(0))
            .unwrap(),
        &[1.0, 0.5, 0.0]
    );
}

#[test]
fn test_transfer_fails_when_no_influence_matches() {
    let document = export_layers(&source_store()).unwrap();

    let influences = vec![Influence::new(0, "|other|joint", Vector3D::ZERO)];
    let mut target = LayerStore::new(MeshContext::new(3).with_influences(influences));
    target.init_layers();

    assert!(matches!(
        LayersTransfer::new(document).execute(&mut target),
        Err(Error::NoMatchingInfluences)
    ));
    // Nothing was created on the target
    assert!(target.list_layers().unwrap().is_empty());
}

#[test]
fn test_transfer_validates_vertex_count() {
    let document = export_layers(&source_store()).unwrap();

    let influences = vec![Influence::new(0, "|root|hip", Vector3D::ZERO)];
    let mut target = LayerStore::new(MeshContext::new(7).with_influences(influences));
    target.init_layers();

    assert!(matches!(
        LayersTransfer::new(document).execute(&mut target),
        Err(Error::DimensionMismatch { .. })
    ));
}

#[test]
fn test_transfer_restores_layer_hierarchy() {
    let influences = vec![Influence::new(0, "|root|hip", Vector3D::ZERO)];
    let mut source = LayerStore::new(MeshContext::new(2).with_influences(influences.clone()));
    source.init_layers();
    let group = source.create_layer("group", true).unwrap();
    let child = source.create_layer("child", true).unwrap();
    source.set_layer_parent(child, Some(group)).unwrap();
    let document = export_layers(&source).unwrap();

    let mut target = LayerStore::new(MeshContext::new(2).with_influences(influences));
    target.init_layers();
    LayersTransfer::new(document).execute(&mut target).unwrap();

    let layers = target.list_layers().unwrap();
    let group_info = layers.iter().find(|l| l.name == "group").unwrap();
    let child_info = layers.iter().find(|l| l.name == "child").unwrap();
    assert_eq!(child_info.parent, Some(group_info.id));
}
