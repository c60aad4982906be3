use std::io::Cursor;

use crate::SceneIoError;
use crate::graph::SceneGraph;
use crate::graph::types::{
    AppearanceComponent, CullFace, IndexData, ObjectKind, TexelFormat, TextureComponent, Topology,
};
use crate::state::StateAdapter;
use crate::state::adapters::components::{AppearanceState, MeshState, TextureState};
use crate::state::adapters::nodes::{BoundsLeafState, LightState, LinkState, ShapeState};
use crate::state::registry::{FallbackPolicy, TypeRegistry, TypeTag};

#[test]
fn standard_registry_identifies_every_builtin() -> Result<(), anyhow::Error> {
    let registry = TypeRegistry::standard();
    let samples = vec![
        (ObjectKind::Group, TypeTag::Group),
        (ObjectKind::Transform(Default::default()), TypeTag::Transform),
        (ObjectKind::Link(Default::default()), TypeTag::Link),
        (ObjectKind::SharedUnit, TypeTag::SharedUnit),
        (ObjectKind::Shape(Default::default()), TypeTag::Shape),
        (ObjectKind::Light(Default::default()), TypeTag::Light),
        (ObjectKind::BoundsLeaf(Default::default()), TypeTag::BoundsLeaf),
        (ObjectKind::Appearance(Default::default()), TypeTag::Appearance),
        (ObjectKind::Material(Default::default()), TypeTag::Material),
        (ObjectKind::Texture(Default::default()), TypeTag::Texture),
        (ObjectKind::Mesh(Default::default()), TypeTag::Mesh),
    ];

    for (kind, tag) in samples {
        assert_eq!(registry.identify(&kind), tag);
        let adapter = registry.adapter_for_tag(tag)?;
        assert_eq!(adapter.type_name(), kind.kind_name());
    }
    Ok(())
}

#[test]
fn unrecognized_tags_fold_to_unknown_and_are_rejected() {
    assert_eq!(TypeTag::from(999u16), TypeTag::Unknown);

    let registry = TypeRegistry::standard();
    let result = registry.adapter_for_tag(TypeTag::Unknown);
    assert!(matches!(result, Err(SceneIoError::UnknownTypeTag { tag: 0 })));
}

#[test]
fn fallback_policy_defaults_to_strict() {
    let registry = TypeRegistry::standard();
    assert_eq!(registry.fallback_policy(), FallbackPolicy::Strict);

    let registry = TypeRegistry::standard().with_fallback(FallbackPolicy::Placeholder);
    assert_eq!(registry.fallback_policy(), FallbackPolicy::Placeholder);
}

#[test]
fn custom_registrations_resolve_their_ancestor() {
    let mut registry = TypeRegistry::standard();
    registry.register_custom_type("demo::LodGroup", TypeTag::Group);

    assert_eq!(registry.custom_ancestor("demo::LodGroup"), Some(TypeTag::Group));
    assert_eq!(registry.custom_ancestor("demo::Unheard"), None);
}

#[test]
fn slot_names_and_collected_fields_stay_aligned() -> Result<(), anyhow::Error> {
    let mut graph = SceneGraph::new();
    let unit = graph.add(ObjectKind::SharedUnit);
    let link = graph.add(ObjectKind::Link(Default::default()));
    let shape = graph.add(ObjectKind::Shape(Default::default()));
    let light = graph.add(ObjectKind::Light(Default::default()));
    let bounds = graph.add(ObjectKind::BoundsLeaf(Default::default()));
    graph.set_link_unit(link, Some(unit))?;
    graph.set_light_influence(light, Some(bounds))?;

    let adapters: Vec<(Box<dyn StateAdapter>, _)> = vec![
        (Box::new(LinkState), link),
        (Box::new(ShapeState), shape),
        (Box::new(LightState), light),
        (Box::new(BoundsLeafState), bounds),
    ];
    for (adapter, id) in adapters {
        let names = adapter.reference_slot_names();
        let fields = adapter.collect_reference_fields(&graph, id);
        assert_eq!(names.len(), fields.len());
        for (name, field) in names.iter().zip(&fields) {
            assert_eq!(*name, field.name);
        }
    }

    let fields = LinkState.collect_reference_fields(&graph, link);
    assert_eq!(fields[0].target, Some(unit));
    Ok(())
}

#[test]
fn texture_save_rejects_compressed_layouts() {
    let mut graph = SceneGraph::new();
    let texture = graph.add(ObjectKind::Texture(TextureComponent {
        format: TexelFormat::Compressed,
        width: 4,
        height: 4,
        texels: vec![0; 16],
    }));

    let mut sink = Vec::new();
    let result = TextureState::default().write_construction(&graph, texture, &mut sink);
    assert!(matches!(
        result,
        Err(SceneIoError::UnsupportedEncoding { type_name: "Texture", .. })
    ));
}

#[test]
fn texture_save_rejects_mismatched_texel_buffers() {
    let mut graph = SceneGraph::new();
    let texture = graph.add(ObjectKind::Texture(TextureComponent {
        format: TexelFormat::Rgba8,
        width: 2,
        height: 2,
        texels: vec![0; 3],
    }));

    let mut sink = Vec::new();
    let result = TextureState::default().write_construction(&graph, texture, &mut sink);
    assert!(matches!(
        result,
        Err(SceneIoError::UnsupportedEncoding { type_name: "Texture", .. })
    ));
}

#[test]
fn appearance_save_rejects_unknown_cull_modes() {
    let mut graph = SceneGraph::new();
    let appearance = graph.add(ObjectKind::Appearance(AppearanceComponent {
        cull: CullFace::Unknown,
        ..Default::default()
    }));

    let mut sink = Vec::new();
    let result = AppearanceState.write_fields(&graph, appearance, &mut sink);
    assert!(matches!(
        result,
        Err(SceneIoError::UnsupportedEncoding { type_name: "Appearance", .. })
    ));
}

#[test]
fn mesh_state_round_trips_through_the_adapter_protocol() -> Result<(), anyhow::Error> {
    let mut graph = SceneGraph::new();
    let mesh = graph.add(ObjectKind::Mesh(crate::graph::types::MeshComponent {
        topology: Topology::Lines,
        vertices: vec![
            crate::common::types::Vector3 { x: 0.0, y: 1.0, z: 2.0 },
            crate::common::types::Vector3 { x: 3.0, y: 4.0, z: 5.0 },
        ],
        indices: IndexData::U16(vec![0, 1]),
    }));

    let mut buf = Vec::new();
    let mut saving = MeshState::default();
    saving.write_construction(&graph, mesh, &mut buf)?;
    saving.write_fields(&graph, mesh, &mut buf)?;

    let mut rdr = Cursor::new(buf);
    let mut loading = MeshState::default();
    let mut loaded_graph = SceneGraph::new();
    loading.read_construction(&mut rdr)?;
    let loaded = loading.create_live_object(&mut loaded_graph)?;
    loading.read_fields(&mut loaded_graph, loaded, &mut rdr)?;

    assert_eq!(graph.object(mesh).kind.mesh(), loaded_graph.object(loaded).kind.mesh());
    Ok(())
}

#[test]
fn mesh_save_rejects_unknown_topology() {
    let mut graph = SceneGraph::new();
    let mesh = graph.add(ObjectKind::Mesh(crate::graph::types::MeshComponent {
        topology: Topology::Unknown,
        vertices: Vec::new(),
        indices: IndexData::None,
    }));

    let mut sink = Vec::new();
    let result = MeshState::default().write_construction(&graph, mesh, &mut sink);
    assert!(matches!(
        result,
        Err(SceneIoError::UnsupportedEncoding { type_name: "Mesh", .. })
    ));
}
