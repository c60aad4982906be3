use crate::graph::types::{
    AppearanceComponent, CustomNode, LinkNode, MaterialComponent, MeshComponent, ObjectKind, ShapeNode, TransformNode,
};
use crate::graph::{SceneError, SceneGraph};

#[test]
fn attach_builds_a_tree() -> Result<(), anyhow::Error> {
    let mut graph = SceneGraph::new();
    let root = graph.add(ObjectKind::Group);
    let transform = graph.add(ObjectKind::Transform(TransformNode::default()));
    let shape = graph.add(ObjectKind::Shape(ShapeNode::default()));

    graph.attach(root, transform)?;
    graph.attach(transform, shape)?;

    assert_eq!(graph.children(root), &[transform]);
    assert_eq!(graph.children(transform), &[shape]);
    assert_eq!(graph.parent(shape), Some(transform));
    assert_eq!(graph.parent(root), None);
    Ok(())
}

#[test]
fn components_cannot_be_children() {
    let mut graph = SceneGraph::new();
    let root = graph.add(ObjectKind::Group);
    let material = graph.add(ObjectKind::Material(MaterialComponent::default()));

    let result = graph.attach(root, material);
    assert!(matches!(result, Err(SceneError::NotAttachable(_))));
}

#[test]
fn shared_units_are_reached_through_links() -> Result<(), anyhow::Error> {
    let mut graph = SceneGraph::new();
    let root = graph.add(ObjectKind::Group);
    let unit = graph.add(ObjectKind::SharedUnit);
    let link = graph.add(ObjectKind::Link(LinkNode::default()));

    assert!(matches!(graph.attach(root, unit), Err(SceneError::NotAttachable(_))));

    graph.attach(root, link)?;
    graph.set_link_unit(link, Some(unit))?;
    assert_eq!(graph.object(link).kind.link().unit, Some(unit));

    // Only shared units qualify as link targets.
    let group = graph.add(ObjectKind::Group);
    let result = graph.set_link_unit(link, Some(group));
    assert!(matches!(result, Err(SceneError::KindMismatch { .. })));
    Ok(())
}

#[test]
fn second_parent_is_rejected() -> Result<(), anyhow::Error> {
    let mut graph = SceneGraph::new();
    let left = graph.add(ObjectKind::Group);
    let right = graph.add(ObjectKind::Group);
    let root = graph.add(ObjectKind::Group);
    let shape = graph.add(ObjectKind::Shape(ShapeNode::default()));

    graph.attach(root, left)?;
    graph.attach(root, right)?;
    graph.attach(left, shape)?;

    let result = graph.attach(right, shape);
    assert!(matches!(result, Err(SceneError::AlreadyParented(_))));
    Ok(())
}

#[test]
fn parent_cycles_are_rejected() -> Result<(), anyhow::Error> {
    let mut graph = SceneGraph::new();
    let root = graph.add(ObjectKind::Group);
    let middle = graph.add(ObjectKind::Group);
    graph.attach(root, middle)?;

    assert!(matches!(
        graph.attach(middle, root),
        Err(SceneError::CyclicAttachment { .. })
    ));
    assert!(matches!(
        graph.attach(root, root),
        Err(SceneError::CyclicAttachment { .. })
    ));
    Ok(())
}

#[test]
fn leaves_cannot_take_children() {
    let mut graph = SceneGraph::new();
    let shape = graph.add(ObjectKind::Shape(ShapeNode::default()));
    let other = graph.add(ObjectKind::Group);

    let result = graph.attach(shape, other);
    assert!(matches!(result, Err(SceneError::NotComposite(_))));
}

#[test]
fn detach_and_reattach() -> Result<(), anyhow::Error> {
    let mut graph = SceneGraph::new();
    let root = graph.add(ObjectKind::Group);
    let other = graph.add(ObjectKind::Group);
    let shape = graph.add(ObjectKind::Shape(ShapeNode::default()));

    graph.attach(root, shape)?;
    graph.detach(shape)?;
    assert!(graph.children(root).is_empty());
    assert_eq!(graph.parent(shape), None);

    graph.attach(other, shape)?;
    assert_eq!(graph.parent(shape), Some(other));

    assert!(matches!(graph.detach(root), Err(SceneError::NotAttached(_))));
    Ok(())
}

#[test]
fn typed_setters_validate_target_kinds() {
    let mut graph = SceneGraph::new();
    let shape = graph.add(ObjectKind::Shape(ShapeNode::default()));
    let mesh = graph.add(ObjectKind::Mesh(MeshComponent::default()));
    let material = graph.add(ObjectKind::Material(MaterialComponent::default()));

    assert!(graph.set_shape_geometry(shape, Some(mesh)).is_ok());
    assert!(matches!(
        graph.set_shape_appearance(shape, Some(mesh)),
        Err(SceneError::KindMismatch { .. })
    ));
    assert!(matches!(
        graph.set_shape_geometry(mesh, Some(mesh)),
        Err(SceneError::KindMismatch { .. })
    ));

    let leaf = graph.add(ObjectKind::BoundsLeaf(Default::default()));
    assert!(matches!(
        graph.set_bounds_tracked(leaf, Some(material)),
        Err(SceneError::KindMismatch { .. })
    ));
}

#[test]
fn custom_kinds_borrow_their_base_structure() -> Result<(), anyhow::Error> {
    let mut graph = SceneGraph::new();
    let root = graph.add(ObjectKind::Group);
    let lod_group = graph.add(ObjectKind::Custom(CustomNode {
        type_name: "demo::LodGroup".to_string(),
        base: Box::new(ObjectKind::Group),
        payload: vec![0, 1, 2],
    }));
    let shape = graph.add(ObjectKind::Shape(ShapeNode::default()));

    // A custom group is composite and attachable like its base.
    graph.attach(root, lod_group)?;
    graph.attach(lod_group, shape)?;

    // A custom material stays a component.
    let fancy_material = graph.add(ObjectKind::Custom(CustomNode {
        type_name: "demo::MeasuredBrdf".to_string(),
        base: Box::new(ObjectKind::Material(MaterialComponent::default())),
        payload: Vec::new(),
    }));
    assert!(matches!(
        graph.attach(root, fancy_material),
        Err(SceneError::NotAttachable(_))
    ));
    assert!(graph.set_appearance_material(shape, Some(fancy_material)).is_err());

    let appearance = graph.add(ObjectKind::Appearance(AppearanceComponent::default()));
    graph.set_appearance_material(appearance, Some(fancy_material))?;
    Ok(())
}
