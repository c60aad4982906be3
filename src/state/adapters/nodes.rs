//! Adapters for the node kinds. Groups, transforms and shared units are
//! pure composites with no scalar state of their own; the remaining nodes
//! carry a handful of scalars and reference slots.

use std::io::{Read, Write};

use crate::SceneIoError;
use crate::common::codec::Streamable;
use crate::common::types::{BoundingVolume, ColorRgba, Matrix4};
use crate::graph::types::ObjectKind;
use crate::graph::{ObjectId, SceneGraph};
use crate::state::{RefField, StateAdapter};

pub struct GroupState;

impl StateAdapter for GroupState {
    fn type_name(&self) -> &'static str {
        "Group"
    }

    fn composite(&self) -> bool {
        true
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Group))
    }
}

pub struct TransformState;

impl StateAdapter for TransformState {
    fn type_name(&self) -> &'static str {
        "Transform"
    }

    fn composite(&self) -> bool {
        true
    }

    fn write_fields(&mut self, graph: &SceneGraph, id: ObjectId, wtr: &mut dyn Write) -> Result<(), SceneIoError> {
        graph.object(id).kind.transform().matrix.encode(wtr)
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Transform(Default::default())))
    }

    fn read_fields(&mut self, graph: &mut SceneGraph, id: ObjectId, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        graph.object_mut(id).kind.transform_mut().matrix = Matrix4::decode(rdr)?;
        Ok(())
    }
}

/// Shared units never sit in a child list; they are reached through the
/// `unit` slot of any number of links, or stand alone as the stream root.
pub struct SharedUnitState;

impl StateAdapter for SharedUnitState {
    fn type_name(&self) -> &'static str {
        "SharedUnit"
    }

    fn composite(&self) -> bool {
        true
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::SharedUnit))
    }
}

pub struct LinkState;

impl StateAdapter for LinkState {
    fn type_name(&self) -> &'static str {
        "Link"
    }

    fn reference_slot_names(&self) -> &'static [&'static str] {
        &["unit"]
    }

    fn collect_reference_fields(&self, graph: &SceneGraph, id: ObjectId) -> Vec<RefField> {
        vec![RefField {
            name: "unit",
            target: graph.object(id).kind.link().unit,
        }]
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Link(Default::default())))
    }

    fn resolve_reference_fields(
        &mut self,
        graph: &mut SceneGraph,
        id: ObjectId,
        targets: &[Option<ObjectId>],
    ) -> Result<(), SceneIoError> {
        if let Some(unit) = targets[0] {
            if !matches!(graph.object(unit).kind.body(), ObjectKind::SharedUnit) {
                return Err(SceneIoError::FormatError {
                    reason: "link unit slot names a non-unit target",
                });
            }
        }
        graph.object_mut(id).kind.link_mut().unit = targets[0];
        Ok(())
    }
}

pub struct ShapeState;

impl StateAdapter for ShapeState {
    fn type_name(&self) -> &'static str {
        "Shape"
    }

    fn reference_slot_names(&self) -> &'static [&'static str] {
        &["appearance", "geometry"]
    }

    fn collect_reference_fields(&self, graph: &SceneGraph, id: ObjectId) -> Vec<RefField> {
        let shape = graph.object(id).kind.shape();
        vec![
            RefField {
                name: "appearance",
                target: shape.appearance,
            },
            RefField {
                name: "geometry",
                target: shape.geometry,
            },
        ]
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Shape(Default::default())))
    }

    fn resolve_reference_fields(
        &mut self,
        graph: &mut SceneGraph,
        id: ObjectId,
        targets: &[Option<ObjectId>],
    ) -> Result<(), SceneIoError> {
        if let Some(appearance) = targets[0] {
            if !matches!(graph.object(appearance).kind.body(), ObjectKind::Appearance(_)) {
                return Err(SceneIoError::FormatError {
                    reason: "shape appearance slot names a non-appearance target",
                });
            }
        }
        if let Some(geometry) = targets[1] {
            if !matches!(graph.object(geometry).kind.body(), ObjectKind::Mesh(_)) {
                return Err(SceneIoError::FormatError {
                    reason: "shape geometry slot names a non-mesh target",
                });
            }
        }
        let shape = graph.object_mut(id).kind.shape_mut();
        shape.appearance = targets[0];
        shape.geometry = targets[1];
        Ok(())
    }
}

pub struct LightState;

impl StateAdapter for LightState {
    fn type_name(&self) -> &'static str {
        "Light"
    }

    fn reference_slot_names(&self) -> &'static [&'static str] {
        &["influence"]
    }

    fn write_fields(&mut self, graph: &SceneGraph, id: ObjectId, wtr: &mut dyn Write) -> Result<(), SceneIoError> {
        let light = graph.object(id).kind.light();
        light.color.encode(wtr)?;
        light.intensity.encode(wtr)
    }

    fn collect_reference_fields(&self, graph: &SceneGraph, id: ObjectId) -> Vec<RefField> {
        vec![RefField {
            name: "influence",
            target: graph.object(id).kind.light().influence,
        }]
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Light(Default::default())))
    }

    fn read_fields(&mut self, graph: &mut SceneGraph, id: ObjectId, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        let color = ColorRgba::decode(rdr)?;
        let intensity = f32::decode(rdr)?;
        let light = graph.object_mut(id).kind.light_mut();
        light.color = color;
        light.intensity = intensity;
        Ok(())
    }

    fn resolve_reference_fields(
        &mut self,
        graph: &mut SceneGraph,
        id: ObjectId,
        targets: &[Option<ObjectId>],
    ) -> Result<(), SceneIoError> {
        if let Some(influence) = targets[0] {
            if !matches!(graph.object(influence).kind.body(), ObjectKind::BoundsLeaf(_)) {
                return Err(SceneIoError::FormatError {
                    reason: "light influence slot names a non-bounds target",
                });
            }
        }
        graph.object_mut(id).kind.light_mut().influence = targets[0];
        Ok(())
    }
}

pub struct BoundsLeafState;

impl StateAdapter for BoundsLeafState {
    fn type_name(&self) -> &'static str {
        "BoundsLeaf"
    }

    fn reference_slot_names(&self) -> &'static [&'static str] {
        &["tracked"]
    }

    fn write_fields(&mut self, graph: &SceneGraph, id: ObjectId, wtr: &mut dyn Write) -> Result<(), SceneIoError> {
        graph.object(id).kind.bounds_leaf().volume.encode(wtr)
    }

    fn collect_reference_fields(&self, graph: &SceneGraph, id: ObjectId) -> Vec<RefField> {
        vec![RefField {
            name: "tracked",
            target: graph.object(id).kind.bounds_leaf().tracked,
        }]
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::BoundsLeaf(Default::default())))
    }

    fn read_fields(&mut self, graph: &mut SceneGraph, id: ObjectId, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        graph.object_mut(id).kind.bounds_leaf_mut().volume = BoundingVolume::decode(rdr)?;
        Ok(())
    }

    fn resolve_reference_fields(
        &mut self,
        graph: &mut SceneGraph,
        id: ObjectId,
        targets: &[Option<ObjectId>],
    ) -> Result<(), SceneIoError> {
        if let Some(tracked) = targets[0] {
            if !graph.object(tracked).kind.is_node() {
                return Err(SceneIoError::FormatError {
                    reason: "bounds leaf tracks a component",
                });
            }
        }
        graph.object_mut(id).kind.bounds_leaf_mut().tracked = targets[0];
        Ok(())
    }
}
