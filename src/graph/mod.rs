//! The live, in-memory scene graph the persistence engine operates on.
//!
//! Objects live in an arena ([`SceneGraph`]) and refer to each other through
//! [`ObjectId`] indices, so "two fields name the same object" is plain index
//! equality. The parent/child structure is a tree with validated attachment;
//! reference fields (a shape's appearance, a link's unit, a bounds leaf's
//! tracked node) are free-form and may point anywhere, including backwards
//! up the tree.

use thiserror::Error;

use crate::graph::types::{Capabilities, ObjectKind, UserData};

pub mod types;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    pub(crate) fn new(index: u32) -> Self {
        ObjectId(index)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Object {0:?} is already attached to a parent")]
    AlreadyParented(ObjectId),

    #[error("Object {0:?} is not a composite node and cannot take children")]
    NotComposite(ObjectId),

    /// Components are reached through reference fields and shared units
    /// through links; neither may sit in a child list.
    #[error("Object {0:?} cannot be attached as a child")]
    NotAttachable(ObjectId),

    #[error("Attaching {child:?} under {parent:?} would close a parent cycle")]
    CyclicAttachment { parent: ObjectId, child: ObjectId },

    #[error("Object {0:?} has no parent to detach from")]
    NotAttached(ObjectId),

    #[error("Object {id:?} is not a {expected}")]
    KindMismatch { id: ObjectId, expected: &'static str },

    #[error("A component cannot act as the stream root")]
    ComponentRoot,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub name: Option<String>,
    pub capabilities: Capabilities,
    pub user_data: Option<UserData>,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
}

impl SceneObject {
    fn new(kind: ObjectKind) -> Self {
        SceneObject {
            kind,
            name: None,
            capabilities: Capabilities::empty(),
            user_data: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
}

impl SceneGraph {
    pub fn new() -> Self {
        SceneGraph { objects: Vec::new() }
    }

    pub fn add(&mut self, kind: ObjectKind) -> ObjectId {
        let id = ObjectId::new(
            u32::try_from(self.objects.len()).expect("SceneGraph invariant violated: object count exceeds u32"),
        );
        self.objects.push(SceneObject::new(kind));
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.objects.len()).map(|index| ObjectId::new(index as u32))
    }

    pub fn object(&self, id: ObjectId) -> &SceneObject {
        self.objects
            .get(id.as_u32() as usize)
            .expect("SceneGraph invariant violated: object id out of bounds")
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut SceneObject {
        self.objects
            .get_mut(id.as_u32() as usize)
            .expect("SceneGraph invariant violated: object id out of bounds")
    }

    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.object(id).parent
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        &self.object(id).children
    }

    pub fn attach(&mut self, parent: ObjectId, child: ObjectId) -> Result<(), SceneError> {
        if !self.object(parent).kind.is_composite() {
            return Err(SceneError::NotComposite(parent));
        }
        if !self.object(child).kind.is_child_attachable() {
            return Err(SceneError::NotAttachable(child));
        }
        if self.object(child).parent.is_some() {
            return Err(SceneError::AlreadyParented(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneError::CyclicAttachment { parent, child });
        }

        self.object_mut(parent).children.push(child);
        self.object_mut(child).parent = Some(parent);
        Ok(())
    }

    pub fn detach(&mut self, child: ObjectId) -> Result<(), SceneError> {
        let Some(parent) = self.object(child).parent else {
            return Err(SceneError::NotAttached(child));
        };

        self.object_mut(parent).children.retain(|&entry| entry != child);
        self.object_mut(child).parent = None;
        Ok(())
    }

    /// Walks `of`'s parent chain looking for `candidate`.
    fn is_ancestor(&self, candidate: ObjectId, of: ObjectId) -> bool {
        let mut cursor = self.object(of).parent;
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.object(current).parent;
        }
        false
    }

    pub fn set_name(&mut self, id: ObjectId, name: impl Into<String>) {
        self.object_mut(id).name = Some(name.into());
    }

    pub fn set_capabilities(&mut self, id: ObjectId, capabilities: Capabilities) {
        self.object_mut(id).capabilities = capabilities;
    }

    pub fn set_user_data(&mut self, id: ObjectId, user_data: Option<UserData>) {
        self.object_mut(id).user_data = user_data;
    }

    pub fn set_link_unit(&mut self, link: ObjectId, unit: Option<ObjectId>) -> Result<(), SceneError> {
        if let Some(unit_id) = unit {
            if !matches!(self.object(unit_id).kind.body(), ObjectKind::SharedUnit) {
                return Err(SceneError::KindMismatch {
                    id: unit_id,
                    expected: "shared unit",
                });
            }
        }
        match self.object_mut(link).kind.body_mut() {
            ObjectKind::Link(node) => {
                node.unit = unit;
                Ok(())
            }
            _ => Err(SceneError::KindMismatch {
                id: link,
                expected: "link",
            }),
        }
    }

    pub fn set_shape_appearance(&mut self, shape: ObjectId, appearance: Option<ObjectId>) -> Result<(), SceneError> {
        if let Some(appearance_id) = appearance {
            if !matches!(self.object(appearance_id).kind.body(), ObjectKind::Appearance(_)) {
                return Err(SceneError::KindMismatch {
                    id: appearance_id,
                    expected: "appearance",
                });
            }
        }
        match self.object_mut(shape).kind.body_mut() {
            ObjectKind::Shape(node) => {
                node.appearance = appearance;
                Ok(())
            }
            _ => Err(SceneError::KindMismatch {
                id: shape,
                expected: "shape",
            }),
        }
    }

    pub fn set_shape_geometry(&mut self, shape: ObjectId, geometry: Option<ObjectId>) -> Result<(), SceneError> {
        if let Some(mesh_id) = geometry {
            if !matches!(self.object(mesh_id).kind.body(), ObjectKind::Mesh(_)) {
                return Err(SceneError::KindMismatch {
                    id: mesh_id,
                    expected: "mesh",
                });
            }
        }
        match self.object_mut(shape).kind.body_mut() {
            ObjectKind::Shape(node) => {
                node.geometry = geometry;
                Ok(())
            }
            _ => Err(SceneError::KindMismatch {
                id: shape,
                expected: "shape",
            }),
        }
    }

    pub fn set_light_influence(&mut self, light: ObjectId, influence: Option<ObjectId>) -> Result<(), SceneError> {
        if let Some(bounds_id) = influence {
            if !matches!(self.object(bounds_id).kind.body(), ObjectKind::BoundsLeaf(_)) {
                return Err(SceneError::KindMismatch {
                    id: bounds_id,
                    expected: "bounds leaf",
                });
            }
        }
        match self.object_mut(light).kind.body_mut() {
            ObjectKind::Light(node) => {
                node.influence = influence;
                Ok(())
            }
            _ => Err(SceneError::KindMismatch {
                id: light,
                expected: "light",
            }),
        }
    }

    pub fn set_bounds_tracked(&mut self, leaf: ObjectId, tracked: Option<ObjectId>) -> Result<(), SceneError> {
        if let Some(tracked_id) = tracked {
            if !self.object(tracked_id).kind.is_node() {
                return Err(SceneError::KindMismatch {
                    id: tracked_id,
                    expected: "node",
                });
            }
        }
        match self.object_mut(leaf).kind.body_mut() {
            ObjectKind::BoundsLeaf(node) => {
                node.tracked = tracked;
                Ok(())
            }
            _ => Err(SceneError::KindMismatch {
                id: leaf,
                expected: "bounds leaf",
            }),
        }
    }

    pub fn set_appearance_material(&mut self, appearance: ObjectId, material: Option<ObjectId>) -> Result<(), SceneError> {
        if let Some(material_id) = material {
            if !matches!(self.object(material_id).kind.body(), ObjectKind::Material(_)) {
                return Err(SceneError::KindMismatch {
                    id: material_id,
                    expected: "material",
                });
            }
        }
        match self.object_mut(appearance).kind.body_mut() {
            ObjectKind::Appearance(component) => {
                component.material = material;
                Ok(())
            }
            _ => Err(SceneError::KindMismatch {
                id: appearance,
                expected: "appearance",
            }),
        }
    }

    pub fn set_appearance_texture(&mut self, appearance: ObjectId, texture: Option<ObjectId>) -> Result<(), SceneError> {
        if let Some(texture_id) = texture {
            if !matches!(self.object(texture_id).kind.body(), ObjectKind::Texture(_)) {
                return Err(SceneError::KindMismatch {
                    id: texture_id,
                    expected: "texture",
                });
            }
        }
        match self.object_mut(appearance).kind.body_mut() {
            ObjectKind::Appearance(component) => {
                component.texture = texture;
                Ok(())
            }
            _ => Err(SceneError::KindMismatch {
                id: appearance,
                expected: "appearance",
            }),
        }
    }
}
