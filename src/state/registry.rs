//! Maps between live object kinds, wire type tags and the adapters that
//! stream them. A registry is handed to both the writer and the reader;
//! applications extend it with custom subtype registrations and pick the
//! fallback behaviour for subtypes the reading side has never heard of.

use std::collections::HashMap;

use num_enum::{FromPrimitive, IntoPrimitive};

use crate::SceneIoError;
use crate::graph::types::ObjectKind;
use crate::state::StateAdapter;
use crate::state::adapters::components::{AppearanceState, MaterialState, MeshState, TextureState};
use crate::state::adapters::nodes::{
    BoundsLeafState, GroupState, LightState, LinkState, ShapeState, SharedUnitState, TransformState,
};

/// Wire tag of a record. Node tags sit below 16, component tags at 16 and
/// up; [`TypeTag::Custom`] marks records that carry a subtype name and an
/// ancestor tag instead of describing a built-in directly.
#[repr(u16)]
#[derive(FromPrimitive, IntoPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    #[default]
    Unknown = 0,
    Group = 1,
    Transform = 2,
    Link = 3,
    SharedUnit = 4,
    Shape = 5,
    Light = 6,
    BoundsLeaf = 7,
    Appearance = 16,
    Material = 17,
    Texture = 18,
    Mesh = 19,
    Custom = 0xFFFE,
}

/// What the reader does with a custom record whose subtype name has no
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Fail the load.
    #[default]
    Strict,
    /// Construct the plain ancestor form and drop the subtype payload.
    AncestorForm,
    /// Construct the ancestor form wrapped in a placeholder that keeps the
    /// subtype name and payload, so a later save loses nothing.
    Placeholder,
}

pub type AdapterFactory = fn() -> Box<dyn StateAdapter>;

pub struct TypeRegistry {
    factories: HashMap<TypeTag, AdapterFactory>,
    custom_types: HashMap<String, TypeTag>,
    fallback: FallbackPolicy,
}

impl TypeRegistry {
    /// A registry covering every built-in kind, with the strict fallback.
    pub fn standard() -> Self {
        let mut registry = TypeRegistry {
            factories: HashMap::new(),
            custom_types: HashMap::new(),
            fallback: FallbackPolicy::default(),
        };

        registry.register(TypeTag::Group, || Box::new(GroupState));
        registry.register(TypeTag::Transform, || Box::new(TransformState));
        registry.register(TypeTag::Link, || Box::new(LinkState));
        registry.register(TypeTag::SharedUnit, || Box::new(SharedUnitState));
        registry.register(TypeTag::Shape, || Box::new(ShapeState));
        registry.register(TypeTag::Light, || Box::new(LightState));
        registry.register(TypeTag::BoundsLeaf, || Box::new(BoundsLeafState));
        registry.register(TypeTag::Appearance, || Box::new(AppearanceState));
        registry.register(TypeTag::Material, || Box::new(MaterialState));
        registry.register(TypeTag::Texture, || Box::new(TextureState::default()));
        registry.register(TypeTag::Mesh, || Box::new(MeshState::default()));

        registry
    }

    pub fn register(&mut self, tag: TypeTag, factory: AdapterFactory) {
        self.factories.insert(tag, factory);
    }

    /// Declares a custom subtype by name, anchored to the built-in tag whose
    /// record structure it extends. Registered subtypes round-trip their
    /// payload regardless of the fallback policy.
    pub fn register_custom_type(&mut self, type_name: impl Into<String>, ancestor: TypeTag) {
        self.custom_types.insert(type_name.into(), ancestor);
    }

    pub fn custom_ancestor(&self, type_name: &str) -> Option<TypeTag> {
        self.custom_types.get(type_name).copied()
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.fallback
    }

    pub fn set_fallback_policy(&mut self, policy: FallbackPolicy) {
        self.fallback = policy;
    }

    pub fn with_fallback(mut self, policy: FallbackPolicy) -> Self {
        self.fallback = policy;
        self
    }

    pub fn identify(&self, kind: &ObjectKind) -> TypeTag {
        match kind {
            ObjectKind::Group => TypeTag::Group,
            ObjectKind::Transform(_) => TypeTag::Transform,
            ObjectKind::Link(_) => TypeTag::Link,
            ObjectKind::SharedUnit => TypeTag::SharedUnit,
            ObjectKind::Shape(_) => TypeTag::Shape,
            ObjectKind::Light(_) => TypeTag::Light,
            ObjectKind::BoundsLeaf(_) => TypeTag::BoundsLeaf,
            ObjectKind::Appearance(_) => TypeTag::Appearance,
            ObjectKind::Material(_) => TypeTag::Material,
            ObjectKind::Texture(_) => TypeTag::Texture,
            ObjectKind::Mesh(_) => TypeTag::Mesh,
            ObjectKind::Custom(_) => TypeTag::Custom,
        }
    }

    pub fn adapter_for_tag(&self, tag: TypeTag) -> Result<Box<dyn StateAdapter>, SceneIoError> {
        self.factories
            .get(&tag)
            .map(|factory| factory())
            .ok_or(SceneIoError::UnknownTypeTag { tag: tag.into() })
    }
}
