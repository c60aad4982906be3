use std::any::Any;
use std::fmt;
use std::sync::Arc;

use num_enum::{FromPrimitive, IntoPrimitive};

use crate::common::types::{BoundingVolume, ColorRgba, Matrix4, Vector3};
use crate::graph::ObjectId;

bitflags::bitflags! {
    /// Engine-level permission bits carried by every object record,
    /// orthogonal to the type-specific payload. Unknown bits are preserved
    /// across a round trip.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u32 {
        const WRITE_CHILDREN = 1 << 0;
        const WRITE_TRANSFORM = 1 << 1;
        const WRITE_FIELDS = 1 << 2;
        const ALLOW_DETACH = 1 << 3;
        const PICKABLE = 1 << 4;
        const COLLIDABLE = 1 << 5;
    }
}

/// Application payload attached to an object. `Bytes` round-trips through
/// the stream as-is; `Runtime` values cannot be persisted and are dropped
/// on save with a diagnostic.
#[derive(Clone)]
pub enum UserData {
    Bytes(Vec<u8>),
    Runtime(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserData::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            UserData::Runtime(_) => write!(f, "Runtime(..)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformNode {
    pub matrix: Matrix4,
}

/// Leaf that splices a [`ObjectKind::SharedUnit`] subgraph into the tree.
/// Several links may name the same unit; that is the whole point.
#[derive(Debug, Clone, Default)]
pub struct LinkNode {
    pub unit: Option<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct ShapeNode {
    pub appearance: Option<ObjectId>,
    pub geometry: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct LightNode {
    pub color: ColorRgba,
    pub intensity: f32,
    /// Names a [`ObjectKind::BoundsLeaf`] anywhere in the graph.
    pub influence: Option<ObjectId>,
}

impl Default for LightNode {
    fn default() -> Self {
        LightNode {
            color: ColorRgba::WHITE,
            intensity: 1.0,
            influence: None,
        }
    }
}

/// Spatial leaf other nodes point at. `tracked` may name any node,
/// including an ancestor, which is how reference cycles enter the graph.
#[derive(Debug, Clone)]
pub struct BoundsLeafNode {
    pub volume: BoundingVolume,
    pub tracked: Option<ObjectId>,
}

impl Default for BoundsLeafNode {
    fn default() -> Self {
        BoundsLeafNode {
            volume: BoundingVolume::Sphere {
                center: Vector3 { x: 0.0, y: 0.0, z: 0.0 },
                radius: 1.0,
            },
            tracked: None,
        }
    }
}

#[repr(u8)]
#[derive(FromPrimitive, IntoPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    None = 0,
    Front = 1,
    Back = 2,
    #[default]
    Unknown = 255,
}

#[derive(Debug, Clone)]
pub struct AppearanceComponent {
    pub transparency: f32,
    pub cull: CullFace,
    pub material: Option<ObjectId>,
    pub texture: Option<ObjectId>,
}

impl Default for AppearanceComponent {
    fn default() -> Self {
        AppearanceComponent {
            transparency: 0.0,
            cull: CullFace::Back,
            material: None,
            texture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialComponent {
    pub ambient: ColorRgba,
    pub diffuse: ColorRgba,
    pub specular: ColorRgba,
    pub emissive: ColorRgba,
    pub shininess: f32,
}

impl Default for MaterialComponent {
    fn default() -> Self {
        MaterialComponent {
            ambient: ColorRgba::BLACK,
            diffuse: ColorRgba::WHITE,
            specular: ColorRgba::WHITE,
            emissive: ColorRgba::BLACK,
            shininess: 64.0,
        }
    }
}

#[repr(u8)]
#[derive(FromPrimitive, IntoPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelFormat {
    Rgba8 = 0,
    Rgb8 = 1,
    Luminance8 = 2,
    /// GPU-compressed texel blocks. No stable wire form, see the adapter.
    Compressed = 3,
    #[default]
    Unknown = 255,
}

impl TexelFormat {
    pub fn bytes_per_texel(&self) -> Option<u32> {
        match self {
            TexelFormat::Rgba8 => Some(4),
            TexelFormat::Rgb8 => Some(3),
            TexelFormat::Luminance8 => Some(1),
            TexelFormat::Compressed | TexelFormat::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureComponent {
    pub format: TexelFormat,
    pub width: u32,
    pub height: u32,
    pub texels: Vec<u8>,
}

impl Default for TextureComponent {
    fn default() -> Self {
        TextureComponent {
            format: TexelFormat::Rgba8,
            width: 0,
            height: 0,
            texels: Vec::new(),
        }
    }
}

#[repr(u8)]
#[derive(FromPrimitive, IntoPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles = 0,
    Lines = 1,
    Points = 2,
    #[default]
    Unknown = 255,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum IndexData {
    #[default]
    None,
    U16(Vec<u16>),
    U32(Vec<u32>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshComponent {
    pub topology: Topology,
    pub vertices: Vec<Vector3>,
    pub indices: IndexData,
}

impl Default for MeshComponent {
    fn default() -> Self {
        MeshComponent {
            topology: Topology::Triangles,
            vertices: Vec::new(),
            indices: IndexData::None,
        }
    }
}

/// An application-defined subtype: structurally its base kind, plus an
/// opaque self-delimited payload readers without the subtype can skip.
/// The base must be a built-in kind; a wrapper around another wrapper
/// has no wire form and is refused on save.
#[derive(Debug, Clone)]
pub struct CustomNode {
    pub type_name: String,
    pub base: Box<ObjectKind>,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum ObjectKind {
    Group,
    Transform(TransformNode),
    Link(LinkNode),
    SharedUnit,
    Shape(ShapeNode),
    Light(LightNode),
    BoundsLeaf(BoundsLeafNode),
    Appearance(AppearanceComponent),
    Material(MaterialComponent),
    Texture(TextureComponent),
    Mesh(MeshComponent),
    Custom(CustomNode),
}

impl ObjectKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ObjectKind::Group => "Group",
            ObjectKind::Transform(_) => "Transform",
            ObjectKind::Link(_) => "Link",
            ObjectKind::SharedUnit => "SharedUnit",
            ObjectKind::Shape(_) => "Shape",
            ObjectKind::Light(_) => "Light",
            ObjectKind::BoundsLeaf(_) => "BoundsLeaf",
            ObjectKind::Appearance(_) => "Appearance",
            ObjectKind::Material(_) => "Material",
            ObjectKind::Texture(_) => "Texture",
            ObjectKind::Mesh(_) => "Mesh",
            ObjectKind::Custom(_) => "Custom",
        }
    }

    /// Peels custom wrappers down to the structural base kind.
    pub fn body(&self) -> &ObjectKind {
        match self {
            ObjectKind::Custom(custom) => custom.base.body(),
            other => other,
        }
    }

    pub fn body_mut(&mut self) -> &mut ObjectKind {
        match self {
            ObjectKind::Custom(custom) => custom.base.body_mut(),
            other => other,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(
            self.body(),
            ObjectKind::Appearance(_) | ObjectKind::Material(_) | ObjectKind::Texture(_) | ObjectKind::Mesh(_)
        )
    }

    pub fn is_node(&self) -> bool {
        !self.is_component()
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self.body(),
            ObjectKind::Group | ObjectKind::Transform(_) | ObjectKind::SharedUnit
        )
    }

    /// Whether this object may sit in a parent's child list. Components are
    /// reached through reference fields, shared units through links.
    pub fn is_child_attachable(&self) -> bool {
        self.is_node() && !matches!(self.body(), ObjectKind::SharedUnit)
    }
}

macro_rules! kind_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $type:ty, $label:literal) => {
        impl ObjectKind {
            pub(crate) fn $get(&self) -> &$type {
                match self.body() {
                    ObjectKind::$variant(inner) => inner,
                    other => panic!(
                        "SceneGraph invariant violated: expected a {}, found a {}",
                        $label,
                        other.kind_name()
                    ),
                }
            }

            pub(crate) fn $get_mut(&mut self) -> &mut $type {
                match self.body_mut() {
                    ObjectKind::$variant(inner) => inner,
                    other => panic!(
                        "SceneGraph invariant violated: expected a {}, found a {}",
                        $label,
                        other.kind_name()
                    ),
                }
            }
        }
    };
}

kind_accessors!(transform, transform_mut, Transform, TransformNode, "transform");
kind_accessors!(link, link_mut, Link, LinkNode, "link");
kind_accessors!(shape, shape_mut, Shape, ShapeNode, "shape");
kind_accessors!(light, light_mut, Light, LightNode, "light");
kind_accessors!(bounds_leaf, bounds_leaf_mut, BoundsLeaf, BoundsLeafNode, "bounds leaf");
kind_accessors!(appearance, appearance_mut, Appearance, AppearanceComponent, "appearance");
kind_accessors!(material, material_mut, Material, MaterialComponent, "material");
kind_accessors!(texture, texture_mut, Texture, TextureComponent, "texture");
kind_accessors!(mesh, mesh_mut, Mesh, MeshComponent, "mesh");
