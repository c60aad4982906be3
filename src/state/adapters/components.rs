//! Adapters for the component kinds. Components never appear in child
//! lists, so none of these are composites; shapes and appearances reach
//! them through reference slots and several owners may share one instance.

use std::io::{Read, Write};

use crate::SceneIoError;
use crate::common::codec::{Streamable, read_blob, write_blob};
use crate::common::types::ColorRgba;
use crate::graph::types::{CullFace, IndexData, MeshComponent, ObjectKind, TexelFormat, TextureComponent, Topology};
use crate::graph::{ObjectId, SceneGraph};
use crate::state::{RefField, StateAdapter};

pub struct AppearanceState;

impl StateAdapter for AppearanceState {
    fn type_name(&self) -> &'static str {
        "Appearance"
    }

    fn reference_slot_names(&self) -> &'static [&'static str] {
        &["material", "texture"]
    }

    fn write_fields(&mut self, graph: &SceneGraph, id: ObjectId, wtr: &mut dyn Write) -> Result<(), SceneIoError> {
        let appearance = graph.object(id).kind.appearance();
        if appearance.cull == CullFace::Unknown {
            return Err(SceneIoError::UnsupportedEncoding {
                type_name: "Appearance",
                reason: "an unrecognized cull mode cannot be persisted",
            });
        }
        appearance.transparency.encode(wtr)?;
        u8::from(appearance.cull).encode(wtr)
    }

    fn collect_reference_fields(&self, graph: &SceneGraph, id: ObjectId) -> Vec<RefField> {
        let appearance = graph.object(id).kind.appearance();
        vec![
            RefField {
                name: "material",
                target: appearance.material,
            },
            RefField {
                name: "texture",
                target: appearance.texture,
            },
        ]
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Appearance(Default::default())))
    }

    fn read_fields(&mut self, graph: &mut SceneGraph, id: ObjectId, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        let transparency = f32::decode(rdr)?;
        let cull = CullFace::from(u8::decode(rdr)?);
        if cull == CullFace::Unknown {
            return Err(SceneIoError::FormatError {
                reason: "unrecognized cull mode",
            });
        }
        let appearance = graph.object_mut(id).kind.appearance_mut();
        appearance.transparency = transparency;
        appearance.cull = cull;
        Ok(())
    }

    fn resolve_reference_fields(
        &mut self,
        graph: &mut SceneGraph,
        id: ObjectId,
        targets: &[Option<ObjectId>],
    ) -> Result<(), SceneIoError> {
        if let Some(material) = targets[0] {
            if !matches!(graph.object(material).kind.body(), ObjectKind::Material(_)) {
                return Err(SceneIoError::FormatError {
                    reason: "appearance material slot names a non-material target",
                });
            }
        }
        if let Some(texture) = targets[1] {
            if !matches!(graph.object(texture).kind.body(), ObjectKind::Texture(_)) {
                return Err(SceneIoError::FormatError {
                    reason: "appearance texture slot names a non-texture target",
                });
            }
        }
        let appearance = graph.object_mut(id).kind.appearance_mut();
        appearance.material = targets[0];
        appearance.texture = targets[1];
        Ok(())
    }
}

pub struct MaterialState;

impl StateAdapter for MaterialState {
    fn type_name(&self) -> &'static str {
        "Material"
    }

    fn write_fields(&mut self, graph: &SceneGraph, id: ObjectId, wtr: &mut dyn Write) -> Result<(), SceneIoError> {
        let material = graph.object(id).kind.material();
        material.ambient.encode(wtr)?;
        material.diffuse.encode(wtr)?;
        material.specular.encode(wtr)?;
        material.emissive.encode(wtr)?;
        material.shininess.encode(wtr)
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Material(Default::default())))
    }

    fn read_fields(&mut self, graph: &mut SceneGraph, id: ObjectId, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        let ambient = ColorRgba::decode(rdr)?;
        let diffuse = ColorRgba::decode(rdr)?;
        let specular = ColorRgba::decode(rdr)?;
        let emissive = ColorRgba::decode(rdr)?;
        let shininess = f32::decode(rdr)?;
        let material = graph.object_mut(id).kind.material_mut();
        material.ambient = ambient;
        material.diffuse = diffuse;
        material.specular = specular;
        material.emissive = emissive;
        material.shininess = shininess;
        Ok(())
    }
}

/// Texture records carry their format and dimensions as construction
/// parameters; the texel blob follows in the field section and has to match
/// `width * height * bytes_per_texel` exactly.
pub struct TextureState {
    format: TexelFormat,
    width: u32,
    height: u32,
}

impl Default for TextureState {
    fn default() -> Self {
        TextureState {
            format: TexelFormat::Rgba8,
            width: 0,
            height: 0,
        }
    }
}

impl TextureState {
    fn expected_texel_len(&self) -> Option<u64> {
        let bytes = self.format.bytes_per_texel()?;
        Some(self.width as u64 * self.height as u64 * bytes as u64)
    }
}

impl StateAdapter for TextureState {
    fn type_name(&self) -> &'static str {
        "Texture"
    }

    fn write_construction(
        &mut self,
        graph: &SceneGraph,
        id: ObjectId,
        wtr: &mut dyn Write,
    ) -> Result<(), SceneIoError> {
        let texture = graph.object(id).kind.texture();
        let Some(bytes_per_texel) = texture.format.bytes_per_texel() else {
            return Err(SceneIoError::UnsupportedEncoding {
                type_name: "Texture",
                reason: "compressed texel layouts have no stable wire form",
            });
        };
        let expected = texture.width as u64 * texture.height as u64 * bytes_per_texel as u64;
        if texture.texels.len() as u64 != expected {
            return Err(SceneIoError::UnsupportedEncoding {
                type_name: "Texture",
                reason: "texel buffer length does not match the declared dimensions",
            });
        }
        u8::from(texture.format).encode(wtr)?;
        texture.width.encode(wtr)?;
        texture.height.encode(wtr)
    }

    fn write_fields(&mut self, graph: &SceneGraph, id: ObjectId, wtr: &mut dyn Write) -> Result<(), SceneIoError> {
        write_blob(wtr, &graph.object(id).kind.texture().texels)
    }

    fn read_construction(&mut self, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        self.format = TexelFormat::from(u8::decode(rdr)?);
        if self.format.bytes_per_texel().is_none() {
            return Err(SceneIoError::FormatError {
                reason: "texel format cannot appear on the wire",
            });
        }
        self.width = u32::decode(rdr)?;
        self.height = u32::decode(rdr)?;
        Ok(())
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Texture(TextureComponent {
            format: self.format,
            width: self.width,
            height: self.height,
            texels: Vec::new(),
        })))
    }

    fn read_fields(&mut self, graph: &mut SceneGraph, id: ObjectId, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        let texels = read_blob(rdr)?;
        if Some(texels.len() as u64) != self.expected_texel_len() {
            return Err(SceneIoError::FormatError {
                reason: "texel buffer length does not match the declared dimensions",
            });
        }
        graph.object_mut(id).kind.texture_mut().texels = texels;
        Ok(())
    }
}

pub struct MeshState {
    topology: Topology,
}

impl Default for MeshState {
    fn default() -> Self {
        MeshState {
            topology: Topology::Triangles,
        }
    }
}

impl StateAdapter for MeshState {
    fn type_name(&self) -> &'static str {
        "Mesh"
    }

    fn write_construction(
        &mut self,
        graph: &SceneGraph,
        id: ObjectId,
        wtr: &mut dyn Write,
    ) -> Result<(), SceneIoError> {
        let mesh = graph.object(id).kind.mesh();
        if mesh.topology == Topology::Unknown {
            return Err(SceneIoError::UnsupportedEncoding {
                type_name: "Mesh",
                reason: "an unrecognized topology cannot be persisted",
            });
        }
        u8::from(mesh.topology).encode(wtr)
    }

    fn write_fields(&mut self, graph: &SceneGraph, id: ObjectId, wtr: &mut dyn Write) -> Result<(), SceneIoError> {
        let mesh = graph.object(id).kind.mesh();
        mesh.vertices.encode(wtr)?;
        write_index_data(&mesh.indices, wtr)
    }

    fn read_construction(&mut self, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        self.topology = Topology::from(u8::decode(rdr)?);
        if self.topology == Topology::Unknown {
            return Err(SceneIoError::FormatError {
                reason: "unrecognized mesh topology",
            });
        }
        Ok(())
    }

    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError> {
        Ok(graph.add(ObjectKind::Mesh(MeshComponent {
            topology: self.topology,
            vertices: Vec::new(),
            indices: IndexData::None,
        })))
    }

    fn read_fields(&mut self, graph: &mut SceneGraph, id: ObjectId, rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        let vertices = Streamable::decode(rdr)?;
        let indices = read_index_data(rdr)?;
        let mesh = graph.object_mut(id).kind.mesh_mut();
        mesh.vertices = vertices;
        mesh.indices = indices;
        Ok(())
    }
}

const INDICES_NONE: u8 = 0;
const INDICES_U16: u8 = 1;
const INDICES_U32: u8 = 2;

fn write_index_data(indices: &IndexData, wtr: &mut dyn Write) -> Result<(), SceneIoError> {
    match indices {
        IndexData::None => INDICES_NONE.encode(wtr),
        IndexData::U16(values) => {
            INDICES_U16.encode(wtr)?;
            values.encode(wtr)
        }
        IndexData::U32(values) => {
            INDICES_U32.encode(wtr)?;
            values.encode(wtr)
        }
    }
}

fn read_index_data(rdr: &mut dyn Read) -> Result<IndexData, SceneIoError> {
    match u8::decode(rdr)? {
        INDICES_NONE => Ok(IndexData::None),
        INDICES_U16 => Ok(IndexData::U16(Streamable::decode(rdr)?)),
        INDICES_U32 => Ok(IndexData::U32(Streamable::decode(rdr)?)),
        _ => Err(SceneIoError::FormatError {
            reason: "unrecognized index encoding",
        }),
    }
}
