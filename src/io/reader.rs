//! The load pass, in two phases. Phase one walks the stream and turns
//! every inline record into a live object, registering it in the symbol
//! table as it goes; reference slots and child lists are kept as raw
//! identities on the symbols. Phase two runs after the footer checks out
//! and revisits every symbol in ascending identity order, resolving slots
//! against the table and attaching children, so cyclic and forward
//! references land on fully constructed objects.

use std::collections::HashMap;
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::SceneIoError;
use crate::common::codec::{Streamable, read_blob, skip_blob};
use crate::graph::types::{Capabilities, CustomNode, ObjectKind, UserData};
use crate::graph::{ObjectId, SceneGraph};
use crate::io::symbols::{Identity, SymbolSummary, SymbolTable};
use crate::io::types::{
    FOURCC_SCENE_END, MARKER_BACK_REFERENCE, MARKER_INLINE, META_HAS_NAME, META_HAS_USER_DATA, NULL_IDENTITY,
    StreamHeader,
};
use crate::state::registry::{FallbackPolicy, TypeRegistry, TypeTag};

pub struct LoadedScene {
    pub graph: SceneGraph,
    pub root: ObjectId,
    pub summary: LoadSummary,
}

#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub header: StreamHeader,
    /// Inline records decoded, which equals the number of minted symbols.
    pub records: u32,
    pub back_references: u32,
    pub symbols: SymbolSummary,
    wire_counts: HashMap<ObjectId, u32>,
}

impl LoadSummary {
    /// How often the wiring phase attached children under `object`. Exactly
    /// 1 for every composite in a well-formed stream, 0 for everything else.
    pub fn wire_count(&self, object: ObjectId) -> u32 {
        self.wire_counts.get(&object).copied().unwrap_or(0)
    }
}

/// Subtype framing carried from phase one into the trailer handling.
struct CustomFrame {
    type_name: String,
    keep_payload: bool,
}

pub struct SceneReader<'a> {
    registry: &'a TypeRegistry,
    graph: SceneGraph,
    symbols: SymbolTable,
    back_references: u32,
}

impl<'a> SceneReader<'a> {
    pub fn read_scene<R: Read>(rdr: &mut R, registry: &TypeRegistry) -> Result<LoadedScene, SceneIoError> {
        let header = StreamHeader::read(rdr)?;
        let mut reader = SceneReader {
            registry,
            graph: SceneGraph::new(),
            symbols: SymbolTable::new(),
            back_references: 0,
        };

        let root_raw = reader.materialize(rdr, false)?;
        let Some(root) = reader.symbols.object_for(root_raw)? else {
            return Err(SceneIoError::FormatError {
                reason: "the stream root is a null reference",
            });
        };
        if reader.graph.object(root).kind.is_component() {
            return Err(SceneIoError::FormatError {
                reason: "the stream root is a component",
            });
        }

        let end = rdr.read_u32::<LittleEndian>()?;
        if end != FOURCC_SCENE_END {
            return Err(SceneIoError::FormatError {
                reason: "missing stream footer",
            });
        }
        let expected = rdr.read_u32::<LittleEndian>()?;
        let found = reader.symbols.len() as u32;
        if expected != found {
            return Err(SceneIoError::TruncatedStream { expected, found });
        }

        let wire_counts = reader.wire()?;
        log::debug!(
            "loaded {} records ({} back-references), root {:?}",
            reader.symbols.len(),
            reader.back_references,
            root
        );

        Ok(LoadedScene {
            root,
            summary: LoadSummary {
                header,
                records: reader.symbols.len() as u32,
                back_references: reader.back_references,
                symbols: reader.symbols.into_summary(),
                wire_counts,
            },
            graph: reader.graph,
        })
    }

    /// Phase one for a single mention. Returns the raw identity the mention
    /// stands for so callers can park it for phase two.
    // TODO: bound the record nesting depth; a hostile stream can recurse
    // deeply before the footer check gets a chance to reject it.
    fn materialize(&mut self, rdr: &mut dyn Read, is_field_mention: bool) -> Result<u32, SceneIoError> {
        match rdr.read_u8()? {
            MARKER_BACK_REFERENCE => {
                let raw = rdr.read_u32::<LittleEndian>()?;
                self.symbols.object_for(raw)?;
                if raw != NULL_IDENTITY {
                    self.back_references += 1;
                    if is_field_mention {
                        self.symbols.increment_reference_count(Identity::from_raw(raw));
                    }
                }
                Ok(raw)
            }
            MARKER_INLINE => {
                let identity = self.materialize_inline(rdr)?;
                if is_field_mention {
                    self.symbols.increment_reference_count(identity);
                }
                Ok(identity.as_u32())
            }
            _ => Err(SceneIoError::FormatError {
                reason: "invalid record marker",
            }),
        }
    }

    fn materialize_inline(&mut self, rdr: &mut dyn Read) -> Result<Identity, SceneIoError> {
        let raw_tag = rdr.read_u16::<LittleEndian>()?;
        let tag = TypeTag::from(raw_tag);
        if tag == TypeTag::Unknown {
            return Err(SceneIoError::UnknownTypeTag { tag: raw_tag });
        }

        let (adapter_tag, custom) = if tag == TypeTag::Custom {
            let type_name = String::decode(rdr)?;
            let raw_ancestor = rdr.read_u16::<LittleEndian>()?;
            let ancestor = TypeTag::from(raw_ancestor);
            if ancestor == TypeTag::Unknown || ancestor == TypeTag::Custom {
                return Err(SceneIoError::FormatError {
                    reason: "invalid ancestor tag in a custom record",
                });
            }
            match self.registry.custom_ancestor(&type_name) {
                Some(registered) => {
                    if registered != ancestor {
                        return Err(SceneIoError::FormatError {
                            reason: "custom record ancestor does not match the registration",
                        });
                    }
                    (
                        ancestor,
                        Some(CustomFrame {
                            type_name,
                            keep_payload: true,
                        }),
                    )
                }
                None => match self.registry.fallback_policy() {
                    FallbackPolicy::Strict => return Err(SceneIoError::UnknownType { type_name }),
                    FallbackPolicy::AncestorForm => {
                        log::warn!(
                            "substituting the plain {:?} form for the unknown type \"{}\"",
                            ancestor,
                            type_name
                        );
                        (
                            ancestor,
                            Some(CustomFrame {
                                type_name,
                                keep_payload: false,
                            }),
                        )
                    }
                    FallbackPolicy::Placeholder => {
                        log::warn!(
                            "keeping the unknown type \"{}\" as a {:?} placeholder",
                            type_name,
                            ancestor
                        );
                        (
                            ancestor,
                            Some(CustomFrame {
                                type_name,
                                keep_payload: true,
                            }),
                        )
                    }
                },
            }
        } else {
            (tag, None)
        };

        let mut adapter = self.registry.adapter_for_tag(adapter_tag)?;
        adapter.read_construction(rdr)?;
        let object = adapter.create_live_object(&mut self.graph)?;
        let identity = self.symbols.register_loaded(object);
        log::trace!("materialized identity {} as {:?}", identity.as_u32(), object);
        adapter.read_fields(&mut self.graph, object, rdr)?;

        let slot_count = adapter.reference_slot_names().len();
        let mut reference_slots = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            reference_slots.push(self.materialize(rdr, true)?);
        }

        let mut child_identities = Vec::new();
        if adapter.composite() {
            let count = rdr.read_u32::<LittleEndian>()?;
            for _ in 0..count {
                let raw = self.materialize(rdr, false)?;
                if raw == NULL_IDENTITY {
                    return Err(SceneIoError::FormatError {
                        reason: "null record in a child list",
                    });
                }
                child_identities.push(Identity::from_raw(raw));
            }
        }

        if let Some(frame) = custom {
            if frame.keep_payload {
                let payload = read_blob(rdr)?;
                let entry = self.graph.object_mut(object);
                let base = std::mem::replace(&mut entry.kind, ObjectKind::Group);
                entry.kind = ObjectKind::Custom(CustomNode {
                    type_name: frame.type_name,
                    base: Box::new(base),
                    payload,
                });
            } else {
                let skipped = skip_blob(rdr)?;
                log::trace!("skipped {} payload bytes of \"{}\"", skipped, frame.type_name);
            }
        }

        let capabilities = rdr.read_u32::<LittleEndian>()?;
        let mask = rdr.read_u8()?;
        if mask & !(META_HAS_NAME | META_HAS_USER_DATA) != 0 {
            return Err(SceneIoError::FormatError {
                reason: "unrecognized meta trailer bits",
            });
        }
        let name = if mask & META_HAS_NAME != 0 {
            Some(String::decode(rdr)?)
        } else {
            None
        };
        let user_data = if mask & META_HAS_USER_DATA != 0 {
            Some(UserData::Bytes(read_blob(rdr)?))
        } else {
            None
        };

        let entry = self.graph.object_mut(object);
        entry.capabilities = Capabilities::from_bits_retain(capabilities);
        entry.name = name;
        entry.user_data = user_data;

        self.symbols.complete_materialize(identity, adapter, reference_slots, child_identities);
        Ok(identity)
    }

    /// Phase two. Ascending identity order guarantees a composite runs
    /// before anything it reached first through a reference slot.
    fn wire(&mut self) -> Result<HashMap<ObjectId, u32>, SceneIoError> {
        let mut wire_counts: HashMap<ObjectId, u32> = HashMap::new();
        for index in 0..self.symbols.len() {
            let identity = Identity::from_index(index);
            if self.symbols.is_materialized(identity) {
                continue;
            }
            let (object, reference_slots, child_identities, mut adapter) = self.symbols.begin_wiring(identity);

            let mut targets = Vec::with_capacity(reference_slots.len());
            for raw in &reference_slots {
                targets.push(self.symbols.object_for(*raw)?);
            }
            adapter.resolve_reference_fields(&mut self.graph, object, &targets)?;

            if adapter.composite() {
                let children: Vec<ObjectId> = child_identities
                    .iter()
                    .map(|child| self.symbols.object_of(*child))
                    .collect();
                adapter.wire_children(&mut self.graph, object, &children)?;
                *wire_counts.entry(object).or_insert(0) += 1;
            }

            self.symbols.mark_materialized(identity);
            self.symbols.store_adapter(identity, adapter);
        }
        Ok(wire_counts)
    }
}
