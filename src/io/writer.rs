//! The save pass. Starting from the chosen root, the writer walks the
//! graph depth-first and emits one inline record per reachable object, in
//! the order objects are first reached; every later mention of the same
//! object becomes a back-reference to the identity minted for it. Reference
//! fields are followed just like children, so a shared component or unit is
//! serialized exactly once no matter how many owners it has.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::SceneIoError;
use crate::common::codec::{Streamable, write_blob};
use crate::graph::types::{ObjectKind, UserData};
use crate::graph::{ObjectId, SceneError, SceneGraph};
use crate::io::symbols::{Identity, SymbolSummary, SymbolTable};
use crate::io::types::{
    FOURCC_SCENE_END, MARKER_BACK_REFERENCE, MARKER_INLINE, META_HAS_NAME, META_HAS_USER_DATA, NULL_IDENTITY,
    StreamHeader,
};
use crate::state::registry::{TypeRegistry, TypeTag};

#[derive(Debug, Clone)]
pub struct WriteSummary {
    /// Inline records emitted, which equals the number of minted symbols.
    pub records: u32,
    pub back_references: u32,
    pub null_references: u32,
    pub bytes_written: u64,
    pub symbols: SymbolSummary,
}

pub(crate) struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub(crate) fn new(inner: W) -> CountingWriter<W> {
        CountingWriter { inner, written: 0 }
    }

    pub(crate) fn bytes_written(&self) -> u64 {
        self.written
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

pub struct SceneWriter<'a> {
    graph: &'a SceneGraph,
    registry: &'a TypeRegistry,
    symbols: SymbolTable,
    back_references: u32,
    null_references: u32,
}

impl<'a> SceneWriter<'a> {
    /// Streams the subgraph reachable from `root`. The root must be a node;
    /// components only enter a stream through the reference fields of their
    /// owners.
    pub fn write_scene<W: Write>(
        wtr: &mut W,
        graph: &SceneGraph,
        root: ObjectId,
        registry: &TypeRegistry,
    ) -> Result<WriteSummary, SceneIoError> {
        if graph.object(root).kind.is_component() {
            return Err(SceneError::ComponentRoot.into());
        }

        let mut counting = CountingWriter::new(wtr);
        let mut writer = SceneWriter {
            graph,
            registry,
            symbols: SymbolTable::new(),
            back_references: 0,
            null_references: 0,
        };

        StreamHeader::current().write(&mut counting)?;
        writer.discover(&mut counting, Some(root), false)?;
        counting.write_u32::<LittleEndian>(FOURCC_SCENE_END)?;
        counting.write_u32::<LittleEndian>(writer.symbols.len() as u32)?;
        counting.flush()?;

        log::debug!(
            "wrote {} records ({} back-references) in {} bytes",
            writer.symbols.len(),
            writer.back_references,
            counting.bytes_written()
        );

        Ok(WriteSummary {
            records: writer.symbols.len() as u32,
            back_references: writer.back_references,
            null_references: writer.null_references,
            bytes_written: counting.bytes_written(),
            symbols: writer.symbols.into_summary(),
        })
    }

    /// One mention of `target`: a null sentinel, a back-reference to an
    /// already-minted identity, or a fresh inline record. Reference-field
    /// mentions bump the target's count; child and root mentions do not.
    fn discover(
        &mut self,
        wtr: &mut dyn Write,
        target: Option<ObjectId>,
        is_field_mention: bool,
    ) -> Result<(), SceneIoError> {
        let Some(object) = target else {
            wtr.write_u8(MARKER_BACK_REFERENCE)?;
            wtr.write_u32::<LittleEndian>(NULL_IDENTITY)?;
            self.null_references += 1;
            return Ok(());
        };

        if let Some(identity) = self.symbols.lookup(object) {
            wtr.write_u8(MARKER_BACK_REFERENCE)?;
            wtr.write_u32::<LittleEndian>(identity.as_u32())?;
            self.back_references += 1;
            if is_field_mention {
                self.symbols.increment_reference_count(identity);
            }
            return Ok(());
        }

        let identity = self.symbols.identity_of(object);
        if is_field_mention {
            self.symbols.increment_reference_count(identity);
        }
        self.describe(wtr, object, identity)
    }

    fn describe(&mut self, wtr: &mut dyn Write, object: ObjectId, identity: Identity) -> Result<(), SceneIoError> {
        let graph = self.graph;
        let entry = graph.object(object);
        log::trace!("describing {:?} as identity {}", object, identity.as_u32());

        wtr.write_u8(MARKER_INLINE)?;
        let mut adapter = match &entry.kind {
            ObjectKind::Custom(custom) => {
                if matches!(custom.base.as_ref(), ObjectKind::Custom(_)) {
                    return Err(SceneIoError::UnsupportedEncoding {
                        type_name: "Custom",
                        reason: "nested subtype wrappers have no wire form",
                    });
                }
                wtr.write_u16::<LittleEndian>(TypeTag::Custom.into())?;
                custom.type_name.encode(wtr)?;
                let ancestor = self.registry.identify(custom.base.body());
                wtr.write_u16::<LittleEndian>(ancestor.into())?;
                self.registry.adapter_for_tag(ancestor)?
            }
            kind => {
                let tag = self.registry.identify(kind);
                wtr.write_u16::<LittleEndian>(tag.into())?;
                self.registry.adapter_for_tag(tag)?
            }
        };

        adapter.write_construction(graph, object, wtr)?;
        adapter.write_fields(graph, object, wtr)?;

        let slots = adapter.collect_reference_fields(graph, object);
        debug_assert_eq!(slots.len(), adapter.reference_slot_names().len());
        for slot in &slots {
            log::trace!("following reference slot {} of {:?}", slot.name, object);
            self.discover(wtr, slot.target, true)?;
        }

        if adapter.composite() {
            let children = graph.children(object);
            wtr.write_u32::<LittleEndian>(children.len() as u32)?;
            for &child in children {
                self.discover(wtr, Some(child), false)?;
            }
        }

        if let ObjectKind::Custom(custom) = &entry.kind {
            write_blob(wtr, &custom.payload)?;
        }

        wtr.write_u32::<LittleEndian>(entry.capabilities.bits())?;

        let user_bytes = match &entry.user_data {
            Some(UserData::Bytes(bytes)) => Some(bytes),
            Some(UserData::Runtime(_)) => {
                log::warn!("dropping runtime-only user data held by {:?}", object);
                None
            }
            None => None,
        };
        let mut mask = 0u8;
        if entry.name.is_some() {
            mask |= META_HAS_NAME;
        }
        if user_bytes.is_some() {
            mask |= META_HAS_USER_DATA;
        }
        wtr.write_u8(mask)?;
        if let Some(name) = entry.name.as_ref() {
            name.encode(wtr)?;
        }
        if let Some(bytes) = user_bytes {
            write_blob(wtr, bytes)?;
        }

        self.symbols.store_adapter(identity, adapter);
        Ok(())
    }
}
