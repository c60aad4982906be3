//! The per-type persistence contract. Every persistable kind has one
//! [`StateAdapter`] implementation describing how its records look on the
//! wire; the save/load controllers in [`crate::io`] drive these adapters and
//! never branch on concrete types themselves.
//!
//! A fresh boxed adapter is created per object record and, on load, owned by
//! that record's symbol until the pass ends. Construction parameters are
//! written/read before anything else so the live object can exist before any
//! other record names it; reference slots are recorded as raw identities in
//! phase one and resolved against the symbol table in phase two.

use std::io::{Read, Write};

use crate::SceneIoError;
use crate::graph::{ObjectId, SceneGraph};

pub mod adapters;
pub mod registry;

#[cfg(test)]
mod tests;

/// One reference field on save. The name never reaches the wire, it feeds
/// diagnostics; slot order is fixed per type and shared with the load side
/// through [`StateAdapter::reference_slot_names`].
#[derive(Debug, Clone, Copy)]
pub struct RefField {
    pub name: &'static str,
    pub target: Option<ObjectId>,
}

pub trait StateAdapter {
    fn type_name(&self) -> &'static str;

    /// Composite types own a child list on the wire.
    fn composite(&self) -> bool {
        false
    }

    /// Slot names in wire order. Both passes derive the reference block
    /// length from this list.
    fn reference_slot_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn write_construction(
        &mut self,
        _graph: &SceneGraph,
        _id: ObjectId,
        _wtr: &mut dyn Write,
    ) -> Result<(), SceneIoError> {
        Ok(())
    }

    fn write_fields(&mut self, _graph: &SceneGraph, _id: ObjectId, _wtr: &mut dyn Write) -> Result<(), SceneIoError> {
        Ok(())
    }

    /// Must align with [`Self::reference_slot_names`] and must not touch the
    /// symbol table; registration happens when the controller reaches each
    /// target.
    fn collect_reference_fields(&self, _graph: &SceneGraph, _id: ObjectId) -> Vec<RefField> {
        Vec::new()
    }

    fn read_construction(&mut self, _rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        Ok(())
    }

    /// Runs after `read_construction`; the returned object is registered in
    /// the symbol table before any further record can reference it.
    fn create_live_object(&mut self, graph: &mut SceneGraph) -> Result<ObjectId, SceneIoError>;

    fn read_fields(&mut self, _graph: &mut SceneGraph, _id: ObjectId, _rdr: &mut dyn Read) -> Result<(), SceneIoError> {
        Ok(())
    }

    /// Phase two. `targets` holds one resolved entry per declared slot, in
    /// slot order; implementations validate referent kinds and assign.
    fn resolve_reference_fields(
        &mut self,
        _graph: &mut SceneGraph,
        _id: ObjectId,
        _targets: &[Option<ObjectId>],
    ) -> Result<(), SceneIoError> {
        Ok(())
    }

    /// Phase two, composites only. Children are fully constructed by the
    /// time this runs.
    fn wire_children(&mut self, graph: &mut SceneGraph, id: ObjectId, children: &[ObjectId]) -> Result<(), SceneIoError> {
        for &child in children {
            graph.attach(id, child)?;
        }
        Ok(())
    }
}
