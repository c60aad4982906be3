//! The symbol table: the bridge between live [`ObjectId`]s and the stable
//! integer identities a stream speaks in. One table exists per pass and is
//! discarded with it; identities are only meaningful inside the stream that
//! minted them.

use std::collections::HashMap;

use crate::SceneIoError;
use crate::graph::ObjectId;
use crate::io::types::NULL_IDENTITY;
use crate::state::StateAdapter;

/// Stream-scoped identity. Minted densely starting at 1, in the order
/// inline records are emitted (save) or encountered (load); raw value 0 is
/// the null sentinel and never owns a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(u32);

impl Identity {
    pub(crate) fn from_index(index: usize) -> Identity {
        Identity(index as u32 + 1)
    }

    /// Caller guarantees `raw` is non-null and already validated.
    pub(crate) fn from_raw(raw: u32) -> Identity {
        Identity(raw)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

pub(crate) struct Symbol {
    pub(crate) object: ObjectId,
    pub(crate) reference_count: u32,
    pub(crate) materialized: bool,
    pub(crate) adapter: Option<Box<dyn StateAdapter>>,
    /// Raw identities read from the record's reference block, in slot order.
    pub(crate) reference_slots: Vec<u32>,
    pub(crate) child_identities: Vec<Identity>,
}

impl Symbol {
    fn new(object: ObjectId) -> Symbol {
        Symbol {
            object,
            reference_count: 0,
            materialized: false,
            adapter: None,
            reference_slots: Vec::new(),
            child_identities: Vec::new(),
        }
    }
}

pub(crate) struct SymbolTable {
    symbols: Vec<Symbol>,
    identities: HashMap<ObjectId, Identity>,
}

impl SymbolTable {
    pub(crate) fn new() -> SymbolTable {
        SymbolTable {
            symbols: Vec::new(),
            identities: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.symbols.len()
    }

    pub(crate) fn lookup(&self, object: ObjectId) -> Option<Identity> {
        self.identities.get(&object).copied()
    }

    /// Save side: returns the existing identity for `object` or mints the
    /// next one.
    pub(crate) fn identity_of(&mut self, object: ObjectId) -> Identity {
        if let Some(existing) = self.lookup(object) {
            return existing;
        }
        let identity = Identity::from_index(self.symbols.len());
        self.symbols.push(Symbol::new(object));
        self.identities.insert(object, identity);
        identity
    }

    /// Load side: registers a freshly constructed object under the identity
    /// implied by stream order.
    pub(crate) fn register_loaded(&mut self, object: ObjectId) -> Identity {
        let identity = Identity::from_index(self.symbols.len());
        self.symbols.push(Symbol::new(object));
        self.identities.insert(object, identity);
        identity
    }

    /// Resolves a raw stream identity. Null maps to `None`; anything beyond
    /// what has been minted so far is a corrupt stream.
    pub(crate) fn object_for(&self, raw: u32) -> Result<Option<ObjectId>, SceneIoError> {
        if raw == NULL_IDENTITY {
            return Ok(None);
        }
        self.symbols
            .get((raw - 1) as usize)
            .map(|symbol| Some(symbol.object))
            .ok_or(SceneIoError::UnknownIdentity { identity: raw })
    }

    pub(crate) fn object_of(&self, identity: Identity) -> ObjectId {
        self.symbol(identity).object
    }

    pub(crate) fn increment_reference_count(&mut self, identity: Identity) {
        self.symbol_mut(identity).reference_count += 1;
    }

    pub(crate) fn reference_count(&self, identity: Identity) -> u32 {
        self.symbol(identity).reference_count
    }

    pub(crate) fn is_materialized(&self, identity: Identity) -> bool {
        self.symbol(identity).materialized
    }

    pub(crate) fn mark_materialized(&mut self, identity: Identity) {
        self.symbol_mut(identity).materialized = true;
    }

    pub(crate) fn store_adapter(&mut self, identity: Identity, adapter: Box<dyn StateAdapter>) {
        self.symbol_mut(identity).adapter = Some(adapter);
    }

    /// Load side: parks everything phase two will need on the symbol.
    pub(crate) fn complete_materialize(
        &mut self,
        identity: Identity,
        adapter: Box<dyn StateAdapter>,
        reference_slots: Vec<u32>,
        child_identities: Vec<Identity>,
    ) {
        let symbol = self.symbol_mut(identity);
        symbol.adapter = Some(adapter);
        symbol.reference_slots = reference_slots;
        symbol.child_identities = child_identities;
    }

    /// Hands the wiring pass ownership of the symbol's deferred state. The
    /// adapter goes back via [`Self::store_adapter`] once the symbol is done.
    pub(crate) fn begin_wiring(&mut self, identity: Identity) -> (ObjectId, Vec<u32>, Vec<Identity>, Box<dyn StateAdapter>) {
        let symbol = self.symbol_mut(identity);
        let adapter = symbol
            .adapter
            .take()
            .expect("SymbolTable invariant violated: wiring a symbol without an adapter");
        (
            symbol.object,
            std::mem::take(&mut symbol.reference_slots),
            std::mem::take(&mut symbol.child_identities),
            adapter,
        )
    }

    fn symbol(&self, identity: Identity) -> &Symbol {
        self.symbols
            .get(identity.index())
            .expect("SymbolTable invariant violated: identity out of bounds")
    }

    fn symbol_mut(&mut self, identity: Identity) -> &mut Symbol {
        self.symbols
            .get_mut(identity.index())
            .expect("SymbolTable invariant violated: identity out of bounds")
    }

    /// Drops the adapters and keeps the countable facts.
    pub(crate) fn into_summary(self) -> SymbolSummary {
        let entries = (0..self.symbols.len())
            .map(|index| {
                let identity = Identity::from_index(index);
                SymbolEntry {
                    identity,
                    object: self.object_of(identity),
                    reference_count: self.reference_count(identity),
                }
            })
            .collect();
        SymbolSummary {
            entries,
            identities: self.identities,
        }
    }
}

/// What outlives a pass: the identity each object was streamed under and
/// how often reference fields named it. Child containment and the stream
/// root do not count as references.
#[derive(Debug, Clone)]
pub struct SymbolSummary {
    entries: Vec<SymbolEntry>,
    identities: HashMap<ObjectId, Identity>,
}

#[derive(Debug, Clone, Copy)]
pub struct SymbolEntry {
    pub identity: Identity,
    pub object: ObjectId,
    pub reference_count: u32,
}

impl SymbolSummary {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending identity order.
    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn identity_of(&self, object: ObjectId) -> Option<Identity> {
        self.identities.get(&object).copied()
    }

    pub fn reference_count(&self, object: ObjectId) -> u32 {
        self.identity_of(object)
            .map(|identity| self.entries[identity.index()].reference_count)
            .unwrap_or(0)
    }
}
