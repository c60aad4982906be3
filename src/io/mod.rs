//! Stream persistence for scene graphs. Everything is little-endian and
//! fixed-width; strings carry a u16 byte length, blobs a u32 one.
//!
//! ```text
//! stream   := header record footer
//! header   := "SGIO" version:u16 flags:u16
//! footer   := "SEND" symbol_count:u32
//! record   := 0x00 inline | 0x01 identity:u32          (identity 0 = null)
//! inline   := tag:u16 [custom_frame] construction fields
//!             record*              one per declared reference slot
//!             [count:u32 record*]  composites only
//!             [payload_blob]       custom records only
//!             capabilities:u32 meta:u8 [name] [user_blob]
//! custom_frame := type_name ancestor_tag:u16
//! ```
//!
//! Inline records mint identities densely from 1 in the order they appear,
//! so the wire never spells an identity out except in back-references.

pub mod reader;
pub mod symbols;
pub mod types;
pub mod writer;
