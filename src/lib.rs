//! palette-fork - Fork a scene palette with new color ids
//!
//! This library provides functionality to:
//! - Copy every color of a palette into a fresh palette under brand-new,
//!   project-unique identifiers
//! - Index which drawing content references and override modules use each
//!   old identifier, collapsing frames that share the same content
//! - Rewrite every consumer to the new identifiers inside one
//!   undo-transaction, without changing rendered appearance

pub mod allocator;
pub mod cli;
pub mod host;
pub mod models;
pub mod overrides;
pub mod remap;
pub mod rewrite;
pub mod scene;
pub mod usage;
