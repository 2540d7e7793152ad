//! The entity factory: conversion between entity instances and flat
//! property maps, in both directions.
//!
//! `construct` is strict (all-or-nothing: every declared property name must
//! be present); `deconstruct` is best-effort per property (a broken
//! accessor is logged and omitted rather than aborting the whole
//! serialization). An incomplete deconstructed map surfaces later through
//! `construct`'s missing-property check.

mod construct;
mod deconstruct;

pub use construct::construct;
pub use deconstruct::deconstruct;

use crate::schema::PropertyDef;

/// Which of a property's two names keys the source map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMode {
    /// Storage-side column names (database rows).
    Storage,
    /// In-memory field names (request bodies, test maps).
    Field,
}

impl NameMode {
    pub(crate) fn name_of<'a>(&self, property: &'a PropertyDef) -> &'a str {
        match self {
            NameMode::Storage => property.storage_name(),
            NameMode::Field => property.field_name(),
        }
    }
}
