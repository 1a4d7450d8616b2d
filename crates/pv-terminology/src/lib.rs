#![deny(unsafe_code)]

pub mod csv_utils;
pub mod error;
pub mod loaders;
pub mod rrf;

pub use crate::error::TerminologyError;
pub use crate::loaders::{
    Loaded, load_concepts, load_cross_reference_index, load_cross_references,
    load_manual_overrides, load_relations, load_terminology,
};
