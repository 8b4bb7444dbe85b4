//! Core domain types

pub mod access;
pub mod identifiers;
