//! Utilities for Schemer
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{
    apply_naming_convention, generate_unique_name, get_table_name, resolver_from_config,
    CapitalizeConvention, ForeignKeyResolver, PascalCaseConvention, PatternConvention,
};
