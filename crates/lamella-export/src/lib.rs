//! lamella-export: Pure format serializers (sans-IO)
//!
//! Converts solver output into text formats. Currently supports CSV.
//! All serializers return a `String`; file writing is the caller's
//! concern.

pub mod csv;

pub use csv::{to_boxcount_csv, to_field_csv, to_levels_csv, to_thickness_csv};
