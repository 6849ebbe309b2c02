//! ODBC type interpretation for odbc-mirror.
//!
//! This crate maps driver-reported column types onto the destination's
//! [`StorageType`](mirror_core::StorageType) classes and shapes the text a
//! driver hands back into [`CellValue`](mirror_core::CellValue)s.
//!
//! # Structure
//!
//! - `codes`: ODBC SQL data type codes and their canonical names
//! - `mapping`: `TypeMapper`, the generic mapping and quirk override tables
//! - `convert`: Convert fetched text into cells for a storage class
//!
//! # Example
//!
//! ```rust
//! use mirror_core::{QuirkProfile, SourceType, StorageType};
//! use odbc_types::{codes, TypeMapper};
//!
//! let mapper = TypeMapper::new(QuirkProfile::Generic);
//! let ty = SourceType::named("int identity").with_code(codes::SQL_INTEGER);
//! assert_eq!(mapper.map_type(&ty), StorageType::Integer);
//!
//! // Unknown types never fail; they fall back to TEXT.
//! assert_eq!(mapper.map_type(&SourceType::named("geography")), StorageType::Text);
//! ```

pub mod codes;
pub mod convert;
pub mod mapping;

pub use convert::{bytes_to_cell, text_to_cell, wide_to_cell};
pub use mapping::{normalize_type_name, TypeMapper};
