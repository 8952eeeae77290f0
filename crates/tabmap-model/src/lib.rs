//! Tabular data model for source-to-template table mapping.
//!
//! A [`Table`] is an ordered list of named columns of scalar [`CellValue`]s,
//! all of equal length. A [`Row`] is an ordered column-to-value mapping
//! whose equality ignores column order.

#![deny(unsafe_code)]

pub mod cell;
pub mod error;
pub mod row;
pub mod table;

pub use cell::CellValue;
pub use error::{ModelError, Result};
pub use row::Row;
pub use table::{Column, Table};
