//! Oxibufr: a BUFR/CREX descriptor program interpreter in Rust.
//!
//! The crate provides:
//! - Descriptor codes, variable metadata, values and bulletins (`bufr`)
//! - The operator interpreter shared by encoders and decoders (`bufr::visitor`)
//! - Data present bitmap resolution (`bufr::bitmap`)
//! - Read-only backends that validate and print bulletins (`backend`)
//! - JSON loaders for tables and bulletins (`io`, `json` feature)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use oxibufr::bufr::{Bulletin, MemoryVartable, Var, Varcode, Vartable};
//!
//! let table = MemoryVartable::builtin();
//! let station = Varcode::new(0, 1, 1);
//! let count = Varcode::new(0, 31, 1);
//! let temp = Varcode::new(0, 12, 101);
//!
//! // Station number, then a delayed replication of temperatures.
//! let mut bulletin = Bulletin::new(vec![station, Varcode::new(1, 1, 0), count, temp]);
//! let subset = bulletin.obtain_subset();
//! subset.store_variable(Var::with_int(table.query(station).unwrap(), 16));
//! subset.store_variable(Var::with_int(table.query(count).unwrap(), 2));
//! subset.store_variable(Var::with_int(table.query(temp).unwrap(), 27315));
//! subset.store_variable(Var::with_int(table.query(temp).unwrap(), 27415));
//!
//! bulletin.validate(&table).unwrap();
//! ```

pub mod backend;
pub mod bufr;

#[cfg(feature = "json")]
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;
