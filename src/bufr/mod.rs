// BUFR/CREX descriptor interpretation.
//
// This module owns descriptor semantics; bit-level value transfer is left to
// `Backend` implementations.
//
// # Modules
//
// - `varcode`: Packed F/X/Y descriptor codes
// - `varinfo`: Variable metadata records
// - `vartable`: Metadata providers (`Vartable` trait, in-memory table)
// - `var`:     Values and attributes
// - `subset`:  Subsets and bulletins
// - `bitmap`:  Data present bitmap resolution
// - `opcodes`: Descriptor program traversal
// - `visitor`: Operator interpreter and the `Backend` trait
// - `binding`: Positional access into a bulletin's subsets
// - `error`:   Error type

pub mod binding;
pub mod bitmap;
pub mod error;
pub mod opcodes;
pub mod subset;
pub mod var;
pub mod varcode;
pub mod varinfo;
pub mod vartable;
pub mod visitor;

// Re-export key types for convenience.
pub use binding::{Binding, BulletinReader, BulletinWriter};
pub use bitmap::Bitmap;
pub use error::{Error, ErrorKind, Result};
pub use opcodes::{OpcodeVisitor, Opcodes};
pub use subset::{Bulletin, Subset};
pub use var::{Value, Var};
pub use varcode::Varcode;
pub use varinfo::{VarFlags, VarInfo, Varinfo};
pub use vartable::{MemoryVartable, Vartable};
pub use visitor::{Backend, ModifierState, Visitor, VisitorOptions};
