// Variable metadata providers.
//
// The interpreter only needs four things from a B table: plain lookups,
// lookups with scale/width overrides applied, membership tests (for local
// descriptors), and the ability to mint a throwaway record.

use std::collections::HashMap;
use std::sync::Arc;

use super::error::{Error, Result};
use super::varcode::{self, Varcode};
use super::varinfo::{VarFlags, VarInfo, Varinfo};

// ---------------------------------------------------------------------------
// Vartable trait
// ---------------------------------------------------------------------------

/// Source of variable metadata.
pub trait Vartable {
    /// Metadata for `code`.
    fn query(&self, code: Varcode) -> Result<Varinfo>;

    /// Metadata for `code` with scale and bit length overridden.
    ///
    /// The returned record is derived on demand; nothing is stored in the
    /// table.
    fn query_altered(&self, code: Varcode, scale: i32, bit_len: u32) -> Result<Varinfo> {
        let base = self.query(code)?;
        if base.scale == scale && base.bit_len == bit_len {
            return Ok(base);
        }
        Ok(Arc::new(base.altered(scale, bit_len)))
    }

    /// Whether `code` has an entry.
    fn contains(&self, code: Varcode) -> bool;

    /// Mint a record that is not part of the table.
    ///
    /// The caller owns the result; it lives only as long as the values built
    /// from it.
    #[allow(clippy::too_many_arguments)]
    fn create_singleuse(
        &self,
        code: Varcode,
        desc: &str,
        unit: &str,
        scale: i32,
        ref_val: i32,
        len: u32,
        bit_len: u32,
        flags: VarFlags,
    ) -> Varinfo {
        Arc::new(VarInfo {
            code,
            desc: desc.to_owned(),
            unit: unit.to_owned(),
            scale,
            ref_val,
            len,
            bit_len,
            flags,
        })
    }
}

impl<T: Vartable + ?Sized> Vartable for &T {
    fn query(&self, code: Varcode) -> Result<Varinfo> {
        (**self).query(code)
    }

    fn query_altered(&self, code: Varcode, scale: i32, bit_len: u32) -> Result<Varinfo> {
        (**self).query_altered(code, scale, bit_len)
    }

    fn contains(&self, code: Varcode) -> bool {
        (**self).contains(code)
    }

    #[allow(clippy::too_many_arguments)]
    fn create_singleuse(
        &self,
        code: Varcode,
        desc: &str,
        unit: &str,
        scale: i32,
        ref_val: i32,
        len: u32,
        bit_len: u32,
        flags: VarFlags,
    ) -> Varinfo {
        (**self).create_singleuse(code, desc, unit, scale, ref_val, len, bit_len, flags)
    }
}

// ---------------------------------------------------------------------------
// In-memory table
// ---------------------------------------------------------------------------

/// HashMap-backed table.
#[derive(Debug, Clone, Default)]
pub struct MemoryVartable {
    entries: HashMap<Varcode, Varinfo>,
}

impl MemoryVartable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with the class 31 and 33 entries the interpreter
    /// itself relies on, plus a handful of common station/observation
    /// entries.
    pub fn builtin() -> Self {
        let mut t = Self::new();
        let numeric = [
            (varcode::B31000, "SHORT DELAYED DESCRIPTOR REPLICATION FACTOR", "NUMERIC", 0, 1),
            (varcode::B31001, "DELAYED DESCRIPTOR REPLICATION FACTOR", "NUMERIC", 0, 8),
            (varcode::B31002, "EXTENDED DELAYED DESCRIPTOR REPLICATION FACTOR", "NUMERIC", 0, 16),
            (varcode::B31011, "DELAYED DESCRIPTOR AND DATA REPETITION FACTOR", "NUMERIC", 0, 8),
            (varcode::B31012, "EXTENDED DELAYED DESCRIPTOR AND DATA REPETITION FACTOR", "NUMERIC", 0, 16),
            (varcode::B31021, "ASSOCIATED FIELD SIGNIFICANCE", "CODE TABLE", 0, 6),
            (varcode::B31031, "DATA PRESENT INDICATOR", "FLAG TABLE", 0, 1),
            (varcode::B33007, "PER CENT CONFIDENCE", "%", 0, 7),
            (Varcode::new(0, 1, 1), "WMO BLOCK NUMBER", "NUMERIC", 0, 7),
            (Varcode::new(0, 1, 2), "WMO STATION NUMBER", "NUMERIC", 0, 10),
            (Varcode::new(0, 10, 4), "PRESSURE", "PA", -1, 14),
            (Varcode::new(0, 12, 101), "TEMPERATURE/AIR TEMPERATURE", "K", 2, 16),
            (Varcode::new(0, 12, 103), "DEWPOINT TEMPERATURE", "K", 2, 16),
        ];
        for (code, desc, unit, scale, bits) in numeric {
            t.insert(VarInfo::numeric(code, desc, unit, scale, 0, bits));
        }
        t.insert(VarInfo::string(Varcode::new(0, 1, 15), "STATION OR SITE NAME", 20));
        t
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, info: VarInfo) {
        self.entries.insert(info.code, Arc::new(info));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by code.
    pub fn entries(&self) -> Vec<Varinfo> {
        let mut v: Vec<Varinfo> = self.entries.values().cloned().collect();
        v.sort_by_key(|i| i.code);
        v
    }
}

impl Extend<VarInfo> for MemoryVartable {
    fn extend<I: IntoIterator<Item = VarInfo>>(&mut self, iter: I) {
        for info in iter {
            self.insert(info);
        }
    }
}

impl Vartable for MemoryVartable {
    fn query(&self, code: Varcode) -> Result<Varinfo> {
        self.entries
            .get(&code)
            .cloned()
            .ok_or(Error::UnknownVarcode(code))
    }

    fn contains(&self, code: Varcode) -> bool {
        self.entries.contains_key(&code)
    }
}
