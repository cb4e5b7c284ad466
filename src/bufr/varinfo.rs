// Variable metadata records (B table entries).

use std::sync::Arc;

use bitflags::bitflags;

use super::varcode::Varcode;

bitflags! {
    /// Value kind flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct VarFlags: u8 {
        /// Character data; `len` counts characters.
        const STRING = 1 << 0;
    }
}

/// Decoding metadata for one descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarInfo {
    pub code: Varcode,
    pub desc: String,
    pub unit: String,
    /// Decimal scale factor.
    pub scale: i32,
    /// Reference value added to the encoded integer.
    pub ref_val: i32,
    /// Length in decimal digits, or characters for strings.
    pub len: u32,
    /// Length in bits.
    pub bit_len: u32,
    pub flags: VarFlags,
}

/// Shared metadata handle, as stored in variables.
pub type Varinfo = Arc<VarInfo>;

impl VarInfo {
    /// Numeric entry with `len` derived from `bit_len`.
    pub fn numeric(
        code: Varcode,
        desc: impl Into<String>,
        unit: impl Into<String>,
        scale: i32,
        ref_val: i32,
        bit_len: u32,
    ) -> Self {
        Self {
            code,
            desc: desc.into(),
            unit: unit.into(),
            scale,
            ref_val,
            len: decimal_digits(bit_len),
            bit_len,
            flags: VarFlags::empty(),
        }
    }

    /// Character entry of `chars` characters.
    pub fn string(code: Varcode, desc: impl Into<String>, chars: u32) -> Self {
        Self {
            code,
            desc: desc.into(),
            unit: "CCITTIA5".into(),
            scale: 0,
            ref_val: 0,
            len: chars,
            bit_len: chars * 8,
            flags: VarFlags::STRING,
        }
    }

    pub fn is_string(&self) -> bool {
        self.flags.contains(VarFlags::STRING)
    }

    /// Copy of this record with scale and bit length replaced.
    ///
    /// String records keep a character length in step with the new bit
    /// length; numeric records recompute their decimal digit count.
    pub fn altered(&self, scale: i32, bit_len: u32) -> Self {
        let mut res = self.clone();
        res.scale = scale;
        res.bit_len = bit_len;
        res.len = if res.is_string() {
            bit_len.div_ceil(8)
        } else {
            decimal_digits(bit_len)
        };
        res
    }
}

/// Minimum number of decimal digits able to hold any `bits`-bit value:
/// `ceil(log10(2^bits))`.
pub fn decimal_digits(bits: u32) -> u32 {
    (f64::from(bits) * std::f64::consts::LOG10_2).ceil() as u32
}
