// Data present bitmaps.
//
// A bitmap marks which of the plain variables preceding its anchor are
// "present". Each `+` bit becomes a reference to a subset position; later
// quality attributes and substituted values consume those references in bit
// order.
//
// Anchoring: bitmaps nominally refer to the data preceding the operator that
// defines them, but observed bulletins with several bitmaps always refer to
// the same block of variables. The first anchor seen in a subset is kept and
// reused for every later bitmap in that subset.

use log::trace;

use super::error::{Error, Result};
use super::var::Var;

/// Resolves a bitmap variable into subset positions.
#[derive(Debug, Default)]
pub struct Bitmap {
    /// Subset position of the bitmap variable, once one is active.
    source: Option<usize>,
    /// First anchor seen in this subset.
    old_anchor: Option<usize>,
    /// Referenced positions, in bit order.
    refs: Vec<usize>,
    /// Next reference to hand out.
    cursor: usize,
}

impl Bitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, including the sticky anchor.
    pub fn reset(&mut self) {
        self.source = None;
        self.old_anchor = None;
        self.refs.clear();
        self.cursor = 0;
    }

    /// Activate `bitmap` (found at `source_pos` in `subset`), anchored at
    /// `anchor` unless an earlier bitmap in this subset already fixed the
    /// anchor.
    ///
    /// The bit count is the decimal length of the bitmap's metadata. Bits
    /// pair with plain (F=0) variables walking backwards from the anchor;
    /// positions holding operator-class values are skipped.
    pub fn init(
        &mut self,
        bitmap: &Var,
        subset: &[Var],
        source_pos: usize,
        anchor: usize,
    ) -> Result<()> {
        self.source = Some(source_pos);
        self.refs.clear();
        self.cursor = 0;

        let anchor = match self.old_anchor {
            Some(old) => old,
            None => {
                if anchor != 0 {
                    self.old_anchor = Some(anchor);
                }
                anchor
            }
        };

        let mut b_cur = bitmap.info().len as usize;
        let mut s_cur = anchor;
        if b_cur == 0 {
            return Err(Error::EmptyBitmap);
        }
        if s_cur == 0 {
            return Err(Error::BitmapAtSubsetStart);
        }
        if s_cur > subset.len() {
            return Err(Error::MalformedProgram(format!(
                "bitmap anchor {anchor} is past the end of a subset of {} variables",
                subset.len()
            )));
        }

        let bits = bitmap.enqc().unwrap_or_default();
        let bits = bits.as_bytes();

        loop {
            b_cur -= 1;
            s_cur -= 1;
            while !subset[s_cur].code().is_plain() {
                if s_cur == 0 {
                    return Err(Error::BitmapBeforeSubsetStart);
                }
                s_cur -= 1;
            }

            if bits.get(b_cur) == Some(&b'+') {
                self.refs.push(s_cur);
            }

            if b_cur == 0 {
                break;
            }
            if s_cur == 0 {
                return Err(Error::BitmapBeforeSubsetStart);
            }
        }

        // Collected last bit first.
        self.refs.reverse();
        trace!(
            "bitmap at {source_pos} anchored at {anchor}: {} references",
            self.refs.len()
        );
        Ok(())
    }

    /// Whether a bitmap has been initialised since the last reset.
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Subset position of the active bitmap variable.
    pub fn source(&self) -> Option<usize> {
        self.source
    }

    /// Anchor in effect for this subset.
    pub fn anchor(&self) -> Option<usize> {
        self.old_anchor
    }

    /// End of bitmap: all references consumed (or none active).
    pub fn eob(&self) -> bool {
        self.cursor >= self.refs.len()
    }

    /// Next referenced position, or `None` at end of bitmap.
    pub fn next(&mut self) -> Option<usize> {
        let res = self.refs.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(res)
    }

    /// References not yet consumed.
    pub fn remaining(&self) -> &[usize] {
        &self.refs[self.cursor.min(self.refs.len())..]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bufr::varcode::Varcode;
    use crate::bufr::varinfo::{VarFlags, VarInfo, Varinfo};

    fn plain() -> Varinfo {
        Arc::new(VarInfo::numeric(Varcode::new(0, 12, 101), "T", "K", 2, 0, 16))
    }

    fn op_var() -> Var {
        let info = Arc::new(VarInfo {
            code: Varcode::new(2, 22, 0),
            desc: "OP".into(),
            unit: "".into(),
            scale: 0,
            ref_val: 0,
            len: 1,
            bit_len: 1,
            flags: VarFlags::STRING,
        });
        Var::with_str(info, "+")
    }

    fn bitmap_var(bits: &str) -> Var {
        let info = Arc::new(VarInfo {
            code: Varcode::new(2, 22, 0),
            desc: "DATA PRESENT BITMAP".into(),
            unit: "".into(),
            scale: 0,
            ref_val: 0,
            len: bits.len() as u32,
            bit_len: bits.len() as u32,
            flags: VarFlags::STRING,
        });
        Var::with_str(info, bits)
    }

    fn plain_vars(n: usize) -> Vec<Var> {
        (0..n).map(|i| Var::with_int(plain(), i as i32)).collect()
    }

    fn drain(b: &mut Bitmap) -> Vec<usize> {
        std::iter::from_fn(|| b.next()).collect()
    }

    #[test]
    fn present_bits_in_bit_order() {
        let subset = plain_vars(4);
        let mut b = Bitmap::new();
        b.init(&bitmap_var("+--+"), &subset, 4, 4).unwrap();
        assert!(b.is_active());
        assert!(!b.eob());
        assert_eq!(drain(&mut b), vec![0, 3]);
        assert!(b.eob());
        assert_eq!(b.next(), None);
    }

    #[test]
    fn bits_cover_the_nearest_preceding_vars() {
        let subset = plain_vars(5);
        let mut b = Bitmap::new();
        b.init(&bitmap_var("++"), &subset, 5, 5).unwrap();
        assert_eq!(drain(&mut b), vec![3, 4]);
    }

    #[test]
    fn operator_positions_are_skipped() {
        let mut subset = plain_vars(2);
        subset.insert(1, op_var());
        // subset: [plain 0][op][plain 1]
        let mut b = Bitmap::new();
        b.init(&bitmap_var("++"), &subset, 3, 3).unwrap();
        assert_eq!(drain(&mut b), vec![0, 2]);
    }

    #[test]
    fn empty_bitmap_fails() {
        let subset = plain_vars(3);
        let mut b = Bitmap::new();
        let err = b.init(&bitmap_var(""), &subset, 3, 3).unwrap_err();
        assert!(matches!(err, Error::EmptyBitmap));
    }

    #[test]
    fn anchor_at_start_fails() {
        let subset = plain_vars(3);
        let mut b = Bitmap::new();
        let err = b.init(&bitmap_var("+"), &subset, 0, 0).unwrap_err();
        assert!(matches!(err, Error::BitmapAtSubsetStart));
    }

    #[test]
    fn walk_before_subset_start_fails() {
        let subset = plain_vars(2);
        let mut b = Bitmap::new();
        let err = b.init(&bitmap_var("+++"), &subset, 2, 2).unwrap_err();
        assert!(matches!(err, Error::BitmapBeforeSubsetStart));

        // Only operator values left while skipping.
        let subset = vec![op_var(), Var::with_int(plain(), 1)];
        let mut b = Bitmap::new();
        let err = b.init(&bitmap_var("++"), &subset, 2, 2).unwrap_err();
        assert!(matches!(err, Error::BitmapBeforeSubsetStart));
    }

    #[test]
    fn first_anchor_sticks() {
        let subset = plain_vars(6);
        let mut b = Bitmap::new();
        b.init(&bitmap_var("+-"), &subset, 3, 3).unwrap();
        assert_eq!(b.anchor(), Some(3));
        assert_eq!(drain(&mut b), vec![1]);

        b.init(&bitmap_var("-+"), &subset, 5, 6).unwrap();
        assert_eq!(b.anchor(), Some(3));
        assert_eq!(drain(&mut b), vec![2]);

        b.reset();
        assert!(!b.is_active());
        assert_eq!(b.anchor(), None);
        b.init(&bitmap_var("-+"), &subset, 5, 6).unwrap();
        assert_eq!(drain(&mut b), vec![5]);
    }

    #[test]
    fn inactive_bitmap_is_at_end() {
        let b = Bitmap::new();
        assert!(b.eob());
        assert!(!b.is_active());
        assert!(b.remaining().is_empty());
    }
}
