// Positional access into a bulletin's subsets.
//
// `Binding` tracks the active subset and a cursor over its variables. It is
// generic over how the bulletin is held: `&Bulletin` for backends that only
// read values (encoders, validators, printers), `&mut Bulletin` for backends
// that fill them in (decoders). Bounds checks are shared by both.

use std::borrow::{Borrow, BorrowMut};

use super::error::{Error, Result};
use super::subset::Bulletin;
use super::var::Var;

/// Cursor over the subsets of a bulletin.
#[derive(Debug)]
pub struct Binding<B> {
    bulletin: B,
    subset_no: usize,
    current_var: usize,
}

/// Read-only binding.
pub type BulletinReader<'a> = Binding<&'a Bulletin>;

/// Binding that may modify subset contents.
pub type BulletinWriter<'a> = Binding<&'a mut Bulletin>;

impl<B: Borrow<Bulletin>> Binding<B> {
    pub fn new(bulletin: B) -> Self {
        Self {
            bulletin,
            subset_no: 0,
            current_var: 0,
        }
    }

    pub fn bulletin(&self) -> &Bulletin {
        self.bulletin.borrow()
    }

    pub fn into_inner(self) -> B {
        self.bulletin
    }

    /// Index of the active subset.
    pub fn subset_no(&self) -> usize {
        self.subset_no
    }

    /// Position of the next variable `get_var` will return.
    pub fn cursor(&self) -> usize {
        self.current_var
    }

    /// Variables of the active subset; empty if the bulletin has none.
    pub fn current_subset(&self) -> &[Var] {
        self.bulletin()
            .subsets
            .get(self.subset_no)
            .map_or(&[][..], |s| s.as_slice())
    }

    fn check_pos(&self, pos: usize) -> Result<()> {
        let max = self.current_subset().len();
        if pos >= max {
            return Err(Error::VarOutOfRange {
                pos,
                max,
                subset: self.subset_no,
            });
        }
        Ok(())
    }

    /// Variable at `pos` in the active subset.
    pub fn var_at(&self, pos: usize) -> Result<&Var> {
        self.check_pos(pos)?;
        Ok(&self.current_subset()[pos])
    }

    /// Variable at the cursor; advances the cursor.
    pub fn get_var(&mut self) -> Result<&Var> {
        let pos = self.current_var;
        self.check_pos(pos)?;
        self.current_var += 1;
        Ok(&self.current_subset()[pos])
    }

    /// Make `subset_no` the active subset and rewind the cursor.
    pub fn start_subset(&mut self, subset_no: usize) -> Result<()> {
        let max = self.bulletin().subsets.len();
        if subset_no >= max {
            return Err(Error::SubsetOutOfRange {
                subset: subset_no,
                max,
            });
        }
        self.subset_no = subset_no;
        self.current_var = 0;
        Ok(())
    }

    /// Take the variable at the cursor as a data present bitmap and return
    /// its position. Only operator-class (F=2) variables qualify.
    pub fn bitmap_source(&mut self) -> Result<usize> {
        let pos = self.current_var;
        let code = self.get_var()?.code();
        if code.f() != 2 {
            return Err(Error::NotABitmap { pos, code });
        }
        Ok(pos)
    }
}

impl<B: BorrowMut<Bulletin>> Binding<B> {
    /// Mutable variable at `pos` in the active subset.
    pub fn var_at_mut(&mut self, pos: usize) -> Result<&mut Var> {
        self.check_pos(pos)?;
        let no = self.subset_no;
        Ok(&mut self.bulletin.borrow_mut().subsets[no][pos])
    }

    /// Mutable variable at the cursor; advances the cursor.
    pub fn get_var_mut(&mut self) -> Result<&mut Var> {
        let pos = self.current_var;
        self.check_pos(pos)?;
        self.current_var += 1;
        self.var_at_mut(pos)
    }

    /// Append `var` to the active subset and return its position. The
    /// cursor is not moved.
    pub fn store_variable(&mut self, var: Var) -> Result<usize> {
        let no = self.subset_no;
        let subsets = &mut self.bulletin.borrow_mut().subsets;
        let max = subsets.len();
        let subset = subsets
            .get_mut(no)
            .ok_or(Error::SubsetOutOfRange { subset: no, max })?;
        subset.store_variable(var);
        Ok(subset.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bufr::varcode::Varcode;
    use crate::bufr::varinfo::VarInfo;

    fn bulletin() -> Bulletin {
        let info = Arc::new(VarInfo::numeric(Varcode::new(0, 1, 1), "BLOCK", "NUMERIC", 0, 0, 7));
        let mut b = Bulletin::new(vec![info.code]);
        b.obtain_subset().store_variable(Var::with_int(info.clone(), 1));
        let s = b.obtain_subset();
        s.store_variable(Var::with_int(info.clone(), 2));
        s.store_variable(Var::with_int(info, 3));
        b
    }

    #[test]
    fn cursor_walks_active_subset() {
        let b = bulletin();
        let mut r = BulletinReader::new(&b);
        r.start_subset(1).unwrap();
        assert_eq!(r.get_var().unwrap().enqi().unwrap(), 2);
        assert_eq!(r.get_var().unwrap().enqi().unwrap(), 3);
        let err = r.get_var().unwrap_err();
        assert!(matches!(
            err,
            Error::VarOutOfRange {
                pos: 2,
                max: 2,
                subset: 1
            }
        ));
        // A failed read does not move the cursor.
        assert_eq!(r.cursor(), 2);

        r.start_subset(0).unwrap();
        assert_eq!(r.cursor(), 0);
        assert_eq!(r.var_at(0).unwrap().enqi().unwrap(), 1);
        assert!(r.var_at(1).is_err());
    }

    #[test]
    fn subset_index_is_checked() {
        let b = bulletin();
        let mut r = BulletinReader::new(&b);
        let err = r.start_subset(2).unwrap_err();
        assert!(matches!(err, Error::SubsetOutOfRange { subset: 2, max: 2 }));
        assert!(err.is_consistency());
    }

    #[test]
    fn writer_updates_in_place() {
        let mut b = bulletin();
        {
            let mut w = BulletinWriter::new(&mut b);
            w.start_subset(1).unwrap();
            w.get_var_mut().unwrap().seti(20);
            w.var_at_mut(1).unwrap().seti(30);
            assert!(w.var_at_mut(2).is_err());
        }
        assert_eq!(b.subsets[1][0].enqi().unwrap(), 20);
        assert_eq!(b.subsets[1][1].enqi().unwrap(), 30);
    }

    #[test]
    fn writer_appends_to_active_subset() {
        let mut b = bulletin();
        let info = b.subsets[0][0].info().clone();
        let mut w = BulletinWriter::new(&mut b);
        w.start_subset(0).unwrap();
        assert_eq!(w.store_variable(Var::with_int(info.clone(), 9)).unwrap(), 1);
        assert_eq!(w.cursor(), 0);
        assert_eq!(w.var_at(1).unwrap().enqi().unwrap(), 9);

        let mut empty = Bulletin::default();
        let mut w = BulletinWriter::new(&mut empty);
        let err = w.store_variable(Var::new(info)).unwrap_err();
        assert!(matches!(err, Error::SubsetOutOfRange { subset: 0, max: 0 }));
    }

    #[test]
    fn bitmap_source_must_be_operator_class() {
        let b = bulletin();
        let mut r = BulletinReader::new(&b);
        r.start_subset(0).unwrap();
        let err = r.bitmap_source().unwrap_err();
        assert!(matches!(err, Error::NotABitmap { pos: 0, .. }));
        assert_eq!(
            err.to_string(),
            "variable at 0 is B01001 and not a data present bitmap"
        );
    }

    #[test]
    fn empty_bulletin_has_no_variables() {
        let b = Bulletin::default();
        let r = BulletinReader::new(&b);
        assert!(r.current_subset().is_empty());
        assert!(r.var_at(0).is_err());
    }
}
