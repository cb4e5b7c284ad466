// Bulletin validation against its descriptor program.
//
// Walks each subset with the interpreter and checks that the stored
// variables line up with what the program says should be there. Encoders run
// the same walk, so a bulletin that validates can be encoded.

use crate::bufr::binding::BulletinReader;
use crate::bufr::error::{Error, Result};
use crate::bufr::opcodes::Opcodes;
use crate::bufr::subset::Bulletin;
use crate::bufr::var::Var;
use crate::bufr::varcode::Varcode;
use crate::bufr::varinfo::Varinfo;
use crate::bufr::vartable::Vartable;
use crate::bufr::visitor::{Backend, Visitor, VisitorOptions};

/// Read-only backend that checks variable codes as they are visited.
#[derive(Debug)]
pub struct DdsValidator<'a> {
    reader: BulletinReader<'a>,
    checked: usize,
}

impl<'a> DdsValidator<'a> {
    pub fn new(bulletin: &'a Bulletin) -> Self {
        Self {
            reader: BulletinReader::new(bulletin),
            checked: 0,
        }
    }

    /// Variables checked so far, across subsets.
    pub fn checked(&self) -> usize {
        self.checked
    }

    /// Next variable, which must have the code `info` describes.
    fn expect_var(&mut self, info: &Varinfo) -> Result<&Var> {
        let pos = self.reader.cursor();
        let found = self.reader.get_var()?.code();
        if found != info.code {
            return Err(Error::VarMismatch {
                pos,
                expected: info.code,
                found,
            });
        }
        self.checked += 1;
        self.reader.var_at(pos)
    }
}

impl Backend for DdsValidator<'_> {
    fn subset(&self) -> &[Var] {
        self.reader.current_subset()
    }

    fn start_subset(&mut self, subset_no: usize) -> Result<()> {
        self.reader.start_subset(subset_no)
    }

    fn do_var(&mut self, info: &Varinfo) -> Result<()> {
        self.expect_var(info)?;
        Ok(())
    }

    fn do_attr(&mut self, _info: &Varinfo, target: usize, _code: Varcode) -> Result<()> {
        // Attributes are optional; the target must exist.
        self.reader.var_at(target)?;
        Ok(())
    }

    fn do_semantic_var(&mut self, info: &Varinfo) -> Result<Var> {
        let var = self.expect_var(info)?;
        if !var.is_set() {
            return Err(Error::MalformedProgram(format!(
                "{} has no value but drives the descriptor program",
                var.code()
            )));
        }
        Ok(var.clone())
    }

    fn do_associated_field(&mut self, _nbits: u32, _significance: u32) -> Result<()> {
        Ok(())
    }

    fn do_char_data(&mut self, _code: Varcode) -> Result<()> {
        self.reader.get_var()?;
        self.checked += 1;
        Ok(())
    }

    fn do_bitmap(
        &mut self,
        _code: Varcode,
        _delayed_code: Option<Varcode>,
        _ops: &Opcodes<'_>,
    ) -> Result<usize> {
        let pos = self.reader.bitmap_source()?;
        self.checked += 1;
        Ok(pos)
    }
}

impl Bulletin {
    /// Check every subset against the data descriptor section.
    pub fn validate(&self, table: &dyn Vartable) -> Result<()> {
        self.validate_with(table, VisitorOptions::default())
    }

    pub fn validate_with(&self, table: &dyn Vartable, opts: VisitorOptions) -> Result<()> {
        let ops = Opcodes::new(&self.datadesc);
        let mut v = Visitor::with_options(table, DdsValidator::new(self), opts);
        v.visit_subsets(self.subsets.len(), &ops)
    }
}
