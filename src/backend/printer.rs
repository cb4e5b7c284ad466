// Structured bulletin dump.
//
// Prints each subset in descriptor program order, so replications, bitmap
// attributes and substituted values show up where the program puts them
// rather than in storage order.

use std::io::Write;

use crate::bufr::binding::BulletinReader;
use crate::bufr::error::Result;
use crate::bufr::opcodes::Opcodes;
use crate::bufr::subset::Bulletin;
use crate::bufr::var::Var;
use crate::bufr::varcode::Varcode;
use crate::bufr::varinfo::Varinfo;
use crate::bufr::vartable::Vartable;
use crate::bufr::visitor::{Backend, Visitor, VisitorOptions};

/// Read-only backend writing one line per transferred value.
pub struct DdsPrinter<'a, W: Write> {
    reader: BulletinReader<'a>,
    out: W,
}

impl<'a, W: Write> DdsPrinter<'a, W> {
    pub fn new(bulletin: &'a Bulletin, out: W) -> Self {
        Self {
            reader: BulletinReader::new(bulletin),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_var(&mut self, pos: usize) -> Result<()> {
        let var = self.reader.var_at(pos)?;
        writeln!(self.out, "{pos} {var}")?;
        for attr in var.attrs() {
            writeln!(self.out, "    {attr}")?;
        }
        Ok(())
    }
}

impl<W: Write> Backend for DdsPrinter<'_, W> {
    fn subset(&self) -> &[Var] {
        self.reader.current_subset()
    }

    fn start_subset(&mut self, subset_no: usize) -> Result<()> {
        self.reader.start_subset(subset_no)?;
        writeln!(self.out, "Subset {subset_no}:")?;
        Ok(())
    }

    fn do_var(&mut self, _info: &Varinfo) -> Result<()> {
        let pos = self.reader.cursor();
        self.reader.get_var()?;
        self.print_var(pos)
    }

    fn do_attr(&mut self, info: &Varinfo, target: usize, code: Varcode) -> Result<()> {
        let var = self.reader.var_at(target)?;
        match var.enqa(code) {
            Some(attr) => writeln!(self.out, "  [{target}] {attr}")?,
            None => writeln!(self.out, "  [{target}] {code}[{}]: (undef)", info.desc)?,
        }
        Ok(())
    }

    fn do_semantic_var(&mut self, _info: &Varinfo) -> Result<Var> {
        let pos = self.reader.cursor();
        let var = self.reader.get_var()?.clone();
        self.print_var(pos)?;
        Ok(var)
    }

    fn do_associated_field(&mut self, nbits: u32, significance: u32) -> Result<()> {
        writeln!(
            self.out,
            "  associated field: {nbits} bits, significance {significance}"
        )?;
        Ok(())
    }

    fn do_char_data(&mut self, _code: Varcode) -> Result<()> {
        let pos = self.reader.cursor();
        self.reader.get_var()?;
        self.print_var(pos)
    }

    fn do_bitmap(
        &mut self,
        _code: Varcode,
        _delayed_code: Option<Varcode>,
        _ops: &Opcodes<'_>,
    ) -> Result<usize> {
        let pos = self.reader.bitmap_source()?;
        self.print_var(pos)?;
        Ok(pos)
    }

    fn do_start_repetition(&mut self, idx: usize) -> Result<()> {
        writeln!(self.out, "  -- repetition {idx}")?;
        Ok(())
    }
}

impl Bulletin {
    /// Dump all subsets following the data descriptor section.
    pub fn print_structured<W: Write>(&self, table: &dyn Vartable, out: W) -> Result<()> {
        self.print_structured_with(table, out, VisitorOptions::default())
    }

    /// Same as [`Bulletin::print_structured`] with explicit traversal limits.
    pub fn print_structured_with<W: Write>(
        &self,
        table: &dyn Vartable,
        out: W,
        opts: VisitorOptions,
    ) -> Result<()> {
        let ops = Opcodes::new(&self.datadesc);
        let mut v = Visitor::with_options(table, DdsPrinter::new(self, out), opts);
        v.visit_subsets(self.subsets.len(), &ops)
    }
}
