// Descriptor program traversal.
//
// `Opcodes` walks an expanded data descriptor section (no D sequences) and
// turns it into `OpcodeVisitor` callbacks in document order:
//
//   F=0  plain variable               -> b_variable
//   F=1  replication of X descriptors -> r_replication (Y=0: delayed, the
//                                        next descriptor is the count code)
//   F=2  operator                     -> the matching c_* callback
//
// Replicated groups are handed to the visitor as a sub-program; the visitor
// decides how many times to walk them.

use std::io::Write;

use super::error::{Error, Result};
use super::varcode::{B31021, Varcode};

// ---------------------------------------------------------------------------
// Visitor interface
// ---------------------------------------------------------------------------

/// Receiver of descriptor program events.
///
/// Operator callbacks default to doing nothing so that simple listeners
/// only implement what they care about.
pub trait OpcodeVisitor {
    /// Plain data descriptor.
    fn b_variable(&mut self, code: Varcode) -> Result<()>;

    /// Any operator without a dedicated callback.
    fn c_modifier(&mut self, _code: Varcode) -> Result<()> {
        Ok(())
    }

    /// C01: change data width by `change` bits (0 cancels).
    fn c_change_data_width(&mut self, _code: Varcode, _change: i32) -> Result<()> {
        Ok(())
    }

    /// C02: change scale by `change` (0 cancels).
    fn c_change_data_scale(&mut self, _code: Varcode, _change: i32) -> Result<()> {
        Ok(())
    }

    /// C04: add an associated field of `nbits` bits to following variables.
    fn c_associated_field(
        &mut self,
        _code: Varcode,
        _sig_code: Option<Varcode>,
        _nbits: u32,
    ) -> Result<()> {
        Ok(())
    }

    /// C05: character data inline in the data section.
    fn c_char_data(&mut self, _code: Varcode) -> Result<()> {
        Ok(())
    }

    /// C06: `desc_code` is a local descriptor of `nbits` bits.
    fn c_local_descriptor(
        &mut self,
        _code: Varcode,
        _desc_code: Varcode,
        _nbits: u32,
    ) -> Result<()> {
        Ok(())
    }

    /// C08: override string length to `new_length` characters (0 cancels).
    fn c_char_data_override(&mut self, _code: Varcode, _new_length: u32) -> Result<()> {
        Ok(())
    }

    /// C22: quality information follows; next replication is a bitmap.
    fn c_quality_information_bitmap(&mut self, _code: Varcode) -> Result<()> {
        Ok(())
    }

    /// C23000: substituted values follow; next replication is a bitmap.
    fn c_substituted_value_bitmap(&mut self, _code: Varcode) -> Result<()> {
        Ok(())
    }

    /// C23255: one substituted value.
    fn c_substituted_value(&mut self, _code: Varcode) -> Result<()> {
        Ok(())
    }

    /// Replication of `ops`. `delayed_code` is the count descriptor for
    /// delayed replication.
    fn r_replication(
        &mut self,
        code: Varcode,
        delayed_code: Option<Varcode>,
        ops: &Opcodes<'_>,
    ) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

/// A borrowed, expanded descriptor program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Opcodes<'a> {
    codes: &'a [Varcode],
}

impl<'a> Opcodes<'a> {
    pub fn new(codes: &'a [Varcode]) -> Self {
        Self { codes }
    }

    /// First descriptor, for diagnostics.
    pub fn head(&self) -> Option<Varcode> {
        self.codes.first().copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn as_slice(&self) -> &'a [Varcode] {
        self.codes
    }

    /// Walk the program once, calling `v` in document order.
    pub fn visit<V: OpcodeVisitor + ?Sized>(&self, v: &mut V) -> Result<()> {
        let codes = self.codes;
        let mut i = 0;
        while i < codes.len() {
            let code = codes[i];
            i = match code.f() {
                0 => {
                    v.b_variable(code)?;
                    i + 1
                }
                1 => self.visit_replication(i, v)?,
                2 => self.visit_operator(i, v)?,
                _ => {
                    return Err(Error::Unimplemented(format!(
                        "{code}: sequence descriptors must be expanded before interpretation"
                    )));
                }
            };
        }
        Ok(())
    }

    /// Returns the index after the replicated group.
    fn visit_replication<V: OpcodeVisitor + ?Sized>(&self, i: usize, v: &mut V) -> Result<usize> {
        let codes = self.codes;
        let code = codes[i];
        let group_len = code.x() as usize;
        let mut start = i + 1;

        let delayed_code = if code.y() == 0 {
            let d = *codes.get(start).ok_or_else(|| {
                Error::MalformedProgram(format!("{code}: missing delayed replication factor"))
            })?;
            if !(d.f() == 0 && d.x() == 31) {
                return Err(Error::MalformedProgram(format!(
                    "{code}: {d} is not a delayed replication factor"
                )));
            }
            start += 1;
            Some(d)
        } else {
            None
        };

        let end = start + group_len;
        if end > codes.len() {
            return Err(Error::MalformedProgram(format!(
                "{code}: replicates {group_len} descriptors but only {} follow",
                codes.len() - start
            )));
        }

        v.r_replication(code, delayed_code, &Opcodes::new(&codes[start..end]))?;
        Ok(end)
    }

    /// Returns the index after the operator and any operands it consumed.
    fn visit_operator<V: OpcodeVisitor + ?Sized>(&self, i: usize, v: &mut V) -> Result<usize> {
        let codes = self.codes;
        let code = codes[i];
        let y = code.y();
        let delta = |y: u8| if y == 0 { 0 } else { i32::from(y) - 128 };

        match code.x() {
            1 => v.c_change_data_width(code, delta(y))?,
            2 => v.c_change_data_scale(code, delta(y))?,
            4 => {
                let sig_code = match codes.get(i + 1) {
                    Some(&next) if y != 0 && next == B31021 => Some(next),
                    _ => None,
                };
                v.c_associated_field(code, sig_code, u32::from(y))?;
                if sig_code.is_some() {
                    return Ok(i + 2);
                }
            }
            5 => v.c_char_data(code)?,
            6 => {
                let desc_code = *codes.get(i + 1).ok_or_else(|| {
                    Error::MalformedProgram(format!("{code}: missing local descriptor"))
                })?;
                v.c_local_descriptor(code, desc_code, u32::from(y))?;
                return Ok(i + 2);
            }
            8 => v.c_char_data_override(code, u32::from(y))?,
            22 => v.c_quality_information_bitmap(code)?,
            23 if y == 0 => v.c_substituted_value_bitmap(code)?,
            23 if y == 255 => v.c_substituted_value(code)?,
            _ => v.c_modifier(code)?,
        }
        Ok(i + 1)
    }

    /// Dump the program one descriptor per line, indenting replicated groups.
    pub fn print<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut printer = OpcodePrinter { out, indent: 0 };
        self.visit(&mut printer)
    }
}

// ---------------------------------------------------------------------------
// Program printer
// ---------------------------------------------------------------------------

struct OpcodePrinter<'w, W: Write> {
    out: &'w mut W,
    indent: usize,
}

impl<W: Write> OpcodePrinter<'_, W> {
    fn line(&mut self, text: std::fmt::Arguments<'_>) -> Result<()> {
        writeln!(self.out, "{:width$}{text}", "", width = self.indent * 2)?;
        Ok(())
    }
}

impl<W: Write> OpcodeVisitor for OpcodePrinter<'_, W> {
    fn b_variable(&mut self, code: Varcode) -> Result<()> {
        self.line(format_args!("{code}"))
    }

    fn c_modifier(&mut self, code: Varcode) -> Result<()> {
        self.line(format_args!("{code}"))
    }

    fn c_change_data_width(&mut self, code: Varcode, change: i32) -> Result<()> {
        self.line(format_args!("{code} change data width {change:+}"))
    }

    fn c_change_data_scale(&mut self, code: Varcode, change: i32) -> Result<()> {
        self.line(format_args!("{code} change data scale {change:+}"))
    }

    fn c_associated_field(
        &mut self,
        code: Varcode,
        sig_code: Option<Varcode>,
        nbits: u32,
    ) -> Result<()> {
        match sig_code {
            Some(sig) => self.line(format_args!("{code} associated field {nbits} bits, {sig}")),
            None => self.line(format_args!("{code} associated field {nbits} bits")),
        }
    }

    fn c_char_data(&mut self, code: Varcode) -> Result<()> {
        self.line(format_args!("{code} character data"))
    }

    fn c_local_descriptor(&mut self, code: Varcode, desc_code: Varcode, nbits: u32) -> Result<()> {
        self.line(format_args!("{code} local descriptor {desc_code} ({nbits} bits)"))
    }

    fn c_char_data_override(&mut self, code: Varcode, new_length: u32) -> Result<()> {
        self.line(format_args!("{code} string length override {new_length}"))
    }

    fn c_quality_information_bitmap(&mut self, code: Varcode) -> Result<()> {
        self.line(format_args!("{code} quality information bitmap"))
    }

    fn c_substituted_value_bitmap(&mut self, code: Varcode) -> Result<()> {
        self.line(format_args!("{code} substituted values bitmap"))
    }

    fn c_substituted_value(&mut self, code: Varcode) -> Result<()> {
        self.line(format_args!("{code} substituted value"))
    }

    fn r_replication(
        &mut self,
        code: Varcode,
        delayed_code: Option<Varcode>,
        ops: &Opcodes<'_>,
    ) -> Result<()> {
        match delayed_code {
            Some(d) => self.line(format_args!("{code} delayed by {d}:"))?,
            None => self.line(format_args!("{code} {} times:", code.y()))?,
        }
        self.indent += 1;
        let res = ops.visit(self);
        self.indent -= 1;
        res
    }
}
