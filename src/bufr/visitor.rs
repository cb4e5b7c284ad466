// Descriptor interpreter.
//
// `Visitor` owns the operator semantics shared by encoders and decoders:
// scale/width/string-length overrides, associated fields, local descriptors,
// bitmaps and substituted values, fixed and delayed replication. It decides
// which metadata applies at which subset position and hands the actual value
// transfer to a `Backend`.
//
// All per-subset state lives in `ModifierState` and the `Bitmap`, and is
// reset by `start_subset`, which must run before each subset's program is
// walked.

use log::{debug, trace};

use super::bitmap::Bitmap;
use super::error::{Error, Result};
use super::opcodes::{OpcodeVisitor, Opcodes};
use super::var::Var;
use super::varcode::{B31012, B31021, Varcode};
use super::varinfo::{VarFlags, Varinfo, decimal_digits};
use super::vartable::Vartable;

/// Widest associated field or local descriptor we handle.
pub const MAX_FIELD_BITS: u32 = 32;

/// Associated field significance in effect before any C04 sets one.
pub const DEFAULT_C04_MEANING: u32 = 63;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Value transfer operations: implemented by encoders, decoders, and
/// anything else that wants to follow a bulletin through its program.
pub trait Backend {
    /// Variables of the subset being interpreted, as far as known.
    fn subset(&self) -> &[Var];

    /// Bind subset `subset_no`. Called after interpreter state is reset.
    fn start_subset(&mut self, subset_no: usize) -> Result<()>;

    /// Transfer an ordinary value described by `info`.
    fn do_var(&mut self, info: &Varinfo) -> Result<()>;

    /// Transfer attribute `code` (described by `info`) of the variable at
    /// subset position `target`.
    fn do_attr(&mut self, info: &Varinfo, target: usize, code: Varcode) -> Result<()>;

    /// Transfer a value the interpreter itself needs (replication counts,
    /// associated field significance) and return it.
    fn do_semantic_var(&mut self, info: &Varinfo) -> Result<Var>;

    /// Transfer an associated field of `nbits` bits with significance
    /// `significance`, attached to the variable that follows.
    fn do_associated_field(&mut self, nbits: u32, significance: u32) -> Result<()>;

    /// Transfer inline character data for operator `code`.
    fn do_char_data(&mut self, code: Varcode) -> Result<()>;

    /// Transfer the data present bitmap defined by replication `code` over
    /// `ops`, returning its position in the subset.
    fn do_bitmap(
        &mut self,
        code: Varcode,
        delayed_code: Option<Varcode>,
        ops: &Opcodes<'_>,
    ) -> Result<usize>;

    /// Repetition `idx` of a replicated group is about to be walked.
    fn do_start_repetition(&mut self, _idx: usize) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Interpreter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorOptions {
    /// Maximum depth of nested replications.
    pub max_nesting: usize,
}

impl Default for VisitorOptions {
    fn default() -> Self {
        Self { max_nesting: 32 }
    }
}

// ---------------------------------------------------------------------------
// Modifier state
// ---------------------------------------------------------------------------

/// Operator state that applies to the rest of a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierState {
    /// C02 scale change.
    pub scale_change: i32,
    /// C01 width change, in bits.
    pub width_change: i32,
    /// C08 string length override, in characters (0 = none).
    pub string_len_override: u32,
    /// C04 associated field width (0 = none).
    pub c04_bits: u32,
    /// C04 associated field significance.
    pub c04_meaning: u32,
    /// The next replication defines a bitmap.
    pub want_bitmap: bool,
    /// Subset position of the next variable.
    pub data_pos: usize,
}

impl ModifierState {
    /// State at the start of every subset.
    pub const DEFAULT: Self = Self {
        scale_change: 0,
        width_change: 0,
        string_len_override: 0,
        c04_bits: 0,
        c04_meaning: DEFAULT_C04_MEANING,
        want_bitmap: false,
        data_pos: 0,
    };
}

impl Default for ModifierState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Visitor
// ---------------------------------------------------------------------------

/// Interprets descriptor programs against a [`Backend`].
pub struct Visitor<'t, B: Backend> {
    table: &'t dyn Vartable,
    backend: B,
    opts: VisitorOptions,
    state: ModifierState,
    bitmap: Bitmap,
    subset_no: usize,
    depth: usize,
}

impl<'t, B: Backend> Visitor<'t, B> {
    pub fn new(table: &'t dyn Vartable, backend: B) -> Self {
        Self::with_options(table, backend, VisitorOptions::default())
    }

    pub fn with_options(table: &'t dyn Vartable, backend: B, opts: VisitorOptions) -> Self {
        Self {
            table,
            backend,
            opts,
            state: ModifierState::DEFAULT,
            bitmap: Bitmap::new(),
            subset_no: 0,
            depth: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn state(&self) -> &ModifierState {
        &self.state
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Reset all operator state and bind subset `subset_no`.
    pub fn start_subset(&mut self, subset_no: usize) -> Result<()> {
        debug!("start subset {subset_no}");
        self.state = ModifierState::DEFAULT;
        self.bitmap.reset();
        self.depth = 0;
        self.subset_no = subset_no;
        self.backend.start_subset(subset_no)
    }

    /// Interpret one subset.
    pub fn visit_subset(&mut self, subset_no: usize, ops: &Opcodes<'_>) -> Result<()> {
        self.start_subset(subset_no)?;
        ops.visit(self)
    }

    /// Interpret subsets `0..count`, stopping at the first failure.
    pub fn visit_subsets(&mut self, count: usize, ops: &Opcodes<'_>) -> Result<()> {
        for subset_no in 0..count {
            self.visit_subset(subset_no, ops)?;
        }
        Ok(())
    }

    /// Metadata for `code` with the active scale, width, and string length
    /// overrides applied.
    pub fn varinfo(&self, code: Varcode) -> Result<Varinfo> {
        let peek = self.table.query(code)?;
        let st = &self.state;

        if st.scale_change == 0 && st.width_change == 0 && st.string_len_override == 0 {
            return Ok(peek);
        }

        let scale = peek.scale + st.scale_change;

        let bit_len = if peek.is_string() && st.string_len_override != 0 {
            trace!("{code}: overriding string to {} bytes", st.string_len_override);
            st.string_len_override * 8
        } else if st.width_change != 0 {
            trace!("{code}: applying {} width change", st.width_change);
            let widened = i64::from(peek.bit_len) + i64::from(st.width_change);
            u32::try_from(widened).map_err(|_| {
                Error::MalformedProgram(format!(
                    "width change {} leaves {code} with {widened} bits",
                    st.width_change
                ))
            })?
        } else {
            peek.bit_len
        };

        trace!("{code}: requesting alteration scale {scale}, bit_len {bit_len}");
        self.table.query_altered(code, scale, bit_len)
    }

    fn repeat(&mut self, count: usize, ops: &Opcodes<'_>) -> Result<()> {
        for idx in 0..count {
            self.backend.do_start_repetition(idx)?;
            ops.visit(self)?;
        }
        Ok(())
    }

    fn check_depth(&self) -> Result<()> {
        if self.depth >= self.opts.max_nesting {
            return Err(Error::NestingTooDeep { depth: self.depth + 1 });
        }
        Ok(())
    }
}

impl<B: Backend> OpcodeVisitor for Visitor<'_, B> {
    fn b_variable(&mut self, code: Varcode) -> Result<()> {
        let info = self.varinfo(code)?;

        if code.is_quality()
            && let Some(target) = self.bitmap.next()
        {
            trace!("{code}: attribute of subset position {target}");
            return self.backend.do_attr(&info, target, code);
        }

        trace!("{code}: variable at {}", self.state.data_pos);
        if self.state.c04_bits > 0 {
            self.backend
                .do_associated_field(self.state.c04_bits, self.state.c04_meaning)?;
        }
        self.backend.do_var(&info)?;
        self.state.data_pos += 1;
        Ok(())
    }

    fn c_modifier(&mut self, code: Varcode) -> Result<()> {
        trace!("{code}: operator ignored");
        Ok(())
    }

    fn c_change_data_width(&mut self, _code: Varcode, change: i32) -> Result<()> {
        trace!("width change {} -> {change}", self.state.width_change);
        self.state.width_change = change;
        Ok(())
    }

    fn c_change_data_scale(&mut self, _code: Varcode, change: i32) -> Result<()> {
        trace!("scale change {} -> {change}", self.state.scale_change);
        self.state.scale_change = change;
        Ok(())
    }

    fn c_associated_field(
        &mut self,
        code: Varcode,
        sig_code: Option<Varcode>,
        nbits: u32,
    ) -> Result<()> {
        trace!("{code}: associated field {} -> {nbits} bits", self.state.c04_bits);
        if nbits != 0 && self.state.c04_bits != 0 {
            return Err(Error::NestedAssociatedField);
        }
        if nbits > MAX_FIELD_BITS {
            return Err(Error::AssociatedFieldTooWide { bits: nbits });
        }
        if nbits != 0 && sig_code.is_some() {
            let info = self.table.query(B31021)?;
            let var = self.backend.do_semantic_var(&info)?;
            let meaning = var.enqi()?;
            self.state.c04_meaning = u32::try_from(meaning).map_err(|_| {
                Error::Parse(format!("{B31021}: negative significance {meaning}"))
            })?;
            self.state.data_pos += 1;
        }
        self.state.c04_bits = nbits;
        Ok(())
    }

    fn c_char_data(&mut self, code: Varcode) -> Result<()> {
        self.backend.do_char_data(code)
    }

    fn c_local_descriptor(&mut self, code: Varcode, desc_code: Varcode, nbits: u32) -> Result<()> {
        if nbits > MAX_FIELD_BITS {
            return Err(Error::LocalDescriptorTooWide { bits: nbits });
        }
        if nbits == 0 {
            return Ok(());
        }

        let known = if self.table.contains(desc_code) {
            Some(self.varinfo(desc_code)?).filter(|info| info.bit_len == nbits)
        } else {
            None
        };

        match known {
            Some(info) => self.backend.do_var(&info)?,
            None => {
                trace!("{code}: skipping unknown local descriptor {desc_code} of {nbits} bits");
                let info = self.table.create_singleuse(
                    code,
                    "UNKNOWN LOCAL DESCRIPTOR",
                    "UNKNOWN",
                    0,
                    0,
                    decimal_digits(nbits),
                    nbits,
                    VarFlags::STRING,
                );
                self.backend.do_var(&info)?;
            }
        }
        self.state.data_pos += 1;
        Ok(())
    }

    fn c_char_data_override(&mut self, _code: Varcode, new_length: u32) -> Result<()> {
        if new_length != 0 {
            trace!("character size overridden to {new_length} chars for all fields");
        } else {
            trace!("character size override end");
        }
        self.state.string_len_override = new_length;
        Ok(())
    }

    fn c_quality_information_bitmap(&mut self, code: Varcode) -> Result<()> {
        if code.y() != 0 {
            return Err(Error::UnsupportedOperator { code });
        }
        self.state.want_bitmap = true;
        Ok(())
    }

    fn c_substituted_value_bitmap(&mut self, _code: Varcode) -> Result<()> {
        self.state.want_bitmap = true;
        Ok(())
    }

    fn c_substituted_value(&mut self, code: Varcode) -> Result<()> {
        if !self.bitmap.is_active() {
            return Err(Error::NoActiveBitmap { code });
        }
        let target = self.bitmap.next().ok_or(Error::BitmapExhausted { code })?;
        let subset = self.backend.subset();
        let info = subset
            .get(target)
            .ok_or(Error::VarOutOfRange {
                pos: target,
                max: subset.len(),
                subset: self.subset_no,
            })?
            .info()
            .clone();
        trace!("{code}: substituted value for subset position {target}");
        self.backend.do_attr(&info, target, info.code)
    }

    fn r_replication(
        &mut self,
        code: Varcode,
        delayed_code: Option<Varcode>,
        ops: &Opcodes<'_>,
    ) -> Result<()> {
        let mut count = u32::from(code.y());

        if self.state.want_bitmap {
            let delayed_code = match delayed_code {
                None if count == 0 => Some(B31012),
                other => other,
            };
            let pos = self.backend.do_bitmap(code, delayed_code, ops)?;
            let subset = self.backend.subset();
            let bitmap_var = subset.get(pos).ok_or(Error::VarOutOfRange {
                pos,
                max: subset.len(),
                subset: self.subset_no,
            })?;
            self.bitmap
                .init(bitmap_var, subset, pos, self.state.data_pos)?;
            if delayed_code.is_some() {
                self.state.data_pos += 1;
            }
            self.state.want_bitmap = false;
            return Ok(());
        }

        if count == 0 {
            let info = self.table.query(delayed_code.unwrap_or(B31012))?;
            let var = self.backend.do_semantic_var(&info)?;
            let n = var.enqi()?;
            count = u32::try_from(n).map_err(|_| {
                Error::MalformedProgram(format!("{code}: negative replication count {n}"))
            })?;
            self.state.data_pos += 1;
        }

        if let Some(head) = ops.head() {
            trace!(
                "{code}: {count} repetitions of {} descriptors from {head}{}",
                ops.len(),
                if delayed_code.is_some() { " (delayed)" } else { "" }
            );
        }

        self.check_depth()?;
        self.depth += 1;
        let res = self.repeat(count as usize, ops);
        self.depth -= 1;
        res
    }
}
