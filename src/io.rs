// JSON input for tables and bulletins.
//
// Formats (all codes accept `B01002` or `001002` spelling):
//
//   table:    [{"code": "B12101", "desc": "TEMPERATURE", "unit": "K",
//               "scale": 2, "ref": 0, "bit_len": 16, "string": false}, ...]
//
//   bulletin: {"descriptors": ["B01001", "R01000", "B31001", ...],
//              "subsets": [[{"code": "B01001", "value": 16,
//                            "attrs": [{"code": "B33007", "value": 70}]},
//                           ...], ...]}
//
// Bulletin values: integers are stored as-is (already scaled), floats are
// scaled with the entry's scale factor, strings are stored verbatim, null or
// a missing "value" leaves the variable unset. Operator-class codes (F=2,
// e.g. data present bitmaps) get a single-use string record sized to their
// value.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value as Json;

use crate::bufr::error::{Error, Result};
use crate::bufr::subset::{Bulletin, Subset};
use crate::bufr::var::Var;
use crate::bufr::varcode::Varcode;
use crate::bufr::varinfo::{VarFlags, VarInfo, Varinfo, decimal_digits};
use crate::bufr::vartable::{MemoryVartable, Vartable};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Parse a JSON table into `table`, replacing entries with the same code.
pub fn read_table<R: Read>(reader: R, table: &mut MemoryVartable) -> Result<usize> {
    let doc: Json = serde_json::from_reader(reader).map_err(parse_err)?;
    let entries = doc
        .as_array()
        .ok_or_else(|| Error::Parse("table must be a JSON array".into()))?;
    for entry in entries {
        table.insert(table_entry(entry)?);
    }
    Ok(entries.len())
}

/// Built-in table extended with the entries in the JSON file at `path`.
pub fn load_table(path: &Path) -> Result<MemoryVartable> {
    let mut table = MemoryVartable::builtin();
    let n = read_table(BufReader::new(File::open(path)?), &mut table)?;
    log::debug!("{}: loaded {n} table entries", path.display());
    Ok(table)
}

fn table_entry(entry: &Json) -> Result<VarInfo> {
    let code = code_field(entry)?;
    let desc = entry.get("desc").and_then(Json::as_str).unwrap_or("");
    let unit = entry.get("unit").and_then(Json::as_str).unwrap_or("");
    let bit_len = u32_field(entry, "bit_len")?
        .ok_or_else(|| Error::Parse(format!("{code}: missing bit_len")))?;
    let is_string = entry.get("string").and_then(Json::as_bool).unwrap_or(false);

    if is_string {
        let mut info = VarInfo::string(code, desc, bit_len.div_ceil(8));
        info.unit = unit.to_owned();
        info.bit_len = bit_len;
        return Ok(info);
    }

    let scale = i32_field(entry, "scale")?.unwrap_or(0);
    let ref_val = i32_field(entry, "ref")?.unwrap_or(0);
    let mut info = VarInfo::numeric(code, desc, unit, scale, ref_val, bit_len);
    if let Some(len) = u32_field(entry, "len")? {
        info.len = len;
    }
    Ok(info)
}

// ---------------------------------------------------------------------------
// Bulletins
// ---------------------------------------------------------------------------

/// Parse a JSON bulletin, resolving variable metadata through `table`.
pub fn read_bulletin<R: Read>(reader: R, table: &dyn Vartable) -> Result<Bulletin> {
    let doc: Json = serde_json::from_reader(reader).map_err(parse_err)?;

    let datadesc = doc
        .get("descriptors")
        .and_then(Json::as_array)
        .ok_or_else(|| Error::Parse("bulletin needs a \"descriptors\" array".into()))?
        .iter()
        .map(|c| {
            c.as_str()
                .ok_or_else(|| Error::Parse(format!("descriptor {c} is not a string")))?
                .parse()
        })
        .collect::<Result<Vec<Varcode>>>()?;

    let mut bulletin = Bulletin::new(datadesc);
    let subsets = doc
        .get("subsets")
        .and_then(Json::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (no, subset) in subsets.iter().enumerate() {
        let vars = subset
            .as_array()
            .ok_or_else(|| Error::Parse(format!("subset {no} is not an array")))?;
        let subset: Subset = vars
            .iter()
            .map(|v| json_var(v, table))
            .collect::<Result<_>>()?;
        bulletin.subsets.push(subset);
    }
    Ok(bulletin)
}

/// Read a JSON bulletin from a file.
pub fn load_bulletin(path: &Path, table: &dyn Vartable) -> Result<Bulletin> {
    read_bulletin(BufReader::new(File::open(path)?), table)
}

fn json_var(v: &Json, table: &dyn Vartable) -> Result<Var> {
    let code = code_field(v)?;
    let value = v.get("value").unwrap_or(&Json::Null);
    let info = var_info(code, value, table)?;

    let mut var = Var::new(info.clone());
    match value {
        Json::Null => {}
        Json::String(s) => var.setc(s.as_str()),
        Json::Number(n) => {
            let raw = match n.as_i64() {
                Some(i) => i,
                None => {
                    let f = n.as_f64().unwrap_or_default();
                    (f * 10f64.powi(info.scale)).round() as i64
                }
            };
            let raw = i32::try_from(raw)
                .map_err(|_| Error::Parse(format!("{code}: value {n} out of range")))?;
            var.seti(raw);
        }
        other => return Err(Error::Parse(format!("{code}: unsupported value {other}"))),
    }

    if let Some(attrs) = v.get("attrs").and_then(Json::as_array) {
        for attr in attrs {
            var.seta(json_var(attr, table)?);
        }
    }
    Ok(var)
}

fn var_info(code: Varcode, value: &Json, table: &dyn Vartable) -> Result<Varinfo> {
    if code.is_plain() {
        return table.query(code);
    }
    let chars = value.as_str().map_or(0, |s| s.len() as u32);
    let (desc, len, bit_len) = match code.x() {
        22..=25 | 32 | 35..=37 => ("DATA PRESENT BITMAP", chars, chars),
        _ => {
            let bits = u32::from(code.y());
            ("UNKNOWN LOCAL DESCRIPTOR", decimal_digits(bits), bits)
        }
    };
    Ok(table.create_singleuse(code, desc, "", 0, 0, len, bit_len, VarFlags::STRING))
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn parse_err(e: serde_json::Error) -> Error {
    Error::Parse(e.to_string())
}

fn code_field(obj: &Json) -> Result<Varcode> {
    obj.get("code")
        .and_then(Json::as_str)
        .ok_or_else(|| Error::Parse(format!("entry without \"code\": {obj}")))?
        .parse()
}

fn i32_field(obj: &Json, key: &str) -> Result<Option<i32>> {
    match obj.get(key) {
        None | Some(Json::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(Some)
            .ok_or_else(|| Error::Parse(format!("\"{key}\" must be an integer, got {v}"))),
    }
}

fn u32_field(obj: &Json, key: &str) -> Result<Option<u32>> {
    match obj.get(key) {
        None | Some(Json::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|i| u32::try_from(i).ok())
            .map(Some)
            .ok_or_else(|| {
                Error::Parse(format!("\"{key}\" must be a non-negative integer, got {v}"))
            }),
    }
}
