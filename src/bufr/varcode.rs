// Packed descriptor codes (F, X, Y).
//
// Layout matches the usual 16-bit packing: F in the top 2 bits, X in the
// next 6, Y in the low 8.

use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// A packed BUFR descriptor code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Varcode(u16);

/// Delayed replication factor with 1-bit count (short delayed replication).
pub const B31000: Varcode = Varcode::new(0, 31, 0);
/// Delayed descriptor replication factor (8 bits).
pub const B31001: Varcode = Varcode::new(0, 31, 1);
/// Delayed descriptor replication factor (16 bits).
pub const B31002: Varcode = Varcode::new(0, 31, 2);
/// Delayed descriptor and data repetition factor.
pub const B31011: Varcode = Varcode::new(0, 31, 11);
/// Extended delayed descriptor and data repetition factor; the default
/// delayed count.
pub const B31012: Varcode = Varcode::new(0, 31, 12);
/// Associated field significance.
pub const B31021: Varcode = Varcode::new(0, 31, 21);
/// Data present indicator.
pub const B31031: Varcode = Varcode::new(0, 31, 31);
/// Percent confidence.
pub const B33007: Varcode = Varcode::new(0, 33, 7);

impl Varcode {
    /// Pack a descriptor. Out-of-range components are masked.
    pub const fn new(f: u8, x: u8, y: u8) -> Self {
        Self((((f & 0x03) as u16) << 14) | (((x & 0x3F) as u16) << 8) | y as u16)
    }

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn f(self) -> u8 {
        (self.0 >> 14) as u8
    }

    pub const fn x(self) -> u8 {
        ((self.0 >> 8) & 0x3F) as u8
    }

    pub const fn y(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Plain data descriptor (F=0).
    pub const fn is_plain(self) -> bool {
        self.f() == 0
    }

    /// Quality information (F=0, X=33): attributes of bitmap targets.
    pub const fn is_quality(self) -> bool {
        self.f() == 0 && self.x() == 33
    }

    fn prefix(self) -> char {
        match self.f() {
            0 => 'B',
            1 => 'R',
            2 => 'C',
            _ => 'D',
        }
    }
}

impl fmt::Display for Varcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}{:03}", self.prefix(), self.x(), self.y())
    }
}

/// Parses `B01002`-style (letter prefix) or `001002`-style (numeric F) codes.
impl FromStr for Varcode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || Error::Parse(format!("invalid descriptor code '{s}'"));
        if s.len() != 6 || !s.is_ascii() {
            return Err(bad());
        }
        let f = match s.as_bytes()[0] {
            b'B' | b'0' => 0,
            b'R' | b'1' => 1,
            b'C' | b'2' => 2,
            b'D' | b'3' => 3,
            _ => return Err(bad()),
        };
        let x: u8 = s[1..3].parse().map_err(|_| bad())?;
        let y: u8 = s[3..6].parse().map_err(|_| bad())?;
        if x > 63 {
            return Err(bad());
        }
        Ok(Self::new(f, x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing() {
        let c = Varcode::new(2, 22, 0);
        assert_eq!((c.f(), c.x(), c.y()), (2, 22, 0));
        assert_eq!(c.raw(), (2 << 14) | (22 << 8));
        assert_eq!(Varcode::new(3, 63, 255).raw(), u16::MAX);
    }

    #[test]
    fn display_uses_class_prefix() {
        assert_eq!(B31012.to_string(), "B31012");
        assert_eq!(Varcode::new(1, 1, 0).to_string(), "R01000");
        assert_eq!(Varcode::new(2, 23, 255).to_string(), "C23255");
        assert_eq!(Varcode::new(3, 1, 11).to_string(), "D01011");
    }

    #[test]
    fn parse_both_forms() {
        assert_eq!("B12101".parse::<Varcode>().unwrap(), Varcode::new(0, 12, 101));
        assert_eq!("012101".parse::<Varcode>().unwrap(), Varcode::new(0, 12, 101));
        assert_eq!("222000".parse::<Varcode>().unwrap(), Varcode::new(2, 22, 0));
        assert!("B1210".parse::<Varcode>().is_err());
        assert!("X12101".parse::<Varcode>().is_err());
        assert!("B99001".parse::<Varcode>().is_err());
    }

    #[test]
    fn quality_class() {
        assert!(B33007.is_quality());
        assert!(!B31031.is_quality());
        assert!(!Varcode::new(2, 33, 0).is_quality());
    }
}
