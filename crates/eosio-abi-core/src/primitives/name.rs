/// Account names, symbols and assets
use crate::error::{AbiError, Result};
use crate::stream::ByteReader;
use std::fmt;
use std::str::FromStr;

const NAME_CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";
const MAX_PRECISION: u8 = 18;

/// Account/action name: up to 12 base-32 characters plus a 13th 4-bit one,
/// packed into a u64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u64);

impl Name {
    pub fn new(value: u64) -> Self {
        Name(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

fn name_symbol(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some(u64::from(c - b'1') + 1),
        b'a'..=b'z' => Some(u64::from(c - b'a') + 6),
        _ => None,
    }
}

impl FromStr for Name {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() > 13 {
            return Err(AbiError::invalid("name", format!("'{}' is longer than 13 characters", s)));
        }
        let mut value = 0u64;
        for (i, c) in s.bytes().enumerate() {
            let symbol = name_symbol(c).ok_or_else(|| {
                AbiError::invalid("name", format!("'{}' contains invalid character '{}'", s, c as char))
            })?;
            if i < 12 {
                value |= symbol << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(AbiError::invalid(
                        "name",
                        format!("thirteenth character of '{}' must be in [.1-5a-j]", s),
                    ));
                }
                value |= symbol;
            }
        }
        Ok(Name(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let mask = if i == 0 { 0x0f } else { 0x1f };
            chars[12 - i] = NAME_CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }
        let len = chars.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // charmap is ASCII
        f.write_str(std::str::from_utf8(&chars[..len]).map_err(|_| fmt::Error)?)
    }
}

/// Token symbol code: up to 7 uppercase letters, little-endian in a u64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolCode(u64);

impl SymbolCode {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn from_value(value: u64) -> Result<Self> {
        let code = SymbolCode(value);
        code.validate()?;
        Ok(code)
    }

    fn validate(&self) -> Result<()> {
        let bytes = self.0.to_le_bytes();
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(8);
        let valid = len > 0
            && len <= 7
            && bytes[..len].iter().all(|b| b.is_ascii_uppercase())
            && bytes[len..].iter().all(|&b| b == 0);
        if valid {
            Ok(())
        } else {
            Err(AbiError::invalid("symbol_code", format!("{:#018x} is not a valid symbol code", self.0)))
        }
    }
}

impl FromStr for SymbolCode {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.len() > 7 || !s.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(AbiError::invalid(
                "symbol_code",
                format!("'{}' must be 1 to 7 uppercase letters", s),
            ));
        }
        let mut bytes = [0u8; 8];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Ok(SymbolCode(u64::from_le_bytes(bytes)))
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.to_le_bytes().iter().take_while(|&&b| b != 0) {
            write!(f, "{}", *b as char)?;
        }
        Ok(())
    }
}

/// Precision plus symbol code, `"4,EOS"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub precision: u8,
    pub code: SymbolCode,
}

impl Symbol {
    pub fn value(&self) -> u64 {
        (self.code.value() << 8) | u64::from(self.precision)
    }

    pub fn from_value(value: u64) -> Result<Self> {
        let precision = (value & 0xff) as u8;
        if precision > MAX_PRECISION {
            return Err(AbiError::invalid("symbol", format!("precision {} exceeds {}", precision, MAX_PRECISION)));
        }
        Ok(Symbol {
            precision,
            code: SymbolCode::from_value(value >> 8)?,
        })
    }
}

impl FromStr for Symbol {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| AbiError::invalid("symbol", format!("'{}' is not of the form 'precision,CODE'", s)))?;
        let precision: u8 = precision
            .trim()
            .parse()
            .map_err(|_| AbiError::invalid("symbol", format!("bad precision in '{}'", s)))?;
        if precision > MAX_PRECISION {
            return Err(AbiError::invalid("symbol", format!("precision {} exceeds {}", precision, MAX_PRECISION)));
        }
        Ok(Symbol {
            precision,
            code: code.trim().parse()?,
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

/// Token quantity, `"1.0000 EOS"`: int64 amount in the smallest unit
/// followed by the symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.extend_from_slice(&self.symbol.value().to_le_bytes());
    }

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let amount = i64::from_le_bytes(reader.read_array()?);
        let symbol = Symbol::from_value(u64::from_le_bytes(reader.read_array()?))?;
        Ok(Asset { amount, symbol })
    }
}

impl FromStr for Asset {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = |reason: &str| AbiError::invalid("asset", format!("'{}': {}", s, reason));
        let (number, code) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| bad("expected '<amount> <SYMBOL>'"))?;
        let code: SymbolCode = code.trim().parse()?;

        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad("amount must be a decimal number"));
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) || (digits.contains('.') && frac_part.is_empty()) {
            return Err(bad("amount must be a decimal number"));
        }
        let precision = u8::try_from(frac_part.len()).map_err(|_| bad("precision too large"))?;
        if precision > MAX_PRECISION {
            return Err(bad("precision too large"));
        }

        let magnitude: i128 = format!("{}{}", int_part, frac_part)
            .parse()
            .map_err(|_| bad("amount out of range"))?;
        let amount = i64::try_from(if negative { -magnitude } else { magnitude })
            .map_err(|_| bad("amount out of range"))?;

        Ok(Asset {
            amount,
            symbol: Symbol { precision, code },
        })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = usize::from(self.symbol.precision);
        let digits = format!("{:0width$}", self.amount.unsigned_abs(), width = precision + 1);
        let sign = if self.amount < 0 { "-" } else { "" };
        let (int_part, frac_part) = digits.split_at(digits.len() - precision);
        if precision == 0 {
            write!(f, "{}{} {}", sign, int_part, self.symbol.code)
        } else {
            write!(f, "{}{}.{} {}", sign, int_part, frac_part, self.symbol.code)
        }
    }
}
