/// Byte cursor and variable-length integer helpers for the wire format
use crate::error::{AbiError, Result};

/// Read cursor over an encoded buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(AbiError::TruncatedBuffer {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Unsigned LEB128, at most 10 bytes
    pub fn read_varuint64(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        for i in 0..10 {
            let byte = self.read_u8()?;
            // the tenth byte only has room for the top bit
            if i == 9 && byte > 0x01 {
                return Err(AbiError::invalid(
                    "varuint64",
                    format!("value at offset {} overflows u64", start),
                ));
            }
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(AbiError::invalid(
            "varuint64",
            format!("encoding at offset {} is longer than 10 bytes", start),
        ))
    }

    /// Unsigned LEB128 range-checked to u32
    pub fn read_varuint32(&mut self) -> Result<u32> {
        let start = self.pos;
        let value = self.read_varuint64()?;
        u32::try_from(value).map_err(|_| {
            AbiError::invalid("varuint32", format!("value at offset {} overflows u32", start))
        })
    }

    /// Zigzag-encoded signed varint
    pub fn read_varint32(&mut self) -> Result<i32> {
        let raw = self.read_varuint32()?;
        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }
}

pub fn write_varuint64(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn write_varuint32(out: &mut Vec<u8>, value: u32) {
    write_varuint64(out, u64::from(value));
}

pub fn write_varint32(out: &mut Vec<u8>, value: i32) {
    write_varuint32(out, ((value << 1) ^ (value >> 31)) as u32);
}

/// Length prefix for lists, strings and bytes
pub fn write_len(out: &mut Vec<u8>, len: usize, what: &str) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| AbiError::invalid(what, format!("length {} exceeds u32", len)))?;
    write_varuint32(out, len);
    Ok(())
}
