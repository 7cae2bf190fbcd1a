//! Hub chain wire primitives.
//!
//! The hub chain serializes collections as a compact var-uint count followed
//! by the items, and byte strings as a var-uint length followed by the raw
//! bytes. Both the trust chain and the signature array use this layout.

use crate::Error;

/// Append-only writer for the hub chain encoding.
#[derive(Debug, Default)]
pub struct Sink {
    buf: Vec<u8>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_var_uint(&mut self, v: u64) {
        if v < 0xFD {
            self.buf.push(v as u8);
        } else if v <= 0xFFFF {
            self.buf.push(0xFD);
            self.buf.extend_from_slice(&(v as u16).to_le_bytes());
        } else if v <= 0xFFFF_FFFF {
            self.buf.push(0xFE);
            self.buf.extend_from_slice(&(v as u32).to_le_bytes());
        } else {
            self.buf.push(0xFF);
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
    }

    pub fn write_var_bytes(&mut self, data: &[u8]) {
        self.write_var_uint(data.len() as u64);
        self.buf.extend_from_slice(data);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an encoded buffer.
#[derive(Debug)]
pub struct Source<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Source<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                Error::Codec(format!(
                    "unexpected end of input: need {} bytes at offset {}, have {}",
                    n,
                    self.pos,
                    self.data.len() - self.pos
                ))
            })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    /// Reads a var-uint, rejecting encodings that are wider than needed.
    pub fn read_var_uint(&mut self) -> Result<u64, Error> {
        let tag = self.read_u8()?;
        let (value, min) = match tag {
            0xFD => {
                let raw = self.take(2)?;
                (u16::from_le_bytes([raw[0], raw[1]]) as u64, 0xFD)
            }
            0xFE => {
                let raw = self.take(4)?;
                (
                    u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64,
                    0x1_0000,
                )
            }
            0xFF => {
                let raw = self.take(8)?;
                let mut le = [0u8; 8];
                le.copy_from_slice(raw);
                (u64::from_le_bytes(le), 0x1_0000_0000)
            }
            small => return Ok(small as u64),
        };
        if value < min {
            return Err(Error::Codec(format!(
                "non-canonical var-uint {:#x} with prefix {:#x}",
                value, tag
            )));
        }
        Ok(value)
    }

    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_var_uint()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::Codec(format!("byte string length {} overflows", len)))?;
        self.take(len)
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fails if any input is left unread.
    pub fn finish(self) -> Result<(), Error> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::Codec(format!("{} trailing bytes after decoding", n))),
        }
    }
}

/// Encodes an ordered signature set the way the hub's cross-chain manager
/// expects it in an `ImportOuterTransfer` call.
pub fn encode_signature_array(sigs: &[Vec<u8>]) -> Vec<u8> {
    let mut sink = Sink::new();
    sink.write_var_uint(sigs.len() as u64);
    for sig in sigs {
        sink.write_var_bytes(sig);
    }
    sink.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_signature_array(data: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
        let mut source = Source::new(data);
        let count = source.read_var_uint()?;
        let mut sigs = Vec::new();
        for _ in 0..count {
            sigs.push(source.read_var_bytes()?.to_vec());
        }
        source.finish()?;
        Ok(sigs)
    }

    fn var_uint(v: u64) -> Vec<u8> {
        let mut sink = Sink::new();
        sink.write_var_uint(v);
        sink.into_bytes()
    }

    #[test]
    fn test_var_uint_widths() {
        assert_eq!(var_uint(0), vec![0x00]);
        assert_eq!(var_uint(0xFC), vec![0xFC]);
        assert_eq!(var_uint(0xFD), vec![0xFD, 0xFD, 0x00]);
        assert_eq!(var_uint(0xFFFF), vec![0xFD, 0xFF, 0xFF]);
        assert_eq!(var_uint(0x1_0000), vec![0xFE, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(
            var_uint(0x1_0000_0000),
            vec![0xFF, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_reads_back_boundaries() {
        for v in [0u64, 0xFC, 0xFD, 0xFFFF, 0x1_0000, 0xFFFF_FFFF, u64::MAX] {
            let bytes = var_uint(v);
            let mut source = Source::new(&bytes);
            assert_eq!(source.read_var_uint().unwrap(), v);
            source.finish().unwrap();
        }
    }

    #[test]
    fn test_rejects_non_canonical_var_uint() {
        let mut source = Source::new(&[0xFD, 0x10, 0x00]);
        assert!(matches!(source.read_var_uint(), Err(Error::Codec(_))));
    }

    #[test]
    fn test_rejects_truncated_bytes() {
        let mut source = Source::new(&[0x05, 1, 2]);
        assert!(source.read_var_bytes().is_err());
    }

    #[test]
    fn test_signature_array_layout() {
        let sigs = vec![vec![0xAA, 0xBB], vec![0xCC]];
        let encoded = encode_signature_array(&sigs);
        assert_eq!(encoded, vec![0x02, 0x02, 0xAA, 0xBB, 0x01, 0xCC]);
        assert_eq!(decode_signature_array(&encoded).unwrap(), sigs);
    }

    #[test]
    fn test_signature_array_trailing_bytes() {
        assert!(decode_signature_array(&[0x01, 0x01, 0xAA, 0x00]).is_err());
    }
}
