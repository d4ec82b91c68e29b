use std::fmt;
use std::io::{Cursor, Read};

use byteorder::{ReadBytesExt, BE};

use crate::constants::MAX_RECURSION_DEPTH;
use crate::error::{Error, Result};

/// Reads fields out of one complete incoming message.
///
/// The buffer must hold the whole message starting at the transaction id,
/// otherwise compression pointers resolve against the wrong bytes. Every
/// read is bounds checked and fails with [`Error::Truncated`] instead of
/// running past the end.
pub struct Unpacker<'a> {
    rdr: Cursor<&'a [u8]>,
}

impl<'a> Unpacker<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            rdr: Cursor::new(data),
        }
    }

    pub fn offset(&self) -> usize {
        self.rdr.position() as usize
    }

    pub fn seek(&mut self, offset: usize) {
        self.rdr.set_position(offset as u64);
    }

    pub fn remaining(&self) -> usize {
        self.rdr.get_ref().len().saturating_sub(self.offset())
    }

    pub fn data(&self) -> &'a [u8] {
        self.rdr.get_ref()
    }

    fn ensure(&self, wanted: usize) -> Result<()> {
        if self.remaining() < wanted {
            return Err(Error::Truncated);
        }
        Ok(())
    }

    pub fn unpack_u8(&mut self) -> Result<u8> {
        Ok(self.rdr.read_u8()?)
    }

    pub fn unpack_u16(&mut self) -> Result<u16> {
        Ok(self.rdr.read_u16::<BE>()?)
    }

    pub fn unpack_u32(&mut self) -> Result<u32> {
        Ok(self.rdr.read_u32::<BE>()?)
    }

    pub fn unpack_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure(len)?;

        let mut buf = vec![0; len];
        self.rdr.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads a possibly compressed name and returns it dotted, e.g.
    /// `\x03www\xc0\x0c` becomes `www.` followed by whatever name sits at
    /// offset 0x0c.
    pub fn unpack_name(&mut self) -> Result<String> {
        self.unpack_name_at_depth(0)
    }

    fn unpack_name_at_depth(&mut self, depth: usize) -> Result<String> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(Error::PointerDepth);
        }

        let mut segments: Vec<String> = Vec::new();
        loop {
            let len = self.unpack_u8()?;
            if len == 0 {
                break;
            }

            if len & 0xc0 == 0xc0 {
                let offset = (u16::from(len & 0x3f) << 8) | u16::from(self.unpack_u8()?);

                let saved = self.offset();
                self.seek(offset as usize);
                let pointed = self.unpack_name_at_depth(depth + 1);
                self.seek(saved);

                let pointed = pointed?;
                if !pointed.is_empty() {
                    segments.push(pointed);
                }
                // a pointer always ends the name
                break;
            }

            let label = self.unpack_bytes(len as usize)?;
            segments.push(String::from_utf8_lossy(&label).into_owned());
        }

        Ok(segments.join("."))
    }
}

/// Hex dump of the whole buffer with the byte under the cursor in `<..>`.
impl fmt::Display for Unpacker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let data = self.data();
        let cursor = self.offset();

        let mut lines = Vec::new();
        for (n, chunk) in data.chunks(16).enumerate() {
            let start = n * 16;

            let mut hex = String::new();
            for (i, b) in chunk.iter().enumerate() {
                let index = start + i;
                let sep = if index == cursor {
                    '<'
                } else if index > 0 && index - 1 == cursor {
                    '>'
                } else {
                    ' '
                };
                hex.push(sep);
                hex.push_str(&format!("{:02x}", b));
            }
            let last = start + chunk.len() - 1;
            let close = if last == cursor { '>' } else { ' ' };

            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();

            lines.push(format!("{:08x} {:<48}{}  {}", start, hex, close, ascii));
        }

        write!(f, "{}", lines.join("\n"))
    }
}
