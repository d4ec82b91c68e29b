use std::collections::HashMap;

use byteorder::{WriteBytesExt, BE};

use crate::constants::MAX_POINTER_OFFSET;
use crate::error::Result;
use crate::utils::{normalize_name, validate_name};

/// Builds one outgoing message.
///
/// Besides plain big-endian fields, the packer remembers where every name
/// suffix was written so later names can point back at it. For example once
/// `test.com` sits at offset 0x0c, `www.test.com` is written as
/// `\x03www\xc0\x0c`. The cache lives exactly as long as the packer, which
/// must not be reused for a second message.
#[derive(Debug, Default)]
pub struct Packer {
    data: Vec<u8>,
    // remaining suffix => offset where its encoding starts
    segment_cache: HashMap<String, u16>,
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pack_u8(&mut self, value: u8) -> Result<()> {
        self.data.write_u8(value)?;
        Ok(())
    }

    pub fn pack_u16(&mut self, value: u16) -> Result<()> {
        self.data.write_u16::<BE>(value)?;
        Ok(())
    }

    pub fn pack_u32(&mut self, value: u32) -> Result<()> {
        self.data.write_u32::<BE>(value)?;
        Ok(())
    }

    pub fn pack_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Writes `name`, compressing against anything already in the buffer.
    /// Returns the number of bytes written.
    pub fn pack_name(&mut self, name: &str) -> Result<usize> {
        self.encode_name(name, true)
    }

    pub fn pack_name_uncompressed(&mut self, name: &str) -> Result<usize> {
        self.encode_name(name, false)
    }

    /// Length [`pack_name`](Self::pack_name) would write right now, without
    /// touching the buffer or the cache.
    pub fn measure_name(&self, name: &str) -> Result<usize> {
        self.measure(name, true)
    }

    pub fn measure_name_uncompressed(&self, name: &str) -> Result<usize> {
        self.measure(name, false)
    }

    fn measure(&self, name: &str, compress: bool) -> Result<usize> {
        validate_name(name)?;

        let mut length = 0;
        let mut rest = normalize_name(name);
        while !rest.is_empty() {
            if compress && self.segment_cache.contains_key(rest) {
                return Ok(length + 2);
            }

            let (label, tail) = split_label(rest);
            length += 1 + label.len();
            rest = tail;
        }

        Ok(length + 1)
    }

    fn encode_name(&mut self, name: &str, compress: bool) -> Result<usize> {
        validate_name(name)?;

        let mut length = 0;
        let mut rest = normalize_name(name);
        while !rest.is_empty() {
            if compress {
                if let Some(&offset) = self.segment_cache.get(rest) {
                    self.pack_u16(0xc000 | offset)?;
                    // the pointer replaces the null terminator as well
                    return Ok(length + 2);
                }
            }

            // offsets past 14 bits can't be pointed at, so don't remember them
            let offset = self.data.len();
            if offset <= MAX_POINTER_OFFSET {
                self.segment_cache.entry(rest.to_string()).or_insert(offset as u16);
            }

            let (label, tail) = split_label(rest);
            self.pack_u8(label.len() as u8)?;
            self.pack_bytes(label.as_bytes());
            length += 1 + label.len();
            rest = tail;
        }

        self.pack_u8(0)?;
        Ok(length + 1)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn split_label(name: &str) -> (&str, &str) {
    match name.split_once('.') {
        Some((label, tail)) => (label, tail),
        None => (name, ""),
    }
}
