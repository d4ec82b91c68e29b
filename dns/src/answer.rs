use std::fmt;

use crate::constants::{class_label, type_label};
use crate::error::Result;
use crate::packer::Packer;
use crate::resource_record::ResourceRecord;
use crate::unpacker::Unpacker;

/// One entry of the answer section.
///
/// `rtype` is written as given; keeping it in line with `rr` is up to the
/// caller.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Answer {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rr: ResourceRecord,
}

impl Answer {
    pub fn new(name: &str, rtype: u16, class: u16, ttl: u32, rr: ResourceRecord) -> Self {
        Self {
            name: name.to_string(),
            rtype,
            class,
            ttl,
            rr,
        }
    }

    pub fn pack(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_name(&self.name)?;
        packer.pack_u16(self.rtype)?;
        packer.pack_u16(self.class)?;
        packer.pack_u32(self.ttl)?;
        self.rr.pack(packer)
    }

    pub fn unpack(unpacker: &mut Unpacker) -> Result<Self> {
        let name = unpacker.unpack_name()?;
        let rtype = unpacker.unpack_u16()?;
        let class = unpacker.unpack_u16()?;
        let ttl = unpacker.unpack_u32()?;
        let rr = ResourceRecord::unpack(rtype, unpacker)?;

        Ok(Self {
            name,
            rtype,
            class,
            ttl,
            rr,
        })
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} [{} {}] {}",
            self.name,
            self.ttl,
            type_label(self.rtype),
            class_label(self.class),
            self.rr
        )
    }
}
