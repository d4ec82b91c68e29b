use std::fmt;

use crate::constants::{class_label, type_label};
use crate::error::Result;
use crate::packer::Packer;
use crate::unpacker::Unpacker;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Question {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
}

impl Question {
    pub fn new(name: &str, rtype: u16, class: u16) -> Self {
        Self {
            name: name.to_string(),
            rtype,
            class,
        }
    }

    pub fn pack(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_name(&self.name)?;
        packer.pack_u16(self.rtype)?;
        packer.pack_u16(self.class)?;

        Ok(())
    }

    pub fn unpack(unpacker: &mut Unpacker) -> Result<Self> {
        let name = unpacker.unpack_name()?;
        let rtype = unpacker.unpack_u16()?;
        let class = unpacker.unpack_u16()?;

        let q = Self { name, rtype, class };

        Ok(q)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{} {}]", self.name, type_label(self.rtype), class_label(self.class))
    }
}
