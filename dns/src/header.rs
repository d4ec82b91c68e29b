use crate::constants::Qr;
use crate::error::Result;
use crate::packer::Packer;
use crate::unpacker::Unpacker;

// 12 bytes
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Header {
    pub id: u16,
    pub qr: Qr,
    pub opcode: u8,
    pub flags: u8,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    // 只解析、不使用；发送时总是 0
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    /// `qr<<15 | opcode<<11 | flags<<7 | rcode`
    pub fn flags_word(&self) -> u16 {
        ((self.qr.bit() << 15) & 0x8000)
            | ((u16::from(self.opcode) << 11) & 0x7800)
            | ((u16::from(self.flags) << 7) & 0x0780)
            | (u16::from(self.rcode) & 0x000f)
    }

    pub fn pack(&self, packer: &mut Packer) -> Result<()> {
        packer.pack_u16(self.id)?;
        packer.pack_u16(self.flags_word())?;
        packer.pack_u16(self.qdcount)?;
        packer.pack_u16(self.ancount)?;
        packer.pack_u16(self.nscount)?;
        packer.pack_u16(self.arcount)?;

        Ok(())
    }

    pub fn unpack(unpacker: &mut Unpacker) -> Result<Self> {
        let id = unpacker.unpack_u16()?;
        let word = unpacker.unpack_u16()?;
        let qdcount = unpacker.unpack_u16()?;
        let ancount = unpacker.unpack_u16()?;
        let nscount = unpacker.unpack_u16()?;
        let arcount = unpacker.unpack_u16()?;

        let h = Self {
            id,
            qr: Qr::from_bit(word >> 15),
            opcode: ((word >> 11) & 0x000f) as u8,
            flags: ((word >> 7) & 0x000f) as u8,
            rcode: (word & 0x000f) as u8,
            qdcount,
            ancount,
            nscount,
            arcount,
        };

        Ok(h)
    }
}
