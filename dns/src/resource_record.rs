use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::packer::Packer;
use crate::unpacker::Unpacker;

/// Start of authority data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Soa {
    pub primary: String,
    pub responsible: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// The type specific part of an answer, rdlength included.
///
/// Types without a variant of their own decode to `Unknown` and are written
/// back byte for byte.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceRecord {
    A(Ipv4Addr),
    NS(String),
    CNAME(String),
    SOA(Soa),
    MX { preference: u16, name: String },
    TXT(Vec<u8>),
    AAAA(Ipv6Addr),
    PTR(String),
    Unknown { rtype: u16, data: Vec<u8> },
}

impl ResourceRecord {
    pub fn rtype(&self) -> u16 {
        match self {
            ResourceRecord::A(_) => TYPE_A,
            ResourceRecord::NS(_) => TYPE_NS,
            ResourceRecord::CNAME(_) => TYPE_CNAME,
            ResourceRecord::SOA(_) => TYPE_SOA,
            ResourceRecord::MX { .. } => TYPE_MX,
            ResourceRecord::TXT(_) => TYPE_TXT,
            ResourceRecord::AAAA(_) => TYPE_AAAA,
            ResourceRecord::PTR(_) => TYPE_PTR,
            ResourceRecord::Unknown { rtype, .. } => *rtype,
        }
    }

    pub fn unpack(rtype: u16, unpacker: &mut Unpacker) -> Result<Self> {
        match rtype {
            TYPE_A => unpack_a(unpacker),
            TYPE_NS => Ok(ResourceRecord::NS(unpack_name_rdata(unpacker, "NS")?)),
            TYPE_CNAME => Ok(ResourceRecord::CNAME(unpack_name_rdata(unpacker, "CNAME")?)),
            TYPE_SOA => unpack_soa(unpacker),
            TYPE_PTR => Ok(ResourceRecord::PTR(unpack_name_rdata(unpacker, "PTR")?)),
            TYPE_MX => unpack_mx(unpacker),
            TYPE_TXT => unpack_txt(unpacker),
            TYPE_AAAA => unpack_aaaa(unpacker),
            _ => {
                let length = unpacker.unpack_u16()?;
                let data = unpacker.unpack_bytes(length as usize)?;
                Ok(ResourceRecord::Unknown { rtype, data })
            }
        }
    }

    pub fn pack(&self, packer: &mut Packer) -> Result<()> {
        match self {
            ResourceRecord::A(address) => {
                packer.pack_u16(4)?;
                packer.pack_bytes(&address.octets());
            }
            ResourceRecord::NS(name) | ResourceRecord::CNAME(name) | ResourceRecord::PTR(name) => {
                let length = packer.measure_name(name)?;
                packer.pack_u16(length as u16)?;
                packer.pack_name(name)?;
            }
            ResourceRecord::SOA(soa) => {
                // the second name is always written uncompressed
                let length = packer.measure_name(&soa.primary)?
                    + packer.measure_name_uncompressed(&soa.responsible)?
                    + 20;
                packer.pack_u16(length as u16)?;

                packer.pack_name(&soa.primary)?;
                packer.pack_name_uncompressed(&soa.responsible)?;
                packer.pack_u32(soa.serial)?;
                packer.pack_u32(soa.refresh)?;
                packer.pack_u32(soa.retry)?;
                packer.pack_u32(soa.expire)?;
                packer.pack_u32(soa.minimum)?;
            }
            ResourceRecord::MX { preference, name } => {
                let length = packer.measure_name(name)? + 2;
                packer.pack_u16(length as u16)?;
                packer.pack_u16(*preference)?;
                packer.pack_name(name)?;
            }
            ResourceRecord::TXT(data) => {
                if data.len() > u8::MAX as usize {
                    return Err(Error::TxtTooLong);
                }
                packer.pack_u16(data.len() as u16 + 1)?;
                packer.pack_u8(data.len() as u8)?;
                packer.pack_bytes(data);
            }
            ResourceRecord::AAAA(address) => {
                packer.pack_u16(16)?;
                packer.pack_bytes(&address.octets());
            }
            ResourceRecord::Unknown { data, .. } => {
                if data.len() > u16::MAX as usize {
                    return Err(Error::RecordTooLong);
                }
                packer.pack_u16(data.len() as u16)?;
                packer.pack_bytes(data);
            }
        }

        Ok(())
    }
}

fn unpack_a(unpacker: &mut Unpacker) -> Result<ResourceRecord> {
    if unpacker.unpack_u16()? != 4 {
        return Err(Error::InvalidRecord("A"));
    }

    let b = unpacker.unpack_bytes(4)?;
    Ok(ResourceRecord::A(Ipv4Addr::new(b[0], b[1], b[2], b[3])))
}

fn unpack_aaaa(unpacker: &mut Unpacker) -> Result<ResourceRecord> {
    if unpacker.unpack_u16()? != 16 {
        return Err(Error::InvalidRecord("AAAA"));
    }

    let mut octets = [0u8; 16];
    octets.copy_from_slice(&unpacker.unpack_bytes(16)?);
    Ok(ResourceRecord::AAAA(Ipv6Addr::from(octets)))
}

// rdata must end exactly where rdlength says it does
fn ensure_consumed(unpacker: &Unpacker, start: usize, length: u16, kind: &'static str) -> Result<()> {
    if unpacker.offset() - start != usize::from(length) {
        return Err(Error::InvalidRecord(kind));
    }
    Ok(())
}

// NS, CNAME and PTR
fn unpack_name_rdata(unpacker: &mut Unpacker, kind: &'static str) -> Result<String> {
    let length = unpacker.unpack_u16()?;
    let start = unpacker.offset();

    let name = unpacker.unpack_name()?;
    ensure_consumed(unpacker, start, length, kind)?;

    Ok(name)
}

fn unpack_soa(unpacker: &mut Unpacker) -> Result<ResourceRecord> {
    // two names of at least one byte each, then five u32
    let length = unpacker.unpack_u16()?;
    if length < 22 {
        return Err(Error::InvalidRecord("SOA"));
    }
    let start = unpacker.offset();

    let soa = Soa {
        primary: unpacker.unpack_name()?,
        responsible: unpacker.unpack_name()?,
        serial: unpacker.unpack_u32()?,
        refresh: unpacker.unpack_u32()?,
        retry: unpacker.unpack_u32()?,
        expire: unpacker.unpack_u32()?,
        minimum: unpacker.unpack_u32()?,
    };
    ensure_consumed(unpacker, start, length, "SOA")?;

    Ok(ResourceRecord::SOA(soa))
}

fn unpack_mx(unpacker: &mut Unpacker) -> Result<ResourceRecord> {
    let length = unpacker.unpack_u16()?;
    if length < 3 {
        return Err(Error::InvalidRecord("MX"));
    }
    let start = unpacker.offset();

    let preference = unpacker.unpack_u16()?;
    let name = unpacker.unpack_name()?;
    ensure_consumed(unpacker, start, length, "MX")?;

    Ok(ResourceRecord::MX { preference, name })
}

fn unpack_txt(unpacker: &mut Unpacker) -> Result<ResourceRecord> {
    let length = unpacker.unpack_u16()?;
    if length < 1 {
        return Err(Error::InvalidRecord("TXT"));
    }

    let len = unpacker.unpack_u8()?;
    if u16::from(len) != length - 1 {
        return Err(Error::InvalidRecord("TXT"));
    }

    Ok(ResourceRecord::TXT(unpacker.unpack_bytes(len as usize)?))
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceRecord::A(address) => write!(f, "{} [A]", address),
            ResourceRecord::NS(name) => write!(f, "{} [NS]", name),
            ResourceRecord::CNAME(name) => write!(f, "{} [CNAME]", name),
            ResourceRecord::SOA(soa) => write!(
                f,
                "Primary name server = {}, responsible authority's mailbox: {}, \
                 serial number: 0x{:08x}, refresh interval: 0x{:08x}, \
                 retry interval: 0x{:08x}, expire limit: 0x{:08x}, min_ttl: 0x{:08x}, [SOA]",
                soa.primary, soa.responsible, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum,
            ),
            ResourceRecord::MX { preference, name } => write!(f, "{} {} [MX]", preference, name),
            ResourceRecord::TXT(data) => write!(f, "{} [TXT]", String::from_utf8_lossy(data)),
            ResourceRecord::AAAA(address) => write!(f, "{} [AAAA]", address),
            ResourceRecord::PTR(name) => write!(f, "{} [PTR]", name),
            ResourceRecord::Unknown { rtype, data } => write!(
                f,
                "(Unknown record type 0x{:04x}: {})",
                rtype,
                String::from_utf8_lossy(data)
            ),
        }
    }
}
