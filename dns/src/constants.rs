// https://datatracker.ietf.org/doc/html/rfc1035#section-3.2.2

use std::fmt;

/// Maximum number of compression pointers followed while reading one name.
pub const MAX_RECURSION_DEPTH: usize = 16;

// RFC 952
pub const MAX_LABEL_LENGTH: usize = 63;
pub const MAX_NAME_LENGTH: usize = 253;

/// Largest offset a 14-bit compression pointer can hold.
pub const MAX_POINTER_OFFSET: usize = 0x3FFF;

pub const TYPE_A: u16 = 0x0001;
pub const TYPE_NS: u16 = 0x0002;
pub const TYPE_CNAME: u16 = 0x0005;
pub const TYPE_SOA: u16 = 0x0006;
pub const TYPE_PTR: u16 = 0x000c;
pub const TYPE_MX: u16 = 0x000f;
pub const TYPE_TXT: u16 = 0x0010;
pub const TYPE_AAAA: u16 = 0x001c;
pub const TYPE_ANY: u16 = 0x00ff;

pub const CLS_IN: u16 = 0x0001;

pub const OPCODE_QUERY: u8 = 0x0;
pub const OPCODE_IQUERY: u8 = 0x1;
pub const OPCODE_STATUS: u8 = 0x2;

// flags nibble, most significant bit first
pub const FLAG_AA: u8 = 0x8;
pub const FLAG_TC: u8 = 0x4;
pub const FLAG_RD: u8 = 0x2;
pub const FLAG_RA: u8 = 0x1;

pub const RCODE_SUCCESS: u8 = 0x0;
pub const RCODE_FORMAT_ERROR: u8 = 0x1;
pub const RCODE_SERVER_FAILURE: u8 = 0x2; // SERVFAIL
pub const RCODE_NAME_ERROR: u8 = 0x3; // NXDOMAIN
pub const RCODE_NOT_IMPLEMENTED: u8 = 0x4;
pub const RCODE_REFUSED: u8 = 0x5;

/// The QR bit of the header.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Qr {
    Query,
    Response,
}

impl Qr {
    pub fn from_bit(bit: u16) -> Self {
        if bit & 1 == 1 {
            Qr::Response
        } else {
            Qr::Query
        }
    }

    pub fn bit(self) -> u16 {
        match self {
            Qr::Query => 0,
            Qr::Response => 1,
        }
    }
}

impl fmt::Display for Qr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Qr::Query => "QUERY",
            Qr::Response => "RESPONSE",
        };
        write!(f, "{}", s)
    }
}

static TYPES: &[(u16, &str)] = &[
    (TYPE_A, "A"),
    (TYPE_NS, "NS"),
    (TYPE_CNAME, "CNAME"),
    (TYPE_SOA, "SOA"),
    (TYPE_PTR, "PTR"),
    (TYPE_MX, "MX"),
    (TYPE_TXT, "TXT"),
    (TYPE_AAAA, "AAAA"),
    (TYPE_ANY, "ANY"),
];

static CLASSES: &[(u16, &str)] = &[(CLS_IN, "IN")];

static OPCODES: &[(u8, &str)] = &[
    (OPCODE_QUERY, "OPCODE_QUERY"),
    (OPCODE_IQUERY, "OPCODE_IQUERY"),
    (OPCODE_STATUS, "OPCODE_STATUS"),
];

static RCODES: &[(u8, &str)] = &[
    (RCODE_SUCCESS, ":NoError (RCODE_SUCCESS)"),
    (RCODE_FORMAT_ERROR, ":FormErr (RCODE_FORMAT_ERROR)"),
    (RCODE_SERVER_FAILURE, ":ServFail (RCODE_SERVER_FAILURE)"),
    (RCODE_NAME_ERROR, ":NXDomain (RCODE_NAME_ERROR)"),
    (RCODE_NOT_IMPLEMENTED, ":NotImp (RCODE_NOT_IMPLEMENTED)"),
    (RCODE_REFUSED, ":Refused (RCODE_REFUSED)"),
];

fn lookup<K: PartialEq + Copy>(table: &'static [(K, &'static str)], key: K) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, name)| *name)
}

pub fn type_name(rtype: u16) -> Option<&'static str> {
    lookup(TYPES, rtype)
}

/// Case-insensitive reverse of [`type_name`].
pub fn type_from_name(name: &str) -> Option<u16> {
    TYPES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}

pub fn class_name(class: u16) -> Option<&'static str> {
    lookup(CLASSES, class)
}

pub fn opcode_name(opcode: u8) -> Option<&'static str> {
    lookup(OPCODES, opcode)
}

pub fn rcode_name(rcode: u8) -> Option<&'static str> {
    lookup(RCODES, rcode)
}

/// Renders a flags nibble as `AA|TC|RD|RA`, omitting the bits that are clear.
pub fn flags_to_string(flags: u8) -> String {
    let names = [(FLAG_AA, "AA"), (FLAG_TC, "TC"), (FLAG_RD, "RD"), (FLAG_RA, "RA")];

    names
        .iter()
        .filter(|(bit, _)| flags & bit == *bit)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join("|")
}

/// `A`, or `<0x1337?>` for codes without a name.
pub(crate) fn type_label(rtype: u16) -> String {
    match type_name(rtype) {
        Some(name) => name.to_string(),
        None => format!("<0x{:04x}?>", rtype),
    }
}

pub(crate) fn class_label(class: u16) -> String {
    match class_name(class) {
        Some(name) => name.to_string(),
        None => format!("<0x{:04x}?>", class),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_to_string_test() {
        assert_eq!(flags_to_string(FLAG_AA | FLAG_TC | FLAG_RD | FLAG_RA), "AA|TC|RD|RA");
        assert_eq!(flags_to_string(FLAG_RD | FLAG_RA), "RD|RA");
        assert_eq!(flags_to_string(0), "");
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(TYPE_MX), Some("MX"));
        assert_eq!(type_name(0x1337), None);
        assert_eq!(type_from_name("aaaa"), Some(TYPE_AAAA));
        assert_eq!(type_from_name("bogus"), None);
        assert_eq!(type_label(0x1234), "<0x1234?>");
    }

    #[test]
    fn qr_bit() {
        assert_eq!(Qr::from_bit(1), Qr::Response);
        assert_eq!(Qr::from_bit(0), Qr::Query);
        assert_eq!(Qr::Response.bit(), 1);
    }
}
