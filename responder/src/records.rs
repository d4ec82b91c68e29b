use std::net::{Ipv4Addr, Ipv6Addr};

use configuration::RecordConfiguration;
use dns::constants::{type_from_name, CLS_IN, TYPE_A, TYPE_AAAA, TYPE_ANY, TYPE_CNAME, TYPE_MX, TYPE_NS, TYPE_PTR, TYPE_SOA, TYPE_TXT};
use dns::{Answer, Question, ResourceRecord, Soa};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("{name}: unsupported record type '{rtype}'")]
    UnknownType { name: String, rtype: String },

    #[error("{name}: bad {rtype} value '{value}'")]
    BadValue {
        name: String,
        rtype: String,
        value: String,
    },

    #[error("bad record name: {0}")]
    BadName(#[from] dns::Error),
}

#[derive(Debug, Clone)]
struct Record {
    name: String,
    rtype: u16,
    ttl: u32,
    rr: ResourceRecord,
}

/// The static records a responder answers with.
#[derive(Debug, Default)]
pub struct RecordTable {
    records: Vec<Record>,
}

impl RecordTable {
    pub fn from_config(records: &[RecordConfiguration]) -> Result<Self, RecordError> {
        let mut table = Self::default();

        for record in records {
            dns::validate_name(&record.name)?;

            let rtype = match type_from_name(&record.rtype) {
                Some(rtype) if rtype != TYPE_ANY => rtype,
                _ => {
                    return Err(RecordError::UnknownType {
                        name: record.name.clone(),
                        rtype: record.rtype.clone(),
                    })
                }
            };

            let rr = parse_value(rtype, &record.value).ok_or_else(|| RecordError::BadValue {
                name: record.name.clone(),
                rtype: record.rtype.clone(),
                value: record.value.clone(),
            })?;

            table.records.push(Record {
                name: record.name.trim_end_matches('.').to_string(),
                rtype,
                ttl: record.ttl,
                rr,
            });
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record matching the question's name and type, or all types for
    /// ANY. Names compare case-insensitively. The answers carry the name as
    /// asked so they compress against the question.
    pub fn lookup(&self, question: &Question) -> Vec<Answer> {
        if question.class != CLS_IN {
            return Vec::new();
        }

        let name = question.name.trim_end_matches('.');
        self.records
            .iter()
            .filter(|r| r.name.eq_ignore_ascii_case(name))
            .filter(|r| question.rtype == TYPE_ANY || question.rtype == r.rtype)
            .map(|r| Answer::new(&question.name, r.rtype, CLS_IN, r.ttl, r.rr.clone()))
            .collect()
    }
}

fn parse_value(rtype: u16, value: &str) -> Option<ResourceRecord> {
    let value = value.trim();

    let rr = match rtype {
        TYPE_A => ResourceRecord::A(value.parse::<Ipv4Addr>().ok()?),
        TYPE_AAAA => ResourceRecord::AAAA(value.parse::<Ipv6Addr>().ok()?),
        TYPE_NS => ResourceRecord::NS(parse_name(value)?),
        TYPE_CNAME => ResourceRecord::CNAME(parse_name(value)?),
        TYPE_PTR => ResourceRecord::PTR(parse_name(value)?),
        TYPE_MX => {
            // "10 mail.test.com"
            let mut fields = value.split_whitespace();
            let preference = fields.next()?.parse().ok()?;
            let name = parse_name(fields.next()?)?;
            if fields.next().is_some() {
                return None;
            }
            ResourceRecord::MX { preference, name }
        }
        TYPE_TXT => {
            if value.len() > 255 {
                return None;
            }
            ResourceRecord::TXT(value.as_bytes().to_vec())
        }
        TYPE_SOA => {
            // primary responsible serial refresh retry expire minimum
            let fields: Vec<&str> = value.split_whitespace().collect();
            if fields.len() != 7 {
                return None;
            }
            let mut numbers = [0u32; 5];
            for (n, field) in numbers.iter_mut().zip(&fields[2..]) {
                *n = field.parse().ok()?;
            }
            ResourceRecord::SOA(Soa {
                primary: parse_name(fields[0])?,
                responsible: parse_name(fields[1])?,
                serial: numbers[0],
                refresh: numbers[1],
                retry: numbers[2],
                expire: numbers[3],
                minimum: numbers[4],
            })
        }
        _ => return None,
    };

    Some(rr)
}

fn parse_name(value: &str) -> Option<String> {
    dns::validate_name(value).ok()?;
    Some(value.trim_end_matches('.').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, rtype: &str, value: &str) -> RecordConfiguration {
        RecordConfiguration {
            name: name.to_string(),
            rtype: rtype.to_string(),
            value: value.to_string(),
            ttl: 300,
        }
    }

    fn table() -> RecordTable {
        RecordTable::from_config(&[
            record("test.com", "A", "1.2.3.4"),
            record("test.com", "aaaa", "::1"),
            record("test.com", "MX", "10 mail.test.com"),
            record("test.com.", "TXT", "hello"),
            record("test.com", "SOA", "ns1.test.com admin.test.com 1 7200 3600 604800 300"),
            record("www.test.com", "CNAME", "test.com."),
            record("4.3.2.1.in-addr.arpa", "PTR", "test.com"),
        ])
        .unwrap()
    }

    #[test]
    fn from_config_test() {
        let table = table();
        assert_eq!(table.len(), 7);
        assert!(!table.is_empty());
    }

    #[test]
    fn lookup_by_type() {
        let table = table();

        let answers = table.lookup(&Question::new("test.com", TYPE_A, CLS_IN));
        assert_eq!(answers, vec![Answer::new("test.com", TYPE_A, CLS_IN, 300, ResourceRecord::A([1, 2, 3, 4].into()))]);

        let answers = table.lookup(&Question::new("test.com", TYPE_MX, CLS_IN));
        assert_eq!(answers[0].rr, ResourceRecord::MX { preference: 10, name: "mail.test.com".into() });

        let answers = table.lookup(&Question::new("www.test.com", TYPE_CNAME, CLS_IN));
        assert_eq!(answers[0].rr, ResourceRecord::CNAME("test.com".into()));

        let answers = table.lookup(&Question::new("test.com", TYPE_SOA, CLS_IN));
        match &answers[0].rr {
            ResourceRecord::SOA(soa) => {
                assert_eq!(soa.primary, "ns1.test.com");
                assert_eq!(soa.expire, 604800);
                assert_eq!(soa.minimum, 300);
            }
            other => panic!("unexpected record {}", other),
        }

        assert!(table.lookup(&Question::new("test.com", TYPE_NS, CLS_IN)).is_empty());
        assert!(table.lookup(&Question::new("other.com", TYPE_A, CLS_IN)).is_empty());
    }

    #[test]
    fn lookup_any_and_case() {
        let table = table();

        let answers = table.lookup(&Question::new("TEST.com.", TYPE_ANY, CLS_IN));
        assert_eq!(answers.len(), 5);
        // the asked-for spelling is echoed back
        assert!(answers.iter().all(|a| a.name == "TEST.com."));

        // only IN is served
        assert!(table.lookup(&Question::new("test.com", TYPE_A, 3)).is_empty());
    }

    #[test]
    fn rejects_bad_records() {
        let bad = [
            record("test.com", "HINFO", "x"),
            record("test.com", "ANY", "x"),
            record("test.com", "A", "1.2.3"),
            record("test.com", "AAAA", "1.2.3.4"),
            record("test.com", "MX", "mail.test.com"),
            record("test.com", "MX", "10 mail.test.com extra"),
            record("test.com", "CNAME", "bad name"),
            record("test.com", "SOA", "ns1.test.com admin.test.com 1 2 3"),
            record("test.com", "TXT", &"A".repeat(256)),
        ];
        for r in &bad {
            assert!(RecordTable::from_config(std::slice::from_ref(r)).is_err(), "{:?}", r);
        }

        assert!(matches!(
            RecordTable::from_config(&[record("bad_name.com", "A", "1.2.3.4")]),
            Err(RecordError::BadName(_))
        ));
    }
}
