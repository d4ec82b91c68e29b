use std::fmt;

use crate::answer::Answer;
use crate::constants::*;
use crate::error::{Error, Result};
use crate::header::Header;
use crate::packer::Packer;
use crate::question::Question;
use crate::unpacker::Unpacker;

/// A whole DNS message: header, questions and answers.
///
/// Authority and additional records are never produced, and are skipped
/// when parsing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Packet {
    pub trn_id: u16,
    pub qr: Qr,
    pub opcode: u8,
    pub flags: u8,
    pub rcode: u8,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
}

impl Packet {
    pub fn new(trn_id: u16, qr: Qr, opcode: u8, flags: u8, rcode: u8) -> Self {
        Self {
            trn_id,
            qr,
            opcode,
            flags,
            rcode,
            questions: Vec::new(),
            answers: Vec::new(),
        }
    }

    /// A recursive query carrying one question.
    pub fn query(trn_id: u16, question: Question) -> Self {
        let mut packet = Self::new(trn_id, Qr::Query, OPCODE_QUERY, FLAG_RD, RCODE_SUCCESS);
        packet.add_question(question);
        packet
    }

    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    pub fn add_answer(&mut self, answer: Answer) {
        self.answers.push(answer);
    }

    // 解析 DNS 报文
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut unpacker = Unpacker::new(data);
        let header = Header::unpack(&mut unpacker)?;

        let mut packet = Self::new(header.id, header.qr, header.opcode, header.flags, header.rcode);

        for _ in 0..header.qdcount {
            packet.add_question(Question::unpack(&mut unpacker)?);
        }
        for _ in 0..header.ancount {
            packet.add_answer(Answer::unpack(&mut unpacker)?);
        }

        Ok(packet)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let qdcount = u16::try_from(self.questions.len()).map_err(|_| Error::TooManyRecords)?;
        let ancount = u16::try_from(self.answers.len()).map_err(|_| Error::TooManyRecords)?;

        let header = Header {
            id: self.trn_id,
            qr: self.qr,
            opcode: self.opcode,
            flags: self.flags,
            rcode: self.rcode,
            qdcount,
            ancount,
            nscount: 0,
            arcount: 0,
        };

        // one packer for the whole message, so names compress across sections
        let mut packer = Packer::new();
        header.pack(&mut packer)?;
        for q in &self.questions {
            q.pack(&mut packer)?;
        }
        for a in &self.answers {
            a.pack(&mut packer)?;
        }

        Ok(packer.into_bytes())
    }

    /// The response to this request: same id, recursion desired and
    /// available, echoing `question` or else the request's first question.
    pub fn answer(&self, answers: Vec<Answer>, question: Option<Question>) -> Self {
        let mut packet = Self::new(
            self.trn_id,
            Qr::Response,
            OPCODE_QUERY,
            FLAG_RD | FLAG_RA,
            RCODE_SUCCESS,
        );
        packet.questions = question.or_else(|| self.questions.first().cloned()).into_iter().collect();
        packet.answers = answers;
        packet
    }

    /// Like [`answer`](Self::answer), with no answers and the given rcode.
    pub fn error(&self, rcode: u8, question: Option<Question>) -> Self {
        let mut packet = self.answer(Vec::new(), question);
        packet.rcode = rcode;
        packet
    }

    /// One-line summary, e.g. `Request for test.com [A IN]`.
    pub fn brief(&self) -> String {
        let question = match self.questions.first() {
            Some(q) => q.to_string(),
            None => "<unknown>".to_string(),
        };

        if self.rcode != RCODE_SUCCESS {
            return format!(
                "Request for {}: error: {}",
                question,
                rcode_name(self.rcode).unwrap_or("unknown")
            );
        }

        match (self.qr, self.answers.first()) {
            (Qr::Query, _) => format!("Request for {}", question),
            (Qr::Response, None) => format!("Response for {}: n/a", question),
            (Qr::Response, Some(first)) => format!(
                "Response for {}: {} (and {} others)",
                question,
                first,
                self.answers.len() - 1
            ),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DNS {}: id=0x{:04x}, opcode = {}, flags = {}, rcode = {}, qdcount = 0x{:04x}, ancount = 0x{:04x}",
            self.qr,
            self.trn_id,
            opcode_name(self.opcode).unwrap_or("unknown opcode"),
            flags_to_string(self.flags),
            rcode_name(self.rcode).unwrap_or("unknown"),
            self.questions.len(),
            self.answers.len(),
        )?;

        for q in &self.questions {
            write!(f, "\n    Question: {}", q)?;
        }
        for a in &self.answers {
            write!(f, "\n    Answer: {}", a)?;
        }

        Ok(())
    }
}
