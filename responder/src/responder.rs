use std::net::SocketAddr;
use std::time::Duration;

use configuration::ResponderConfiguration;
use dns::constants::{FLAG_AA, RCODE_FORMAT_ERROR, RCODE_NAME_ERROR};
use dns_server::{HandlerResult, Transaction};

use crate::records::{RecordError, RecordTable};

/// Answers from the static table first, then forwards upstream if one is
/// configured, else NXDOMAIN.
#[derive(Debug)]
pub struct Responder {
    records: RecordTable,
    upstream: Option<(SocketAddr, Duration)>,
}

impl Responder {
    pub fn new(records: RecordTable, upstream: Option<(SocketAddr, Duration)>) -> Self {
        Self { records, upstream }
    }

    pub fn from_config(config: &ResponderConfiguration) -> Result<Self, RecordError> {
        let records = RecordTable::from_config(&config.records)?;
        let upstream = config.upstream.as_ref().map(|u| (u.server_address, u.timeout()));

        Ok(Self::new(records, upstream))
    }

    pub fn records(&self) -> &RecordTable {
        &self.records
    }

    pub fn handle(&self, transaction: &mut Transaction) -> HandlerResult {
        tracing::info!("{} from {}", transaction.request().brief(), transaction.peer());

        let question = match transaction.request().questions.first() {
            Some(q) => q.clone(),
            None => {
                transaction.error(RCODE_FORMAT_ERROR)?;
                return Ok(());
            }
        };

        let answers = self.records.lookup(&question);
        if !answers.is_empty() {
            transaction.response_mut().flags |= FLAG_AA;
            transaction.answer(answers)?;
        } else if let Some((upstream, timeout)) = self.upstream {
            // 交给上游，回复由转发任务发出
            transaction.passthrough(upstream, timeout)?;
        } else {
            transaction.error(RCODE_NAME_ERROR)?;
        }

        Ok(())
    }
}
