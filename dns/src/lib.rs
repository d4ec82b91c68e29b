// https://datatracker.ietf.org/doc/html/rfc1035#section-4.1

mod answer;
pub mod constants;
mod error;
mod header;
mod packer;
mod packet;
mod question;
mod resource_record;
mod unpacker;
mod utils;

pub use answer::Answer;
pub use constants::Qr;
pub use error::{Error, Result};
pub use header::Header;
pub use packer::Packer;
pub use packet::Packet;
pub use question::Question;
pub use resource_record::{ResourceRecord, Soa};
pub use unpacker::Unpacker;
pub use utils::validate_name;
