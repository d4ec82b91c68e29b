use std::error::Error;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use argh::FromArgs;
use dns::constants::{type_from_name, CLS_IN};
use dns::Question;
use log::{debug, error};

fn default_server() -> SocketAddr {
    SocketAddr::from(([8, 8, 8, 8], 53))
}

#[derive(Debug, FromArgs)]
#[argh(description = "send one DNS query and print the response")]
struct ProbeArgs {
    #[argh(positional, description = "name to look up")]
    name: String,

    #[argh(option, long = "type", short = 't', default = "String::from(\"A\")", description = "record type, default: A")]
    rtype: String,

    #[argh(option, short = 's', default = "default_server()", description = "DNS server, default: 8.8.8.8:53")]
    server: SocketAddr,

    #[argh(option, default = "3", description = "seconds to wait for the answer, default: 3")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let _ = env_logger::try_init();

    let args: ProbeArgs = argh::from_env();
    let rtype = match type_from_name(&args.rtype) {
        Some(rtype) => rtype,
        None => {
            error!("unknown record type: {}", args.rtype);
            return Ok(ExitCode::FAILURE);
        }
    };

    let question = Question::new(&args.name, rtype, CLS_IN);
    debug!("asking {} for {}", args.server, question);

    let timeout = Duration::from_secs(args.timeout);
    match dns_server::query(args.server, question, timeout).await {
        Ok(response) => {
            println!("{}", response);
            Ok(ExitCode::SUCCESS)
        }
        Err(dns_server::Error::Timeout(t)) => {
            error!("no response from {} after {:?}", args.server, t);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
