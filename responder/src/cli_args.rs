use std::path::PathBuf;
use argh::FromArgs;

fn default_config_path() -> PathBuf {
    PathBuf::from("./responder.toml")
}

#[derive(Debug, FromArgs)]
#[argh(description = "answer DNS queries from static records, forwarding the rest upstream")]
pub struct CliArgs {
    #[argh(
        option,
        description = "config file path, default: './responder.toml'",
        default = "default_config_path()"
    )]
    pub config: PathBuf,
}
