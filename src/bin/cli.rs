// src/bin/cli.rs
use color_eyre::eyre::eyre;
use ncaa_store::{cli, log};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let params = cli::parse_args(std::env::args().skip(1)).map_err(|e| eyre!(e))?;
    log::init(params.options.log_file.as_deref());

    match cli::run(&params) {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => Err(eyre!(e)),
    }
}
