//! Command line exits shared by every binary.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::error;

use crate::error::FarmError;

/// Parse the command line. Anything but `--help` and `--version` that
/// clap rejects exits with code 1.
pub fn parse_or_exit<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            std::process::exit(1)
        }
    }
}

/// Report a configuration error with the usage line and exit with code 1.
pub fn exit_with_usage<P: CommandFactory>(err: &FarmError) -> ! {
    error!("{}", err);
    eprintln!("{err}");
    eprintln!("{}", P::command().render_usage());
    std::process::exit(1)
}
