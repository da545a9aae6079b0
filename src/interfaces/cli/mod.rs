//! Command-line interface of the `gtoints` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::io::format::gtoints_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted GTOInts heading to the `gtoints-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    gtoints_output!("╭─────────────────────────────────────────────────────────────────────────────────────────────────────╮");
    gtoints_output!("│                                                                                                     │");
    gtoints_output!("│        ██████╗ ████████╗ ██████╗     ██╗███╗   ██╗████████╗███████╗                                 │");
    gtoints_output!("│       ██╔════╝ ╚══██╔══╝██╔═══██╗    ██║████╗  ██║╚══██╔══╝██╔════╝                                 │");
    gtoints_output!("│       ██║  ███╗   ██║   ██║   ██║    ██║██╔██╗ ██║   ██║   ███████╗                                 │");
    gtoints_output!("│       ██║   ██║   ██║   ██║   ██║    ██║██║╚██╗██║   ██║   ╚════██║                                 │");
    gtoints_output!("│       ╚██████╔╝   ██║   ╚██████╔╝    ██║██║ ╚████║   ██║   ███████║                                 │");
    gtoints_output!("│        ╚═════╝    ╚═╝    ╚═════╝     ╚═╝╚═╝  ╚═══╝   ╚═╝   ╚══════╝                                 │");
    gtoints_output!("│                                                                                                     │");
    gtoints_output!("│       Molecular integrals over contracted Gaussian-type orbitals                      {version:>13} │");
    gtoints_output!("╰─────────────────────────────────────────────────────────────────────────────────────────────────────╯");
    gtoints_output!("");
}

/// Command-line arguments of the `gtoints` binary.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// The YAML input configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// The output prefix. The main output is written to `<output>.out`.
    #[arg(short, long)]
    pub output: PathBuf,
}
