use std::process;

use anyhow::{self, format_err};
use clap::Parser;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use gtoints::interfaces::cli::{log_heading, Cli};
use gtoints::interfaces::input::Input;
use gtoints::interfaces::InputHandle;
use gtoints::io::read_gtoints_yaml;

fn configure_logging(cli: &Cli) -> Result<(), anyhow::Error> {
    let mut output_path = cli.output.clone();
    output_path.set_extension("out");
    let output_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .append(false)
        .build(output_path)?;
    let debug_path = {
        let mut path = cli.output.clone();
        path.set_extension("log");
        path
    };
    let debug_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}",
        )))
        .append(false)
        .build(debug_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("gtoints-output", Box::new(output_appender)))
        .appender(Appender::builder().build("gtoints-log", Box::new(debug_appender)))
        .logger(
            Logger::builder()
                .appender("gtoints-output")
                .additive(false)
                .build("gtoints-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("gtoints-log").build(LevelFilter::Warn))
        .map_err(|err| format_err!(err))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), anyhow::Error> {
    log_heading();
    let input: Input = read_gtoints_yaml(&cli.config)?;
    input.handle()
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = configure_logging(&cli) {
        eprintln!("Unable to configure logging: {err}");
        process::exit(1);
    }
    if let Err(err) = run(&cli) {
        log::error!("{err}");
        eprintln!("{err}");
        process::exit(1);
    }
}
