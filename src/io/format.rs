//! Formatted output of integral calculations.

use std::fmt;

use log;

const GTOINTS_BANNER_LENGTH: usize = 103;

/// Logs an error to the `gtoints-output` logger as well as the default logger.
macro_rules! gtoints_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "gtoints-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `gtoints-output` logger.
macro_rules! gtoints_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "gtoints-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `gtoints-output` logger.
macro_rules! gtoints_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "gtoints-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {gtoints_error, gtoints_output, gtoints_warn};

/// Logs a section title framed by a box.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(GTOINTS_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    gtoints_output!("┌──{bar}──┐");
    gtoints_output!("│§ {title:^length$} §│");
    gtoints_output!("└──{bar}──┘");
}

/// Writes an underlined subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs an underlined subtitle.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    gtoints_output!("{}", subtitle);
    gtoints_output!("{}", bar);
}

/// Logs the beginning of a macro-section.
pub(crate) fn log_macsec_begin(sectitle: &str) {
    let width = GTOINTS_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    gtoints_output!("❬❬❬❬❬ [Begin] {sectitle_space:❬<width$}");
}

/// Logs the end of a macro-section.
pub(crate) fn log_macsec_end(sectitle: &str) {
    let width = GTOINTS_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    gtoints_output!("❭❭❭❭❭ [ End ] {sectitle_space:❭<width$}");
}

/// Logs the beginning of a micro-section.
pub(crate) fn log_micsec_begin(sectitle: &str) {
    let width = GTOINTS_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    gtoints_output!("‹‹‹‹‹ [Begin] {sectitle_space:‹<width$}");
}

/// Logs the end of a micro-section.
pub(crate) fn log_micsec_end(sectitle: &str) {
    let width = GTOINTS_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    gtoints_output!("››››› [ End ] {sectitle_space:›<width$}");
}

/// Turns a boolean into `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// Line-by-line logging of displayable structures to the `gtoints-output` logger.
pub(crate) trait GtoIntsOutput: fmt::Debug + fmt::Display {
    /// Logs the `Display` output.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            gtoints_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> GtoIntsOutput for T where T: fmt::Debug + fmt::Display {}
