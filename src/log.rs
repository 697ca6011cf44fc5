//! Colored console output.
//!
//! Every line carries the `[folio]` prefix. Debug lines are only printed
//! when `FOLIO_DEBUG` is set to a non-empty value.

use std::sync::OnceLock;

use colored::Colorize;

const PREFIX: &str = "[folio]";

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

fn debug_enabled() -> bool {
    *DEBUG_ENABLED.get_or_init(|| {
        std::env::var("FOLIO_DEBUG")
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    })
}

pub fn info(message: &str) {
    println!("{} {}", PREFIX.blue(), message.green());
}

pub fn warn(message: &str) {
    println!("{} {}", PREFIX.yellow(), format!("[WARN] {message}").yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", PREFIX.red(), format!("error: {message}").red());
}

pub fn debug(message: &str) {
    if debug_enabled() {
        println!("{} {}", PREFIX.yellow(), message.dimmed());
    }
}
