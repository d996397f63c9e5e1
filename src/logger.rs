//! Terminal logging: every line gets a `[module]` prefix colored from a
//! small fixed palette, plus a debug channel gated behind `--verbose`.
//!
//! ```ignore
//! log!("build"; "compiling {} files", count);
//! ```

use crossterm::{execute, terminal::{Clear, ClearType}};
use owo_colors::OwoColorize;
use std::{
    io::{stdout, Write},
    sync::atomic::{AtomicBool, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Format and emit a line through [`log`].
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like [`log!`], but the line is dropped entirely unless `--verbose` was
/// passed.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Run a block only under `--verbose`, for debug output whose inputs are
/// themselves too expensive to build outside of it.
#[macro_export]
macro_rules! debug_do {
    ($($body:tt)*) => {{
        if $crate::logger::is_verbose() {
            $($body)*
        }
    }};
}

enum Tint {
    Blue,
    Green,
    Red,
    Yellow,
}

/// Lowercased module name -> tint, checked in declaration order. Any
/// module not listed here falls through to yellow.
const TINTS: &[(&str, Tint)] = &[("serve", Tint::Blue), ("build", Tint::Green), ("error", Tint::Red)];

fn tinted_prefix(module: &str) -> String {
    let lower = module.to_ascii_lowercase();
    let tint = TINTS.iter().find(|(name, _)| *name == lower).map_or(&Tint::Yellow, |(_, t)| t);
    let bracketed = format!("[{module}]");
    match tint {
        Tint::Blue => bracketed.bright_blue().bold().to_string(),
        Tint::Green => bracketed.bright_green().bold().to_string(),
        Tint::Red => bracketed.bright_red().bold().to_string(),
        Tint::Yellow => bracketed.bright_yellow().bold().to_string(),
    }
}

/// Write one prefixed, colored line to stdout, clearing any trailing
/// leftover from a previous longer line first.
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = tinted_prefix(module);
    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}
