//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.
//! Services never print; everything user-facing goes through here.

use std::io::{self, Write};

use colored::Colorize;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print an error as a JSON object to stderr (for `--json-only` callers)
pub fn json_error(message: &str, err: &(impl std::fmt::Display + ?Sized)) {
    // Nothing left to report to if stderr itself fails.
    let _ = write_json_error(&mut std::io::stderr(), message, err);
}

/// Write an error as a one-line JSON object `{"Message", "Error"}`.
pub fn write_json_error<W: Write + ?Sized>(
    out: &mut W,
    message: &str,
    err: &(impl std::fmt::Display + ?Sized),
) -> io::Result<()> {
    let doc = serde_json::json!({
        "Message": message,
        "Error": err.to_string(),
    });
    writeln!(out, "{doc}")
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print labelled value (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print labelled value with the value highlighted (green value)
pub fn value(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label, msg.to_string().green());
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print a highlighted block such as a JSON body (green)
pub fn highlight(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().green());
}

/// Print plain output (no color, for data meant to be piped)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}
