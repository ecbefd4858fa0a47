use std::fmt;

use console::style;

use sshkeys_common::args::Error;

pub const TAB: &str = "   ";

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => ({
        $crate::io::success_args(format_args!($($arg)*));
    })
}

pub fn success_args(args: fmt::Arguments) {
    println!("{} {}", style("ok").green().reverse(), args);
}

pub use success;

pub fn blank() {
    eprintln!()
}

pub fn prefixed(prefix: &str, text: &str) -> String {
    text.split('\n')
        .map(|line| format!("{}{}\n", prefix, line))
        .collect()
}

pub fn help(name: &str, version: &str, description: &str, usage: &str) {
    println!("{} {}\n{}\n{}", name, version, description, usage);
}

pub fn usage(name: &str, usage: &str) {
    eprintln!(
        "{} {}\n{}",
        style("==").red(),
        style(format!("Error: {}: invalid usage", name)).red(),
        style(prefixed(TAB, usage)).red().dim()
    );
}

pub fn eprintln(prefix: impl fmt::Display, msg: impl fmt::Display) {
    eprintln!("{} {}", prefix, msg);
}

pub fn warning(warning: &str) {
    eprintln!(
        "{} {} {}",
        style("**").yellow(),
        style("Warning:").yellow().bold(),
        style(warning).yellow()
    );
}

pub fn error(error: impl fmt::Display) {
    eprintln!("{} {}", style("==").red(), style(error).red());
}

pub fn fail(header: &str, error: &anyhow::Error) {
    let err = error.to_string();
    let err = err.trim_end();
    let separator = if err.len() > 160 || err.contains('\n') {
        "\n"
    } else {
        " "
    };

    eprintln!(
        "{} {}{}{}",
        style("==").red(),
        style(header).red().reverse(),
        separator,
        style(err).red().bold(),
    );

    let cause = error.root_cause();
    if cause.to_string() != error.to_string() {
        eprintln!("{} {}", style("==").red().dim(), style(cause).red().dim());
        blank();
    }

    if let Some(Error::WithHint { hint, .. }) = error.downcast_ref::<Error>() {
        eprintln!("{} {}", style("==").yellow(), style(hint).yellow());
        blank();
    }
}
