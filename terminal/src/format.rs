pub use console::style;

pub fn tertiary<D: std::fmt::Display>(msg: D) -> String {
    style(msg).cyan().to_string()
}

pub fn highlight<D: std::fmt::Display>(input: D) -> String {
    style(input).green().bright().to_string()
}
