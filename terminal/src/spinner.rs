use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressFinish, ProgressStyle};

use crate as term;

pub struct Spinner {
    progress: ProgressBar,
    message: String,
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.progress.is_finished() {
            self.progress.finish_and_clear();
        }
    }
}

impl Spinner {
    pub fn finish(self) {
        self.progress.finish_and_clear();
        term::success!("{}", &self.message);
    }

    pub fn failed(self) {
        self.progress.finish_and_clear();
        term::eprintln(style("!!").red().reverse(), &self.message);
    }
}

/// Show a spinner on standard error until finished or dropped.
pub fn spinner(message: &str) -> Spinner {
    let message = message.to_owned();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&[
            &style("\\ ").yellow().to_string(),
            &style("| ").yellow().to_string(),
            &style("/ ").yellow().to_string(),
            &style("| ").yellow().to_string(),
        ])
        .template("{spinner} {msg}")
        .on_finish(ProgressFinish::AndClear);

    let progress = ProgressBar::with_draw_target(!0, ProgressDrawTarget::stderr());
    progress.set_style(style);
    progress.enable_steady_tick(99);
    progress.set_message(message.clone());

    Spinner { message, progress }
}
