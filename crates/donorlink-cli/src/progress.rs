use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for a blocking step
///
/// The spinner draws to stderr and stays hidden when stderr is not a terminal.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.red} {msg}") {
        pb.set_style(spinner_style.tick_strings(&["◐", "◓", "◑", "◒", "●"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Run `work` behind a spinner and finish it with the outcome
pub fn with_spinner<T, E>(
    message: &str,
    work: impl FnOnce() -> Result<T, E>,
    done: impl FnOnce(&T) -> String,
    failed: &str,
) -> Result<T, E> {
    let pb = create_spinner(message);
    let result = work();
    match &result {
        Ok(value) => pb.finish_with_message(format!("{} {}", style("✓").green(), done(value))),
        Err(_) => pb.finish_with_message(format!("{} {}", style("✗").red(), failed)),
    }
    result
}
