//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::{style, StyledObject};

/// Kind of progress line
#[derive(Debug, Clone, Copy)]
enum Step {
    Ok,
    Warn,
    Info,
}

impl Step {
    fn tag(self) -> StyledObject<&'static str> {
        match self {
            Self::Ok => style("[OK]").green(),
            Self::Warn => style("[WARN]").yellow(),
            Self::Info => style("[INFO]").cyan(),
        }
    }
}

fn emit(ctx: &UiContext, step: Step, message: &str) {
    if ctx.use_fancy_output() {
        let _ = match step {
            Step::Ok => cliclack::log::success(message),
            Step::Warn => cliclack::log::warning(message),
            Step::Info => cliclack::log::info(message),
        };
    } else {
        println!("  {} {}", step.tag(), message);
    }
}

/// Display a success step
pub fn step_ok(ctx: &UiContext, message: &str) {
    emit(ctx, Step::Ok, message);
}

/// Display a success step with detail
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    let detail = if ctx.use_fancy_output() {
        style(detail).dim().to_string()
    } else {
        detail.to_string()
    };
    emit(ctx, Step::Ok, &format!("{} ({})", message, detail));
}

/// Display a warning step with hint
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    let hint = if ctx.use_fancy_output() {
        style(hint).dim().to_string()
    } else {
        hint.to_string()
    };
    emit(ctx, Step::Warn, &format!("{} - {}", message, hint));
}

/// Display an info step
pub fn step_info(ctx: &UiContext, message: &str) {
    emit(ctx, Step::Info, message);
}

/// Display a remark/hint
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        let _ = cliclack::log::remark(message);
    } else {
        println!("  {}", style(message).dim());
    }
}

/// Print styled key-value pair
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("{}: {}", key, value);
    }
}
