//! Output functions shared by the install-style commands

use super::context::UiContext;
use console::{style, StyledObject};

/// Plain-mode marker printed in front of a line
#[derive(Debug, Clone, Copy)]
enum Mark {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Mark {
    fn styled(self) -> StyledObject<&'static str> {
        match self {
            Mark::Ok => style("[OK]").green(),
            Mark::Warn => style("[WARN]").yellow(),
            Mark::Fail => style("[FAIL]").red(),
            Mark::Info => style("[INFO]").cyan(),
        }
    }

    fn log(self, message: String) {
        let result = match self {
            Mark::Ok => cliclack::log::success(message),
            Mark::Warn => cliclack::log::warning(message),
            Mark::Fail => cliclack::log::error(message),
            Mark::Info => cliclack::log::info(message),
        };
        result.ok();
    }
}

fn step(ctx: &UiContext, mark: Mark, message: String) {
    if ctx.use_fancy_output() {
        mark.log(message);
    } else {
        println!("  {} {}", mark.styled(), message);
    }
}

/// Command title, e.g. `boss install`
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
    }
}

pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("{} {}", Mark::Ok.styled(), message);
    }
}

pub fn outro_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).yellow().bold()).ok();
    } else {
        println!("{} {}", Mark::Warn.styled(), message);
    }
}

/// `horse (checked out)`
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    let detail = if ctx.use_fancy_output() {
        style(detail).dim().to_string()
    } else {
        detail.to_string()
    };
    step(ctx, Mark::Ok, format!("{} ({})", message, detail));
}

pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    step(ctx, Mark::Warn, format!("{} - {}", message, hint));
}

pub fn step_error(ctx: &UiContext, message: &str) {
    step(ctx, Mark::Fail, message.to_string());
}

pub fn step_info(ctx: &UiContext, message: &str) {
    step(ctx, Mark::Info, message.to_string());
}

/// Dimmed side note
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}
