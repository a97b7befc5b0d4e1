//! Terminal output for boss commands
//!
//! Uses `cliclack` log lines on an interactive terminal and falls back to
//! plain bracketed markers in CI or when output is piped.

mod context;
mod output;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, remark, step_error, step_info, step_ok_detail,
    step_warn_hint,
};
