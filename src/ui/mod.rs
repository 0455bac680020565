//! UI module for consistent CLI output
//!
//! Uses `cliclack` step logging in interactive terminals with automatic
//! fallback to plain `[OK]`/`[WARN]` lines in CI and when piped.
//!
//! # Example
//!
//! ```rust,ignore
//! use dvc::ui::{self, UiContext};
//!
//! let ctx = UiContext::detect();
//! ui::step_ok_detail(&ctx, "Added data", "data.dvc");
//! ui::step_warn_hint(&ctx, "Could not restore model.pkl", "missing from cache");
//! ```

mod context;
mod output;

pub use context::UiContext;
pub use output::{key_value, remark, step_info, step_ok, step_ok_detail, step_warn_hint};
