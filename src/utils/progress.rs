//! Build progress bar. Without the `progress` feature every call compiles to nothing.

#[cfg(feature = "progress")]
pub use indicatif::{ProgressBar, ProgressStyle};

#[cfg(not(feature = "progress"))]
pub use self::noop::*;

#[cfg(not(feature = "progress"))]
mod noop {
    use std::borrow::Cow;

    #[derive(Clone)]
    pub struct ProgressBar;

    impl ProgressBar {
        pub fn new(_len: u64) -> Self {
            ProgressBar
        }

        pub fn set_style(&self, _style: ProgressStyle) {}
        pub fn set_message(&self, _msg: impl Into<Cow<'static, str>>) {}
        pub fn inc(&self, _delta: u64) {}
        pub fn finish_with_message(&self, _msg: impl Into<Cow<'static, str>>) {}
    }

    pub struct ProgressStyle;

    impl ProgressStyle {
        pub fn default_bar() -> Self {
            ProgressStyle
        }

        pub fn template(self, _template: &str) -> Result<Self, std::convert::Infallible> {
            Ok(self)
        }

        pub fn progress_chars(self, _chars: &str) -> Self {
            self
        }
    }
}
