#![doc = include_str!("../README.md")]

pub(crate) mod error;
pub mod format;
pub mod frames;
pub(crate) mod instance;
#[cfg(feature = "layer")]
pub(crate) mod layer;
pub(crate) mod multi;
pub(crate) mod writer;


/// Re-exports of all public types and traits.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::format::{AnsiColors, Colorize, DefaultFormat, NoColor};
    pub use crate::instance::{Formatter, InstanceBuilder, ProgressInstance};
    #[cfg(feature = "layer")]
    pub use crate::layer::ProgressLayer;
    pub use crate::multi::{DEFAULT_INTERVAL, MultiProgress};
    pub use crate::writer::{RedrawSink, TerminalSink};
}

pub use crate::prelude::*;
