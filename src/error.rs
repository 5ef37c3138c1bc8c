use thiserror::Error;

/// Errors produced while building instances or drawing frames.
///
/// Misuse such as stopping an instance twice or registering it twice is
/// accepted silently and never surfaces here.
#[derive(Error, Debug)]
pub enum Error {
    /// An instance was built with no animation frames.
    #[error("a progress instance needs at least one frame")]
    EmptyFrames,

    /// The redraw sink failed to write a frame.
    #[error("failed to redraw progress block")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
