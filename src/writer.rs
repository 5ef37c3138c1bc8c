use std::io::Write;

/// Overwrites the terminal's current progress block.
///
/// Receives the full multi-line block once per render tick. Every call
/// replaces whatever the previous call drew.
///
/// Any `FnMut(&str) -> io::Result<()>` closure is a sink, which keeps tests
/// and custom backends short:
///
/// ```rust,ignore
/// let multi = MultiProgress::with_sink(|block: &str| -> std::io::Result<()> {
///     eprintln!("{block}");
///     Ok(())
/// });
/// ```
pub trait RedrawSink {
    fn redraw(&mut self, block: &str) -> std::io::Result<()>;
}

impl<F> RedrawSink for F
where F: FnMut(&str) -> std::io::Result<()>
{
    fn redraw(&mut self, block: &str) -> std::io::Result<()> {
        self(block)
    }
}

/// Redraws the block in place with ANSI cursor control.
///
/// Remembers how many lines the last block occupied, moves the cursor back
/// up over them and clears to the end of the screen before writing.
pub struct TerminalSink<W: Write> {
    target: W,
    frame_lines: usize,
}

impl TerminalSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl TerminalSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(target: W) -> Self {
        Self {
            target,
            frame_lines: 0,
        }
    }

    /// Lines occupied by the last block written.
    pub fn frame_lines(&self) -> usize {
        self.frame_lines
    }

    pub fn get_ref(&self) -> &W {
        &self.target
    }

    fn clear_frame(&mut self) -> std::io::Result<()> {
        if self.frame_lines > 0 {
            write!(self.target, "\r\x1b[{}A\x1b[2K\x1b[J", self.frame_lines)?;
            self.target.flush()?;
        }
        self.frame_lines = 0;
        Ok(())
    }
}

impl<W: Write> RedrawSink for TerminalSink<W> {
    fn redraw(&mut self, block: &str) -> std::io::Result<()> {
        self.clear_frame()?;
        writeln!(self.target, "{block}")?;
        // writeln! adds one more line break than the block carries.
        self.frame_lines = block.matches('\n').count() + 1;
        self.target.flush()
    }
}
