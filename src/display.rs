use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

/// Where rendered reports go, once per cycle.
pub trait DisplaySink: Send {
    fn display(&mut self, text: &str) -> io::Result<()>;
}

/// Clears the screen and redraws the whole report.
pub struct TerminalSink<W: Write + Send> {
    out: W,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        TerminalSink::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        TerminalSink { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> DisplaySink for TerminalSink<W> {
    fn display(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        // raw newlines do not return the cursor on every terminal
        for line in text.lines() {
            write!(self.out, "{line}\r\n")?;
        }
        self.out.flush()
    }
}

/// Appends each report as-is, for pipes and JSON lines.
pub struct LineSink<W: Write + Send> {
    out: W,
}

impl LineSink<io::Stdout> {
    pub fn stdout() -> Self {
        LineSink::new(io::stdout())
    }
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(out: W) -> Self {
        LineSink { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> DisplaySink for LineSink<W> {
    fn display(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }
}
