// Non-fatal problems noticed while producing a frame. In debug builds they
// are collected and, if any were seen, shown in a blocking dialog at the end
// of the frame before the process exits. Release builds only log them.

use crate::arena::FrameArena;
use std::fmt;

#[derive(Debug)]
pub struct Diagnostics {
    enabled: bool,
    messages: Vec<String>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(cfg!(debug_assertions))
    }
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            messages: Vec::new(),
        }
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        if self.enabled {
            self.messages.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drains everything recorded so far into one report. The report is
    /// assembled in a scratch scope of `arena`, which is released before
    /// returning.
    pub fn end_frame(&mut self, arena: &FrameArena) -> Option<String> {
        if !self.enabled || self.is_empty() {
            return None;
        }
        let lines = Lines(&self.messages);
        let scratch = arena.temp();
        let report = match scratch.arena().try_alloc_fmt(format_args!("{lines}")) {
            Ok(handle) if !handle.is_empty() => scratch.arena().resolve(handle).to_string(),
            _ => lines.to_string(),
        };
        scratch.end();
        self.messages.clear();
        Some(report)
    }
}

struct Lines<'a>(&'a [String]);

impl fmt::Display for Lines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

pub fn report_and_exit(report: &str) -> ! {
    log::error!("frame diagnostics:\n{report}");
    let _ = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Error")
        .set_description(report)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
    std::process::exit(1)
}
