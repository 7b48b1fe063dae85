//! Audit spinner and a tracing writer that prints above it.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

static BARS: OnceLock<MultiProgress> = OnceLock::new();

fn bars() -> &'static MultiProgress {
    BARS.get_or_init(|| {
        let bars = MultiProgress::new();
        bars.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        bars
    })
}

/// Spinner shown while an audit runs; hidden when `quiet` (JSON output)
pub fn spinner(message: impl Into<String>, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = bars().add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Replace the spinner with a one-line outcome, e.g. the audit score
pub fn finish_spinner(bar: &ProgressBar, outcome: impl Into<String>) {
    if bar.is_hidden() {
        return;
    }
    if let Ok(style) = ProgressStyle::with_template("{msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.finish_with_message(outcome.into());
}

/// `MakeWriter` that keeps log lines from tearing the spinner
#[derive(Default, Clone)]
pub struct LogWriterFactory;

/// Buffers partial writes and prints whole lines
pub struct LogWriter {
    pending: Vec<u8>,
}

impl LogWriter {
    fn take_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            lines.push(
                String::from_utf8_lossy(&raw)
                    .trim_end_matches(['\r', '\n'])
                    .to_string(),
            );
        }
        lines
    }

    fn print(lines: Vec<String>) {
        for line in lines {
            let _ = bars().println(line);
        }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Self::print(self.take_lines());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Self::print(self.take_lines());
        if !self.pending.is_empty() {
            let rest = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            Self::print(vec![rest]);
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            pending: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_spinner_is_hidden() {
        let bar = spinner("Auditing https://acme.example/", true);
        assert!(bar.is_hidden());
        finish_spinner(&bar, "done");
    }

    #[test]
    fn test_writer_splits_whole_lines() {
        let mut writer = LogWriter {
            pending: b"INFO audit started\r\nINFO sc".to_vec(),
        };
        assert_eq!(writer.take_lines(), vec!["INFO audit started".to_string()]);
        assert_eq!(writer.pending, b"INFO sc".to_vec());

        writer.pending.extend_from_slice(b"ore=81\n");
        assert_eq!(writer.take_lines(), vec!["INFO score=81".to_string()]);
        assert!(writer.pending.is_empty());
    }
}
