//! Turning relay events into terminal text.

use std::io::{self, Write};

use tether_core::{ConsoleEvent, Report};

/// Text for one event. Acknowledgments of sent commands stay short.
pub fn render(event: &ConsoleEvent) -> String {
    match event {
        ConsoleEvent::Report(Report::Status(record)) => format!("\n{record}\n"),
        ConsoleEvent::Report(report) => report.to_string(),
        ConsoleEvent::Sent(command) => format!("> {command}"),
        ConsoleEvent::BadKey(key) => format!("BAD COMMAND '{}'", key.escape_default()),
        ConsoleEvent::Closed => "Session closed".into(),
    }
}

/// Write `text` on its own lines. Raw mode needs explicit carriage returns.
pub fn print_raw(out: &mut impl Write, text: &str) -> io::Result<()> {
    for line in text.split('\n') {
        write!(out, "{line}\r\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{DeviceCommand, ResponseCode, TelemetryRecord};

    #[test]
    fn renders_each_event() {
        assert_eq!(
            render(&ConsoleEvent::Report(Report::Ack)),
            "Command / Status OK"
        );
        assert_eq!(
            render(&ConsoleEvent::Report(Report::Failure(ResponseCode::BadChecksum))),
            "BAD CHECKSUM FROM DEVICE"
        );
        assert_eq!(render(&ConsoleEvent::Sent(DeviceCommand::Stop)), "> Stop");
        assert_eq!(render(&ConsoleEvent::BadKey('x')), "BAD COMMAND 'x'");
        assert!(render(&ConsoleEvent::Report(Report::Status(TelemetryRecord::default())))
            .contains("STATUS REPORT"));
    }

    #[test]
    fn raw_output_uses_crlf() {
        let mut out = Vec::new();
        print_raw(&mut out, "a\nb").unwrap();
        assert_eq!(out, b"a\r\nb\r\n");
    }
}
