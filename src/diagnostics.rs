//! Crash diagnostics.
//!
//! A panic on the device ends in a reset, and the serial console is rarely
//! attached when that happens.  The hook installed here writes the panic
//! reason to the `log` facade and, when a [`FileLog`] is supplied, appends a
//! `CRITICAL` line to the persistent log file before the default handler
//! aborts.

use std::panic::PanicHookInfo;

use crate::adapters::log_sink::FileLog;
use crate::app::events::Severity;

/// Best-effort extraction of the panic message.
pub fn panic_reason<'a>(info: &'a PanicHookInfo<'_>) -> &'a str {
    if let Some(msg) = info.payload().downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = info.payload().downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// One-line crash record, `FATAL SYSTEM ERROR at file:line: reason`.
pub fn crash_line(reason: &str, location: Option<(&str, u32)>) -> String {
    match location {
        Some((file, line)) => format!("FATAL SYSTEM ERROR at {}:{}: {}", file, line, reason),
        None => format!("FATAL SYSTEM ERROR: {}", reason),
    }
}

/// Install a panic hook that records the crash before reset.
///
/// Must be called once during init, after the filesystem is mounted.  A
/// failed file write is ignored; the serial log line is always emitted.
pub fn install_panic_handler(file: Option<FileLog>) {
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map(|l| (l.file(), l.line()));
        let line = crash_line(panic_reason(info), location);

        log::error!("{}", line);
        if let Some(file) = &file {
            file.append(Severity::Critical, &line);
        }
    }));
}
