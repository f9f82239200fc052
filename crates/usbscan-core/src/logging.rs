/// Append-only log file.
///
/// Every line is `<timestamp> <message>`, with a local timestamp in the
/// `2022-03-24 21:19:00,894` form. The file is opened once in append mode and
/// held by the subscriber for the life of the process. No rotation.
use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Local wall-clock timestamp for log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(TIMESTAMP_FORMAT))
    }
}

/// Open (or create) the log file for appending.
pub fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::LogFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Subscriber writing plain `<timestamp> <message>` lines to `file`.
pub fn file_subscriber(file: File) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_timer(LocalTimestamp)
        .with_level(false)
        .with_target(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish()
}

/// Install the file subscriber as the process-wide default.
pub fn init(path: &Path) -> Result<()> {
    let file = open_log(path)?;
    tracing::subscriber::set_global_default(file_subscriber(file))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn appends_timestamped_lines() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let path = tmp.path().join("usb_scan.log");
        fs::write(&path, "earlier run\n").unwrap();

        let subscriber = file_subscriber(open_log(&path).unwrap());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("usb_scan: Found USB device SanDisk Cruzer Blade");
            tracing::debug!("usb_scan: agent status unavailable");
        });

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3, "{contents}");
        assert_eq!(lines[0], "earlier run");
        assert!(lines[1].ends_with(" usb_scan: Found USB device SanDisk Cruzer Blade"));
        assert!(lines[2].ends_with(" usb_scan: agent status unavailable"));

        for line in &lines[1..] {
            let date = &line[..10];
            assert!(
                chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok(),
                "line does not start with a date: {line}"
            );
            assert!(!line.contains("INFO") && !line.contains("DEBUG"), "{line}");
        }
    }

    #[test]
    fn timestamp_has_millisecond_comma() {
        let stamp = chrono::NaiveDate::from_ymd_opt(2022, 3, 24)
            .unwrap()
            .and_hms_milli_opt(21, 19, 0, 894)
            .unwrap()
            .format(TIMESTAMP_FORMAT)
            .to_string();
        assert_eq!(stamp, "2022-03-24 21:19:00,894");
    }

    #[test]
    fn unopenable_path_is_reported() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let err = open_log(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::LogFile { .. }));
    }
}
