//! Log output: stderr by default, or appended to a plain file.
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Writer for log lines. A file is created if missing and always appended to.
pub fn make_writer(log_file: Option<&Path>) -> io::Result<BoxMakeWriter> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(io::stderr));
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`.
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer(log_file)?)
        .with_ansi(log_file.is_none())
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn file_writer_appends() {
        let td = tempdir().unwrap();
        let path = td.path().join("logs").join("steam_news.log");
        for line in ["first", "second"] {
            let make = make_writer(Some(&path)).unwrap();
            let mut w = make.make_writer();
            writeln!(w, "{line}").unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn events_land_in_the_file() {
        let td = tempdir().unwrap();
        let path = td.path().join("steam_news.log");
        let subscriber = tracing_subscriber::fmt()
            .with_writer(make_writer(Some(&path)).unwrap())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(appid = 427520, "announcement changed");
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("announcement changed"));
        assert!(content.contains("appid=427520"));
    }
}
