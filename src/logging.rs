use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::domain::RTError;

/// Log to a file, the terminal belongs to the table view.
pub fn init(path: &Path) -> Result<(), RTError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(ErrorLayer::default())
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_log_directory_and_file() {
        let dir = std::env::temp_dir().join(format!("reltable-log-{}", std::process::id()));
        let path = dir.join("nested").join("reltable.log");

        // A subscriber may already be installed by another test, only the
        // file side effects are checked here.
        let _ = init(&path);
        assert!(path.exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
