#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory for inputs and reports, removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    /// Writes a CSV with `header` and one line per entry of `rows`.
    pub fn write_csv(&self, name: &str, header: &str, rows: &[String]) -> PathBuf {
        let mut contents = String::from(header);
        contents.push('\n');
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        self.write(name, &contents)
    }
}

/// Daily rows: `counts[i]` rows dated day `days[i]` of March 2024.
pub fn daily_rows(days: &[u32], counts: &[usize]) -> Vec<String> {
    days.iter()
        .zip(counts)
        .flat_map(|(day, count)| (0..*count).map(move |i| format!("2024-03-{day:02},{i}")))
        .collect()
}
