#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use sheet_editor::sheet::Sheet;
use tempfile::{TempDir, tempdir};

/// Header row shared by the measurement fixtures.
pub const MEASUREMENT_HEADERS: &str = "Input,LL,Chest,Sleeve,Output,Status";

/// Scratch directory helper that cleans up files automatically on drop.
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

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read temp file")
    }

    /// A small measurement sheet: two open rows and one closed row.
    pub fn measurements(&self) -> PathBuf {
        self.write(
            "measurements.csv",
            &format!(
                "{MEASUREMENT_HEADERS}\n\
                 ,,,,,open\n\
                 12-30-8,12,30,8,12x30x8,closed\n\
                 ,,,,,open\n"
            ),
        )
    }
}

pub fn bin() -> Command {
    Command::cargo_bin("sheet-editor").expect("binary exists")
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn sheet(headers: &[&str], rows: &[&[&str]]) -> Sheet {
    Sheet::from_records(
        strings(headers),
        rows.iter().map(|row| strings(row)).collect(),
    )
    .expect("valid sheet")
}
