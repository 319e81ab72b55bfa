#![allow(dead_code)]

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Directory of the checked-in fixtures.
pub fn data_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

/// Temporary working directory with a UTF-8 path.
pub struct Workspace {
    _tmp: TempDir,
    pub root: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        Workspace { _tmp: tmp, root }
    }

    /// Create `rel` (and its parent directories) under the workspace root.
    pub fn write(&self, rel: &str, content: &str) -> Utf8PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Copy fixture files into `rel_dir` and return that directory.
    pub fn copy_fixtures(&self, rel_dir: &str, fixtures: &[&str]) -> Utf8PathBuf {
        let dir = self.root.join(rel_dir);
        fs::create_dir_all(&dir).unwrap();
        for f in fixtures {
            let src = data_dir().join(f);
            let name = src.file_name().unwrap();
            fs::copy(&src, dir.join(name)).unwrap();
        }
        dir
    }
}

/// Sorted file names of `dir`.
pub fn file_names(dir: &Utf8Path) -> Vec<String> {
    let mut names: Vec<String> = dir
        .read_dir_utf8()
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string())
        .collect();
    names.sort();
    names
}

/// Non-empty lines of a text file.
pub fn read_lines(path: &Utf8Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}
