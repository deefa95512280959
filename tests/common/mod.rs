//! Throw-away Go workspaces for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use gosense::BuildContext;
use tempfile::TempDir;

/// A temporary GOROOT and GOPATH.
pub struct Workspace {
    _tmp: TempDir,
    pub goroot: PathBuf,
    pub gopath: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let goroot = tmp.path().join("goroot");
        let gopath = tmp.path().join("gopath");
        fs::create_dir_all(goroot.join("src")).unwrap();
        fs::create_dir_all(gopath.join("src")).unwrap();
        Self {
            _tmp: tmp,
            goroot,
            gopath,
        }
    }

    pub fn context(&self) -> BuildContext {
        BuildContext::new(&self.goroot, "linux", "amd64").with_gopath([&self.gopath])
    }

    /// Write `<gopath>/src/<package>/<name>`.
    pub fn file(&self, package: &str, name: &str, text: &str) -> &Self {
        write(&self.gopath.join("src").join(package), name, text);
        self
    }

    /// Write `<goroot>/src/<package>/<name>`.
    pub fn std_file(&self, package: &str, name: &str, text: &str) -> &Self {
        write(&self.goroot.join("src").join(package), name, text);
        self
    }

    pub fn dir(&self, package: &str) -> PathBuf {
        self.gopath.join("src").join(package)
    }

    pub fn text(&self, package: &str, name: &str) -> String {
        fs::read_to_string(self.dir(package).join(name)).unwrap()
    }

    /// Byte offset of the `nth` occurrence of `needle` in a GOPATH file.
    pub fn offset(&self, package: &str, name: &str, needle: &str, nth: usize) -> usize {
        offset_of(&self.text(package, name), needle, nth)
    }
}

pub fn offset_of(text: &str, needle: &str, nth: usize) -> usize {
    text.match_indices(needle)
        .nth(nth)
        .map(|(offset, _)| offset)
        .unwrap_or_else(|| panic!("{needle:?} #{nth} not found"))
}

/// 0-based line of `offset`.
pub fn line_of(text: &str, offset: usize) -> u32 {
    text[..offset].matches('\n').count() as u32
}

fn write(dir: &Path, name: &str, text: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), text).unwrap();
}
