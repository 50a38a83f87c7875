//! Filesystem operations used by the engines.
//!
//! The engines only need a handful of calls, so they go through the
//! [`FileSystem`] trait. [`OsFileSystem`] forwards to `std::fs`;
//! [`MemoryFileSystem`] keeps a tree in memory and can be told to fail on
//! chosen paths, which lets the failure paths be exercised without touching
//! a disk.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The filesystem calls a run makes.
pub trait FileSystem {
    /// Names of the regular files directly inside `dir`, sorted.
    ///
    /// Names come back exactly as the platform stores them, including ones
    /// that are not valid UTF-8.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<OsString>>;

    /// Moves `from` to `to`, replacing an existing file at `to`.
    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()>;

    fn create_dir_all(&mut self, dir: &Path) -> io::Result<()>;

    /// Removes an empty directory.
    fn remove_dir(&mut self, dir: &Path) -> io::Result<()>;

    fn remove_file(&mut self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name());
            }
        }
        names.sort();
        Ok(names)
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn create_dir_all(&mut self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn remove_dir(&mut self, dir: &Path) -> io::Result<()> {
        fs::remove_dir(dir)
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// An in-memory filesystem.
///
/// Paths are used as given, without normalization. The root `/` always
/// exists.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    nodes: BTreeMap<PathBuf, Node>,
    failing: HashSet<PathBuf>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), Node::Dir);
        Self {
            nodes,
            failing: HashSet::new(),
        }
    }

    /// Adds a file, creating parent directories as needed.
    pub fn add_file(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.mkdirs(parent);
        }
        self.nodes
            .insert(path.to_path_buf(), Node::File(contents.into()));
    }

    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        self.mkdirs(path.as_ref());
    }

    /// Makes every later operation that touches `path` fail with
    /// `PermissionDenied`.
    pub fn fail_on(&mut self, path: impl AsRef<Path>) {
        self.failing.insert(path.as_ref().to_path_buf());
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.nodes.get(path.as_ref()), Some(Node::File(_)))
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.nodes.get(path.as_ref()), Some(Node::Dir))
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        match self.nodes.get(path.as_ref()) {
            Some(Node::File(data)) => Some(data),
            _ => None,
        }
    }

    /// Every file path, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn mkdirs(&mut self, dir: &Path) {
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
    }

    fn check(&self, path: &Path) -> io::Result<()> {
        if self.failing.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected failure for {}", path.display()),
            ));
        }
        Ok(())
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )
    }

    fn children<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = (&'a PathBuf, &'a Node)> {
        self.nodes
            .iter()
            .filter(move |(path, _)| path.parent() == Some(dir))
    }
}

impl FileSystem for MemoryFileSystem {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        self.check(dir)?;
        if !self.is_dir(dir) {
            return Err(Self::not_found(dir));
        }
        let mut names: Vec<OsString> = self
            .children(dir)
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .filter_map(|(path, _)| path.file_name())
            .map(|name| name.to_os_string())
            .collect();
        names.sort();
        Ok(names)
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        self.check(from)?;
        self.check(to)?;
        if !self.is_file(from) {
            return Err(Self::not_found(from));
        }
        match to.parent() {
            Some(parent) if self.is_dir(parent) => {}
            _ => return Err(Self::not_found(to)),
        }
        if self.is_dir(to) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", to.display()),
            ));
        }
        if let Some(node) = self.nodes.remove(from) {
            self.nodes.insert(to.to_path_buf(), node);
        }
        Ok(())
    }

    fn create_dir_all(&mut self, dir: &Path) -> io::Result<()> {
        self.check(dir)?;
        if self.is_file(dir) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a file", dir.display()),
            ));
        }
        self.mkdirs(dir);
        Ok(())
    }

    fn remove_dir(&mut self, dir: &Path) -> io::Result<()> {
        self.check(dir)?;
        if !self.is_dir(dir) {
            return Err(Self::not_found(dir));
        }
        if self.children(dir).next().is_some() {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("{} is not empty", dir.display()),
            ));
        }
        self.nodes.remove(dir);
        Ok(())
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        self.check(path)?;
        if !self.is_file(path) {
            return Err(Self::not_found(path));
        }
        self.nodes.remove(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }
}
