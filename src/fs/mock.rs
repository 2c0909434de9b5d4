// src/fs/mock.rs

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::FileSystem;

#[derive(Debug, Clone)]
enum MockNode {
    File { data: Vec<u8>, mtime_ns: u64 },
    Dir { mtime_ns: u64 },
}

/// In-memory filesystem with settable mtimes.
///
/// Creating or removing an entry bumps the parent directory's mtime by one,
/// mirroring how adding a file to a real directory advances its mtime. Tests
/// that need a specific timestamp call [`MockFileSystem::set_mtime`].
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    nodes: Arc<Mutex<HashMap<PathBuf, MockNode>>>,
    denied: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut nodes = self.nodes.lock().unwrap();
        Self::ensure_dir(&mut nodes, path.as_ref());
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut nodes = self.nodes.lock().unwrap();
        let mtime_ns = match nodes.get(&path) {
            Some(MockNode::File { mtime_ns, .. }) => mtime_ns + 1,
            _ => 1_000,
        };
        nodes.insert(
            path.clone(),
            MockNode::File {
                data: content.into(),
                mtime_ns,
            },
        );
        Self::bump_parent(&mut nodes, &path);
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut nodes = self.nodes.lock().unwrap();
        nodes.retain(|p, _| p != &path && !p.starts_with(&path));
        Self::bump_parent(&mut nodes, &path);
    }

    pub fn set_mtime(&self, path: impl AsRef<Path>, mtime: u64) {
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get_mut(path.as_ref()) {
            Some(MockNode::File { mtime_ns, .. }) | Some(MockNode::Dir { mtime_ns }) => {
                *mtime_ns = mtime;
            }
            None => panic!("set_mtime on unknown path {:?}", path.as_ref()),
        }
    }

    /// Make every access to `path` fail with `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.denied
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    /// Current contents of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path.as_ref()) {
            Some(MockNode::File { data, .. }) => String::from_utf8(data.clone()).ok(),
            _ => None,
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.nodes.lock().unwrap().contains_key(path.as_ref())
    }

    fn ensure_dir(nodes: &mut HashMap<PathBuf, MockNode>, path: &Path) {
        if nodes.contains_key(path) {
            return;
        }
        nodes.insert(path.to_path_buf(), MockNode::Dir { mtime_ns: 1_000 });
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && parent != path {
                Self::ensure_dir(nodes, parent);
            }
        }
    }

    fn bump_parent(nodes: &mut HashMap<PathBuf, MockNode>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if parent.as_os_str().is_empty() {
            return;
        }
        Self::ensure_dir(nodes, parent);
        if let Some(MockNode::Dir { mtime_ns }) = nodes.get_mut(parent) {
            *mtime_ns += 1;
        }
    }

    fn check_denied(&self, path: &Path) -> io::Result<()> {
        if self.denied.lock().unwrap().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        Ok(())
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.check_denied(path)?;
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(MockNode::File { data, .. }) => String::from_utf8(data.clone())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Some(MockNode::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "is a directory",
            )),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "file not found")),
        }
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.check_denied(path)?;
        self.add_file(path, contents.to_vec());
        Ok(())
    }

    fn mtime_ns(&self, path: &Path) -> io::Result<u64> {
        self.check_denied(path)?;
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(MockNode::File { mtime_ns, .. }) | Some(MockNode::Dir { mtime_ns }) => {
                Ok(*mtime_ns)
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such path")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_a_file_bumps_the_parent_dir_mtime() {
        let fs = MockFileSystem::new();
        fs.add_dir("/work/src");
        fs.set_mtime("/work/src", 500);

        fs.add_file("/work/src/a.cpp", "");
        assert_eq!(fs.mtime_ns(Path::new("/work/src")).unwrap(), 501);
    }

    #[test]
    fn removal_bumps_parent_and_drops_children() {
        let fs = MockFileSystem::new();
        fs.add_file("/work/src/a.cpp", "");
        fs.remove("/work/src");

        assert!(fs.mtime_ns(Path::new("/work/src")).is_err());
        assert!(fs.mtime_ns(Path::new("/work/src/a.cpp")).is_err());
    }

    #[test]
    fn denied_paths_fail_with_permission_denied() {
        let fs = MockFileSystem::new();
        fs.add_dir("/work/denied/sub");
        fs.deny("/work/denied/sub");

        let err = fs.mtime_ns(Path::new("/work/denied/sub")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
