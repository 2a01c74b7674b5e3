use std::fs;
use std::io;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{FileDescriptor, MetagenomeId, ProjectId};
use crate::error::MgError;

/// `<dest>[/<project>]/<metagenome>/<file>` layout for downloads.
#[derive(Debug, Clone)]
pub struct DownloadTree {
    root: Utf8PathBuf,
}

impl DownloadTree {
    /// `dest` must already exist; nothing below it is created yet.
    pub fn new(dest: &Path, project: Option<&ProjectId>) -> Result<Self, MgError> {
        if !dest.is_dir() {
            return Err(MgError::MissingDirectory(dest.to_path_buf()));
        }
        let dest = Utf8PathBuf::from_path_buf(dest.to_path_buf())
            .map_err(|path| MgError::Filesystem(format!("non-utf8 path {}", path.display())))?;
        let root = match project {
            Some(project) => dest.join(project.as_str()),
            None => dest,
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn metagenome_dir(&self, mg: &MetagenomeId) -> Utf8PathBuf {
        self.root.join(mg.as_str())
    }

    pub fn file_path(&self, mg: &MetagenomeId, file: &FileDescriptor) -> Result<Utf8PathBuf, MgError> {
        let name = file.local_name();
        if !is_plain_file_name(&name) {
            return Err(MgError::Filesystem(format!(
                "refusing to write {name:?} for {mg}: not a plain file name"
            )));
        }
        Ok(self.metagenome_dir(mg).join(name))
    }

    pub fn ensure_root(&self) -> Result<(), MgError> {
        ensure_dir(&self.root)
    }
}

/// Create a single directory level. An existing directory is fine.
pub fn ensure_dir(path: &Utf8Path) -> Result<(), MgError> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(err) => Err(MgError::Filesystem(format!("create {path}: {err}"))),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
