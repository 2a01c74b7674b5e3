use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use url::Url;

use crate::catalog::{CatalogClient, CatalogIndex, build_index};
use crate::domain::{FileDescriptor, Identifier, MetagenomeId};
use crate::error::MgError;
use crate::resolve::resolve_metagenomes;
use crate::store::{DownloadTree, ensure_dir};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub dest: PathBuf,
    /// Restrict downloads to descriptors with this `file_id`.
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub files: Vec<ListEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub metagenome: String,
    pub file_name: String,
    pub file_id: String,
    pub checksum: String,
    /// `0` when the catalog has no size for the file.
    pub byte_size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub items: Vec<FetchItemResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchItemResult {
    pub metagenome: String,
    pub file_id: String,
    pub path: String,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Phase(String),
    DownloadStarted {
        metagenome: String,
        file_name: String,
    },
    DownloadFinished {
        bytes: u64,
        elapsed: Duration,
    },
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Resolves identifiers against the catalog and lists or downloads their files.
pub struct App<C: CatalogClient> {
    client: C,
    api: Url,
}

impl<C: CatalogClient> App<C> {
    pub fn new(client: C, api: Url) -> Self {
        Self { client, api }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolve `identifier` and fetch the file listing of every member.
    pub fn catalog(
        &self,
        identifier: &Identifier,
        sink: &dyn ProgressSink,
    ) -> Result<CatalogIndex, MgError> {
        sink.event(ProgressEvent::Phase(format!("phase=Resolve; {}", describe(identifier))));
        let metagenomes = resolve_metagenomes(&self.client, &self.api, identifier)?;
        tracing::info!(count = metagenomes.len(), "resolved metagenomes");

        sink.event(ProgressEvent::Phase("phase=Catalog; fetching file listings".to_string()));
        let index = build_index(&self.client, &self.api, &metagenomes)?;
        if index.is_empty() {
            tracing::warn!("{} has no metagenomes", describe(identifier));
        }
        tracing::info!(
            metagenomes = index.len(),
            files = index.file_count(),
            "catalog fetched"
        );
        Ok(index)
    }

    pub fn list(
        &self,
        identifier: &Identifier,
        sink: &dyn ProgressSink,
    ) -> Result<ListResult, MgError> {
        let index = self.catalog(identifier, sink)?;
        let files = index
            .iter()
            .flat_map(|(mg, files)| {
                files.iter().map(move |file| ListEntry {
                    metagenome: mg.to_string(),
                    file_name: file.local_name(),
                    file_id: file.file_id.clone(),
                    checksum: file.file_md5.clone(),
                    byte_size: file.byte_size(),
                })
            })
            .collect();
        Ok(ListResult { files })
    }

    pub fn fetch(
        &self,
        identifier: &Identifier,
        options: &FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, MgError> {
        let tree = DownloadTree::new(&options.dest, identifier.project())?;
        let index = self.catalog(identifier, sink)?;

        sink.event(ProgressEvent::Phase(format!(
            "phase=Download; writing into {}",
            tree.root()
        )));
        if identifier.project().is_some() {
            tree.ensure_root()?;
        }

        let mut items = Vec::new();
        for (mg, files) in index.iter() {
            ensure_dir(&tree.metagenome_dir(mg))?;
            let selected = files.iter().filter(|file| match options.file_id.as_deref() {
                Some(file_id) => file.file_id == file_id,
                None => true,
            });
            for file in selected {
                let path = tree.file_path(mg, file)?;
                items.push(self.download_file(mg, file, &path, sink)?);
            }
        }

        tracing::info!(files = items.len(), "downloads complete");
        Ok(FetchResult { items })
    }

    fn download_file(
        &self,
        mg: &MetagenomeId,
        file: &FileDescriptor,
        path: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<FetchItemResult, MgError> {
        sink.event(ProgressEvent::DownloadStarted {
            metagenome: mg.to_string(),
            file_name: file.local_name(),
        });
        let start = Instant::now();

        let mut handle =
            File::create(path).map_err(|err| MgError::Filesystem(format!("create {path}: {err}")))?;
        let bytes = self.client.download(&file.url, &mut handle)?;
        handle
            .flush()
            .map_err(|err| MgError::Filesystem(format!("write {path}: {err}")))?;

        sink.event(ProgressEvent::DownloadFinished {
            bytes,
            elapsed: start.elapsed(),
        });
        Ok(FetchItemResult {
            metagenome: mg.to_string(),
            file_id: file.file_id.clone(),
            path: path.to_string(),
            bytes,
        })
    }
}

fn describe(identifier: &Identifier) -> String {
    match identifier {
        Identifier::Project(id) => format!("project {id}"),
        Identifier::Metagenome(id) => format!("metagenome {id}"),
    }
}
