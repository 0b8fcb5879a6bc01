//! Multi-file batches.
//!
//! A batch is a directory of part files, each written by
//! [`LocalJsonSerializer`] for a single table, plus a `batch.json` manifest
//! listing the parts in write order with their row counts and CRC32.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::local_json::{BatchRowReader, LocalJsonSerializer};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::io_utils::{classify_io_error, file_checksum, write_atomic};
use crate::table::{SyncRow, SyncTable};

/// Manifest file name inside a batch directory.
pub const BATCH_INFO_FILE: &str = "batch.json";

/// One part file of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPartInfo {
    /// File name relative to the batch directory
    #[serde(rename = "file")]
    pub file_name: String,
    /// Position of the part within the batch
    #[serde(rename = "i")]
    pub index: usize,
    #[serde(rename = "t")]
    pub table_name: String,
    #[serde(rename = "s", default, skip_serializing_if = "String::is_empty")]
    pub schema_name: String,
    #[serde(rename = "rc")]
    pub rows_count: u64,
    /// CRC32 of the closed file; absent for parts written by older writers
    #[serde(rename = "crc", default, skip_serializing_if = "Option::is_none")]
    pub crc32: Option<u32>,
}

impl BatchPartInfo {
    /// Fails with `ChecksumMismatch` when the file no longer matches its CRC32.
    pub fn verify(&self, directory: &Path) -> SyncResult<()> {
        let path = directory.join(&self.file_name);
        let Some(expected) = self.crc32 else {
            warn!("Batch part {} has no checksum, reading it unverified", path.display());
            return Ok(());
        };
        let actual = file_checksum(&path)?;
        if actual != expected {
            return Err(SyncError::ChecksumMismatch {
                file: self.file_name.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// Manifest of a written batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub id: Uuid,
    #[serde(rename = "ct")]
    pub created: DateTime<Utc>,
    /// Directory holding the parts; set on load
    #[serde(skip)]
    pub directory: PathBuf,
    #[serde(rename = "ps", default)]
    pub parts: Vec<BatchPartInfo>,
}

impl BatchInfo {
    fn new(id: Uuid, directory: PathBuf) -> Self {
        Self {
            id,
            created: Utc::now(),
            directory,
            parts: Vec::new(),
        }
    }

    /// Writes the manifest to `batch.json` in the batch directory.
    pub fn save(&self) -> SyncResult<PathBuf> {
        let path = self.directory.join(BATCH_INFO_FILE);
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(&path, json.as_bytes())?;
        debug!("Saved batch {} with {} parts", self.id, self.parts.len());
        Ok(path)
    }

    /// Reads the manifest of the batch stored in `directory`.
    pub fn load(directory: &Path) -> SyncResult<BatchInfo> {
        let path = directory.join(BATCH_INFO_FILE);
        let json = fs::read_to_string(&path)
            .map_err(|e| classify_io_error(e, "Failed to read batch manifest"))?;
        let mut info: BatchInfo = serde_json::from_str(&json)?;
        info.directory = directory.to_path_buf();
        debug!("Loaded batch {} with {} parts", info.id, info.parts.len());
        Ok(info)
    }

    /// Total rows over all parts.
    pub fn rows_count(&self) -> u64 {
        self.parts.iter().map(|part| part.rows_count).sum()
    }

    /// Parts holding rows of `table`, in write order.
    pub fn parts_for<'a>(
        &'a self,
        table: &'a SyncTable,
    ) -> impl Iterator<Item = &'a BatchPartInfo> + 'a {
        self.parts
            .iter()
            .filter(move |part| table.is_named(&part.table_name, &part.schema_name))
    }

    /// Lazily reads every row of `table` across its parts.
    ///
    /// Each part is checked against its CRC32 before its first row is read.
    pub fn read_rows<'a>(&'a self, table: &'a SyncTable) -> BatchRows<'a> {
        self.read_rows_with(table, &SyncConfig::default())
    }

    /// Like [`BatchInfo::read_rows`], with the reader buffer sizes of `config`.
    pub fn read_rows_with<'a>(&'a self, table: &'a SyncTable, config: &SyncConfig) -> BatchRows<'a> {
        BatchRows {
            serializer: LocalJsonSerializer::with_config(config),
            directory: &self.directory,
            parts: self.parts_for(table).collect::<Vec<_>>().into_iter(),
            table,
            current: None,
            done: false,
        }
    }
}

/// Rows of one table chained over the parts of a batch.
pub struct BatchRows<'a> {
    serializer: LocalJsonSerializer,
    directory: &'a Path,
    parts: std::vec::IntoIter<&'a BatchPartInfo>,
    table: &'a SyncTable,
    current: Option<BatchRowReader<'a>>,
    done: bool,
}

impl BatchRows<'_> {
    fn fail(&mut self, error: SyncError) -> Option<SyncResult<SyncRow>> {
        self.done = true;
        Some(Err(error))
    }
}

impl Iterator for BatchRows<'_> {
    type Item = SyncResult<SyncRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(reader) = self.current.as_mut() {
                match reader.next() {
                    Some(Ok(row)) => return Some(Ok(row)),
                    Some(Err(e)) => return self.fail(e),
                    None => self.current = None,
                }
            }

            let Some(part) = self.parts.next() else {
                self.done = true;
                return None;
            };
            if let Err(e) = part.verify(self.directory) {
                return self.fail(e);
            }
            let path = self.directory.join(&part.file_name);
            match self.serializer.read_rows_from_file(&path, self.table) {
                Ok(reader) => self.current = Some(reader),
                Err(e) => return self.fail(e),
            }
        }
    }
}

/// Streams rows of many tables into rotating part files.
///
/// A new part starts whenever the table changes or the open part has reached
/// the configured size.
pub struct BatchWriter {
    serializer: LocalJsonSerializer,
    batch_size_bytes: u64,
    info: BatchInfo,
    current: Option<BatchPartInfo>,
}

impl BatchWriter {
    /// Starts a batch in a new directory under `config.batch_directory`.
    pub fn new(config: &SyncConfig) -> Self {
        let id = Uuid::new_v4();
        let directory = config.batch_directory.join(id.simple().to_string());
        Self {
            serializer: LocalJsonSerializer::with_config(config),
            batch_size_bytes: config.batch_size_bytes,
            info: BatchInfo::new(id, directory),
            current: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.info.id
    }

    pub fn directory(&self) -> &Path {
        &self.info.directory
    }

    /// Appends one row of `table`, rotating to a new part when needed.
    pub fn write_row(&mut self, table: &SyncTable, row: &SyncRow) -> SyncResult<()> {
        let rotate = match &self.current {
            None => true,
            Some(part) => {
                !table.is_named(&part.table_name, &part.schema_name)
                    || self.serializer.current_file_size() >= self.batch_size_bytes
            }
        };
        if rotate {
            self.close_part()?;
            self.open_part(table)?;
        }

        self.serializer.write_row(row, table)?;
        if let Some(part) = self.current.as_mut() {
            part.rows_count += 1;
        }
        Ok(())
    }

    /// Appends every row held by `table`.
    ///
    /// # Returns
    /// Number of rows written.
    pub fn write_table(&mut self, table: &SyncTable) -> SyncResult<usize> {
        for row in table.rows.iter() {
            self.write_row(table, row)?;
        }
        Ok(table.rows.len())
    }

    /// Closes the open part and saves the manifest.
    pub fn finish(mut self) -> SyncResult<BatchInfo> {
        self.close_part()?;
        self.info.save()?;
        Ok(self.info)
    }

    fn open_part(&mut self, table: &SyncTable) -> SyncResult<()> {
        let index = self.info.parts.len();
        let file_name = format!("{:04}_{}.json", index, Uuid::new_v4().simple());
        self.serializer
            .open_file(&self.info.directory.join(&file_name), table)?;
        self.current = Some(BatchPartInfo {
            file_name,
            index,
            table_name: table.table_name.clone(),
            schema_name: table.schema_name.clone(),
            rows_count: 0,
            crc32: None,
        });
        Ok(())
    }

    fn close_part(&mut self) -> SyncResult<()> {
        let Some(mut part) = self.current.take() else {
            return Ok(());
        };
        self.serializer.close_file()?;
        part.crc32 = Some(file_checksum(&self.info.directory.join(&part.file_name))?);
        debug!(
            "Batch {} part {} holds {} rows of '{}'",
            self.info.id, part.index, part.rows_count, part.table_name
        );
        self.info.parts.push(part);
        Ok(())
    }
}
