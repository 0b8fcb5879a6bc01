//! Row-by-row batch file serializer.
//!
//! One file holds the rows of one table:
//!
//! ```text
//! {"t":[{"n":"<table>","s":"<schema>","r":[
//! [<state>,<col0>,<col1>,...],
//! ...
//! ]}]}
//! ```
//!
//! Every row is flushed as soon as it is written, so an interrupted writer
//! leaves a file whose complete rows can still be read back.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{SyncConfig, DEFAULT_JSON_BUFFER_SIZE, DEFAULT_JSON_MAX_BUFFER_SIZE};
use crate::error::{SyncError, SyncResult};
use crate::io_utils::classify_io_error;
use crate::json::{JsonReader, JsonTokenType, JsonWriter};
use crate::table::{RowState, SyncRow, SyncTable};
use crate::types::{SyncValue, TypeCode};

/// Depth of the row tuples inside a batch file.
const ROW_DEPTH: usize = 4;

struct OpenFile {
    path: PathBuf,
    writer: JsonWriter<BufWriter<File>>,
}

/// Writes and reads batch files one row at a time.
pub struct LocalJsonSerializer {
    current: Option<OpenFile>,
    buffer_size: usize,
    max_buffer_size: usize,
}

impl Default for LocalJsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalJsonSerializer {
    pub fn new() -> Self {
        Self {
            current: None,
            buffer_size: DEFAULT_JSON_BUFFER_SIZE,
            max_buffer_size: DEFAULT_JSON_MAX_BUFFER_SIZE,
        }
    }

    /// Creates a serializer whose readers use the buffer sizes of `config`.
    pub fn with_config(config: &SyncConfig) -> Self {
        Self {
            current: None,
            buffer_size: config.json_buffer_size,
            max_buffer_size: config.json_max_buffer_size,
        }
    }

    /// Whether a file is open for writing.
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Creates `path` and writes the header for `table`.
    ///
    /// A file still open from a previous call is closed first.
    ///
    /// # Arguments
    /// * `path` - File to create (parent directories are created)
    /// * `table` - Table whose rows will be written
    pub fn open_file(&mut self, path: &Path, table: &SyncTable) -> SyncResult<()> {
        if let Some(open) = &self.current {
            warn!(
                "Batch file {} was not closed before opening {}; closing it",
                open.path.display(),
                path.display()
            );
            self.close_file()?;
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| classify_io_error(e, "Failed to create batch directory"))?;
        }
        let file =
            File::create(path).map_err(|e| classify_io_error(e, "Failed to create batch file"))?;

        let mut writer = JsonWriter::new(BufWriter::new(file));
        writer.set_line_break_depth(ROW_DEPTH);
        writer.write_start_object()?;
        writer.write_property_name("t")?;
        writer.write_start_array()?;
        writer.write_start_object()?;
        writer.write_property_name("n")?;
        writer.write_string(&table.table_name)?;
        writer.write_property_name("s")?;
        writer.write_string(&table.schema_name)?;
        writer.write_property_name("r")?;
        writer.write_start_array()?;
        writer.flush()?;

        debug!("Opened batch file {} for table '{}'", path.display(), table.full_name());
        self.current = Some(OpenFile {
            path: path.to_path_buf(),
            writer,
        });
        Ok(())
    }

    /// Appends one row tuple and flushes it.
    ///
    /// Values are converted to their column types before anything is
    /// written. A row that fails conversion leaves the file untouched.
    ///
    /// # Returns
    /// `StreamNotOpen` without an open file, `ColumnCountMismatch` when the row
    /// width differs from the table's column count.
    pub fn write_row(&mut self, row: &SyncRow, table: &SyncTable) -> SyncResult<()> {
        let open = self.current.as_mut().ok_or(SyncError::StreamNotOpen)?;
        if row.len() != table.columns.len() {
            return Err(SyncError::ColumnCountMismatch {
                table: table.full_name(),
                expected: table.columns.len(),
                got: row.len(),
            });
        }

        // Nothing is written until every cell has a wire form, so a failed
        // row never leaves an open array behind.
        let cells = table
            .columns
            .iter()
            .zip(row.values())
            .map(|(column, value)| {
                let cell = value.convert_to(column.type_code())?;
                match cell {
                    SyncValue::Float(v) if !v.is_finite() => {
                        Err(SyncError::conversion(v, "JSON number"))
                    }
                    SyncValue::Double(v) if !v.is_finite() => {
                        Err(SyncError::conversion(v, "JSON number"))
                    }
                    cell => Ok(cell),
                }
            })
            .collect::<SyncResult<Vec<_>>>()?;

        let writer = &mut open.writer;
        writer.write_start_array()?;
        writer.write_i64(i64::from(row.state().code()))?;
        for cell in &cells {
            writer.write_value(cell)?;
        }
        writer.write_end_array()?;
        writer.flush()
    }

    /// Writes the closing brackets and closes the file.
    pub fn close_file(&mut self) -> SyncResult<()> {
        let mut open = self.current.take().ok_or(SyncError::StreamNotOpen)?;
        open.writer.write_end_array()?;
        open.writer.write_end_object()?;
        open.writer.write_end_array()?;
        open.writer.write_end_object()?;
        open.writer.flush()?;
        open.writer
            .get_ref()
            .get_ref()
            .sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync batch file"))?;
        debug!(
            "Closed batch file {} ({} bytes)",
            open.path.display(),
            open.writer.bytes_written()
        );
        Ok(())
    }

    /// Bytes written to the open file so far, 0 when no file is open.
    pub fn current_file_size(&self) -> u64 {
        self.current
            .as_ref()
            .map_or(0, |open| open.writer.bytes_written())
    }

    /// Lazily reads the rows of a batch file written for `table`.
    ///
    /// Cells are parsed with the declared type of their column. A file that
    /// ends before its closing brackets yields its complete rows and then ends.
    pub fn read_rows_from_file<'a>(
        &self,
        path: &Path,
        table: &'a SyncTable,
    ) -> SyncResult<BatchRowReader<'a>> {
        let file = File::open(path).map_err(|e| classify_io_error(e, "Failed to open batch file"))?;
        Ok(BatchRowReader {
            reader: JsonReader::with_buffer_size(file, self.buffer_size, self.max_buffer_size),
            table,
            path: path.to_path_buf(),
            positioned: false,
            done: false,
        })
    }
}

impl Drop for LocalJsonSerializer {
    fn drop(&mut self) {
        if self.current.is_some() {
            if let Err(e) = self.close_file() {
                warn!("Failed to close batch file on drop: {}", e);
            }
        }
    }
}

/// Iterator over the rows of one batch file.
pub struct BatchRowReader<'a> {
    reader: JsonReader<File>,
    table: &'a SyncTable,
    path: PathBuf,
    positioned: bool,
    done: bool,
}

impl BatchRowReader<'_> {
    /// Moves the reader onto the start of the `"r"` array.
    ///
    /// # Returns
    /// `false` when the file ends first.
    fn seek_rows(&mut self) -> SyncResult<bool> {
        while self.reader.read()? {
            if self.reader.token_type() != JsonTokenType::PropertyName {
                continue;
            }
            let name = self.reader.get_string()?;
            if self.reader.depth() == ROW_DEPTH - 1 && name == "r" {
                return self.reader.read();
            }
            if name == "n" && self.reader.depth() == ROW_DEPTH - 1 {
                if let Some(file_table) = self.reader.read_as_string()? {
                    if !self.table.comparison().equals(&file_table, &self.table.table_name) {
                        warn!(
                            "Batch file {} holds table '{}', reading it as '{}'",
                            self.path.display(),
                            file_table,
                            self.table.full_name()
                        );
                    }
                }
                continue;
            }
            self.reader.skip()?;
        }
        Ok(false)
    }

    fn truncated(&mut self) -> Option<SyncResult<SyncRow>> {
        warn!(
            "Batch file {} ends before its closing brackets; stopping after the last complete row",
            self.path.display()
        );
        self.done = true;
        None
    }

    /// Reads one row tuple, or `None` at the end of the row array.
    fn next_row(&mut self) -> SyncResult<Option<SyncRow>> {
        if !self.reader.read()? {
            return Err(SyncError::UnexpectedEndOfJson);
        }
        match self.reader.token_type() {
            JsonTokenType::EndArray => return Ok(None),
            JsonTokenType::StartArray => {}
            other => {
                return Err(SyncError::InvalidTokenType {
                    expected: "row array".to_string(),
                    actual: other.to_string(),
                })
            }
        }

        if !self.reader.read()? {
            return Err(SyncError::UnexpectedEndOfJson);
        }
        let state = RowState::try_from(&self.reader.current_value()?)?;

        let columns = &self.table.columns;
        let mut row = SyncRow::new(columns.len(), state);
        let mut count = 0;
        loop {
            if !self.reader.read()? {
                return Err(SyncError::UnexpectedEndOfJson);
            }
            if self.reader.token_type() == JsonTokenType::EndArray {
                break;
            }
            let column = columns
                .by_ordinal(count)
                .ok_or_else(|| SyncError::ColumnCountMismatch {
                    table: self.table.full_name(),
                    expected: columns.len(),
                    got: count + 1,
                })?;
            row.set(count, cell_value(&self.reader, column.type_code())?);
            count += 1;
        }

        if count != columns.len() {
            return Err(SyncError::ColumnCountMismatch {
                table: self.table.full_name(),
                expected: columns.len(),
                got: count,
            });
        }
        Ok(Some(row))
    }
}

impl Iterator for BatchRowReader<'_> {
    type Item = SyncResult<SyncRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.positioned {
            match self.seek_rows() {
                Ok(true) if self.reader.token_type() == JsonTokenType::StartArray => {
                    self.positioned = true;
                }
                Ok(true) | Ok(false) => {
                    self.done = true;
                    return Some(Err(SyncError::invalid_json(
                        self.reader.position(),
                        "batch file has no row array",
                    )));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(SyncError::UnexpectedEndOfJson) if !self.reader.is_complete() => self.truncated(),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Parses the current token as a value of the declared column type.
fn cell_value<R: std::io::Read>(reader: &JsonReader<R>, code: TypeCode) -> SyncResult<SyncValue> {
    match reader.token_type() {
        JsonTokenType::Null => Ok(SyncValue::Null),
        JsonTokenType::True | JsonTokenType::False => {
            SyncValue::Bool(reader.get_bool()?).convert_to(code)
        }
        JsonTokenType::Number => match code {
            TypeCode::Object => reader.current_value(),
            TypeCode::Decimal => reader.get_decimal().map(SyncValue::Decimal),
            TypeCode::Double => reader.get_f64().map(SyncValue::Double),
            TypeCode::Float => reader.get_f32().map(SyncValue::Float),
            TypeCode::UInt64 => reader.get_u64().map(SyncValue::UInt64),
            c if c.is_integer() => SyncValue::Int64(reader.get_i64()?).convert_to(c),
            c => reader.current_value()?.convert_to(c),
        },
        JsonTokenType::String => match code {
            TypeCode::Object => reader.current_value(),
            TypeCode::String => reader.get_string().map(SyncValue::String),
            c => SyncValue::String(reader.get_string()?).convert_to(c),
        },
        other => Err(SyncError::InvalidTokenType {
            expected: "cell value".to_string(),
            actual: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SyncColumn;
    use ntest::timeout;
    use tempfile::tempdir;

    fn create_customer_table() -> SyncTable {
        let mut table = SyncTable::new("Customer", "dbo");
        table.add_column(SyncColumn::new("Id", TypeCode::Int32)).unwrap();
        table.add_column(SyncColumn::new("Name", TypeCode::String)).unwrap();
        table.add_primary_key("Id").unwrap();
        table
    }

    #[timeout(2000)]
    #[test]
    fn test_file_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customer.json");
        let table = create_customer_table();

        let mut serializer = LocalJsonSerializer::new();
        serializer.open_file(&path, &table).unwrap();
        let mut row = table.new_row(RowState::Added);
        row[0] = SyncValue::Int32(1);
        row[1] = SyncValue::from("Alice");
        serializer.write_row(&row, &table).unwrap();
        row.set_state(RowState::Modified);
        row[0] = SyncValue::Int32(2);
        row[1] = SyncValue::Null;
        serializer.write_row(&row, &table).unwrap();
        let size = serializer.current_file_size();
        serializer.close_file().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "{\"t\":[{\"n\":\"Customer\",\"s\":\"dbo\",\"r\":[\n[1,1,\"Alice\"],\n[2,2,null]\n]}]}"
        );
        assert_eq!(size as usize, text.len() - "\n]}]}".len());
        assert_eq!(serializer.current_file_size(), 0);
    }

    #[timeout(2000)]
    #[test]
    fn test_write_without_open_file() {
        let table = create_customer_table();
        let mut serializer = LocalJsonSerializer::new();
        let row = table.new_row(RowState::Added);
        assert_eq!(serializer.write_row(&row, &table).unwrap_err(), SyncError::StreamNotOpen);
        assert_eq!(serializer.close_file().unwrap_err(), SyncError::StreamNotOpen);
    }

    #[timeout(2000)]
    #[test]
    fn test_reopen_closes_previous_file() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        let table = create_customer_table();

        let mut serializer = LocalJsonSerializer::new();
        serializer.open_file(&first, &table).unwrap();
        serializer.open_file(&second, &table).unwrap();
        serializer.close_file().unwrap();

        assert!(fs::read_to_string(&first).unwrap().ends_with("]}]}"));
        let rows: Vec<_> = serializer.read_rows_from_file(&first, &table).unwrap().collect();
        assert!(rows.is_empty());
    }

    #[timeout(2000)]
    #[test]
    fn test_width_mismatch() {
        let dir = tempdir().unwrap();
        let table = create_customer_table();
        let mut serializer = LocalJsonSerializer::new();
        serializer.open_file(&dir.path().join("c.json"), &table).unwrap();
        let row = SyncRow::new(3, RowState::Added);
        assert!(matches!(
            serializer.write_row(&row, &table),
            Err(SyncError::ColumnCountMismatch { expected: 2, got: 3, .. })
        ));
    }

    #[timeout(2000)]
    #[test]
    fn test_rejected_row_leaves_file_intact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        let mut table = create_customer_table();
        table.add_column(SyncColumn::new("Ratio", TypeCode::Double)).unwrap();

        let new_row = |id: SyncValue, ratio: f64| {
            let mut row = table.new_row(RowState::Added);
            row[0] = id;
            row[1] = SyncValue::from("Alice");
            row[2] = SyncValue::Double(ratio);
            row
        };

        let mut serializer = LocalJsonSerializer::new();
        serializer.open_file(&path, &table).unwrap();
        serializer.write_row(&new_row(SyncValue::Int32(1), 0.5), &table).unwrap();
        let size = serializer.current_file_size();

        assert!(matches!(
            serializer.write_row(&new_row(SyncValue::from("not-a-number"), 0.5), &table),
            Err(SyncError::TypeConversion { .. })
        ));
        assert!(matches!(
            serializer.write_row(&new_row(SyncValue::Int32(2), f64::NAN), &table),
            Err(SyncError::TypeConversion { .. })
        ));
        assert_eq!(serializer.current_file_size(), size);

        serializer.write_row(&new_row(SyncValue::Int32(3), 1.5), &table).unwrap();
        serializer.close_file().unwrap();

        let rows: Vec<SyncRow> = serializer
            .read_rows_from_file(&path, &table)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], SyncValue::Int32(1));
        assert_eq!(rows[1][0], SyncValue::Int32(3));
        assert_eq!(rows[1][2], SyncValue::Double(1.5));
    }

    #[timeout(2000)]
    #[test]
    fn test_truncated_file_yields_complete_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(
            &path,
            "{\"t\":[{\"n\":\"Customer\",\"s\":\"dbo\",\"r\":[\n[1,1,\"Alice\"],\n[1,2,\"Bob\"],\n[1,3",
        )
        .unwrap();

        let table = create_customer_table();
        let serializer = LocalJsonSerializer::new();
        let rows: Vec<SyncRow> = serializer
            .read_rows_from_file(&path, &table)
            .unwrap()
            .collect::<SyncResult<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], SyncValue::from("Bob"));
    }

    #[timeout(2000)]
    #[test]
    fn test_cell_count_mismatch_on_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.json");
        fs::write(&path, r#"{"t":[{"n":"Customer","s":"dbo","r":[[1,1,"A","extra"]]}]}"#).unwrap();

        let table = create_customer_table();
        let serializer = LocalJsonSerializer::new();
        let mut rows = serializer.read_rows_from_file(&path, &table).unwrap();
        assert!(matches!(
            rows.next(),
            Some(Err(SyncError::ColumnCountMismatch { .. }))
        ));
        assert!(rows.next().is_none());
    }

    #[timeout(2000)]
    #[test]
    fn test_cells_follow_column_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typed.json");
        fs::write(
            &path,
            r#"{"t":[{"n":"T","s":"","r":[[0,"5",12.50,"2024-05-01T10:00:00","AQID",7]]}]}"#,
        )
        .unwrap();

        let mut table = SyncTable::new("T", "");
        table.add_column(SyncColumn::new("A", TypeCode::Int16)).unwrap();
        table.add_column(SyncColumn::new("B", TypeCode::Decimal)).unwrap();
        table.add_column(SyncColumn::new("C", TypeCode::DateTime)).unwrap();
        table.add_column(SyncColumn::new("D", TypeCode::Bytes)).unwrap();
        table.add_column(SyncColumn::new("E", TypeCode::Object)).unwrap();

        let serializer = LocalJsonSerializer::new();
        let row = serializer
            .read_rows_from_file(&path, &table)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(row[0], SyncValue::Int16(5));
        assert_eq!(row[1].to_string(), "12.50");
        assert!(matches!(row[2], SyncValue::DateTime(_)));
        assert_eq!(row[3], SyncValue::Bytes(vec![1, 2, 3]));
        assert_eq!(row[4], SyncValue::Int64(7));
    }
}
