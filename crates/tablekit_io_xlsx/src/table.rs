//! Table descriptor (per-sheet session state) and column metadata.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::conf::{N_FONT_SIZE_DEFAULT, N_WIDTH_COLUMN_DEFAULT};
use crate::spec::SpecSheetId;
use crate::style::{CellStyle, Text};
use crate::util::derive_column_heading;

////////////////////////////////////////////////////////////////////////////////
// #region Column

/// Display metadata of one column key.
#[derive(Debug, Clone)]
pub struct SpecColumn {
    /// Row mapping key.
    pub key: String,
    /// Column heading text.
    pub heading: String,
    /// Column width in character units.
    pub width: f64,
    /// Data type / style / decoration of data cells.
    pub cell_style: Arc<dyn CellStyle>,
}

impl SpecColumn {
    /// Column with derived heading, default width and plain text style.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            heading: derive_column_heading(&key),
            key,
            width: N_WIDTH_COLUMN_DEFAULT,
            cell_style: Arc::new(Text),
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_cell_style(mut self, cell_style: impl CellStyle + 'static) -> Self {
        self.cell_style = Arc::new(cell_style);
        self
    }

    pub fn with_shared_cell_style(mut self, cell_style: Arc<dyn CellStyle>) -> Self {
        self.cell_style = cell_style;
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Table

/// Session state of one logical table on one sheet.
///
/// A table continued on a new sheet gets a fresh descriptor from
/// [`SpecTable::split_on_new_sheet`]: style metadata is inherited, counters are not.
#[derive(Debug, Clone)]
pub struct SpecTable {
    sheet: SpecSheetId,
    heading: String,
    font_size: i64,
    row_height: Option<f64>,
    if_text_wrap: bool,
    if_freeze_panes: bool,
    dict_columns: IndexMap<String, SpecColumn>,

    n_row_current: usize,
    n_column_current: usize,
    n_row_data_start: Option<usize>,
    l_columns_written: Vec<String>,
    n_count: usize,
}

impl SpecTable {
    /// Create a table targeting `sheet`.
    pub fn new(sheet: SpecSheetId, heading: impl Into<String>) -> Self {
        Self {
            sheet,
            heading: heading.into(),
            font_size: N_FONT_SIZE_DEFAULT,
            row_height: None,
            if_text_wrap: false,
            if_freeze_panes: true,
            dict_columns: IndexMap::new(),
            n_row_current: 0,
            n_column_current: 0,
            n_row_data_start: None,
            l_columns_written: Vec::new(),
            n_count: 0,
        }
    }

    pub fn with_font_size(mut self, font_size: i64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Accepted and kept, but not applied to rows.
    pub fn with_row_height(mut self, row_height: Option<f64>) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn with_text_wrap(mut self, if_text_wrap: bool) -> Self {
        self.if_text_wrap = if_text_wrap;
        self
    }

    pub fn with_freeze_panes(mut self, if_freeze_panes: bool) -> Self {
        self.if_freeze_panes = if_freeze_panes;
        self
    }

    /// Register column metadata, replacing any previous entry for the same key.
    pub fn with_column(mut self, column: SpecColumn) -> Self {
        self.dict_columns.insert(column.key.clone(), column);
        self
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = SpecColumn>) -> Self {
        for column in columns {
            self.dict_columns.insert(column.key.clone(), column);
        }
        self
    }

    /// Descriptor for the next sheet of the same logical table.
    pub fn split_on_new_sheet(&self, sheet: SpecSheetId) -> SpecTable {
        SpecTable {
            sheet,
            heading: self.heading.clone(),
            font_size: self.font_size,
            row_height: self.row_height,
            if_text_wrap: self.if_text_wrap,
            if_freeze_panes: self.if_freeze_panes,
            dict_columns: self.dict_columns.clone(),
            ..SpecTable::new(sheet, "")
        }
    }

    pub fn sheet(&self) -> SpecSheetId {
        self.sheet
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn font_size(&self) -> i64 {
        self.font_size
    }

    pub fn row_height(&self) -> Option<f64> {
        self.row_height
    }

    pub fn text_wrap(&self) -> bool {
        self.if_text_wrap
    }

    pub fn freeze_panes(&self) -> bool {
        self.if_freeze_panes
    }

    /// Registered metadata for `key`, if any.
    pub fn column(&self, key: &str) -> Option<&SpecColumn> {
        self.dict_columns.get(key)
    }

    pub fn columns(&self) -> impl Iterator<Item = &SpecColumn> {
        self.dict_columns.values()
    }

    /// Physical rows written to this sheet, heading rows included.
    pub fn row_current(&self) -> usize {
        self.n_row_current
    }

    /// Columns laid out on this sheet.
    pub fn column_current(&self) -> usize {
        self.n_column_current
    }

    /// Physical row index where data rows start, once headings are written.
    pub fn row_data_start(&self) -> Option<usize> {
        self.n_row_data_start
    }

    /// Column order fixed by the first row of this sheet.
    pub fn columns_written(&self) -> &[String] {
        &self.l_columns_written
    }

    /// Finalized data row count of this sheet.
    pub fn count(&self) -> usize {
        self.n_count
    }

    /// Data rows written so far on this sheet.
    pub fn count_data_rows_written(&self) -> usize {
        match self.n_row_data_start {
            Some(n_start) => self.n_row_current.saturating_sub(n_start),
            None => 0,
        }
    }

    pub(crate) fn increment_row(&mut self) {
        self.n_row_current += 1;
    }

    pub(crate) fn increment_column(&mut self) {
        self.n_column_current += 1;
    }

    pub(crate) fn set_columns_written(&mut self, columns: Vec<String>) {
        self.l_columns_written = columns;
    }

    pub(crate) fn flag_data_row_start(&mut self) {
        self.n_row_data_start = Some(self.n_row_current);
    }

    pub(crate) fn set_count(&mut self, count: usize) {
        self.n_count = count;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
