//! Shared table/sheet specification models and the crate error type.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use crate::conf::N_ROWS_PER_SHEET_DEFAULT;
use crate::style::CellStyle;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Visual cell style. Writers treat it as an opaque value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellAndRow

/// Logical cell content.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Whether the value is missing.
    pub fn is_none(&self) -> bool {
        matches!(self, EnumCellValue::None)
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumCellValue::None => Ok(()),
            EnumCellValue::String(val) => write!(f, "{val}"),
            EnumCellValue::Number(val) => write!(f, "{val}"),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        EnumCellValue::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        EnumCellValue::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        EnumCellValue::Number(value)
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        EnumCellValue::Number(value as f64)
    }
}

impl From<i32> for EnumCellValue {
    fn from(value: i32) -> Self {
        EnumCellValue::Number(f64::from(value))
    }
}

impl<T: Into<EnumCellValue>> From<Option<T>> for EnumCellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(EnumCellValue::None, Into::into)
    }
}

/// Logical type a cell is encoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellDataType {
    /// Text cell.
    String,
    /// Numeric cell.
    Number,
    /// Blank cell.
    Empty,
}

/// One physical cell handed to a [`crate::sink::SheetWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCell<'a> {
    /// Content after decoration.
    pub value: EnumCellValue,
    /// Style reference; `None` means the document default style.
    pub format: Option<&'a SpecCellFormat>,
    /// Encoding tag.
    pub data_type: EnumCellDataType,
}

impl<'a> SpecCell<'a> {
    /// Create a text cell.
    pub fn create_string(value: impl Into<String>, format: Option<&'a SpecCellFormat>) -> Self {
        Self {
            value: EnumCellValue::String(value.into()),
            format,
            data_type: EnumCellDataType::String,
        }
    }
}

/// Logical row: column key -> value, in key insertion order.
pub type SpecRow = IndexMap<String, EnumCellValue>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetSpecification

/// Opaque handle of a sheet owned by a [`crate::sink::SheetWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecSheetId(pub usize);

/// Sheet view options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecSheetView {
    /// Number of frozen rows at the top.
    pub row_freeze: usize,
    /// Number of frozen columns at the left.
    pub col_freeze: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleBundle

/// Per-column styles generated once per sheet.
#[derive(Debug, Clone)]
pub struct SpecStyleBundle {
    /// Descriptor that typed/styled this column.
    pub cell_style: Arc<dyn CellStyle>,
    /// Column-heading style.
    pub fmt_header: SpecCellFormat,
    /// Odd data rows.
    pub fmt_zebra_light: SpecCellFormat,
    /// Even data rows.
    pub fmt_zebra_dark: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Construction-time options of [`crate::table_writer::TableWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTableWriterOptions {
    /// Text written when a table has no data rows.
    pub empty_table_message: String,
    /// Data rows per sheet before the table continues on a new sheet.
    pub rows_per_sheet: usize,
}

impl Default for SpecTableWriterOptions {
    fn default() -> Self {
        Self {
            empty_table_message: String::new(),
            rows_per_sheet: N_ROWS_PER_SHEET_DEFAULT,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised while paginating/writing a table.
#[derive(Debug, Error)]
pub enum TableWriteError {
    /// A row carries a key without a generated style bundle.
    #[error("No style registered for column {column:?} on the current sheet.")]
    MissingColumnStyle {
        /// Offending column key.
        column: String,
    },

    /// Invalid construction options.
    #[error("{0}")]
    InvalidOptions(String),

    /// Row wider than the worksheet column limit.
    #[error("Row has {width} columns; worksheet limit is {max}.")]
    TooManyColumns {
        /// Number of columns requested.
        width: usize,
        /// Platform maximum.
        max: usize,
    },

    /// Sheet name rejected by platform rules.
    #[error("Invalid sheet name {name:?}: {reason}")]
    InvalidSheetName {
        /// Rejected name.
        name: String,
        /// Rule that was violated.
        reason: String,
    },

    /// Sheet name already used by another sheet.
    #[error("Sheet name already in use: {0:?}")]
    SheetNameConflict(String),

    /// Sheet handle not owned by the writer.
    #[error("Unknown sheet index: {0}")]
    UnknownSheet(usize),

    /// The row stream failed.
    #[error("Row source failed: {0}")]
    RowSource(String),

    /// Write attempted after the document was saved.
    #[error("Cannot write after close().")]
    WriterClosed,

    /// Encoder/storage failure.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_patch_values() {
        let fmt_base = SpecCellFormat {
            font_size: Some(8),
            bg_color: Some("#000000".to_string()),
            ..Default::default()
        };
        let fmt = fmt_base.with_(SpecCellFormat {
            bg_color: Some("#FFFFFF".to_string()),
            bold: Some(true),
            ..Default::default()
        });

        assert_eq!(fmt.font_size, Some(8));
        assert_eq!(fmt.bg_color.as_deref(), Some("#FFFFFF"));
        assert_eq!(fmt.bold, Some(true));
    }

    #[test]
    fn test_cell_value_from_option() {
        assert_eq!(EnumCellValue::from(None::<&str>), EnumCellValue::None);
        assert_eq!(EnumCellValue::from(Some(3)), EnumCellValue::Number(3.0));
        assert_eq!(EnumCellValue::from(1.0).to_string(), "1");
    }
}
