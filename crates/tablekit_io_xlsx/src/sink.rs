//! Spreadsheet writer seam consumed by [`crate::table_writer::TableWriter`].

use std::collections::BTreeMap;

use crate::spec::{
    EnumCellDataType, EnumCellValue, SpecCell, SpecCellFormat, SpecSheetId, SpecSheetView,
    TableWriteError,
};
use crate::util::{derive_default_sheet_name, validate_sheet_name};

/// Row-oriented document writer with a "current sheet" cursor.
///
/// Rows are appended to the current sheet in call order.
pub trait SheetWriter {
    /// Style every cell is overlaid on from now on.
    fn set_default_format(&mut self, format: &SpecCellFormat) -> Result<(), TableWriteError>;

    /// Append one physical row to the current sheet.
    ///
    /// `format_row` applies to cells that carry no style of their own.
    fn add_row(
        &mut self,
        cells: &[SpecCell<'_>],
        format_row: Option<&SpecCellFormat>,
    ) -> Result<(), TableWriteError>;

    /// Allocate a new sheet and direct subsequent rows to it.
    fn add_new_sheet_and_make_it_current(&mut self) -> Result<SpecSheetId, TableWriteError>;

    /// Sheet receiving rows.
    fn current_sheet(&self) -> SpecSheetId;

    /// Set the width of a one-based column on the current sheet.
    fn set_column_width(&mut self, width: f64, col_1based: usize) -> Result<(), TableWriteError>;

    fn set_sheet_view(
        &mut self,
        sheet: SpecSheetId,
        view: SpecSheetView,
    ) -> Result<(), TableWriteError>;

    fn sheet_name(&self, sheet: SpecSheetId) -> Result<String, TableWriteError>;

    /// Rename a sheet; fails on invalid or already used names.
    fn set_sheet_name(&mut self, sheet: SpecSheetId, name: &str) -> Result<(), TableWriteError>;
}

////////////////////////////////////////////////////////////////////////////////
// #region RecordingWriter

/// Owned copy of a written cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRecordedCell {
    pub value: EnumCellValue,
    pub format: Option<SpecCellFormat>,
    pub data_type: EnumCellDataType,
}

/// Everything written to one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRecordedSheet {
    pub name: String,
    pub rows: Vec<Vec<SpecRecordedCell>>,
    /// One-based column index -> width.
    pub column_widths: BTreeMap<usize, f64>,
    pub view: Option<SpecSheetView>,
}

/// In-memory [`SheetWriter`] that records every call; used for dry runs.
#[derive(Debug, Clone)]
pub struct RecordingWriter {
    l_sheets: Vec<SpecRecordedSheet>,
    n_sheet_current: usize,
    fmt_default: Option<SpecCellFormat>,
}

impl Default for RecordingWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingWriter {
    /// Writer holding a single current sheet named `Sheet1`.
    pub fn new() -> Self {
        Self {
            l_sheets: vec![SpecRecordedSheet {
                name: derive_default_sheet_name(std::iter::empty()),
                ..Default::default()
            }],
            n_sheet_current: 0,
            fmt_default: None,
        }
    }

    pub fn sheets(&self) -> &[SpecRecordedSheet] {
        &self.l_sheets
    }

    pub fn sheet(&self, sheet: SpecSheetId) -> Option<&SpecRecordedSheet> {
        self.l_sheets.get(sheet.0)
    }

    pub fn default_format(&self) -> Option<&SpecCellFormat> {
        self.fmt_default.as_ref()
    }

    fn get_sheet_mut(
        &mut self,
        sheet: SpecSheetId,
    ) -> Result<&mut SpecRecordedSheet, TableWriteError> {
        self.l_sheets
            .get_mut(sheet.0)
            .ok_or(TableWriteError::UnknownSheet(sheet.0))
    }
}

impl SheetWriter for RecordingWriter {
    fn set_default_format(&mut self, format: &SpecCellFormat) -> Result<(), TableWriteError> {
        self.fmt_default = Some(format.clone());
        Ok(())
    }

    fn add_row(
        &mut self,
        cells: &[SpecCell<'_>],
        format_row: Option<&SpecCellFormat>,
    ) -> Result<(), TableWriteError> {
        let l_cells = cells
            .iter()
            .map(|cell| SpecRecordedCell {
                value: cell.value.clone(),
                format: cell.format.or(format_row).cloned(),
                data_type: cell.data_type,
            })
            .collect();
        let sheet = self.current_sheet();
        self.get_sheet_mut(sheet)?.rows.push(l_cells);
        Ok(())
    }

    fn add_new_sheet_and_make_it_current(&mut self) -> Result<SpecSheetId, TableWriteError> {
        let c_name = derive_default_sheet_name(self.l_sheets.iter().map(|s| s.name.as_str()));
        self.l_sheets.push(SpecRecordedSheet {
            name: c_name,
            ..Default::default()
        });
        self.n_sheet_current = self.l_sheets.len() - 1;
        Ok(SpecSheetId(self.n_sheet_current))
    }

    fn current_sheet(&self) -> SpecSheetId {
        SpecSheetId(self.n_sheet_current)
    }

    fn set_column_width(&mut self, width: f64, col_1based: usize) -> Result<(), TableWriteError> {
        let sheet = self.current_sheet();
        self.get_sheet_mut(sheet)?
            .column_widths
            .insert(col_1based, width);
        Ok(())
    }

    fn set_sheet_view(
        &mut self,
        sheet: SpecSheetId,
        view: SpecSheetView,
    ) -> Result<(), TableWriteError> {
        self.get_sheet_mut(sheet)?.view = Some(view);
        Ok(())
    }

    fn sheet_name(&self, sheet: SpecSheetId) -> Result<String, TableWriteError> {
        self.sheet(sheet)
            .map(|s| s.name.clone())
            .ok_or(TableWriteError::UnknownSheet(sheet.0))
    }

    fn set_sheet_name(&mut self, sheet: SpecSheetId, name: &str) -> Result<(), TableWriteError> {
        if sheet.0 >= self.l_sheets.len() {
            return Err(TableWriteError::UnknownSheet(sheet.0));
        }
        validate_sheet_name(
            name,
            self.l_sheets
                .iter()
                .enumerate()
                .filter(|(n_idx, _)| *n_idx != sheet.0)
                .map(|(_, s)| s.name.as_str()),
        )?;
        self.get_sheet_mut(sheet)?.name = name.to_string();
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_writer_sheet_allocation() {
        let mut writer = RecordingWriter::new();
        assert_eq!(writer.current_sheet(), SpecSheetId(0));
        assert_eq!(writer.sheet_name(SpecSheetId(0)).expect("name"), "Sheet1");

        writer
            .set_sheet_name(SpecSheetId(0), "Sheet2")
            .expect("rename first sheet");
        let sheet = writer
            .add_new_sheet_and_make_it_current()
            .expect("new sheet");
        assert_eq!(sheet, SpecSheetId(1));
        assert_eq!(writer.sheet_name(sheet).expect("name"), "Sheet3");
        assert_eq!(writer.current_sheet(), sheet);
    }

    #[test]
    fn test_recording_writer_rejects_duplicate_names() {
        let mut writer = RecordingWriter::new();
        let sheet = writer
            .add_new_sheet_and_make_it_current()
            .expect("new sheet");

        let res = writer.set_sheet_name(sheet, "SHEET1");
        assert!(matches!(res, Err(TableWriteError::SheetNameConflict(_))));

        writer
            .set_sheet_name(SpecSheetId(0), "Sheet1")
            .expect("renaming to own name is allowed");
        assert!(matches!(
            writer.set_sheet_name(SpecSheetId(9), "X"),
            Err(TableWriteError::UnknownSheet(9))
        ));
    }

    #[test]
    fn test_recording_writer_row_format_fallback() {
        let mut writer = RecordingWriter::new();
        let fmt_cell = SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        };
        let fmt_row = SpecCellFormat {
            italic: Some(true),
            ..Default::default()
        };
        writer
            .add_row(
                &[
                    SpecCell::create_string("a", Some(&fmt_cell)),
                    SpecCell::create_string("b", None),
                ],
                Some(&fmt_row),
            )
            .expect("add row");

        let l_row = &writer.sheets()[0].rows[0];
        assert_eq!(l_row[0].format.as_ref(), Some(&fmt_cell));
        assert_eq!(l_row[1].format.as_ref(), Some(&fmt_row));
    }
}
