//! XLSX document writer backed by `rust_xlsxwriter`.

use std::collections::HashMap;
use std::path::PathBuf;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::conf::N_NCOLS_EXCEL_MAX;
use crate::sink::SheetWriter;
use crate::spec::{
    EnumCellDataType, EnumCellValue, SpecCell, SpecCellFormat, SpecSheetId, SpecSheetView,
    TableWriteError,
};
use crate::util::{cast_col_num, cast_row_num, derive_default_sheet_name, validate_sheet_name};

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::close`] is called.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    l_sheet_names: Vec<String>,
    l_rows_next: Vec<usize>,
    n_sheet_current: usize,
    fmt_default: SpecCellFormat,
    dict_formats: HashMap<SpecCellFormat, Format>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path, holding one current sheet `Sheet1`.
    pub fn new(path_file_out: impl Into<PathBuf>) -> Result<Self, TableWriteError> {
        let mut writer = Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            l_sheet_names: Vec::new(),
            l_rows_next: Vec::new(),
            n_sheet_current: 0,
            fmt_default: SpecCellFormat::default(),
            dict_formats: HashMap::new(),
            if_closed: false,
        };
        writer.add_new_sheet_and_make_it_current()?;
        Ok(writer)
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Number of sheets in the document.
    pub fn sheet_count(&self) -> usize {
        self.l_sheet_names.len()
    }

    /// Physical rows written to `sheet`.
    pub fn rows_written(&self, sheet: SpecSheetId) -> Option<usize> {
        self.l_rows_next.get(sheet.0).copied()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), TableWriteError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        debug!(
            path = %self.path_file_out.display(),
            sheets = self.l_sheet_names.len(),
            "xlsx document saved"
        );
        Ok(())
    }

    fn validate_open(&self) -> Result<(), TableWriteError> {
        if self.if_closed {
            return Err(TableWriteError::WriterClosed);
        }
        Ok(())
    }

    fn get_worksheet(&mut self, sheet: SpecSheetId) -> Result<&mut Worksheet, TableWriteError> {
        if sheet.0 >= self.l_sheet_names.len() {
            return Err(TableWriteError::UnknownSheet(sheet.0));
        }
        Ok(self.workbook.worksheet_from_index(sheet.0)?)
    }

    /// Default style overlaid with `format`, converted once per distinct result.
    fn resolve_format(&mut self, format: Option<&SpecCellFormat>) -> Format {
        let fmt_spec = match format {
            Some(fmt) => self.fmt_default.merge(fmt),
            None => self.fmt_default.clone(),
        };
        self.dict_formats
            .entry(fmt_spec)
            .or_insert_with_key(derive_rust_xlsx_format)
            .clone()
    }
}

impl SheetWriter for XlsxWriter {
    fn set_default_format(&mut self, format: &SpecCellFormat) -> Result<(), TableWriteError> {
        self.validate_open()?;
        self.fmt_default = format.clone();
        Ok(())
    }

    fn add_row(
        &mut self,
        cells: &[SpecCell<'_>],
        format_row: Option<&SpecCellFormat>,
    ) -> Result<(), TableWriteError> {
        self.validate_open()?;
        if cells.len() > N_NCOLS_EXCEL_MAX {
            return Err(TableWriteError::TooManyColumns {
                width: cells.len(),
                max: N_NCOLS_EXCEL_MAX,
            });
        }

        let l_formats: Vec<Format> = cells
            .iter()
            .map(|cell| self.resolve_format(cell.format.or(format_row)))
            .collect();

        let sheet = self.current_sheet();
        let n_row = cast_row_num(self.l_rows_next[sheet.0])?;
        let worksheet = self.get_worksheet(sheet)?;
        for (n_idx_col, (cell, format)) in cells.iter().zip(&l_formats).enumerate() {
            write_cell_with_format(worksheet, n_row, cast_col_num(n_idx_col)?, cell, format)?;
        }

        self.l_rows_next[sheet.0] += 1;
        Ok(())
    }

    fn add_new_sheet_and_make_it_current(&mut self) -> Result<SpecSheetId, TableWriteError> {
        self.validate_open()?;
        let c_name = derive_default_sheet_name(self.l_sheet_names.iter().map(String::as_str));
        self.workbook.add_worksheet().set_name(&c_name)?;

        self.l_sheet_names.push(c_name);
        self.l_rows_next.push(0);
        self.n_sheet_current = self.l_sheet_names.len() - 1;
        Ok(SpecSheetId(self.n_sheet_current))
    }

    fn current_sheet(&self) -> SpecSheetId {
        SpecSheetId(self.n_sheet_current)
    }

    fn set_column_width(&mut self, width: f64, col_1based: usize) -> Result<(), TableWriteError> {
        self.validate_open()?;
        let Some(n_idx_col) = col_1based.checked_sub(1) else {
            return Err(TableWriteError::InvalidOptions(
                "Column index is one-based; got 0.".to_string(),
            ));
        };
        let n_col = cast_col_num(n_idx_col)?;
        let sheet = self.current_sheet();
        self.get_worksheet(sheet)?.set_column_width(n_col, width)?;
        Ok(())
    }

    fn set_sheet_view(
        &mut self,
        sheet: SpecSheetId,
        view: SpecSheetView,
    ) -> Result<(), TableWriteError> {
        self.validate_open()?;
        if view.row_freeze == 0 && view.col_freeze == 0 {
            return Ok(());
        }
        let n_row = cast_row_num(view.row_freeze)?;
        let n_col = cast_col_num(view.col_freeze)?;
        self.get_worksheet(sheet)?.set_freeze_panes(n_row, n_col)?;
        Ok(())
    }

    fn sheet_name(&self, sheet: SpecSheetId) -> Result<String, TableWriteError> {
        self.l_sheet_names
            .get(sheet.0)
            .cloned()
            .ok_or(TableWriteError::UnknownSheet(sheet.0))
    }

    fn set_sheet_name(&mut self, sheet: SpecSheetId, name: &str) -> Result<(), TableWriteError> {
        self.validate_open()?;
        if sheet.0 >= self.l_sheet_names.len() {
            return Err(TableWriteError::UnknownSheet(sheet.0));
        }
        validate_sheet_name(
            name,
            self.l_sheet_names
                .iter()
                .enumerate()
                .filter(|(n_idx, _)| *n_idx != sheet.0)
                .map(|(_, c_name)| c_name.as_str()),
        )?;

        self.get_worksheet(sheet)?.set_name(name)?;
        self.l_sheet_names[sheet.0] = name.to_string();
        Ok(())
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    n_row: u32,
    n_col: u16,
    cell: &SpecCell<'_>,
    format: &Format,
) -> Result<(), TableWriteError> {
    match (cell.data_type, &cell.value) {
        (EnumCellDataType::Empty, _) | (_, EnumCellValue::None) => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        (EnumCellDataType::String, value) => {
            worksheet.write_string_with_format(n_row, n_col, value.to_string(), format)?;
        }
        (EnumCellDataType::Number, EnumCellValue::Number(val)) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        (EnumCellDataType::Number, EnumCellValue::String(val)) => {
            match val.trim().parse::<f64>() {
                Ok(n_val) if n_val.is_finite() => {
                    worksheet.write_number_with_format(n_row, n_col, n_val, format)?;
                }
                _ => {
                    worksheet.write_string_with_format(n_row, n_col, val.as_str(), format)?;
                }
            }
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}
