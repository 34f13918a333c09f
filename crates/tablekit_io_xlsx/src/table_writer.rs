//! Table pagination and styling pipeline.
//!
//! [`TableWriter`] consumes a lazy row stream, lays each sheet out from its
//! first row, renders zebra-styled data rows and starts a new sheet whenever
//! the per-sheet data row ceiling is reached.

use std::sync::Arc;

use indexmap::IndexMap;
use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::conf::{
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_ROWS_HEADING, N_WIDTH_COLUMN_DEFAULT,
    derive_column_header_format, derive_default_document_format, derive_heading_format,
    derive_zebra_formats,
};
use crate::frame::generate_rows_from_dataframe;
use crate::sink::SheetWriter;
use crate::spec::{
    EnumCellDataType, EnumCellValue, SpecCell, SpecRow, SpecSheetView, SpecStyleBundle,
    SpecTableWriterOptions, TableWriteError,
};
use crate::style::{CellStyle, Text};
use crate::table::SpecTable;
use crate::util::{create_sheet_part_name, derive_column_heading};

/// Validate construction options.
pub fn validate_table_writer_options(
    options: &SpecTableWriterOptions,
) -> Result<(), TableWriteError> {
    if options.rows_per_sheet == 0 {
        return Err(TableWriteError::InvalidOptions(
            "rows_per_sheet must be >= 1.".to_string(),
        ));
    }
    if options.rows_per_sheet > N_NROWS_EXCEL_MAX - N_ROWS_HEADING {
        return Err(TableWriteError::InvalidOptions(format!(
            "rows_per_sheet must be <= {}; heading rows share the {N_NROWS_EXCEL_MAX}-row sheet limit.",
            N_NROWS_EXCEL_MAX - N_ROWS_HEADING
        )));
    }
    Ok(())
}

/// Paginating table writer.
///
/// Holds the style lookup of the sheet being written; the lookup is rebuilt
/// from the first row of every sheet.
#[derive(Debug)]
pub struct TableWriter {
    options: SpecTableWriterOptions,
    dict_style_bundles: IndexMap<String, SpecStyleBundle>,
}

impl TableWriter {
    pub fn new(options: SpecTableWriterOptions) -> Result<Self, TableWriteError> {
        validate_table_writer_options(&options)?;
        Ok(Self {
            options,
            dict_style_bundles: IndexMap::new(),
        })
    }

    pub fn options(&self) -> &SpecTableWriterOptions {
        &self.options
    }

    /// Write `rows` as one logical table starting on `table`'s sheet.
    ///
    /// Returns one descriptor per sheet produced, in sheet order.
    pub fn write_table<W, I>(
        &mut self,
        writer: &mut W,
        table: SpecTable,
        rows: I,
    ) -> Result<Vec<SpecTable>, TableWriteError>
    where
        W: SheetWriter + ?Sized,
        I: IntoIterator<Item = SpecRow>,
    {
        self.try_write_table(writer, table, rows.into_iter().map(Ok))
    }

    /// Write every row of `df`, keyed by column name.
    pub fn write_table_from_dataframe<W>(
        &mut self,
        writer: &mut W,
        table: SpecTable,
        df: &DataFrame,
    ) -> Result<Vec<SpecTable>, TableWriteError>
    where
        W: SheetWriter + ?Sized,
    {
        self.try_write_table(writer, table, generate_rows_from_dataframe(df))
    }

    /// Same as [`Self::write_table`] over a fallible row stream.
    ///
    /// The first stream error aborts the table and is returned unchanged.
    pub fn try_write_table<W, I>(
        &mut self,
        writer: &mut W,
        table: SpecTable,
        rows: I,
    ) -> Result<Vec<SpecTable>, TableWriteError>
    where
        W: SheetWriter + ?Sized,
        I: IntoIterator<Item = Result<SpecRow, TableWriteError>>,
    {
        if table.sheet() != writer.current_sheet() {
            return Err(TableWriteError::InvalidOptions(format!(
                "Table targets sheet {} but the writer's current sheet is {}.",
                table.sheet().0,
                writer.current_sheet().0
            )));
        }

        writer.set_default_format(&derive_default_document_format(
            table.font_size(),
            table.text_wrap(),
        ))?;
        let c_sheet_name_original = writer.sheet_name(table.sheet())?;
        self.dict_style_bundles.clear();

        let mut l_tables: Vec<SpecTable> = Vec::new();
        let mut table = table;
        let mut n_ordinal = 0usize;

        for row in rows {
            let row = row?;
            n_ordinal += 1;

            if table.row_data_start().is_some()
                && table.count_data_rows_written() >= self.options.rows_per_sheet
            {
                table.set_count(n_ordinal - 1);
                n_ordinal = 1;

                let sheet_next = writer.add_new_sheet_and_make_it_current()?;
                let table_next = table.split_on_new_sheet(sheet_next);
                info!(
                    sheet_prev = table.sheet().0,
                    sheet_next = sheet_next.0,
                    rows = table.count(),
                    "row ceiling reached, table continues on a new sheet"
                );
                l_tables.push(std::mem::replace(&mut table, table_next));
            }

            if table.row_data_start().is_none() {
                self.write_table_header(writer, &mut table, &row)?;
            }
            self.write_row(writer, &mut table, &row, n_ordinal)?;
        }

        table.set_count(n_ordinal);
        l_tables.push(table);

        if l_tables.len() > 1 {
            let n_total = l_tables.len();
            info!(
                base = %c_sheet_name_original,
                sheets = n_total,
                "renaming split sheets"
            );
            for (n_idx, table) in l_tables.iter().enumerate() {
                let c_name = create_sheet_part_name(&c_sheet_name_original, n_idx + 1, n_total);
                writer.set_sheet_name(table.sheet(), &c_name)?;
            }
        }

        if let Some(table_first) = l_tables.first_mut()
            && table_first.count() == 0
        {
            self.write_empty_table(writer, table_first)?;
        }

        Ok(l_tables)
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region SheetLayout

    /// Lay out the sheet from its first row: styles, widths, view and heading rows.
    fn write_table_header<W>(
        &mut self,
        writer: &mut W,
        table: &mut SpecTable,
        row: &SpecRow,
    ) -> Result<(), TableWriteError>
    where
        W: SheetWriter + ?Sized,
    {
        let l_keys: Vec<String> = row.keys().cloned().collect();
        if l_keys.len() > N_NCOLS_EXCEL_MAX {
            return Err(TableWriteError::TooManyColumns {
                width: l_keys.len(),
                max: N_NCOLS_EXCEL_MAX,
            });
        }

        self.generate_style_bundles(table, &l_keys);
        debug!(
            sheet = table.sheet().0,
            columns = l_keys.len(),
            "style bundles generated"
        );

        for (n_idx, c_key) in l_keys.iter().enumerate() {
            let width = table
                .column(c_key)
                .map_or(N_WIDTH_COLUMN_DEFAULT, |column| column.width);
            writer.set_column_width(width, n_idx + 1)?;
            table.increment_column();
        }

        if table.freeze_panes() {
            writer.set_sheet_view(
                table.sheet(),
                SpecSheetView {
                    row_freeze: N_ROWS_HEADING,
                    col_freeze: 0,
                },
            )?;
        }

        write_heading(writer, table)?;

        let row_titles: SpecRow = l_keys
            .iter()
            .map(|c_key| {
                let c_title = table
                    .column(c_key)
                    .map_or_else(|| derive_column_heading(c_key), |column| column.heading.clone());
                (c_key.clone(), EnumCellValue::String(c_title))
            })
            .collect();
        table.set_columns_written(l_keys);
        self.write_row(writer, table, &row_titles, 0)?;
        table.flag_data_row_start();
        Ok(())
    }

    /// Replace the style lookup with one bundle per key.
    fn generate_style_bundles(&mut self, table: &SpecTable, keys: &[String]) {
        let fmt_header = derive_column_header_format(table.font_size());
        let (fmt_zebra_light, fmt_zebra_dark) = derive_zebra_formats(table.font_size());

        self.dict_style_bundles = keys
            .iter()
            .map(|c_key| {
                let cell_style: Arc<dyn CellStyle> = match table.column(c_key) {
                    Some(column) => Arc::clone(&column.cell_style),
                    None => Arc::new(Text),
                };

                let mut fmt_light = fmt_zebra_light.clone();
                let mut fmt_dark = fmt_zebra_dark.clone();
                cell_style.style_cell(&mut fmt_light);
                cell_style.style_cell(&mut fmt_dark);

                let bundle = SpecStyleBundle {
                    cell_style,
                    fmt_header: fmt_header.clone(),
                    fmt_zebra_light: fmt_light,
                    fmt_zebra_dark: fmt_dark,
                };
                (c_key.clone(), bundle)
            })
            .collect();
    }

    fn write_empty_table<W>(
        &self,
        writer: &mut W,
        table: &mut SpecTable,
    ) -> Result<(), TableWriteError>
    where
        W: SheetWriter + ?Sized,
    {
        debug!(sheet = table.sheet().0, "writing empty table fallback");
        write_heading(writer, table)?;

        writer.add_row(&[], None)?;
        table.increment_row();

        writer.add_row(
            &[SpecCell::create_string(
                self.options.empty_table_message.as_str(),
                None,
            )],
            None,
        )?;
        table.increment_row();
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region RowRendering

    /// Emit one physical row in the sheet's column order.
    ///
    /// `n_position` is 0 for the column-heading row, else the 1-based data row ordinal.
    fn write_row<W>(
        &self,
        writer: &mut W,
        table: &mut SpecTable,
        row: &SpecRow,
        n_position: usize,
    ) -> Result<(), TableWriteError>
    where
        W: SheetWriter + ?Sized,
    {
        if let Some(c_key) = row
            .keys()
            .find(|c_key| !self.dict_style_bundles.contains_key(c_key.as_str()))
        {
            return Err(TableWriteError::MissingColumnStyle {
                column: c_key.clone(),
            });
        }

        let mut l_cells = Vec::with_capacity(table.columns_written().len());
        for c_key in table.columns_written() {
            let bundle = self.dict_style_bundles.get(c_key).ok_or_else(|| {
                TableWriteError::MissingColumnStyle {
                    column: c_key.clone(),
                }
            })?;
            let value = row.get(c_key).cloned().unwrap_or(EnumCellValue::None);
            l_cells.push(render_cell(bundle, value, n_position));
        }

        writer.add_row(&l_cells, None)?;
        table.increment_row();
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}

/// Single-cell table heading row.
fn write_heading<W>(writer: &mut W, table: &mut SpecTable) -> Result<(), TableWriteError>
where
    W: SheetWriter + ?Sized,
{
    let fmt_heading = derive_heading_format(table.font_size());
    writer.add_row(
        &[SpecCell::create_string(table.heading(), Some(&fmt_heading))],
        None,
    )?;
    table.increment_row();
    Ok(())
}

fn render_cell(bundle: &SpecStyleBundle, value: EnumCellValue, n_position: usize) -> SpecCell<'_> {
    let format = match n_position {
        0 => &bundle.fmt_header,
        n if n % 2 == 1 => &bundle.fmt_zebra_light,
        _ => &bundle.fmt_zebra_dark,
    };

    if value.is_none() {
        return SpecCell {
            value,
            format: Some(format),
            data_type: EnumCellDataType::Empty,
        };
    }
    if n_position == 0 {
        return SpecCell {
            value,
            format: Some(format),
            data_type: EnumCellDataType::String,
        };
    }

    let value = match bundle.cell_style.as_decorator() {
        Some(decorator) => decorator.decorate(value),
        None => value,
    };
    let data_type = if value.is_none() {
        EnumCellDataType::Empty
    } else {
        bundle.cell_style.data_type()
    };
    SpecCell {
        value,
        format: Some(format),
        data_type,
    }
}
