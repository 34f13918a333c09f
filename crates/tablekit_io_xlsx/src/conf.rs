//! Table writer constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecTableWriterOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Sheet name prefix kept when a table spans several sheets.
///
/// Leaves room for the ` (index|total)` suffix under the name limit.
pub const N_LEN_SHEET_NAME_BASE_MAX: usize = 21;
/// Prefix used for writer-allocated sheet names (`Sheet1`, `Sheet2`, ...).
pub const C_SHEET_NAME_DEFAULT_PREFIX: &str = "Sheet";

/// Rows written above the data block: table heading + column headings.
pub const N_ROWS_HEADING: usize = 2;
/// Default data rows per sheet before the table continues on a new sheet.
pub const N_ROWS_PER_SHEET_DEFAULT: usize = 262_144;

/// Column width used when no column metadata is registered.
pub const N_WIDTH_COLUMN_DEFAULT: f64 = 10.0;
/// Default table font size in points.
pub const N_FONT_SIZE_DEFAULT: i64 = 8;
/// Extra points added to the table font size for the heading row.
pub const N_FONT_SIZE_HEADING_DELTA: i64 = 2;

/// Column-heading font color.
pub const C_COLOR_HEADER_FONT: &str = "#FFFFFF";
/// Column-heading background fill.
pub const C_COLOR_HEADER_FILL: &str = "#4472C4";
/// Background fill of even ("dark") zebra rows.
pub const C_COLOR_ZEBRA_DARK_FILL: &str = "#D9E1F2";

/// Document default style derived from table font size and wrap flag.
pub fn derive_default_document_format(font_size: i64, if_text_wrap: bool) -> SpecCellFormat {
    SpecCellFormat {
        font_size: Some(font_size),
        text_wrap: Some(if_text_wrap),
        ..Default::default()
    }
}

/// Style of the single-cell table heading row.
pub fn derive_heading_format(font_size: i64) -> SpecCellFormat {
    SpecCellFormat {
        font_size: Some(font_size + N_FONT_SIZE_HEADING_DELTA),
        text_wrap: Some(false),
        ..Default::default()
    }
}

/// Style of column-heading cells.
pub fn derive_column_header_format(font_size: i64) -> SpecCellFormat {
    SpecCellFormat {
        font_size: Some(font_size),
        bold: Some(true),
        align: Some("center".to_string()),
        text_wrap: Some(true),
        bg_color: Some(C_COLOR_HEADER_FILL.to_string()),
        font_color: Some(C_COLOR_HEADER_FONT.to_string()),
        ..Default::default()
    }
}

/// Zebra styles for odd (`light`) and even (`dark`) data rows.
pub fn derive_zebra_formats(font_size: i64) -> (SpecCellFormat, SpecCellFormat) {
    let fmt_light = SpecCellFormat {
        font_size: Some(font_size),
        ..Default::default()
    };
    let fmt_dark = fmt_light.with_(SpecCellFormat {
        bg_color: Some(C_COLOR_ZEBRA_DARK_FILL.to_string()),
        ..Default::default()
    });
    (fmt_light, fmt_dark)
}

/// Build default table writer options.
pub fn derive_default_table_writer_options() -> SpecTableWriterOptions {
    SpecTableWriterOptions::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_writer_options() {
        let options = derive_default_table_writer_options();
        assert_eq!(options.rows_per_sheet, N_ROWS_PER_SHEET_DEFAULT);
        assert!(options.empty_table_message.is_empty());
    }

    #[test]
    fn test_zebra_formats_differ_by_fill_only() {
        let (fmt_light, fmt_dark) = derive_zebra_formats(11);
        assert_eq!(fmt_light.font_size, Some(11));
        assert_eq!(fmt_light.bg_color, None);
        assert_eq!(fmt_dark.bg_color.as_deref(), Some(C_COLOR_ZEBRA_DARK_FILL));
        assert_eq!(
            fmt_dark.with_(SpecCellFormat {
                bg_color: None,
                ..Default::default()
            }),
            fmt_dark
        );
    }

    #[test]
    fn test_heading_and_header_formats() {
        let fmt_heading = derive_heading_format(N_FONT_SIZE_DEFAULT);
        assert_eq!(
            fmt_heading.font_size,
            Some(N_FONT_SIZE_DEFAULT + N_FONT_SIZE_HEADING_DELTA)
        );
        assert_eq!(fmt_heading.text_wrap, Some(false));

        let fmt_header = derive_column_header_format(N_FONT_SIZE_DEFAULT);
        assert_eq!(fmt_header.bold, Some(true));
        assert_eq!(fmt_header.text_wrap, Some(true));
        assert_eq!(fmt_header.align.as_deref(), Some("center"));
        assert_eq!(fmt_header.font_color.as_deref(), Some(C_COLOR_HEADER_FONT));
    }
}
