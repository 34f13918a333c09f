//! `tablekit_io_xlsx` v1:
//! Paginated, zebra-styled table writer for spreadsheet documents.
//!
//! Modules:
//! - `conf`         : platform limits, colors and default presets
//! - `spec`         : value models, options and the error type
//! - `style`        : cell style descriptors and built-in column kinds
//! - `table`        : table descriptor and column metadata
//! - `util`         : pure helper functions
//! - `sink`         : spreadsheet writer seam and in-memory recorder
//! - `writer`       : `rust_xlsxwriter`-backed document writer
//! - `table_writer` : style bundles, row rendering and pagination
//! - `frame`        : DataFrame row streams
pub mod conf;
pub mod frame;
pub mod sink;
pub mod spec;
pub mod style;
pub mod table;
pub mod table_writer;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_ROWS_PER_SHEET_DEFAULT,
    TUP_EXCEL_ILLEGAL, derive_default_table_writer_options,
};
pub use frame::{derive_dataframe_from_ipc_bytes, generate_rows_from_dataframe};
pub use sink::{RecordingWriter, SheetWriter, SpecRecordedCell, SpecRecordedSheet};
pub use spec::{
    EnumCellDataType, EnumCellValue, SpecCell, SpecCellFormat, SpecRow, SpecSheetId,
    SpecSheetView, SpecStyleBundle, SpecTableWriterOptions, TableWriteError,
};
pub use style::{
    Amount, CellStyle, ContentDecorator, Date, Integer, PaddedNumericalString, Percentage, Text,
    convert_iso_date_to_serial,
};
pub use table::{SpecColumn, SpecTable};
pub use table_writer::{TableWriter, validate_table_writer_options};
pub use util::{create_sheet_part_name, derive_column_heading, sanitize_sheet_name};
pub use writer::XlsxWriter;
