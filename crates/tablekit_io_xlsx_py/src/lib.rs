use std::sync::Arc;

use arrow::array::{StructArray, TryExtend};
use arrow::datatypes::{ArrowDataType, ArrowSchema, Field as ArrowField};
use arrow::record_batch::RecordBatchT;
use polars::prelude::DataFrame;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::ffi as pyffi;
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBool, PyDict, PyFloat, PyInt, PyList, PyString};
use tablekit_io_xlsx::conf::{N_FONT_SIZE_DEFAULT, N_ROWS_PER_SHEET_DEFAULT};
use tablekit_io_xlsx::spec::{EnumCellValue, SpecRow, SpecTableWriterOptions, TableWriteError};
use tablekit_io_xlsx::style::{
    Amount, CellStyle, Date, Integer, PaddedNumericalString, Percentage, Text,
};
use tablekit_io_xlsx::{
    SheetWriter, SpecColumn, SpecTable, TableWriter as RsTableWriter, XlsxWriter as RsXlsxWriter,
    sanitize_sheet_name,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "tablekit.xlsx.table_writer.v1";
const C_BRIDGE_TRANSPORT: &str = "arrow_c_data";
const C_ARROW_ARRAY_STREAM_CAPSULE_NAME: &[u8] = b"arrow_array_stream\0";

#[pyclass(name = "TableWriter")]
struct PyTableWriter {
    inner: RsTableWriter,
    writer: RsXlsxWriter,
    n_tables_written: usize,
}

#[pymethods]
impl PyTableWriter {
    #[new]
    #[pyo3(signature = (
        file_out,
        empty_table_message = String::new(),
        rows_per_sheet = N_ROWS_PER_SHEET_DEFAULT
    ))]
    fn new(file_out: String, empty_table_message: String, rows_per_sheet: usize) -> PyResult<Self> {
        let inner = RsTableWriter::new(SpecTableWriterOptions {
            empty_table_message,
            rows_per_sheet,
        })
        .map_err(convert_table_write_error)?;
        let writer = RsXlsxWriter::new(&file_out).map_err(convert_table_write_error)?;

        Ok(Self {
            inner,
            writer,
            n_tables_written: 0,
        })
    }

    #[getter]
    fn file_out(&self) -> String {
        self.writer.file_out()
    }

    fn __enter__(slf: PyRefMut<'_, Self>) -> PyRefMut<'_, Self> {
        slf
    }

    #[pyo3(signature = (_exc_type=None, _exc=None, _tb=None))]
    fn __exit__(
        &mut self,
        _exc_type: Option<&Bound<'_, PyAny>>,
        _exc: Option<&Bound<'_, PyAny>>,
        _tb: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<()> {
        self.close()
    }

    fn close(&mut self) -> PyResult<()> {
        self.writer.close().map_err(convert_table_write_error)
    }

    #[pyo3(signature = (
        rows,
        heading = "",
        sheet_name = None,
        columns = None,
        font_size = N_FONT_SIZE_DEFAULT,
        text_wrap = false,
        freeze_panes = true,
        row_height = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn write_table<'py>(
        &mut self,
        py: Python<'py>,
        rows: &Bound<'py, PyAny>,
        heading: &str,
        sheet_name: Option<&str>,
        columns: Option<&Bound<'py, PyAny>>,
        font_size: i64,
        text_wrap: bool,
        freeze_panes: bool,
        row_height: Option<f64>,
    ) -> PyResult<Bound<'py, PyList>> {
        let table = self.create_table(
            heading,
            sheet_name,
            columns,
            font_size,
            text_wrap,
            freeze_panes,
            row_height,
        )?;

        let mut err_row_source: Option<PyErr> = None;
        let iter_rows = rows.try_iter()?.map(|res_item| {
            res_item.and_then(|item| parse_row(&item)).map_err(|err| {
                let c_msg = err.to_string();
                err_row_source = Some(err);
                TableWriteError::RowSource(c_msg)
            })
        });
        let res_tables = self
            .inner
            .try_write_table(&mut self.writer, table, iter_rows);

        if let Some(err) = err_row_source {
            return Err(err);
        }
        let l_tables = res_tables.map_err(convert_table_write_error)?;
        self.create_report(py, &l_tables)
    }

    #[pyo3(signature = (
        df,
        heading = "",
        sheet_name = None,
        columns = None,
        font_size = N_FONT_SIZE_DEFAULT,
        text_wrap = false,
        freeze_panes = true,
        row_height = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn write_dataframe<'py>(
        &mut self,
        py: Python<'py>,
        df: &Bound<'py, PyAny>,
        heading: &str,
        sheet_name: Option<&str>,
        columns: Option<&Bound<'py, PyAny>>,
        font_size: i64,
        text_wrap: bool,
        freeze_panes: bool,
        row_height: Option<f64>,
    ) -> PyResult<Bound<'py, PyList>> {
        let df_data = derive_dataframe_from_any_dataframe(py, df)?;
        let table = self.create_table(
            heading,
            sheet_name,
            columns,
            font_size,
            text_wrap,
            freeze_panes,
            row_height,
        )?;

        let l_tables = self
            .inner
            .write_table_from_dataframe(&mut self.writer, table, &df_data)
            .map_err(convert_table_write_error)?;
        self.create_report(py, &l_tables)
    }
}

impl PyTableWriter {
    /// Descriptor for the next table; every table after the first gets a fresh sheet.
    #[allow(clippy::too_many_arguments)]
    fn create_table(
        &mut self,
        heading: &str,
        sheet_name: Option<&str>,
        columns: Option<&Bound<'_, PyAny>>,
        font_size: i64,
        text_wrap: bool,
        freeze_panes: bool,
        row_height: Option<f64>,
    ) -> PyResult<SpecTable> {
        let l_columns = parse_columns(columns)?;

        if self.n_tables_written > 0 {
            self.writer
                .add_new_sheet_and_make_it_current()
                .map_err(convert_table_write_error)?;
        }
        self.n_tables_written += 1;

        let sheet = self.writer.current_sheet();
        if let Some(c_name) = sheet_name {
            self.writer
                .set_sheet_name(sheet, &sanitize_sheet_name(c_name, "_"))
                .map_err(convert_table_write_error)?;
        }

        Ok(SpecTable::new(sheet, heading)
            .with_font_size(font_size)
            .with_text_wrap(text_wrap)
            .with_freeze_panes(freeze_panes)
            .with_row_height(row_height)
            .with_columns(l_columns))
    }

    fn create_report<'py>(
        &self,
        py: Python<'py>,
        l_tables: &[SpecTable],
    ) -> PyResult<Bound<'py, PyList>> {
        let mut l_report_obj = Vec::with_capacity(l_tables.len());
        for table in l_tables {
            let dict_report = PyDict::new(py);
            let c_sheet_name = self
                .writer
                .sheet_name(table.sheet())
                .map_err(convert_table_write_error)?;
            dict_report.set_item("sheet_name", c_sheet_name)?;
            dict_report.set_item("row_count", table.count())?;
            dict_report.set_item("column_count", table.column_current())?;
            dict_report.set_item("row_current", table.row_current())?;
            l_report_obj.push(dict_report);
        }
        PyList::new(py, l_report_obj)
    }
}

fn convert_table_write_error(err: TableWriteError) -> PyErr {
    match err {
        TableWriteError::Xlsx(_) | TableWriteError::WriterClosed => {
            PyRuntimeError::new_err(err.to_string())
        }
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn parse_row(obj: &Bound<'_, PyAny>) -> PyResult<SpecRow> {
    let dict_row = obj
        .downcast::<PyDict>()
        .map_err(|_| PyValueError::new_err("Each row must be a dict of column key -> value."))?;

    let mut row = SpecRow::with_capacity(dict_row.len());
    for (key, value) in dict_row.iter() {
        row.insert(key.extract::<String>()?, parse_cell_value(&value)?);
    }
    Ok(row)
}

fn parse_cell_value(value: &Bound<'_, PyAny>) -> PyResult<EnumCellValue> {
    if value.is_none() {
        return Ok(EnumCellValue::None);
    }
    if value.is_instance_of::<PyBool>() {
        let if_value = value.extract::<bool>()?;
        return Ok(EnumCellValue::from(if if_value { "True" } else { "False" }));
    }
    if value.is_instance_of::<PyInt>() {
        return match value.extract::<i64>() {
            Ok(n_value) => Ok(EnumCellValue::from(n_value)),
            Err(_) => Ok(EnumCellValue::Number(value.extract::<f64>()?)),
        };
    }
    if value.is_instance_of::<PyFloat>() {
        return Ok(EnumCellValue::Number(value.extract::<f64>()?));
    }
    if value.is_instance_of::<PyString>() {
        return Ok(EnumCellValue::String(value.extract::<String>()?));
    }
    Ok(EnumCellValue::String(value.str()?.to_string()))
}

fn parse_columns(obj: Option<&Bound<'_, PyAny>>) -> PyResult<Vec<SpecColumn>> {
    let Some(obj) = obj else {
        return Ok(Vec::new());
    };
    if obj.is_none() {
        return Ok(Vec::new());
    }

    let mut l_columns = Vec::new();
    for res_item in obj.try_iter()? {
        let item = res_item?;
        let c_key = extract_optional_attr::<String>(&item, "key")?
            .ok_or_else(|| PyValueError::new_err("Column metadata requires a `key` attribute."))?;

        let mut column = SpecColumn::new(c_key);
        if let Some(c_heading) = extract_optional_attr::<String>(&item, "heading")? {
            column = column.with_heading(c_heading);
        }
        if let Some(width) = extract_optional_attr::<f64>(&item, "width")? {
            column = column.with_width(width);
        }
        if let Some(c_style) = extract_optional_attr::<String>(&item, "cell_style")? {
            let pad_length = extract_optional_attr::<usize>(&item, "pad_length")?;
            column = column.with_shared_cell_style(parse_cell_style(&c_style, pad_length)?);
        }
        l_columns.push(column);
    }
    Ok(l_columns)
}

fn parse_cell_style(value: &str, pad_length: Option<usize>) -> PyResult<Arc<dyn CellStyle>> {
    match value {
        "text" => Ok(Arc::new(Text)),
        "integer" => Ok(Arc::new(Integer)),
        "amount" => Ok(Arc::new(Amount)),
        "percentage" => Ok(Arc::new(Percentage)),
        "date" => Ok(Arc::new(Date)),
        "padded_numerical_string" => {
            let pad_length = pad_length.ok_or_else(|| {
                PyValueError::new_err("cell_style 'padded_numerical_string' requires pad_length.")
            })?;
            Ok(Arc::new(PaddedNumericalString::new(pad_length)))
        }
        _ => Err(PyValueError::new_err(
            "cell_style must be one of: 'text', 'integer', 'amount', 'percentage', 'date', \
             'padded_numerical_string'.",
        )),
    }
}

fn derive_dataframe_from_any_dataframe(
    py: Python<'_>,
    df: &Bound<'_, PyAny>,
) -> PyResult<DataFrame> {
    let df_polars = convert_to_polars_dataframe(py, df)?;
    let obj_capsule = df_polars.call_method0("__arrow_c_stream__")?;
    derive_dataframe_from_arrow_c_stream_capsule(&obj_capsule)
}

fn derive_dataframe_from_arrow_c_stream_capsule(
    obj_capsule: &Bound<'_, PyAny>,
) -> PyResult<DataFrame> {
    let ptr_capsule = obj_capsule.as_ptr();
    let ptr_stream_name = C_ARROW_ARRAY_STREAM_CAPSULE_NAME
        .as_ptr()
        .cast::<std::os::raw::c_char>();

    // Safety: only pointers owned by the Python object are passed for validation.
    let if_valid_capsule = unsafe { pyffi::PyCapsule_IsValid(ptr_capsule, ptr_stream_name) };
    if if_valid_capsule == 0 {
        return Err(PyValueError::new_err(
            "Expected a valid `arrow_array_stream` PyCapsule.",
        ));
    }

    // Safety: capsule name was validated as `arrow_array_stream` above.
    let ptr_stream = unsafe { pyffi::PyCapsule_GetPointer(ptr_capsule, ptr_stream_name) };
    if ptr_stream.is_null() {
        return Err(PyValueError::new_err(
            "Arrow C stream capsule pointer is null.",
        ));
    }

    let stream = ptr_stream.cast::<arrow::ffi::ArrowArrayStream>();
    // Safety: `stream` points to a live ArrowArrayStream owned by the capsule.
    let mut reader = unsafe { arrow::ffi::ArrowArrayStreamReader::try_new(&mut *stream) }
        .map_err(|err| PyValueError::new_err(format!("Failed to open Arrow C stream: {err}")))?;

    let schema_arrow = derive_arrow_schema_from_stream_field(reader.field())?;
    let schema_ref = Arc::new(schema_arrow.clone());
    let mut df = DataFrame::empty_with_arrow_schema(&schema_arrow);

    while let Some(res_array) = unsafe { reader.next() } {
        let array_row_batch = res_array.map_err(|err| {
            PyValueError::new_err(format!("Failed to read Arrow stream batch: {err}"))
        })?;

        let array_struct = array_row_batch
            .as_any()
            .downcast_ref::<StructArray>()
            .ok_or_else(|| {
                PyValueError::new_err("Arrow C stream must yield StructArray batches.")
            })?;

        let l_arrays = array_struct.values().to_vec();
        let record_batch = RecordBatchT::try_new(array_struct.len(), schema_ref.clone(), l_arrays)
            .map_err(|err| {
                PyValueError::new_err(format!("Failed to build Arrow record batch: {err}"))
            })?;

        df.try_extend(std::iter::once(record_batch)).map_err(|err| {
            PyValueError::new_err(format!("Failed to append Arrow record batch: {err}"))
        })?;
    }

    Ok(df)
}

fn derive_arrow_schema_from_stream_field(field: &ArrowField) -> PyResult<ArrowSchema> {
    match field.dtype() {
        ArrowDataType::Struct(fields) => Ok(fields
            .iter()
            .cloned()
            .map(|field_inner| (field_inner.name.clone(), field_inner))
            .collect::<ArrowSchema>()),
        dtype => Err(PyValueError::new_err(format!(
            "Arrow stream schema must be Struct, got: {dtype:?}"
        ))),
    }
}

fn convert_to_polars_dataframe<'py>(
    py: Python<'py>,
    df: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyAny>> {
    let module_polars = py.import("polars")?;
    let cls_dataframe = module_polars.getattr("DataFrame")?;

    if df.is_instance(&cls_dataframe)? {
        return Ok(df.clone());
    }

    cls_dataframe.call1((df,))
}

fn extract_optional_attr<T>(obj: &Bound<'_, PyAny>, attr: &str) -> PyResult<Option<T>>
where
    for<'a> T: FromPyObject<'a>,
{
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val.extract::<T>()?))
}

#[pymodule]
fn _tablekit_io_xlsx_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyTableWriter>()?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    module.add("N_ROWS_PER_SHEET_DEFAULT", N_ROWS_PER_SHEET_DEFAULT)?;
    Ok(())
}
