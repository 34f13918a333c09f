//! Row streams over `polars` DataFrames.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::spec::{EnumCellValue, SpecRow, TableWriteError};

/// Read a DataFrame from Arrow IPC file bytes.
pub fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, TableWriteError> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| {
            TableWriteError::RowSource(format!("Failed to read IPC DataFrame bytes: {err}"))
        })
}

/// Lazily yield one row per DataFrame row, keyed by column name in column order.
pub fn generate_rows_from_dataframe(
    df: &DataFrame,
) -> impl Iterator<Item = Result<SpecRow, TableWriteError>> + '_ {
    let l_cols = df.get_columns();
    (0..df.height()).map(move |n_idx_row| {
        l_cols
            .iter()
            .map(|col| {
                let value = col.get(n_idx_row).map_err(|err| {
                    TableWriteError::RowSource(format!(
                        "Failed to read cell ({n_idx_row}, {:?}): {err}",
                        col.name().as_str()
                    ))
                })?;
                Ok((col.name().to_string(), derive_cell_value_from_any_value(value)))
            })
            .collect()
    })
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int128(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{IpcWriter, SerWriter};

    use super::*;

    fn create_dataframe() -> DataFrame {
        polars::df!(
            "id" => [1i64, 2],
            "name" => [Some("a"), None],
            "active" => [true, false],
            "score" => [0.5f64, 1.25],
        )
        .expect("dataframe")
    }

    #[test]
    fn test_rows_follow_column_order() {
        let df = create_dataframe();
        let l_rows: Vec<SpecRow> = generate_rows_from_dataframe(&df)
            .collect::<Result<_, _>>()
            .expect("rows");

        assert_eq!(l_rows.len(), 2);
        let l_keys: Vec<&str> = l_rows[0].keys().map(String::as_str).collect();
        assert_eq!(l_keys, vec!["id", "name", "active", "score"]);

        assert_eq!(l_rows[0]["id"], EnumCellValue::Number(1.0));
        assert_eq!(l_rows[0]["name"], EnumCellValue::from("a"));
        assert_eq!(l_rows[0]["active"], EnumCellValue::from("True"));
        assert_eq!(l_rows[1]["name"], EnumCellValue::None);
        assert_eq!(l_rows[1]["active"], EnumCellValue::from("False"));
        assert_eq!(l_rows[1]["score"], EnumCellValue::Number(1.25));
    }

    #[test]
    fn test_ipc_bytes_round_trip_into_rows() {
        let mut df = create_dataframe();
        let mut v_ipc_df: Vec<u8> = Vec::new();
        IpcWriter::new(&mut v_ipc_df)
            .finish(&mut df)
            .expect("write ipc");

        let df_read = derive_dataframe_from_ipc_bytes(&v_ipc_df).expect("read ipc");
        assert_eq!(df_read.height(), 2);
        assert_eq!(generate_rows_from_dataframe(&df_read).count(), 2);
    }

    #[test]
    fn test_invalid_ipc_bytes() {
        assert!(matches!(
            derive_dataframe_from_ipc_bytes(b"not ipc"),
            Err(TableWriteError::RowSource(_))
        ));
    }
}
