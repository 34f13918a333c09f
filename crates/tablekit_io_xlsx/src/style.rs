//! Cell style descriptors: per-column data type, style patch and optional decoration.
//!
//! A descriptor declares statically whether it decorates content through
//! [`CellStyle::as_decorator`]; the row renderer never probes types at runtime.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::spec::{EnumCellDataType, EnumCellValue, SpecCellFormat};

////////////////////////////////////////////////////////////////////////////////
// #region Traits

/// How one column's data cells are typed and styled.
pub trait CellStyle: fmt::Debug + Send + Sync {
    /// Encoding tag for non-null data cells.
    fn data_type(&self) -> EnumCellDataType;

    /// Patch a zebra style in place. Called once per style variant and sheet,
    /// never per cell and never for column headings.
    fn style_cell(&self, format: &mut SpecCellFormat) {
        let _ = format;
    }

    /// Decoration capability, if this descriptor has one.
    fn as_decorator(&self) -> Option<&dyn ContentDecorator> {
        None
    }
}

/// Descriptor that rewrites non-null data cell content before it is written.
pub trait ContentDecorator: CellStyle {
    /// Transform one non-null value.
    fn decorate(&self, content: EnumCellValue) -> EnumCellValue;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BuiltinStyles

/// Plain text column. Default descriptor for unregistered columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl CellStyle for Text {
    fn data_type(&self) -> EnumCellDataType {
        EnumCellDataType::String
    }
}

/// Whole numbers with thousands separator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integer;

impl CellStyle for Integer {
    fn data_type(&self) -> EnumCellDataType {
        EnumCellDataType::Number
    }

    fn style_cell(&self, format: &mut SpecCellFormat) {
        format.num_format = Some("#,##0".to_string());
    }
}

/// Monetary amounts with two decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Amount;

impl CellStyle for Amount {
    fn data_type(&self) -> EnumCellDataType {
        EnumCellDataType::Number
    }

    fn style_cell(&self, format: &mut SpecCellFormat) {
        format.num_format = Some("#,##0.00".to_string());
    }
}

/// Ratios displayed as percentages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Percentage;

impl CellStyle for Percentage {
    fn data_type(&self) -> EnumCellDataType {
        EnumCellDataType::Number
    }

    fn style_cell(&self, format: &mut SpecCellFormat) {
        format.num_format = Some("0.00%".to_string());
    }
}

/// ISO dates written as spreadsheet serial day numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Date;

impl CellStyle for Date {
    fn data_type(&self) -> EnumCellDataType {
        EnumCellDataType::Number
    }

    fn style_cell(&self, format: &mut SpecCellFormat) {
        format.num_format = Some("dd/mm/yyyy".to_string());
    }

    fn as_decorator(&self) -> Option<&dyn ContentDecorator> {
        Some(self)
    }
}

impl ContentDecorator for Date {
    fn decorate(&self, content: EnumCellValue) -> EnumCellValue {
        let EnumCellValue::String(c_text) = &content else {
            return content;
        };
        match convert_iso_date_to_serial(c_text.trim()) {
            Some(n_serial) => EnumCellValue::Number(n_serial),
            None => content,
        }
    }
}

/// Numeric codes kept as text and left-padded with zeros (`42` -> `00042`).
#[derive(Debug, Clone, Copy)]
pub struct PaddedNumericalString {
    /// Target length after padding.
    pub pad_length: usize,
}

impl PaddedNumericalString {
    /// Create a descriptor padding to `pad_length` characters.
    pub fn new(pad_length: usize) -> Self {
        Self { pad_length }
    }
}

impl CellStyle for PaddedNumericalString {
    fn data_type(&self) -> EnumCellDataType {
        EnumCellDataType::String
    }

    fn style_cell(&self, format: &mut SpecCellFormat) {
        format.num_format = Some("@".to_string());
    }

    fn as_decorator(&self) -> Option<&dyn ContentDecorator> {
        Some(self)
    }
}

impl ContentDecorator for PaddedNumericalString {
    fn decorate(&self, content: EnumCellValue) -> EnumCellValue {
        let c_digits = match &content {
            EnumCellValue::String(val)
                if !val.is_empty() && val.bytes().all(|b| b.is_ascii_digit()) =>
            {
                val.clone()
            }
            EnumCellValue::Number(val) if val.is_finite() && *val >= 0.0 && val.fract() == 0.0 => {
                format!("{val:.0}")
            }
            _ => return content,
        };
        EnumCellValue::String(format!("{c_digits:0>width$}", width = self.pad_length))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Helpers

/// Convert `YYYY-MM-DD[( |T)HH:MM:SS]` to a 1900-system serial date.
pub fn convert_iso_date_to_serial(text: &str) -> Option<f64> {
    let date_epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.signed_duration_since(date_epoch).num_days() as f64);
    }

    let datetime = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    let datetime_epoch = date_epoch.and_hms_opt(0, 0, 0)?;
    let n_seconds = datetime.signed_duration_since(datetime_epoch).num_seconds();
    Some(n_seconds as f64 / 86_400.0)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_not_a_decorator() {
        assert!(Text.as_decorator().is_none());
        assert_eq!(Text.data_type(), EnumCellDataType::String);
    }

    #[test]
    fn test_number_styles_set_num_format() {
        let mut fmt = SpecCellFormat::default();
        Amount.style_cell(&mut fmt);
        assert_eq!(fmt.num_format.as_deref(), Some("#,##0.00"));

        Integer.style_cell(&mut fmt);
        assert_eq!(fmt.num_format.as_deref(), Some("#,##0"));
    }

    #[test]
    fn test_date_decorates_iso_strings() {
        let decorator = Date.as_decorator().expect("date decorates");
        assert_eq!(
            decorator.decorate(EnumCellValue::from("2024-01-01")),
            EnumCellValue::Number(45_292.0)
        );
        assert_eq!(
            decorator.decorate(EnumCellValue::from("2024-01-01 12:00:00")),
            EnumCellValue::Number(45_292.5)
        );
        assert_eq!(
            decorator.decorate(EnumCellValue::from("not a date")),
            EnumCellValue::from("not a date")
        );
    }

    #[test]
    fn test_padded_numerical_string() {
        let style = PaddedNumericalString::new(5);
        let decorator = style.as_decorator().expect("padded decorates");

        assert_eq!(
            decorator.decorate(EnumCellValue::from("42")),
            EnumCellValue::from("00042")
        );
        assert_eq!(
            decorator.decorate(EnumCellValue::Number(7.0)),
            EnumCellValue::from("00007")
        );
        assert_eq!(
            decorator.decorate(EnumCellValue::from("A1")),
            EnumCellValue::from("A1")
        );
        assert_eq!(
            decorator.decorate(EnumCellValue::from("1234567")),
            EnumCellValue::from("1234567")
        );
    }
}
