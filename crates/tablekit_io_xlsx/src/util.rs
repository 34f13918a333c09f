//! Stateless helper utilities used by the table writer and sheet writers.

use crate::conf::{
    C_SHEET_NAME_DEFAULT_PREFIX, N_LEN_EXCEL_SHEET_NAME_MAX, N_LEN_SHEET_NAME_BASE_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::TableWriteError;

////////////////////////////////////////////////////////////////////////////////
// #region ColumnHeading

/// Derive a display heading from a column key (`first_name` -> `First Name`).
pub fn derive_column_heading(key: &str) -> String {
    let mut c_heading = String::with_capacity(key.len());
    let mut if_word_start = true;
    for chr in key.chars() {
        let chr = if chr == '_' { ' ' } else { chr };
        if chr.is_whitespace() {
            if_word_start = true;
            c_heading.push(chr);
        } else if if_word_start {
            if_word_start = false;
            c_heading.extend(chr.to_uppercase());
        } else {
            c_heading.push(chr);
        }
    }
    c_heading
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_DEFAULT_PREFIX.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create the name of part `part_idx_1based` of `parts_total` sheets.
///
/// `original_name` is cut to [`N_LEN_SHEET_NAME_BASE_MAX`] characters first.
pub fn create_sheet_part_name(
    original_name: &str,
    part_idx_1based: usize,
    parts_total: usize,
) -> String {
    let c_sheet_name_base: String = original_name
        .chars()
        .take(N_LEN_SHEET_NAME_BASE_MAX)
        .collect();
    format!("{c_sheet_name_base} ({part_idx_1based}|{parts_total})")
}

/// Positional `SheetN` name for the next sheet (`N` = sheet count + 1).
///
/// Moves on to the next free `N` when that name is already used.
pub fn derive_default_sheet_name<'a>(existing: impl Iterator<Item = &'a str> + Clone) -> String {
    let mut n_idx = existing.clone().count() + 1;
    loop {
        let candidate = format!("{C_SHEET_NAME_DEFAULT_PREFIX}{n_idx}");
        if !existing
            .clone()
            .any(|c_name| c_name.eq_ignore_ascii_case(&candidate))
        {
            return candidate;
        }
        n_idx += 1;
    }
}

/// Validate a sheet name against platform rules and the other sheets' names.
pub fn validate_sheet_name<'a>(
    name: &str,
    others: impl IntoIterator<Item = &'a str>,
) -> Result<(), TableWriteError> {
    let derive_error = |reason: &str| TableWriteError::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(derive_error("name must not be blank"));
    }
    if name.chars().count() > N_LEN_EXCEL_SHEET_NAME_MAX {
        return Err(derive_error(&format!(
            "name must be at most {N_LEN_EXCEL_SHEET_NAME_MAX} characters"
        )));
    }
    if let Some(c_illegal) = TUP_EXCEL_ILLEGAL.iter().find(|c| name.contains(**c)) {
        return Err(derive_error(&format!("character {c_illegal:?} is not allowed")));
    }

    let c_name_lower = name.to_lowercase();
    if others
        .into_iter()
        .any(|c_other| c_other.to_lowercase() == c_name_lower)
    {
        return Err(TableWriteError::SheetNameConflict(name.to_string()));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IndexCasting

/// Cast zero-based row index to worksheet row number.
pub fn cast_row_num(value: usize) -> Result<u32, TableWriteError> {
    u32::try_from(value)
        .map_err(|_| TableWriteError::InvalidOptions(format!("row index overflow: {value}")))
}

/// Cast zero-based column index to worksheet column number.
pub fn cast_col_num(value: usize) -> Result<u16, TableWriteError> {
    u16::try_from(value)
        .map_err(|_| TableWriteError::InvalidOptions(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_column_heading() {
        assert_eq!(derive_column_heading("first_name"), "First Name");
        assert_eq!(derive_column_heading("id"), "Id");
        assert_eq!(derive_column_heading("vat_ID_code"), "Vat ID Code");
        assert_eq!(derive_column_heading(""), "");
    }

    #[test]
    fn test_create_sheet_part_name_truncates_base() {
        assert_eq!(create_sheet_part_name("Sheet1", 1, 2), "Sheet1 (1|2)");

        let c_name = create_sheet_part_name("A very long sheet name for export", 3, 12);
        assert_eq!(c_name, "A very long sheet nam (3|12)");
        assert!(c_name.chars().count() <= N_LEN_EXCEL_SHEET_NAME_MAX);
    }

    #[test]
    fn test_derive_default_sheet_name_is_positional() {
        assert_eq!(derive_default_sheet_name(std::iter::empty()), "Sheet1");

        let l_names = ["Sheet1 (1|2)", "Sheet1 (2|2)"];
        assert_eq!(derive_default_sheet_name(l_names.iter().copied()), "Sheet3");

        let l_names = ["Data", "sheet3", "Other"];
        assert_eq!(derive_default_sheet_name(l_names.iter().copied()), "Sheet4");

        let l_names = ["Sheet2", "SHEET3"];
        assert_eq!(derive_default_sheet_name(l_names.iter().copied()), "Sheet4");
    }

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("Report", ["Sheet1"]).is_ok());
        assert!(matches!(
            validate_sheet_name("report", ["Report"]),
            Err(TableWriteError::SheetNameConflict(_))
        ));
        assert!(matches!(
            validate_sheet_name("a/b", std::iter::empty()),
            Err(TableWriteError::InvalidSheetName { .. })
        ));
        assert!(matches!(
            validate_sheet_name(&"x".repeat(32), std::iter::empty()),
            Err(TableWriteError::InvalidSheetName { .. })
        ));
        assert!(matches!(
            validate_sheet_name("  ", std::iter::empty()),
            Err(TableWriteError::InvalidSheetName { .. })
        ));
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name(" a:b ", "_"), "a_b");
        assert_eq!(sanitize_sheet_name("", "_"), "Sheet");
    }
}
