//! Export of transactions as Excel workbooks.

use axum::{
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use time::Date;

use crate::Error;

/// The MIME type of `.xlsx` files.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One row of a transaction sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow<'a> {
    /// The expense category or income source.
    pub label: &'a str,
    /// The amount of money.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
}

impl From<XlsxError> for Error {
    fn from(error: XlsxError) -> Self {
        Error::ExcelError(error.to_string())
    }
}

/// Write `rows` to a workbook with a single sheet called `sheet_name`.
///
/// The first row holds the headers `label_header`, "Amount" and "Date".
///
/// # Errors
///
/// Returns an [Error::ExcelError] if the workbook could not be written.
pub fn transactions_workbook<'a>(
    sheet_name: &str,
    label_header: &str,
    rows: impl IntoIterator<Item = TransactionRow<'a>>,
) -> Result<Vec<u8>, Error> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet().set_name(sheet_name)?;

    for (column, header) in [label_header, "Amount", "Date"].into_iter().enumerate() {
        worksheet.write_string_with_format(0, column as u16, header, &header_format)?;
    }

    for (index, row) in rows.into_iter().enumerate() {
        let row_number = index as u32 + 1;

        worksheet.write_string(row_number, 0, row.label)?;
        worksheet.write_number(row_number, 1, row.amount)?;
        worksheet.write_string(row_number, 2, row.date.to_string())?;
    }

    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

/// A response that makes the browser download `bytes` as the workbook `file_name`.
pub fn excel_attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
    use time::macros::date;

    use super::{TransactionRow, XLSX_CONTENT_TYPE, excel_attachment, transactions_workbook};

    #[test]
    fn workbook_is_a_zip_archive() {
        let bytes = transactions_workbook(
            "Expense",
            "Category",
            [TransactionRow {
                label: "Food",
                amount: 12.5,
                date: date!(2025 - 03 - 14),
            }],
        )
        .unwrap();

        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_workbook_is_valid() {
        let bytes = transactions_workbook("Income", "Source", Vec::new()).unwrap();

        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn attachment_sets_headers() {
        let response = excel_attachment("expense_details.xlsx", vec![b'P', b'K']);

        assert_eq!(response.headers()[CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"expense_details.xlsx\""
        );
    }
}
