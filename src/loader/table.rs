//! `csv(fileName[, options])`: a table of cells, loaded as a sequence of row
//! hashes keyed by the header cells.
//!
//! A header cell may end with a type, as in `price:n` or `active: boolean`.
//! Typed cells are converted; an empty typed cell is left out of its row.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use log::debug;

use super::file::FileArgs;
use super::options::{bool_option, char_option, string_list_option, string_option, unknown_option};
use super::{DataLoader, LoadContext};
use crate::error::{Error, Result};
use crate::interpreter::is_ws;
use crate::strings::j_quote;
use crate::value::{Hash, Value};

const USAGE: &str = "csv(fileName[, options])";

const SUPPORTED_OPTIONS: &str = "encoding, separator, headers, replaceHeaders, normalizeHeaders, \
     trimCells, emptyValue, groupingSeparator, decimalSeparator, altTrue, altFalse";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    String,
    Number,
    Boolean,
}

#[derive(Debug)]
struct Column {
    name: String,
    column_type: ColumnType,
}

/// Where the header cells come from.
#[derive(Debug)]
enum Headers {
    /// The first row of the file
    FirstRow,
    /// The option; the file has no header row
    Given(Vec<String>),
    /// The option; the header row of the file is skipped
    Replaced(Vec<String>),
}

#[derive(Debug)]
struct CsvOptions {
    headers: Headers,
    normalize_headers: bool,
    trim_cells: bool,
    empty_values: Vec<String>,
    separator: u8,
    grouping_separator: Option<char>,
    decimal_separator: char,
    alt_true: Option<String>,
    alt_false: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            headers: Headers::FirstRow,
            normalize_headers: false,
            trim_cells: false,
            empty_values: Vec::new(),
            separator: b';',
            grouping_separator: None,
            decimal_separator: '.',
            alt_true: None,
            alt_false: None,
        }
    }
}

impl CsvOptions {
    fn parse(options: &Hash) -> Result<Self> {
        let mut parsed = Self::default();
        let mut header_option_used = false;
        for (name, value) in options {
            match name.as_str() {
                "headers" | "replaceHeaders" => {
                    if header_option_used {
                        return Err(Error::DataLoaderError(
                            "Only one of the \"headers\" and \"replaceHeaders\" options can be used at once."
                                .to_string(),
                        ));
                    }
                    header_option_used = true;
                    let headers = string_list_option(name, value, false)?;
                    parsed.headers = if name == "headers" {
                        Headers::Given(headers)
                    } else {
                        Headers::Replaced(headers)
                    };
                }
                "normalizeHeaders" => parsed.normalize_headers = bool_option(name, value)?,
                "trimCells" => parsed.trim_cells = bool_option(name, value)?,
                "emptyValue" => parsed.empty_values = string_list_option(name, value, true)?,
                "separator" => {
                    let c = char_option(name, value)?;
                    parsed.separator = u8::try_from(c).ok().filter(u8::is_ascii).ok_or_else(|| {
                        Error::DataLoaderError(format!(
                            "The separator must be an ASCII character, but it is {}.",
                            j_quote(&c.to_string())
                        ))
                    })?;
                }
                "groupingSeparator" => parsed.grouping_separator = Some(char_option(name, value)?),
                "decimalSeparator" => parsed.decimal_separator = char_option(name, value)?,
                "altTrue" => parsed.alt_true = Some(string_option(name, value)?.to_lowercase()),
                "altFalse" => parsed.alt_false = Some(string_option(name, value)?.to_lowercase()),
                _ => return Err(unknown_option(name, SUPPORTED_OPTIONS)),
            }
        }
        Ok(parsed)
    }

    fn column(&self, cell: &str) -> Result<Column> {
        let mut cell = cell.to_string();
        if self.normalize_headers {
            if let (Some(open), Some(close)) = (cell.find('('), cell.rfind(')')) {
                if open < close {
                    cell.replace_range(open..=close, "");
                }
            }
        }

        let (name, column_type) = match cell.rfind(':') {
            None => (cell.trim_matches(is_ws), ColumnType::String),
            Some(i) => {
                let type_name = cell[i + 1..].trim_matches(is_ws).to_lowercase();
                let column_type = match type_name.as_str() {
                    "n" | "number" => ColumnType::Number,
                    "s" | "string" => ColumnType::String,
                    "b" | "boolean" => ColumnType::Boolean,
                    "d" | "date" | "t" | "time" | "dt" | "datetime" => {
                        return Err(Error::DataLoaderError(format!(
                            "Date and time columns are not supported, found type {} in a header.",
                            j_quote(&type_name)
                        )))
                    }
                    _ => {
                        return Err(Error::DataLoaderError(format!(
                            "Unknown data type in a header: {}",
                            j_quote(&type_name)
                        )))
                    }
                };
                (cell[..i].trim_matches(is_ws), column_type)
            }
        };

        let mut name = name.to_string();
        if self.normalize_headers {
            name = name
                .to_lowercase()
                .replace([' ', '-', ',', ';', ':'], "_");
            while name.contains("__") {
                name = name.replace("__", "_");
            }
        }
        Ok(Column { name, column_type })
    }

    fn cell_value(&self, column: &Column, cell: &str, row: usize) -> Result<Option<Value>> {
        let mut cell = if self.trim_cells { cell.trim_matches(is_ws) } else { cell };
        if self.empty_values.iter().any(|empty| empty == cell) {
            cell = "";
        }
        match column.column_type {
            ColumnType::String => Ok(Some(Value::String(cell.to_string()))),
            ColumnType::Number => {
                let mut number = cell.trim_matches(is_ws).to_string();
                if let Some(grouping) = self.grouping_separator {
                    number.retain(|c| c != grouping);
                }
                if self.decimal_separator != '.' {
                    number = number.replace(self.decimal_separator, ".");
                }
                if number.is_empty() {
                    return Ok(None);
                }
                if let Ok(i) = number.parse::<i64>() {
                    return Ok(Some(Value::Integer(i)));
                }
                BigDecimal::from_str(&number)
                    .map(|n| Some(Value::Decimal(n)))
                    .map_err(|_| invalid_cell(&number, "number", row, column))
            }
            ColumnType::Boolean => {
                let mut flag = cell.trim_matches(is_ws).to_lowercase();
                if self.alt_true.as_deref() == Some(flag.as_str()) {
                    flag = "true".to_string();
                } else if self.alt_false.as_deref() == Some(flag.as_str()) {
                    flag = "false".to_string();
                }
                match flag.as_str() {
                    "" => Ok(None),
                    "true" | "yes" | "y" | "1" => Ok(Some(Value::Boolean(true))),
                    "false" | "no" | "n" | "0" => Ok(Some(Value::Boolean(false))),
                    _ => Err(invalid_cell(&flag, "boolean", row, column)),
                }
            }
        }
    }
}

fn invalid_cell(cell: &str, kind: &str, row: usize, column: &Column) -> Error {
    Error::DataLoaderError(format!(
        "Value {} is not a valid {kind} (row {row}, column {}).",
        j_quote(cell),
        j_quote(&column.name)
    ))
}

/// Loads a CSV file. The default separator is `;`.
pub struct CsvLoader;

impl DataLoader for CsvLoader {
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        let file = FileArgs::parse_with_options(&ctx, args, USAGE)?;
        let options = CsvOptions::parse(&file.options)?;
        let text = file.read_text(&ctx)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(options.separator)
            .from_reader(text.as_bytes());
        let mut records = reader.records();

        let header_cells: Vec<String> = match &options.headers {
            Headers::Given(headers) => headers.clone(),
            Headers::Replaced(headers) => {
                records.next().transpose()?;
                headers.clone()
            }
            Headers::FirstRow => match records.next().transpose()? {
                Some(record) => record.iter().map(str::to_string).collect(),
                None => Vec::new(),
            },
        };
        let columns = header_cells
            .iter()
            .map(|cell| options.column(cell))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        for record in records {
            let record = record?;
            // Rows are numbered from 1, and the header row is row 1
            let row_number = rows.len() + 2;
            if record.len() > columns.len() {
                return Err(Error::DataLoaderError(format!(
                    "Row {row_number} contains more columns than the number of header cells."
                )));
            }
            let mut row = Hash::with_capacity(columns.len());
            for (column, cell) in columns.iter().zip(record.iter()) {
                if let Some(value) = options.cell_value(column, cell, row_number)? {
                    row.insert(column.name.clone(), value);
                }
            }
            rows.push(Value::Hash(row));
        }
        debug!("Loaded {} CSV rows with {} columns", rows.len(), columns.len());
        Ok(Value::Sequence(rows))
    }
}
