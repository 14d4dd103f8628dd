//! Minimal SpreadsheetML (XLSX) writer and reader.
//!
//! An XLSX file is a zip archive of XML parts. The writer emits inline
//! strings and numeric cells with three styles (bold header, integer with
//! thousands grouping, two decimals). Number formats are stored as built-in
//! format ids, so the spreadsheet application renders them in the viewer's
//! locale (decimal comma and thousands dot for German).

use crate::error::{AnalysisError, Result};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Style indices into `cellXfs` of the generated stylesheet.
const STYLE_HEADER: u32 = 1;
const STYLE_INTEGER: u32 = 2;
const STYLE_DECIMAL: u32 = 3;

/// Built-in number format `#,##0`.
const NUMFMT_INTEGER: u32 = 3;
/// Built-in number format `#,##0.00`.
const NUMFMT_DECIMAL: u32 = 4;

/// A cell to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Bold text, used for header rows.
    Header(String),
    Text(String),
    /// Integer with thousands grouping.
    Count(u64),
    /// Number with two decimals.
    Decimal(f64),
    Empty,
}

impl Cell {
    /// Text cell, or empty for a missing value.
    pub fn text(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, |v| Cell::Text(v.to_string()))
    }
}

/// A cell value read back from a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

/// An in-memory workbook.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worksheet.
    pub fn add_sheet(&mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) -> &mut Self {
        self.sheets.push(Sheet {
            name: name.into(),
            rows,
        });
        self
    }

    /// Serialize the workbook to XLSX bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.sheets.is_empty() {
            return Err(AnalysisError::Export(
                "a workbook needs at least one sheet".to_string(),
            ));
        }
        if let Some(sheet) = self.sheets.iter().find(|s| !valid_sheet_name(&s.name)) {
            return Err(AnalysisError::Export(format!(
                "invalid sheet name '{}'",
                sheet.name
            )));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), self.content_types()),
            ("_rels/.rels".to_string(), root_rels()),
            ("xl/workbook.xml".to_string(), self.workbook_xml()),
            ("xl/_rels/workbook.xml.rels".to_string(), self.workbook_rels()),
            ("xl/styles.xml".to_string(), styles_xml()),
        ];
        for (i, sheet) in self.sheets.iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(sheet)));
        }

        for (path, content) in parts {
            zip.start_file(path, options)?;
            zip.write_all(content.as_bytes())?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn content_types(&self) -> String {
        let mut xml = format!(
            "{XML_DECL}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
             <Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>"
        );
        for i in 1..=self.sheets.len() {
            let _ = write!(
                xml,
                "<Override PartName=\"/xl/worksheets/sheet{i}.xml\" \
                 ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>"
            );
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml =
            format!("{XML_DECL}<workbook xmlns=\"{MAIN_NS}\" xmlns:r=\"{REL_NS}\"><sheets>");
        for (i, sheet) in self.sheets.iter().enumerate() {
            let _ = write!(
                xml,
                "<sheet name=\"{}\" sheetId=\"{id}\" r:id=\"rId{id}\"/>",
                escape(sheet.name.as_str()),
                id = i + 1
            );
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = format!("{XML_DECL}<Relationships xmlns=\"{PKG_REL_NS}\">");
        for i in 1..=self.sheets.len() {
            let _ = write!(
                xml,
                "<Relationship Id=\"rId{i}\" Type=\"{REL_NS}/worksheet\" Target=\"worksheets/sheet{i}.xml\"/>"
            );
        }
        let _ = write!(
            xml,
            "<Relationship Id=\"rId{}\" Type=\"{REL_NS}/styles\" Target=\"styles.xml\"/>",
            self.sheets.len() + 1
        );
        xml.push_str("</Relationships>");
        xml
    }
}

fn root_rels() -> String {
    format!(
        "{XML_DECL}<Relationships xmlns=\"{PKG_REL_NS}\">\
         <Relationship Id=\"rId1\" Type=\"{REL_NS}/officeDocument\" Target=\"xl/workbook.xml\"/>\
         </Relationships>"
    )
}

fn styles_xml() -> String {
    format!(
        "{XML_DECL}<styleSheet xmlns=\"{MAIN_NS}\">\
         <fonts count=\"2\">\
         <font><sz val=\"11\"/><name val=\"Calibri\"/></font>\
         <font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font>\
         </fonts>\
         <fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill>\
         <fill><patternFill patternType=\"gray125\"/></fill></fills>\
         <borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\
         <cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
         <cellXfs count=\"4\">\
         <xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>\
         <xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/>\
         <xf numFmtId=\"{NUMFMT_INTEGER}\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/>\
         <xf numFmtId=\"{NUMFMT_DECIMAL}\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/>\
         </cellXfs>\
         <cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\
         </styleSheet>"
    )
}

fn sheet_xml(sheet: &Sheet) -> String {
    let mut xml = format!("{XML_DECL}<worksheet xmlns=\"{MAIN_NS}\"><sheetData>");

    for (r, row) in sheet.rows.iter().enumerate() {
        let row_number = r + 1;
        let _ = write!(xml, "<row r=\"{row_number}\">");
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{row_number}", column_name(c));
            match cell {
                Cell::Header(text) => push_inline_string(&mut xml, &reference, text, Some(STYLE_HEADER)),
                Cell::Text(text) => push_inline_string(&mut xml, &reference, text, None),
                Cell::Count(value) => {
                    let _ = write!(xml, "<c r=\"{reference}\" s=\"{STYLE_INTEGER}\"><v>{value}</v></c>");
                }
                Cell::Decimal(value) if value.is_finite() => {
                    let _ = write!(xml, "<c r=\"{reference}\" s=\"{STYLE_DECIMAL}\"><v>{value}</v></c>");
                }
                Cell::Decimal(_) | Cell::Empty => {}
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_inline_string(xml: &mut String, reference: &str, text: &str, style: Option<u32>) {
    let cleaned: String = text.chars().filter(|c| is_xml_char(*c)).collect();
    let style = style.map(|s| format!(" s=\"{s}\"")).unwrap_or_default();
    let _ = write!(
        xml,
        "<c r=\"{reference}\" t=\"inlineStr\"{style}><is><t xml:space=\"preserve\">{}</t></is></c>",
        escape(cleaned.as_str())
    );
}

/// Characters allowed in XML 1.0 text.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// Sheet names are 1-31 characters and may not contain `[]:*?/\`.
fn valid_sheet_name(name: &str) -> bool {
    let len = name.chars().count();
    (1..=31).contains(&len) && !name.contains(['[', ']', ':', '*', '?', '/', '\\'])
}

/// Spreadsheet column letters for a zero-based index (0 -> A, 26 -> AA).
pub fn column_name(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    loop {
        letters.push((b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Zero-based column index of a cell reference such as `AB12`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let number = letters
        .iter()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    Some(number - 1)
}

/// Value of the attribute with local name `key`, so `r:id` matches `id`.
fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| AnalysisError::Export(format!("malformed attribute: {e}")))?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, path: &str) -> Result<String> {
    let mut file = archive.by_name(path)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}

fn read_optional_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    path: &str,
) -> Result<Option<String>> {
    if archive.file_names().any(|name| name == path) {
        read_part(archive, path).map(Some)
    } else {
        Ok(None)
    }
}

/// A `<sheet>` entry of `xl/workbook.xml`.
struct SheetEntry {
    name: String,
    relationship: Option<String>,
}

/// Names of all worksheets, in workbook order.
pub fn sheet_names(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let xml = read_part(&mut archive, "xl/workbook.xml")?;
    Ok(workbook_sheets(&xml)?.into_iter().map(|s| s.name).collect())
}

fn workbook_sheets(xml: &str) -> Result<Vec<SheetEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let Some(name) = attribute(&e, b"name")? {
                    sheets.push(SheetEntry {
                        name,
                        relationship: attribute(&e, b"id")?,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

/// Relationship id to archive path, from `xl/_rels/workbook.xml.rels`.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attribute(&e, b"Id")?, attribute(&e, b"Target")?) {
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{target}"),
                    };
                    targets.insert(id, path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

/// Read all rows of the named worksheet.
///
/// Accepts workbooks from [`Workbook`] and from common spreadsheet tools:
/// inline and shared strings, formula string results, booleans (as 0/1)
/// and numbers. The worksheet part is located through the workbook
/// relationships, falling back to `sheet{N}.xml`. Skipped cells and rows
/// are filled with [`CellValue::Empty`] and empty rows.
pub fn read_sheet(bytes: &[u8], sheet_name: &str) -> Result<Vec<Vec<CellValue>>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let sheets = workbook_sheets(&read_part(&mut archive, "xl/workbook.xml")?)?;
    let position = sheets
        .iter()
        .position(|s| s.name == sheet_name)
        .ok_or_else(|| AnalysisError::Export(format!("sheet '{sheet_name}' not found")))?;

    let targets = match read_optional_part(&mut archive, "xl/_rels/workbook.xml.rels")? {
        Some(xml) => relationship_targets(&xml)?,
        None => HashMap::new(),
    };
    let path = sheets[position]
        .relationship
        .as_ref()
        .and_then(|id| targets.get(id))
        .cloned()
        .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", position + 1));

    let shared = match read_optional_part(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let xml = read_part(&mut archive, &path)?;
    parse_sheet(&xml, &shared)
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut capturing = false;
    let mut phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"rPh" => phonetic = true,
                b"t" if !phonetic => capturing = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(e) if capturing => current.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => capturing = false,
                b"rPh" => phonetic = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = Reader::from_str(xml);

    let mut rows = Vec::new();
    let mut row: Vec<CellValue> = Vec::new();
    let mut column: Option<usize> = None;
    let mut cell_type: Option<String> = None;
    let mut capturing = false;
    let mut phonetic = false;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    pad_rows(&mut rows, &e)?;
                    row.clear();
                }
                b"c" => {
                    column = attribute(&e, b"r")?.as_deref().and_then(column_index);
                    cell_type = attribute(&e, b"t")?;
                    text.clear();
                }
                b"rPh" => phonetic = true,
                b"v" | b"t" if !phonetic => capturing = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    pad_rows(&mut rows, &e)?;
                    rows.push(Vec::new());
                }
                b"c" => {
                    let column = attribute(&e, b"r")?.as_deref().and_then(column_index);
                    place(&mut row, column, CellValue::Empty);
                }
                _ => {}
            },
            Event::Text(e) if capturing => text.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => capturing = false,
                b"rPh" => phonetic = false,
                b"c" => {
                    let raw = std::mem::take(&mut text);
                    let value = cell_value(cell_type.take().as_deref(), raw, shared)?;
                    place(&mut row, column.take(), value);
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

/// Interpret the raw text of a cell according to its `t` attribute.
fn cell_value(cell_type: Option<&str>, raw: String, shared: &[String]) -> Result<CellValue> {
    match cell_type {
        Some("inlineStr" | "str" | "e" | "d") => Ok(CellValue::Text(raw)),
        _ if raw.is_empty() => Ok(CellValue::Empty),
        Some("s") => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| shared.get(index))
            .map(|s| CellValue::Text(s.clone()))
            .ok_or_else(|| AnalysisError::Export(format!("invalid shared string index '{raw}'"))),
        _ => raw
            .trim()
            .parse::<f64>()
            .map(CellValue::Number)
            .map_err(|_| AnalysisError::Export(format!("invalid numeric cell '{raw}'"))),
    }
}

/// Put `value` at `column`, or after the last cell when the reference is
/// missing.
fn place(row: &mut Vec<CellValue>, column: Option<usize>, value: CellValue) {
    let index = column.unwrap_or(row.len());
    if index < row.len() {
        row[index] = value;
    } else {
        row.resize(index, CellValue::Empty);
        row.push(value);
    }
}

/// Append empty rows for row numbers skipped before `element`.
fn pad_rows(rows: &mut Vec<Vec<CellValue>>, element: &BytesStart<'_>) -> Result<()> {
    if let Some(number) = attribute(element, b"r")?.and_then(|r| r.parse::<usize>().ok()) {
        while rows.len() + 1 < number {
            rows.push(Vec::new());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
        assert_eq!(column_index("AB12"), Some(27));
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn test_write_and_read_back() {
        let mut workbook = Workbook::new();
        workbook.add_sheet(
            "Daten",
            vec![
                vec![Cell::Header("Name".into()), Cell::Header("Wert".into())],
                vec![Cell::Text("Größe & <Maß>".into()), Cell::Count(1_234_567)],
                vec![Cell::Empty, Cell::Decimal(12.5)],
            ],
        );
        workbook.add_sheet("Leer", Vec::new());
        let bytes = workbook.to_bytes().unwrap();

        assert_eq!(sheet_names(&bytes).unwrap(), vec!["Daten", "Leer"]);

        let rows = read_sheet(&bytes, "Daten").unwrap();
        assert_eq!(
            rows,
            vec![
                vec![CellValue::Text("Name".into()), CellValue::Text("Wert".into())],
                vec![
                    CellValue::Text("Größe & <Maß>".into()),
                    CellValue::Number(1_234_567.0)
                ],
                vec![CellValue::Empty, CellValue::Number(12.5)],
            ]
        );
        assert!(read_sheet(&bytes, "Leer").unwrap().is_empty());
    }

    #[test]
    fn test_text_keeps_surrounding_whitespace() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("S", vec![vec![Cell::Text("  Titel ".into())]]);
        let rows = read_sheet(&workbook.to_bytes().unwrap(), "S").unwrap();
        assert_eq!(rows[0][0].as_text(), Some("  Titel "));
    }

    #[test]
    fn test_control_characters_are_dropped() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("S", vec![vec![Cell::Text("a\u{1}b".into())]]);
        let rows = read_sheet(&workbook.to_bytes().unwrap(), "S").unwrap();
        assert_eq!(rows[0][0].as_text(), Some("ab"));
    }

    #[test]
    fn test_missing_sheet() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("S", Vec::new());
        let err = read_sheet(&workbook.to_bytes().unwrap(), "Other").unwrap_err();
        assert!(matches!(err, AnalysisError::Export(_)));
    }

    #[test]
    fn test_invalid_workbooks_rejected() {
        assert!(Workbook::new().to_bytes().is_err());

        let mut workbook = Workbook::new();
        workbook.add_sheet("a/b", Vec::new());
        assert!(workbook.to_bytes().is_err());
    }

    fn package(parts: &[(&str, String)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in parts {
            zip.start_file(*path, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn foreign_workbook(sheet_xml: &str) -> Vec<u8> {
        package(&[
            (
                "xl/workbook.xml",
                format!(
                    "<workbook xmlns=\"{MAIN_NS}\" xmlns:r=\"{REL_NS}\"><sheets>\
                     <sheet name=\"Daten\" sheetId=\"1\" r:id=\"rId7\"/></sheets></workbook>"
                ),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                format!(
                    "<Relationships xmlns=\"{PKG_REL_NS}\">\
                     <Relationship Id=\"rId7\" Type=\"{REL_NS}/worksheet\" Target=\"worksheets/daten.xml\"/>\
                     </Relationships>"
                ),
            ),
            (
                "xl/sharedStrings.xml",
                format!(
                    "<sst xmlns=\"{MAIN_NS}\" count=\"3\" uniqueCount=\"3\">\
                     <si><t>Dokument-ID</t></si>\
                     <si><r><t>Hoch</t></r><r><t xml:space=\"preserve\">wasser </t></r></si>\
                     <si><t>007</t><rPh sb=\"0\" eb=\"1\"><t>x</t></rPh></si>\
                     </sst>"
                ),
            ),
            ("xl/worksheets/daten.xml", sheet_xml.to_string()),
        ])
    }

    #[test]
    fn test_reads_shared_strings_and_self_closing_cells() {
        let bytes = foreign_workbook(&format!(
            "<worksheet xmlns=\"{MAIN_NS}\"><sheetData>\
             <row r=\"1\"><c r=\"A1\" t=\"s\"><v>0</v></c><c r=\"B1\" t=\"s\"><v>1</v></c></row>\
             <row r=\"3\"><c r=\"A3\" t=\"s\"><v>2</v></c><c r=\"B3\" s=\"1\"/>\
             <c r=\"C3\" t=\"b\"><v>1</v></c><c r=\"D3\" t=\"str\"><f>A3</f><v>007</v></c></row>\
             <row r=\"4\"/>\
             </sheetData></worksheet>"
        ));

        assert_eq!(sheet_names(&bytes).unwrap(), vec!["Daten"]);
        let rows = read_sheet(&bytes, "Daten").unwrap();
        assert_eq!(
            rows,
            vec![
                vec![
                    CellValue::Text("Dokument-ID".into()),
                    CellValue::Text("Hochwasser ".into())
                ],
                vec![],
                vec![
                    CellValue::Text("007".into()),
                    CellValue::Empty,
                    CellValue::Number(1.0),
                    CellValue::Text("007".into())
                ],
                vec![],
            ]
        );
    }

    #[test]
    fn test_shared_string_index_out_of_range() {
        let bytes = foreign_workbook(&format!(
            "<worksheet xmlns=\"{MAIN_NS}\"><sheetData>\
             <row r=\"1\"><c r=\"A1\" t=\"s\"><v>9</v></c></row>\
             </sheetData></worksheet>"
        ));
        let err = read_sheet(&bytes, "Daten").unwrap_err();
        assert!(err.to_string().contains("shared string"));
    }

    #[test]
    fn test_styles_use_grouped_number_formats() {
        let styles = styles_xml();
        assert!(styles.contains("numFmtId=\"3\""));
        assert!(styles.contains("numFmtId=\"4\""));
    }
}
