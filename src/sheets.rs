use crate::error::SourceError;
use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Reader};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Cell grid of one worksheet, header row excluded. `None` marks an empty cell.
pub type Grid = Vec<Vec<Option<String>>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    /// Number of columns of the sheet's used range.
    pub width: usize,
    pub rows: Grid,
}

/// All worksheets of one uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub source_name: String,
    pub sheets: Vec<Sheet>,
}

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub struct WorkbookReader {
    client: reqwest::Client,
}

impl Default for WorkbookReader {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookReader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Whether a directory entry looks like a workbook this reader understands.
    pub fn is_workbook_path(path: &Path) -> bool {
        if path.is_dir() {
            return csv_sheet_paths(path).map(|p| !p.is_empty()).unwrap_or(false);
        }
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Read a spreadsheet file, or a directory of per-sheet CSV exports.
    pub fn read_path(&self, path: &Path) -> Result<Workbook, SourceError> {
        let source_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        if path.is_dir() {
            return read_csv_workbook(path, source_name);
        }

        let bytes = fs::read(path)?;
        parse_spreadsheet_bytes(bytes, source_name)
    }

    pub async fn fetch_url(&self, url: &str) -> Result<Workbook, SourceError> {
        println!("🌐 Fetching workbook from: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status()));
        }

        let bytes = response.bytes().await?;
        parse_spreadsheet_bytes(bytes.to_vec(), source_name_from_url(url))
    }
}

fn source_name_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .unwrap_or(url)
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url)
        .to_string()
}

/// Parse an in-memory xlsx/xls/ods file into its worksheets.
pub fn parse_spreadsheet_bytes(bytes: Vec<u8>, source_name: String) -> Result<Workbook, SourceError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);

        let mut rows = range.rows().map(|cells| {
            let mut row: Vec<Option<String>> = vec![None; offset];
            row.extend(cells.iter().map(cell_text));
            row
        });

        // The first row of the used range is the header.
        let width = match rows.next() {
            Some(header) => header.len(),
            None => 0,
        };
        let rows: Grid = rows.collect();

        debug!(sheet = %name, width, rows = rows.len(), "read worksheet");
        sheets.push(Sheet { name, width, rows });
    }

    info!(source = %source_name, sheets = sheets.len(), "opened workbook");
    Ok(Workbook {
        source_name,
        sheets,
    })
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) => datetime_text(dt).unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    };
    normalize_cell(&text)
}

/// Time-of-day cells (serial below one day) render as `HH:MM`, dates as
/// `YYYY-MM-DD` with the time appended when it is not midnight.
fn datetime_text(dt: &ExcelDateTime) -> Option<String> {
    let serial = dt.as_f64();
    if (0.0..1.0).contains(&serial) {
        let seconds = (serial * 86_400.0).round() as u32;
        let (hours, minutes, secs) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
        return Some(if secs == 0 {
            format!("{:02}:{:02}", hours, minutes)
        } else {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        });
    }

    let value = dt.as_datetime()?;
    let pattern = if serial.fract() == 0.0 { "%Y-%m-%d" } else { "%Y-%m-%d %H:%M" };
    Some(value.format(pattern).to_string())
}

fn normalize_cell(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn csv_sheet_paths(dir: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|s| s.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// A directory whose CSV files are the sheets of one workbook, named by file stem.
fn read_csv_workbook(dir: &Path, source_name: String) -> Result<Workbook, SourceError> {
    let paths = csv_sheet_paths(dir)?;
    if paths.is_empty() {
        return Err(SourceError::Unsupported(format!(
            "{} contains no CSV sheets",
            dir.display()
        )));
    }

    let mut sheets = Vec::new();
    for path in paths {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let content = fs::read_to_string(&path)?;
        sheets.push(parse_csv_sheet(name, &content)?);
    }

    info!(source = %source_name, sheets = sheets.len(), "opened CSV workbook");
    Ok(Workbook {
        source_name,
        sheets,
    })
}

/// Parse one CSV-exported sheet. The first record is the header.
pub fn parse_csv_sheet(name: String, content: &str) -> Result<Sheet, SourceError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let width = reader.headers()?.len();
    let mut rows = Grid::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<Option<String>> = record.iter().map(normalize_cell).collect();
        if row.iter().all(Option::is_none) {
            continue;
        }
        rows.push(row);
    }

    Ok(Sheet { name, width, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_sheet_drops_header_and_blank_cells() {
        let content = "\u{feff}Saat,Ders Kodu,Ders Adı,Ders Başlığı,Öğretim Üyesi,Hedef\n\
                       1,K1,Anatomi,Giriş,Prof. Dr. Ayşe Yılmaz,\n\
                       ,,,,,\n\
                       2,K2,Anatomi,  ,Dr. Ali Kaya\n";
        let sheet = parse_csv_sheet("Kurul 1".to_string(), content).unwrap();
        assert_eq!(sheet.width, 6);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][4].as_deref(), Some("Prof. Dr. Ayşe Yılmaz"));
        assert_eq!(sheet.rows[0][5], None);
        assert_eq!(sheet.rows[1][3], None);
        assert_eq!(sheet.rows[1].len(), 5);
    }

    #[test]
    fn csv_directory_is_a_workbook() {
        let dir = tempfile::TempDir::new().unwrap();
        let book = dir.path().join("Dönem 1");
        fs::create_dir(&book).unwrap();
        fs::write(book.join("Kurul 2.csv"), "a,b,c,d,e\n1,K2,X,Y,Z\n").unwrap();
        fs::write(book.join("Kurul 1.csv"), "a,b,c,d,e\n1,K1,X,Y,Z\n").unwrap();
        fs::write(book.join("notes.txt"), "ignored").unwrap();

        assert!(WorkbookReader::is_workbook_path(&book));
        let workbook = WorkbookReader::new().read_path(&book).unwrap();
        assert_eq!(workbook.source_name, "Dönem 1");
        let names: Vec<_> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Kurul 1", "Kurul 2"]);
    }

    fn xlsx_fixture() -> Vec<u8> {
        use rust_xlsxwriter::{ExcelDateTime as XlsxDateTime, Format, Workbook as XlsxWorkbook};

        let mut book = XlsxWorkbook::new();

        // Used range B2:F4: column A and row 1 are empty.
        let sheet = book.add_worksheet();
        sheet.set_name("Kurul 1").unwrap();
        for (col, header) in ["Ders Kodu", "Ders Adı", "Ders Başlığı", "Öğretim Üyesi", "Öğrenim Hedefi"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(1, col as u16 + 1, header).unwrap();
        }
        sheet.write_number(2, 1, 101.0).unwrap();
        sheet.write_string(2, 2, "Anatomi").unwrap();
        sheet.write_string(2, 3, "Giriş").unwrap();
        sheet.write_string(2, 4, "Prof. Dr. Ayşe Yılmaz").unwrap();
        sheet.write_string(3, 1, "K2").unwrap();
        sheet.write_string(3, 2, "Anatomi").unwrap();
        sheet.write_string(3, 3, "   ").unwrap();
        sheet.write_string(3, 4, "Dr Ali Kaya").unwrap();
        sheet.write_string(3, 5, "Kemikler").unwrap();

        let sheet = book.add_worksheet();
        sheet.set_name("Kurul 2").unwrap();
        for (col, header) in ["Saat", "Ders Kodu", "Ders Adı", "Ders Başlığı", "Öğretim Üyesi"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, header).unwrap();
        }
        let time = Format::new().set_num_format("hh:mm");
        sheet
            .write_datetime_with_format(1, 0, &XlsxDateTime::from_hms(8, 30, 0).unwrap(), &time)
            .unwrap();
        sheet.write_number(2, 0, 2.5).unwrap();
        for row in 1..=2 {
            sheet.write_string(row, 1, "F1").unwrap();
            sheet.write_string(row, 2, "Fizyoloji").unwrap();
            sheet.write_string(row, 4, "Öğr.Gör. Dr. Elif Demir").unwrap();
        }

        book.save_to_buffer().unwrap()
    }

    #[test]
    fn xlsx_rows_are_padded_to_their_sheet_columns() {
        let workbook = parse_spreadsheet_bytes(xlsx_fixture(), "Dönem 1.xlsx".to_string()).unwrap();
        assert_eq!(workbook.source_name, "Dönem 1.xlsx");
        assert_eq!(workbook.sheets.len(), 2);

        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.name, "Kurul 1");
        assert_eq!(sheet.width, 6);
        let text = |s: &str| Some(s.to_string());
        assert_eq!(
            sheet.rows,
            vec![
                vec![None, text("101"), text("Anatomi"), text("Giriş"), text("Prof. Dr. Ayşe Yılmaz"), None],
                vec![None, text("K2"), text("Anatomi"), None, text("Dr Ali Kaya"), text("Kemikler")],
            ]
        );

        let rows = crate::extractor::extract_sheet(sheet, "Dönem 1");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time_slot, "");
        assert_eq!(rows[0].course_code, "101");
        assert_eq!(rows[0].instructor_raw, "Prof. Dr. Ayşe Yılmaz");
        assert_eq!(rows[1].course_title, "");
        assert_eq!(rows[1].instructor_raw, "Dr Ali Kaya");
        assert_eq!(rows[1].committee_name, "Kurul 1");
    }

    #[test]
    fn xlsx_time_and_number_cells_render_as_text() {
        let workbook = parse_spreadsheet_bytes(xlsx_fixture(), "Dönem 1.xlsx".to_string()).unwrap();
        let sheet = &workbook.sheets[1];
        assert_eq!(sheet.width, 5);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0].as_deref(), Some("08:30"));
        assert_eq!(sheet.rows[1][0].as_deref(), Some("2.5"));
        assert_eq!(sheet.rows[0][3], None);

        let rows = crate::extractor::extract_sheet(sheet, "Dönem 1");
        let slots: Vec<_> = rows.iter().map(|r| r.time_slot.as_str()).collect();
        assert_eq!(slots, vec!["08:30", "2.5"]);
        assert!(rows.iter().all(|r| r.instructor_raw == "Öğr.Gör. Dr. Elif Demir"));
    }

    #[test]
    fn corrupt_spreadsheet_is_an_error() {
        let result = parse_spreadsheet_bytes(b"not a spreadsheet".to_vec(), "bad.xlsx".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn spreadsheet_extensions_are_recognized() {
        assert!(WorkbookReader::is_workbook_path(Path::new("Dönem 1.xlsx")));
        assert!(WorkbookReader::is_workbook_path(Path::new("eski.XLS")));
        assert!(!WorkbookReader::is_workbook_path(Path::new("readme.md")));
    }

    #[test]
    fn url_source_name_is_last_segment() {
        assert_eq!(source_name_from_url("https://x.org/files/Donem%201.xlsx?dl=1"), "Donem%201.xlsx");
        assert_eq!(source_name_from_url("https://x.org/files/d2.xlsx"), "d2.xlsx");
    }
}
