use crate::models::LectureRow;
use crate::sheets::{Sheet, Workbook};
use tracing::debug;

/// Positional column layout of a committee sheet.
const COL_TIME: usize = 0;
const COL_CODE: usize = 1;
const COL_COURSE: usize = 2;
const COL_TITLE: usize = 3;
const COL_INSTRUCTOR: usize = 4;
const MIN_COLUMNS: usize = 5;

/// Header text that sometimes leaks into the data region.
const INSTRUCTOR_HEADER: &str = "Öğretim Üyesi";

/// A sheet is a lecture listing if its name mentions "kurul" and is not a
/// summary ("skt") or totals ("toplam") sheet.
pub fn is_committee_sheet(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("kurul") && !lower.contains("skt") && !lower.contains("toplam")
}

fn cell(row: &[Option<String>], index: usize) -> Option<&str> {
    row.get(index).and_then(|c| c.as_deref())
}

/// Extract the lecture rows of one sheet. Sheets with the wrong shape yield nothing.
pub fn extract_sheet(sheet: &Sheet, term_label: &str) -> Vec<LectureRow> {
    if !is_committee_sheet(&sheet.name) {
        debug!(sheet = %sheet.name, "skipping sheet: not a committee listing");
        return Vec::new();
    }

    if sheet.width < MIN_COLUMNS {
        debug!(sheet = %sheet.name, width = sheet.width, "skipping sheet: too few columns");
        return Vec::new();
    }

    if sheet.rows.iter().all(|row| cell(row, COL_INSTRUCTOR).is_none()) {
        debug!(sheet = %sheet.name, "skipping sheet: instructor column is empty");
        return Vec::new();
    }

    sheet
        .rows
        .iter()
        .filter_map(|row| {
            let instructor = cell(row, COL_INSTRUCTOR)?;
            let code = cell(row, COL_CODE)?;
            let course = cell(row, COL_COURSE)?;
            if instructor.trim() == INSTRUCTOR_HEADER {
                return None;
            }

            Some(LectureRow {
                time_slot: cell(row, COL_TIME).unwrap_or_default().to_string(),
                course_code: code.to_string(),
                course_name: course.to_string(),
                course_title: cell(row, COL_TITLE).unwrap_or_default().to_string(),
                instructor_raw: instructor.to_string(),
                term_label: term_label.to_string(),
                committee_name: sheet.name.clone(),
            })
        })
        .collect()
}

/// Per-workbook extraction result.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub rows: Vec<LectureRow>,
    pub sheets_used: Vec<String>,
}

/// Extract every lecture row of a workbook, in sheet order then row order.
pub fn extract_workbook(workbook: &Workbook, term_label: &str) -> Extraction {
    let mut extraction = Extraction::default();
    for sheet in &workbook.sheets {
        let rows = extract_sheet(sheet, term_label);
        if !rows.is_empty() {
            extraction.sheets_used.push(sheet.name.clone());
            extraction.rows.extend(rows);
        }
    }
    extraction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells
            .iter()
            .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
            .collect()
    }

    fn sheet(name: &str, rows: Vec<Vec<Option<String>>>) -> Sheet {
        Sheet {
            name: name.to_string(),
            width: 6,
            rows,
        }
    }

    #[test]
    fn sheet_name_filter() {
        assert!(is_committee_sheet("Kurul 3"));
        assert!(is_committee_sheet("kurul"));
        assert!(is_committee_sheet("1. KURUL"));
        assert!(!is_committee_sheet("Kurul 3 SKT"));
        assert!(!is_committee_sheet("Toplam Kurul"));
        assert!(!is_committee_sheet("Ders Programı"));
    }

    #[test]
    fn keeps_only_complete_rows() {
        let s = sheet(
            "Kurul 1",
            vec![
                row(&["1", "K1", "Anatomi", "Giriş", "Prof. Dr. Ayşe Yılmaz"]),
                row(&["2", "", "Anatomi", "Kemikler", "Prof. Dr. Ayşe Yılmaz"]),
                row(&["3", "K1", "", "Kaslar", "Prof. Dr. Ayşe Yılmaz"]),
                row(&["4", "K1", "Anatomi", "Eklemler", ""]),
                row(&["5", "K1", "Anatomi", "", "Dr. Ali Kaya"]),
            ],
        );
        let rows = extract_sheet(&s, "Dönem 1");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].course_title, "Giriş");
        assert_eq!(rows[0].term_label, "Dönem 1");
        assert_eq!(rows[0].committee_name, "Kurul 1");
        assert_eq!(rows[1].course_title, "");
        assert_eq!(rows[1].instructor_raw, "Dr. Ali Kaya");
    }

    #[test]
    fn header_leakage_is_dropped() {
        let s = sheet(
            "Kurul 1",
            vec![
                row(&["Saat", "Ders Kodu", "Ders Adı", "Ders Başlığı", " Öğretim Üyesi "]),
                row(&["1", "K1", "Anatomi", "Giriş", "Prof. Dr. Ayşe Yılmaz"]),
            ],
        );
        let rows = extract_sheet(&s, "Dönem 1");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course_code, "K1");
    }

    #[test]
    fn empty_instructor_column_skips_sheet() {
        let s = sheet(
            "Kurul 2",
            vec![row(&["1", "K1", "Anatomi", "Giriş", ""]), row(&["2", "K2", "Fizyoloji", "", ""])],
        );
        assert!(extract_sheet(&s, "Dönem 1").is_empty());
    }

    #[test]
    fn narrow_sheet_is_skipped() {
        let mut s = sheet("Kurul 1", vec![row(&["1", "K1", "Anatomi", "Giriş"])]);
        s.width = 4;
        assert!(extract_sheet(&s, "Dönem 1").is_empty());
    }

    #[test]
    fn workbook_keeps_sheet_order_and_skips_summaries() {
        let workbook = Workbook {
            source_name: "Dönem 1.xlsx".to_string(),
            sheets: vec![
                sheet("Kurul 1", vec![row(&["1", "K1", "Anatomi", "Giriş", "Dr. A"])]),
                sheet("Kurul 1 SKT", vec![row(&["1", "K9", "Özet", "", "Dr. A"])]),
                sheet("Kurul 2", vec![row(&["1", "K2", "Fizyoloji", "Giriş", "Dr. B"])]),
            ],
        };
        let extraction = extract_workbook(&workbook, "Dönem 1");
        assert_eq!(extraction.sheets_used, vec!["Kurul 1", "Kurul 2"]);
        let codes: Vec<_> = extraction.rows.iter().map(|r| r.course_code.as_str()).collect();
        assert_eq!(codes, vec!["K1", "K2"]);
    }
}
