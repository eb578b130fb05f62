use crate::aggregator::AggregateTables;
use crate::analyzer::{Analysis, FileWarning};
use crate::models::ReconciledRow;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub const TOTALS_CSV: &str = "instructor_totals.csv";
pub const DETAILS_CSV: &str = "instructor_term_committee_detail.csv";
pub const ROWS_CSV: &str = "lecture_rows.csv";
pub const BRANCHES_TXT: &str = "branch_terms.txt";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Raw reconciled row as exported for inspection.
#[derive(Debug, Serialize)]
struct LectureRowRecord<'a> {
    time_slot: &'a str,
    course_code: &'a str,
    course_name: &'a str,
    course_title: &'a str,
    instructor_raw: &'a str,
    term_label: &'a str,
    committee_name: &'a str,
    instructor_title: &'a str,
    instructor_name_key: &'a str,
    display_name: &'a str,
}

impl<'a> From<&'a ReconciledRow> for LectureRowRecord<'a> {
    fn from(r: &'a ReconciledRow) -> Self {
        Self {
            time_slot: &r.row.time_slot,
            course_code: &r.row.course_code,
            course_name: &r.row.course_name,
            course_title: &r.row.course_title,
            instructor_raw: &r.row.instructor_raw,
            term_label: &r.row.term_label,
            committee_name: &r.row.committee_name,
            instructor_title: r.parsed.title.map(|t| t.label()).unwrap_or_default(),
            instructor_name_key: &r.parsed.name_key,
            display_name: &r.display_name,
        }
    }
}

/// Write records as a UTF-8 (with BOM) CSV file with a header row.
pub fn write_csv<T: Serialize>(path: &Path, records: impl IntoIterator<Item = T>) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_reports(
    tables: &AggregateTables,
    rows: &[&ReconciledRow],
    branch_terms: &[String],
    output_dir: &str,
) -> Result<()> {
    let output_path = Path::new(output_dir);
    write_csv(&output_path.join(TOTALS_CSV), &tables.totals)?;
    write_csv(&output_path.join(DETAILS_CSV), &tables.details)?;
    write_csv(
        &output_path.join(ROWS_CSV),
        rows.iter().map(|&r| LectureRowRecord::from(r)),
    )?;

    let mut content = branch_terms.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(output_path.join(BRANCHES_TXT), content)?;
    Ok(())
}

// Clean up previous results from output directory
pub fn clean_output_directory(output_dir: &str) -> Result<()> {
    let output_path = Path::new(output_dir);

    if !output_path.exists() {
        return Ok(());
    }

    println!("🧹 Cleaning previous results...");

    for item in [TOTALS_CSV, DETAILS_CSV, ROWS_CSV, BRANCHES_TXT] {
        let item_path = output_path.join(item);
        if item_path.is_file() {
            fs::remove_file(&item_path)?;
            println!("   🗑️  Removed file: {}", item);
        }
    }

    println!("   ✅ Output directory cleaned");
    Ok(())
}

pub fn print_warnings(warnings: &[FileWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n⚠️  {} file(s) could not be read and were skipped:", warnings.len());
    for warning in warnings {
        println!("   - {}: {}", warning.source_name, warning.message);
    }
}

pub fn print_summary(analysis: &Analysis, tables: &AggregateTables, filtered_rows: usize) {
    println!("\n📊 SUMMARY");
    println!("==========\n");

    println!("📚 Workbooks read: {}", analysis.workbook_count);
    println!("📑 Committee sheets used: {}", analysis.sheets_used);
    println!("📝 Lecture rows extracted: {}", analysis.rows_extracted);
    println!(
        "🧹 Rows dropped by instructor-name cleanup: {}",
        analysis.reconciliation.dropped
    );
    println!(
        "👨‍🏫 Distinct instructors: {}",
        analysis.reconciliation.identities.len()
    );
    println!("🔍 Rows after filters: {}", filtered_rows);

    println!("\n🏆 Instructors by total lecture hours:");
    for (i, total) in tables.totals.iter().take(10).enumerate() {
        println!(
            "   {}. {} - {} hours ({} committees, {} terms)",
            i + 1,
            total.display_name,
            total.total_hours,
            total.distinct_committee_count,
            total.distinct_term_count
        );
    }
    if tables.totals.len() > 10 {
        println!("   ... and {} more", tables.totals.len() - 10);
    }
}
