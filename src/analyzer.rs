use crate::branches::extract_branch_terms;
use crate::error::{AnalysisError, SourceError};
use crate::extractor::extract_workbook;
use crate::models::{Config, DataSourceMode, ReconciledRow};
use crate::reconciler::{reconcile, Reconciliation};
use crate::sheets::{Workbook, WorkbookReader};
use anyhow::Context;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// A workbook paired with the term label the user assigned to it.
#[derive(Debug, Clone)]
pub struct LabeledWorkbook {
    pub workbook: Workbook,
    pub term_label: String,
}

/// A file that could not be read. The run continues without it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileWarning {
    pub source_name: String,
    pub message: String,
}

impl FileWarning {
    fn new(source_name: &str, error: &SourceError) -> Self {
        warn!(source = %source_name, %error, "skipping unreadable file");
        Self {
            source_name: source_name.to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadedSources {
    pub workbooks: Vec<LabeledWorkbook>,
    pub warnings: Vec<FileWarning>,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub reconciliation: Reconciliation,
    pub branch_terms: Vec<String>,
    pub workbook_count: usize,
    pub sheets_used: usize,
    pub rows_extracted: usize,
}

/// Distinct values offered for each filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterFacets {
    pub instructors: Vec<String>,
    pub terms: Vec<String>,
    pub committees: Vec<String>,
    pub courses: Vec<String>,
    pub branches: Vec<String>,
}

impl Analysis {
    pub fn rows(&self) -> &[ReconciledRow] {
        &self.reconciliation.rows
    }

    pub fn facets(&self) -> FilterFacets {
        let rows = self.rows();
        FilterFacets {
            instructors: distinct(rows.iter().map(|r| &r.display_name)),
            terms: distinct(rows.iter().map(|r| &r.row.term_label)),
            committees: distinct(rows.iter().map(|r| &r.row.committee_name)),
            courses: distinct(rows.iter().map(|r| &r.row.course_name)),
            branches: self.branch_terms.clone(),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values.cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

pub struct LectureAnalyzer<'a> {
    pub config: &'a Config,
}

impl<'a> LectureAnalyzer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Read every configured source. Unreadable files become warnings.
    pub async fn load_sources(&self, reader: &WorkbookReader) -> anyhow::Result<LoadedSources> {
        let mut sources = LoadedSources::default();

        if matches!(self.config.data_source_mode, DataSourceMode::Local | DataSourceMode::Both) {
            let data_dir = self.config.data_directory.as_deref().unwrap_or("data-source");
            self.load_directory(reader, Path::new(data_dir), &mut sources)?;
        }

        if matches!(self.config.data_source_mode, DataSourceMode::Internet | DataSourceMode::Both) {
            for url in self.config.internet_urls.iter().flatten() {
                match reader.fetch_url(url).await {
                    Ok(workbook) => sources.workbooks.push(self.label(workbook)),
                    Err(e) => {
                        println!("   ❌ Error fetching {}: {}", url, e);
                        sources.warnings.push(FileWarning::new(url, &e));
                    }
                }
            }
        }

        Ok(sources)
    }

    /// Read workbooks from a directory in file-name order.
    pub fn load_directory(
        &self,
        reader: &WorkbookReader,
        data_dir: &Path,
        sources: &mut LoadedSources,
    ) -> anyhow::Result<()> {
        let mut paths: Vec<_> = fs::read_dir(data_dir)
            .with_context(|| format!("Failed to read data directory: {}", data_dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| WorkbookReader::is_workbook_path(p))
            .collect();
        paths.sort();

        for path in paths {
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            println!("📄 Processing: {}", name);

            match reader.read_path(&path) {
                Ok(workbook) => sources.workbooks.push(self.label(workbook)),
                Err(e) => {
                    println!("   ❌ Error processing file: {}", e);
                    sources.warnings.push(FileWarning::new(&name, &e));
                }
            }
        }
        Ok(())
    }

    fn label(&self, workbook: Workbook) -> LabeledWorkbook {
        let term_label = self.config.term_label_for(&workbook.source_name);
        LabeledWorkbook {
            workbook,
            term_label,
        }
    }

    pub fn analyze(&self, workbooks: &[LabeledWorkbook]) -> Result<Analysis, AnalysisError> {
        analyze_workbooks(workbooks)
    }
}

/// Extract, check and reconcile the full dataset. Runs before any filter is applied.
pub fn analyze_workbooks(workbooks: &[LabeledWorkbook]) -> Result<Analysis, AnalysisError> {
    let mut rows = Vec::new();
    let mut sheets_used = 0;

    for labeled in workbooks {
        let extraction = extract_workbook(&labeled.workbook, &labeled.term_label);
        info!(
            source = %labeled.workbook.source_name,
            term = %labeled.term_label,
            sheets = extraction.sheets_used.len(),
            rows = extraction.rows.len(),
            "extracted lecture rows"
        );
        sheets_used += extraction.sheets_used.len();
        rows.extend(extraction.rows);
    }

    if rows.is_empty() {
        return Err(AnalysisError::NoSheetsMatched);
    }

    let rows_extracted = rows.len();
    let reconciliation = reconcile(rows);
    if reconciliation.rows.is_empty() {
        return Err(AnalysisError::NoValidInstructorRows {
            extracted: rows_extracted,
        });
    }

    info!(
        rows = reconciliation.rows.len(),
        dropped = reconciliation.dropped,
        instructors = reconciliation.identities.len(),
        "reconciled instructor identities"
    );

    let branch_terms = extract_branch_terms(&reconciliation.rows);

    Ok(Analysis {
        reconciliation,
        branch_terms,
        workbook_count: workbooks.len(),
        sheets_used,
        rows_extracted,
    })
}
