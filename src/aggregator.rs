use crate::models::{CommitteeDetail, FilterConfig, InstructorTotal, ReconciledRow};
use crate::titles::turkish_lowercase;
use std::collections::{BTreeMap, BTreeSet};

/// Row filter built from the user's facet selections. Empty selections match all.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub instructor: Option<String>,
    pub terms: BTreeSet<String>,
    pub committees: BTreeSet<String>,
    pub courses: BTreeSet<String>,
    /// Branch keyword, matched case-insensitively as a substring.
    pub branch: Option<String>,
}

impl RowFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_config(filters: &FilterConfig) -> Self {
        Self {
            instructor: filters.instructor.clone().filter(|s| !s.trim().is_empty()),
            terms: filters.terms.iter().cloned().collect(),
            committees: filters.committees.iter().cloned().collect(),
            courses: filters.courses.iter().cloned().collect(),
            branch: None,
        }
        .with_branch(filters.branch.as_deref())
    }

    pub fn with_branch(mut self, branch: Option<&str>) -> Self {
        self.branch = branch
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn matches(&self, row: &ReconciledRow) -> bool {
        if let Some(instructor) = &self.instructor {
            if &row.display_name != instructor {
                return false;
            }
        }
        if !self.terms.is_empty() && !self.terms.contains(&row.row.term_label) {
            return false;
        }
        if !self.committees.is_empty() && !self.committees.contains(&row.row.committee_name) {
            return false;
        }
        if !self.courses.is_empty() && !self.courses.contains(&row.row.course_name) {
            return false;
        }
        if let Some(branch) = &self.branch {
            let branch = turkish_lowercase(branch);
            let hit = [&row.row.course_name, &row.row.course_title, &row.row.committee_name]
                .iter()
                .any(|text| turkish_lowercase(text).contains(branch.as_str()));
            if !hit {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, rows: &'a [ReconciledRow]) -> Vec<&'a ReconciledRow> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTables {
    pub totals: Vec<InstructorTotal>,
    pub details: Vec<CommitteeDetail>,
}

/// Outcome of aggregating a filtered row set.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    NoMatchingRows,
    Tables(AggregateTables),
}

fn join_sorted<'a>(values: impl Iterator<Item = &'a String>, separator: &str) -> String {
    values
        .filter(|v| !v.is_empty())
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(separator)
}

/// Per-instructor totals, most hours first. Equal totals stay in name order.
pub fn instructor_totals(rows: &[&ReconciledRow]) -> Vec<InstructorTotal> {
    let mut groups: BTreeMap<&str, Vec<&ReconciledRow>> = BTreeMap::new();
    for &row in rows {
        groups.entry(row.display_name.as_str()).or_default().push(row);
    }

    let mut totals: Vec<InstructorTotal> = groups
        .into_iter()
        .map(|(name, rows)| InstructorTotal {
            display_name: name.to_string(),
            total_hours: rows.len(),
            distinct_committee_count: rows
                .iter()
                .map(|r| &r.row.committee_name)
                .collect::<BTreeSet<_>>()
                .len(),
            distinct_term_count: rows
                .iter()
                .map(|r| &r.row.term_label)
                .collect::<BTreeSet<_>>()
                .len(),
        })
        .collect();

    totals.sort_by(|a, b| b.total_hours.cmp(&a.total_hours));
    totals
}

/// Per-instructor, per-term, per-committee detail, in key order.
pub fn committee_details(rows: &[&ReconciledRow]) -> Vec<CommitteeDetail> {
    let mut groups: BTreeMap<(&str, &str, &str), Vec<&ReconciledRow>> = BTreeMap::new();
    for &row in rows {
        groups
            .entry((
                row.display_name.as_str(),
                row.row.term_label.as_str(),
                row.row.committee_name.as_str(),
            ))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((name, term, committee), rows)| CommitteeDetail {
            display_name: name.to_string(),
            term_label: term.to_string(),
            committee_name: committee.to_string(),
            hour_count: rows.len(),
            course_codes: join_sorted(rows.iter().map(|r| &r.row.course_code), ", "),
            course_titles: join_sorted(rows.iter().map(|r| &r.row.course_title), " | "),
            course_names: join_sorted(rows.iter().map(|r| &r.row.course_name), " | "),
            total_hours: rows.len(),
        })
        .collect()
}

/// Every row counts as one lecture hour.
pub fn aggregate(rows: &[&ReconciledRow]) -> Aggregation {
    if rows.is_empty() {
        return Aggregation::NoMatchingRows;
    }
    Aggregation::Tables(AggregateTables {
        totals: instructor_totals(rows),
        details: committee_details(rows),
    })
}
