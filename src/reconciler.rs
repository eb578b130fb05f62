use crate::models::{CanonicalIdentity, LectureRow, ParsedIdentity, ReconciledRow, Title};
use crate::titles::{is_placeholder, parse_instructor};
use std::collections::HashMap;

/// Immutable mapping from `name_key` to the canonical identity of that person.
/// Identities are kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityMap {
    identities: Vec<CanonicalIdentity>,
    index: HashMap<String, usize>,
}

impl IdentityMap {
    pub fn get(&self, name_key: &str) -> Option<&CanonicalIdentity> {
        self.index.get(name_key).map(|&i| &self.identities[i])
    }

    pub fn identities(&self) -> &[CanonicalIdentity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Reconciled dataset: every surviving row tagged with its canonical display name.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub rows: Vec<ReconciledRow>,
    pub identities: IdentityMap,
    /// Rows dropped because the instructor cell held no usable name.
    pub dropped: usize,
}

/// Parse a row's instructor cell, or `None` when it carries no usable name.
pub fn parse_row(row: &LectureRow) -> Option<ParsedIdentity> {
    if is_placeholder(&row.instructor_raw) {
        return None;
    }
    let parsed = parse_instructor(row.instructor_raw.trim());
    if parsed.name_key.is_empty() {
        return None;
    }
    Some(parsed)
}

/// Fold parsed rows, in order, into canonical identities. The first row seen for a
/// key fixes its spelling; the title is the highest rank seen anywhere for the key.
pub fn build_identities<'a, I>(parsed: I) -> IdentityMap
where
    I: IntoIterator<Item = &'a ParsedIdentity>,
{
    parsed
        .into_iter()
        .fold(IdentityMap::default(), |mut map, identity| {
            match map.index.get(&identity.name_key) {
                Some(&i) => {
                    let existing = &mut map.identities[i];
                    existing.highest_title = max_title(existing.highest_title, identity.title);
                }
                None => {
                    map.index.insert(identity.name_key.clone(), map.identities.len());
                    map.identities.push(CanonicalIdentity {
                        name_key: identity.name_key.clone(),
                        canonical_bare_name: identity.bare_name.clone(),
                        highest_title: identity.title,
                        display_name: String::new(),
                    });
                }
            }
            map
        })
        .finalize()
}

impl IdentityMap {
    fn finalize(mut self) -> Self {
        for identity in &mut self.identities {
            identity.display_name = CanonicalIdentity::compose_display_name(
                identity.highest_title,
                &identity.canonical_bare_name,
            );
        }
        self
    }
}

fn max_title(a: Option<Title>, b: Option<Title>) -> Option<Title> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Reconcile the whole, unfiltered dataset. Rows must be in extraction order.
pub fn reconcile(rows: Vec<LectureRow>) -> Reconciliation {
    let total = rows.len();
    let parsed: Vec<(LectureRow, ParsedIdentity)> = rows
        .into_iter()
        .filter_map(|row| parse_row(&row).map(|parsed| (row, parsed)))
        .collect();

    let identities = build_identities(parsed.iter().map(|(_, p)| p));

    let rows: Vec<ReconciledRow> = parsed
        .into_iter()
        .map(|(row, parsed)| {
            let display_name = identities
                .get(&parsed.name_key)
                .map(|identity| identity.display_name.clone())
                .unwrap_or_else(|| parsed.bare_name.clone());
            ReconciledRow {
                row,
                parsed,
                display_name,
            }
        })
        .collect();

    Reconciliation {
        dropped: total - rows.len(),
        rows,
        identities,
    }
}
