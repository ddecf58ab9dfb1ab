//! Snippet extraction: locating candidate evidence windows per field group

use crate::config::EngineConfig;
use crate::normalize::{clean_text, normalize_lines, sliding_windows, truncate};
use clinex_domain::{FieldGroup, Snippet, SourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;
use tracing::debug;

/// Keyword-scoring vocabulary per field group, in scoring-priority order
static FIELD_GROUP_KEYWORDS: &[(FieldGroup, &[&str])] = &[
    (
        FieldGroup::GaTrimester,
        &[
            "gestational age",
            "weeks",
            "trimester",
            "delivery",
            "collection",
            "sampling",
            "birth",
            "term",
            "preterm",
        ],
    ),
    (FieldGroup::Birthweight, &["birth weight", "birthweight", "bw", "grams", "kg"]),
    (
        FieldGroup::Parity,
        &["parity", "nulliparous", "multiparous", "gravidity", "gravida", "g0p0"],
    ),
    (FieldGroup::Offspring, &["singleton", "twin", "multiple", "fetuses", "offspring"]),
    (FieldGroup::Sex, &["sex", "male", "female", "fetus"]),
    (
        FieldGroup::Race,
        &["race", "ethnicity", "self-reported", "hispanic", "white", "black", "asian"],
    ),
    (
        FieldGroup::Ancestry,
        &["ancestry", "strain", "c57", "european", "african", "admixed"],
    ),
    (
        FieldGroup::Maternal,
        &["maternal age", "maternal height", "maternal weight", "pre-pregnancy"],
    ),
    (FieldGroup::Paternal, &["paternal age", "paternal height", "paternal weight"]),
    (FieldGroup::ModeDelivery, &["cesarean", "caesarean", "c-section", "vaginal"]),
    (
        FieldGroup::PregnancyComplications,
        &[
            "preeclampsia",
            "gestational diabetes",
            "hypertension",
            "preterm",
            "placenta previa",
            "placental abruption",
            "chorioamnionitis",
        ],
    ),
    (
        FieldGroup::FetalComplications,
        &["fetal distress", "anomaly", "nicu", "iugr", "sga", "growth restriction"],
    ),
    (
        FieldGroup::Site,
        &["hospital", "center", "university", "collected at", "recruited", "city", "country"],
    ),
];

/// Standalone line of 4+ alphabetic-led characters, optionally numbered
static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^(?:\d+[.)\-]\s+)?([A-Za-z][A-Za-z0-9 ,\-/()]{3,})\s*$").unwrap()
});

fn build_heading_lookup(text: &str) -> Vec<(usize, String)> {
    HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let title = clean_text(&caps[1]);
            if title.is_empty() {
                return None;
            }
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            Some((start, title))
        })
        .collect()
}

fn nearest_heading(headings: &[(usize, String)], offset: usize) -> String {
    headings
        .iter()
        .take_while(|(pos, _)| *pos <= offset)
        .last()
        .map(|(_, title)| title.clone())
        .unwrap_or_default()
}

fn score_window(window: &str, keywords: &[&str]) -> usize {
    let lowered = window.to_lowercase();
    keywords.iter().map(|kw| lowered.matches(kw).count()).sum()
}

/// Locate candidate evidence windows for every field group.
///
/// Windows of `window_chars` chars advance by `window_step` chars over
/// the normalized text; each is scored as the sum of case-insensitive
/// keyword occurrence counts for the group. Only windows with a
/// positive score survive, ordered by descending score with ties broken
/// by ascending document offset, capped at `max_snippets_per_field`.
///
/// Blank input yields an empty list. Deterministic given identical
/// input and config.
pub fn find_snippets(
    document_id: &str,
    text: &str,
    source_kind: SourceKind,
    config: &EngineConfig,
) -> Vec<Snippet> {
    let working = normalize_lines(text);
    if working.trim().is_empty() {
        return Vec::new();
    }

    let headings = build_heading_lookup(&working);
    let windows = sliding_windows(&working, config.window_chars, config.window_step);
    let mut snippets = Vec::new();

    for (group, keywords) in FIELD_GROUP_KEYWORDS {
        let mut scored: Vec<(usize, usize, &str)> = windows
            .iter()
            .filter_map(|&(offset, window)| {
                let score = score_window(window, keywords);
                (score > 0).then_some((score, offset, window))
            })
            .collect();
        scored.sort_by_key(|&(score, offset, _)| (Reverse(score), offset));

        for &(_, offset, window) in scored.iter().take(config.max_snippets_per_field) {
            snippets.push(Snippet {
                document_id: document_id.to_string(),
                field_group: *group,
                source_kind,
                section_title: nearest_heading(&headings, offset),
                text: truncate(&clean_text(window), config.window_chars),
                locator: format!("offset:{}", offset),
            });
        }
    }

    debug!(
        "Found {} snippets across {} windows for {}",
        snippets.len(),
        windows.len(),
        document_id
    );
    snippets
}
