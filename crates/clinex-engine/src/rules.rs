//! Deterministic rule engine: ordered pattern battery over snippets

use crate::normalize::clean_text;
use clinex_domain::{Field, FieldHit, HitSource, Snippet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static rule pattern")
}

/// Trimester phrases, first match wins
static TRIMESTER_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (re(r"(?i)\b(1st|first)\s+trimester\b"), "1st"),
        (re(r"(?i)\b(2nd|second)\s+trimester\b"), "2nd"),
        (re(r"(?i)\b(3rd|third)\s+trimester\b"), "3rd"),
        (re(r"(?i)\bterm\b"), "term"),
        (re(r"(?i)\b(preterm|premature)\b"), "premature"),
    ]
});

/// Gestational age at delivery: number of weeks within a bounded gap
static GA_DELIVERY_RE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)gestational\s+age[^.\n]{0,60}(delivery|birth)[^0-9]{0,20}(\d{2,3})(?:\s*(weeks|wk))")
});

/// Gestational age at sample collection, same shape
static GA_COLLECTION_RE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)gestational\s+age[^.\n]{0,60}(collection|sampling)[^0-9]{0,20}(\d{2,3})(?:\s*(weeks|wk))")
});

/// Birthweight in grams or kilograms near the phrase
static BIRTHWEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)birth[ -]?weight[^0-9]{0,40}((\d{3,4})\s*g|(\d\.\d)\s*kg)"));

/// Simple presence patterns: a match anywhere sets the field to "yes"
static PRESENCE_PATTERNS: Lazy<Vec<(Field, Regex)>> = Lazy::new(|| {
    vec![
        (Field::SexOfOffspringProvided, re(r"(?i)\bsex\b")),
        (Field::ParityProvided, re(r"(?i)\bparity\b")),
        (Field::GravidityProvided, re(r"(?i)\bgravidity|gravida\b")),
        (Field::NumOffspringProvided, re(r"(?i)\bsingleton|twin|triplet|multiple\b")),
        (Field::RaceEthnicityProvided, re(r"(?i)\brace|ethnicity|self-reported\b")),
        (Field::GeneticAncestryProvided, re(r"(?i)\bancestry|strain\b")),
        (Field::MaternalHeightProvided, re(r"(?i)maternal\s+height")),
        (Field::MaternalPrepregWeightProvided, re(r"(?i)pre-?pregnancy\s+weight|maternal\s+weight")),
        (Field::PaternalHeightProvided, re(r"(?i)paternal\s+height")),
        (Field::PaternalWeightProvided, re(r"(?i)paternal\s+weight")),
        (Field::MaternalAgeProvided, re(r"(?i)maternal\s+age")),
        (Field::PaternalAgeProvided, re(r"(?i)paternal\s+age")),
        (Field::ModeOfDeliveryProvided, re(r"(?i)cesarean|caesarean|c-section|vaginal")),
    ]
});

/// Secondary keyword paths when the presence battery found nothing
static OFFSPRING_KEYWORDS: &[&str] = &["singleton", "twin", "triplet", "multiple", "fetuses"];
static RACE_KEYWORDS: &[&str] =
    &["race", "ethnicity", "self-reported", "hispanic", "white", "black", "asian"];
static ANCESTRY_KEYWORDS: &[&str] =
    &["ancestry", "strain", "c57", "european", "african", "admixed"];

/// Pregnancy complication dictionary, accumulated as a set
static PREGNANCY_COMPLICATIONS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("preeclampsia", re(r"(?i)preeclampsia|pre-eclampsia")),
        ("gestational diabetes", re(r"(?i)gestational\s+diabetes")),
        ("hypertension", re(r"(?i)gestational\s+hypertension|pregnancy-induced\s+hypertension")),
        ("preterm birth", re(r"(?i)preterm\s+birth|ptb")),
        ("placenta previa", re(r"(?i)placenta\s+previa")),
        ("placental abruption", re(r"(?i)placental\s+abruption")),
        ("chorioamnionitis", re(r"(?i)chorioamnionitis")),
    ]
});

/// Fetal complication dictionary, accumulated as a set
static FETAL_COMPLICATIONS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("fetal distress", re(r"(?i)fetal\s+distress")),
        ("congenital anomaly", re(r"(?i)congenital\s+anomal(y|ies)")),
        ("nicu", re(r"(?i)nicu")),
        ("iugr", re(r"(?i)iugr|intrauterine\s+growth\s+restriction")),
        ("sga", re(r"(?i)small\s+for\s+gestational\s+age|sga")),
    ]
});

/// Collection-site phrases with a captured location tail
static SITE_RE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)(collected at|recruited from|enrolled at|delivered at|performed at|obtained from)\s+([^.;\n]+)")
});

/// Closed list of recognized country names (lowercase)
static COUNTRY_LIST: &[&str] = &[
    "united states",
    "usa",
    "china",
    "canada",
    "united kingdom",
    "australia",
    "germany",
    "france",
    "spain",
    "italy",
    "brazil",
    "india",
    "japan",
    "mexico",
    "sweden",
    "norway",
    "denmark",
    "finland",
    "netherlands",
    "russia",
    "korea",
    "hong kong",
    "taiwan",
    "singapore",
    "thailand",
    "argentina",
    "south africa",
];

/// First-writer-wins map over singular fields plus union-set
/// accumulators for the complication list fields. Keeping both behind
/// one type means the arbitrator never special-cases accumulation.
#[derive(Default)]
struct HitAccumulator {
    hits: BTreeMap<Field, FieldHit>,
    pregnancy: BTreeSet<String>,
    fetal: BTreeSet<String>,
}

impl HitAccumulator {
    fn contains(&self, field: Field) -> bool {
        self.hits.contains_key(&field)
    }

    /// Insert a hit unless the field already has one
    fn set_once(
        &mut self,
        field: Field,
        value: Option<&str>,
        evidence: &str,
        source: HitSource,
        locator: &str,
    ) {
        self.hits.entry(field).or_insert_with(|| FieldHit {
            field,
            provided: true,
            value: value.map(str::to_string),
            evidence: clean_text(evidence),
            confidence: 1.0,
            source,
            locator: locator.to_string(),
        });
    }

    fn into_hits(self) -> Vec<FieldHit> {
        self.hits.into_values().collect()
    }
}

/// Apply the ordered rule battery to every snippet.
///
/// Snippets are visited in the order provided by the snippet extractor;
/// within each snippet the matchers run in a fixed sequence. Singular
/// fields keep the first hit found; complication dictionaries
/// accumulate across all snippets and synthesize aggregate hits at the
/// end. Non-matches simply skip, nothing fails.
pub fn apply_rules(snippets: &[Snippet]) -> Vec<FieldHit> {
    let mut acc = HitAccumulator::default();

    for snip in snippets {
        let text = snip.text.as_str();
        let lowered = text.to_lowercase();
        let locator = snip.locator.as_str();

        // Trimester: first phrase pattern to match wins
        if !acc.contains(Field::PregnancyTrimester) {
            for (pattern, value) in TRIMESTER_PATTERNS.iter() {
                if let Some(m) = pattern.find(text) {
                    acc.set_once(
                        Field::PregnancyTrimester,
                        Some(value),
                        m.as_str(),
                        HitSource::Rule,
                        locator,
                    );
                    break;
                }
            }
        }

        // Gestational age at delivery and at collection
        if !acc.contains(Field::GaAtDeliveryWeeks) {
            if let Some(caps) = GA_DELIVERY_RE.captures(text) {
                let evidence = caps.get(0).map_or("", |m| m.as_str());
                let weeks = caps.get(2).map_or("", |m| m.as_str());
                acc.set_once(Field::GaAtDeliveryWeeks, Some(weeks), evidence, HitSource::Rule, locator);
                acc.set_once(Field::GaAtDeliveryProvided, Some("yes"), evidence, HitSource::Rule, locator);
            }
        }
        if !acc.contains(Field::GaAtCollectionWeeks) {
            if let Some(caps) = GA_COLLECTION_RE.captures(text) {
                let evidence = caps.get(0).map_or("", |m| m.as_str());
                let weeks = caps.get(2).map_or("", |m| m.as_str());
                acc.set_once(Field::GaAtCollectionWeeks, Some(weeks), evidence, HitSource::Rule, locator);
                acc.set_once(Field::GaAtCollectionProvided, Some("yes"), evidence, HitSource::Rule, locator);
            }
        }

        // Birthweight presence
        if !acc.contains(Field::BirthweightProvided) {
            if let Some(m) = BIRTHWEIGHT_RE.find(text) {
                acc.set_once(Field::BirthweightProvided, Some("yes"), m.as_str(), HitSource::Rule, locator);
            }
        }

        // Presence battery
        for (field, pattern) in PRESENCE_PATTERNS.iter() {
            if acc.contains(*field) {
                continue;
            }
            if let Some(m) = pattern.find(text) {
                acc.set_once(*field, Some("yes"), m.as_str(), HitSource::Rule, locator);
            }
        }

        // Secondary keyword paths; whole snippet stands as evidence
        if !acc.contains(Field::NumOffspringProvided)
            && OFFSPRING_KEYWORDS.iter().any(|kw| lowered.contains(kw))
        {
            acc.set_once(Field::NumOffspringProvided, Some("yes"), text, HitSource::Rule, locator);
        }
        if !acc.contains(Field::RaceEthnicityProvided)
            && RACE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
        {
            acc.set_once(Field::RaceEthnicityProvided, Some("yes"), text, HitSource::Rule, locator);
        }
        if !acc.contains(Field::GeneticAncestryProvided)
            && ANCESTRY_KEYWORDS.iter().any(|kw| lowered.contains(kw))
        {
            acc.set_once(Field::GeneticAncestryProvided, Some("yes"), text, HitSource::Rule, locator);
        }

        // Complication dictionaries accumulate across snippets
        for (name, pattern) in PREGNANCY_COMPLICATIONS.iter() {
            if pattern.is_match(text) {
                acc.pregnancy.insert((*name).to_string());
            }
        }
        for (name, pattern) in FETAL_COMPLICATIONS.iter() {
            if pattern.is_match(text) {
                acc.fetal.insert((*name).to_string());
            }
        }

        // Hospital / country
        if !acc.contains(Field::HospitalCenter) {
            if let Some(caps) = SITE_RE.captures(text) {
                let evidence = caps.get(0).map_or("", |m| m.as_str());
                let location = clean_text(caps.get(2).map_or("", |m| m.as_str()));
                acc.set_once(Field::HospitalCenter, Some(&location), evidence, HitSource::Rule, locator);
                for token in location.split(',').rev() {
                    let token = token.trim();
                    if COUNTRY_LIST.contains(&token.to_lowercase().as_str()) {
                        acc.set_once(
                            Field::CountryOfCollection,
                            Some(token),
                            evidence,
                            HitSource::Rule,
                            locator,
                        );
                        break;
                    }
                }
            }
        }
    }

    // Synthesize aggregate hits for the accumulated complication sets
    if !acc.pregnancy.is_empty() {
        let names: Vec<&str> = acc.pregnancy.iter().map(String::as_str).collect();
        let value = names.join(", ");
        let evidence = names.join("; ");
        acc.set_once(
            Field::PregnancyComplicationsList,
            Some(&value),
            &evidence,
            HitSource::Aggregate,
            "aggregate",
        );
        acc.set_once(
            Field::ComplicationSamplesCollected,
            Some("yes"),
            &evidence,
            HitSource::Aggregate,
            "aggregate",
        );
    }
    if !acc.fetal.is_empty() {
        let names: Vec<&str> = acc.fetal.iter().map(String::as_str).collect();
        let value = names.join(", ");
        let evidence = names.join("; ");
        acc.set_once(
            Field::FetalComplications,
            Some(&value),
            &evidence,
            HitSource::Aggregate,
            "aggregate",
        );
        acc.set_once(
            Field::FetalComplicationsListed,
            Some("yes"),
            &evidence,
            HitSource::Aggregate,
            "aggregate",
        );
    }

    let hits = acc.into_hits();
    debug!("Rule battery produced {} hits from {} snippets", hits.len(), snippets.len());
    hits
}
