//! Compiled patterns for the rule-based entity passes.
//!
//! The legal patterns (citations, statutes, money, dates) are precise; the general recognizers
//! (people, organizations, places, courts, judges) are surface heuristics keyed on honorifics,
//! corporate suffixes, and court vocabulary.

use super::types::{EntityType, LegalEntity};
use regex::Regex;
use std::sync::LazyLock;

/// "Roe v. Wade", "Brown v. Board of Education".
pub static CASE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][\w.&'-]*(?:[ \t]+(?:(?:of|the|and|for|ex rel\.)[ \t]+)?[A-Z][\w.&'-]*)*[ \t]+vs?\.[ \t]+[A-Z][\w.&'-]*(?:[ \t]+(?:(?:of|the|and|for)[ \t]+)?[A-Z][\w&'-]*)*",
    )
    .expect("CASE_NAME regex is valid")
});

/// Reporter citations such as "410 U.S. 113" or "123 F. Supp. 2d 456".
pub static REPORTER_CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b\d{1,4}[ \t]+(?:U\.[ ]?S\.|S\.[ ]?Ct\.|L\.[ ]?Ed\.(?:[ ]?2d)?|F\.(?:[ ]?Supp\.)?(?:[ ]?(?:2d|3d|4th))?|[A-Z][a-z]{0,4}\.(?:[ ]?(?:2d|3d|4th))?)[ \t]+\d{1,5}\b",
    )
    .expect("REPORTER_CITATION regex is valid")
});

/// "42 U.S.C. § 1983", "Cal. Civ. Code §§ 1950.5(b)".
pub static STATUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\b\d+[ \t]+)?\b[A-Z][A-Za-z.]*(?:[ \t]+[A-Z][A-Za-z.]*)*[ \t]*§§?[ \t]*\d+(?:[.-]\d+)*[A-Za-z]?(?:\([0-9A-Za-z]+\))*",
    )
    .expect("STATUTE regex is valid")
});

/// "$1,000.00".
pub static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\d+(?:,\d+)*(?:\.\d+)?").expect("MONEY regex is valid")
});

/// Numeric dates and "Month D, YYYY".
pub static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d{1,2}/\d{1,2}/\d{2,4}|\d{1,2}-\d{1,2}-\d{2,4}|(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]* \d{1,2},? \d{4}",
    )
    .expect("DATE regex is valid")
});

/// Name following an honorific; group 1 holds the name.
pub static PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?[ \t]+([A-Z][a-z]+(?:[ \t]+[A-Z]\.)?(?:[ \t]+[A-Z][a-z]+)?)")
        .expect("PERSON regex is valid")
});

/// Capitalized name ending in a corporate suffix.
pub static ORG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][\w&'-]*(?:[ \t]+[A-Z][\w&'-]*)*,?[ \t]+(?:Inc|LLC|L\.L\.C|Corporation|Corp|Company|Co|Ltd|LLP|LP|PLC|N\.A)\b\.?",
    )
    .expect("ORG regex is valid")
});

/// "State of California", "Commonwealth of Massachusetts".
pub static GPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:State|Commonwealth|City|County|Republic|Kingdom)[ \t]+of[ \t]+[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*",
    )
    .expect("GPE regex is valid")
});

/// "United States District Court for the Northern District of California".
pub static COURT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?:United[ \t]+States|U\.S\.|Supreme|Superior|District|Circuit|Appellate|Bankruptcy|Family|Probate|Municipal|County|State|Federal)[ \t]+)+Court(?:[ \t]+of[ \t]+(?:Appeals|Justice|Chancery|Claims))?(?:[ \t]+(?:for|of)[ \t]+the[ \t]+[A-Z][a-z]+(?:[ \t]+(?:of[ \t]+)?[A-Z][a-z]+)*)?",
    )
    .expect("COURT regex is valid")
});

/// "Judge Amy Smith", "Chief Justice Roberts", "Hon. Jane Doe".
pub static JUDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:Chief[ \t]+Justice|Magistrate[ \t]+Judge|Judge|Justice|Hon\.|Honorable)[ \t]+[A-Z][a-z]+(?:[ \t]+[A-Z]\.)?(?:[ \t]+[A-Z][a-z]+)?",
    )
    .expect("JUDGE regex is valid")
});

/// Legal patterns: citations, statutes, money, dates.
pub fn legal_pattern_entities(text: &str) -> Vec<LegalEntity> {
    let mut entities = Vec::new();
    collect(&CASE_NAME, text, EntityType::CaseCitation, &mut entities);
    collect(&REPORTER_CITATION, text, EntityType::CaseCitation, &mut entities);
    collect(&STATUTE, text, EntityType::Statute, &mut entities);
    collect(&MONEY, text, EntityType::Money, &mut entities);
    collect(&DATE, text, EntityType::Date, &mut entities);
    entities
}

/// General recognizers: people, organizations, places, courts, judges.
pub fn general_entities(text: &str) -> Vec<LegalEntity> {
    let mut entities = Vec::new();
    for captures in PERSON.captures_iter(text) {
        if let Some(name) = captures.get(1) {
            entities.push(LegalEntity::from_span(
                text,
                name.start(),
                name.end(),
                EntityType::Person,
            ));
        }
    }
    collect(&ORG, text, EntityType::Org, &mut entities);
    collect(&GPE, text, EntityType::Gpe, &mut entities);
    collect(&COURT, text, EntityType::Court, &mut entities);
    collect(&JUDGE, text, EntityType::Judge, &mut entities);
    entities
}

fn collect(pattern: &Regex, text: &str, entity_type: EntityType, out: &mut Vec<LegalEntity>) {
    out.extend(pattern.find_iter(text).map(|found| {
        LegalEntity::from_span(text, found.start(), found.end(), entity_type.clone())
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts_of(entities: &[LegalEntity], entity_type: EntityType) -> Vec<&str> {
        entities
            .iter()
            .filter(|entity| entity.entity_type == entity_type)
            .map(|entity| entity.text.as_str())
            .collect()
    }

    #[test]
    fn finds_case_citations_in_both_forms() {
        let text = "the rule of Miranda v. Arizona, 384 U.S. 436 (1966), still applies.";
        let entities = legal_pattern_entities(text);
        let citations = texts_of(&entities, EntityType::CaseCitation);
        assert!(citations.contains(&"Miranda v. Arizona"));
        assert!(citations.contains(&"384 U.S. 436"));
    }

    #[test]
    fn finds_statutes_money_and_dates() {
        let text = "Claims under 42 U.S.C. § 1983 seek $1,500,000.00 filed 03/15/2023 and on January 5, 2024.";
        let entities = legal_pattern_entities(text);
        assert_eq!(texts_of(&entities, EntityType::Statute), vec!["42 U.S.C. § 1983"]);
        assert_eq!(texts_of(&entities, EntityType::Money), vec!["$1,500,000.00"]);
        assert_eq!(
            texts_of(&entities, EntityType::Date),
            vec!["03/15/2023", "January 5, 2024"]
        );
    }

    #[test]
    fn offsets_index_the_original_text() {
        let text = "Frais dûs à Zoë: $250 per 42 U.S.C. § 1983.";
        for entity in legal_pattern_entities(text) {
            assert_eq!(&text[entity.start..entity.end], entity.text);
        }
    }

    #[test]
    fn general_recognizers_find_people_orgs_places_courts_and_judges() {
        let text = "Agreement between Acme Holdings, Inc. and Ms. Jane Roe of the State of New York, \
                    heard in the United States District Court for the Southern District of New York \
                    before Judge Alan Park.";
        let entities = general_entities(text);
        assert!(texts_of(&entities, EntityType::Org).contains(&"Acme Holdings, Inc."));
        assert_eq!(texts_of(&entities, EntityType::Person), vec!["Jane Roe"]);
        assert!(texts_of(&entities, EntityType::Gpe).contains(&"State of New York"));
        assert!(
            texts_of(&entities, EntityType::Court)
                .iter()
                .any(|court| court.starts_with("United States District Court"))
        );
        assert_eq!(texts_of(&entities, EntityType::Judge), vec!["Judge Alan Park"]);
    }
}
