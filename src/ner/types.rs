//! Entity labels and extracted spans.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category assigned to an extracted entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EntityType {
    /// Citation to a reported case ("Roe v. Wade", "410 U.S. 113").
    CaseCitation,
    /// Statutory section reference ("42 U.S.C. § 1983").
    Statute,
    /// Reference to a law, act, or regulation by name.
    Law,
    /// Specialized legal terminology.
    LegalTerm,
    /// Named judge.
    Judge,
    /// Named court.
    Court,
    /// Governing jurisdiction.
    Jurisdiction,
    /// Party to an agreement or case.
    Party,
    /// Natural person.
    Person,
    /// Company or institution.
    Org,
    /// Geopolitical entity.
    Gpe,
    /// Calendar date.
    Date,
    /// Monetary amount.
    Money,
    /// Administrative regulation.
    Regulation,
    /// Any label outside the known set, kept verbatim.
    Other(String),
}

impl EntityType {
    /// Every known label, in priority order.
    pub const KNOWN: [EntityType; 14] = [
        EntityType::CaseCitation,
        EntityType::Statute,
        EntityType::Law,
        EntityType::LegalTerm,
        EntityType::Judge,
        EntityType::Court,
        EntityType::Jurisdiction,
        EntityType::Party,
        EntityType::Person,
        EntityType::Org,
        EntityType::Gpe,
        EntityType::Date,
        EntityType::Money,
        EntityType::Regulation,
    ];

    /// Parse a label case-insensitively; unknown labels become [`EntityType::Other`].
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "CASE_CITATION" => Self::CaseCitation,
            "STATUTE" => Self::Statute,
            "LAW" => Self::Law,
            "LEGAL_TERM" => Self::LegalTerm,
            "JUDGE" => Self::Judge,
            "COURT" => Self::Court,
            "JURISDICTION" => Self::Jurisdiction,
            "PARTY" => Self::Party,
            "PERSON" => Self::Person,
            "ORG" => Self::Org,
            "GPE" => Self::Gpe,
            "DATE" => Self::Date,
            "MONEY" => Self::Money,
            "REGULATION" => Self::Regulation,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Canonical upper-case label.
    pub fn label(&self) -> &str {
        match self {
            Self::CaseCitation => "CASE_CITATION",
            Self::Statute => "STATUTE",
            Self::Law => "LAW",
            Self::LegalTerm => "LEGAL_TERM",
            Self::Judge => "JUDGE",
            Self::Court => "COURT",
            Self::Jurisdiction => "JURISDICTION",
            Self::Party => "PARTY",
            Self::Person => "PERSON",
            Self::Org => "ORG",
            Self::Gpe => "GPE",
            Self::Date => "DATE",
            Self::Money => "MONEY",
            Self::Regulation => "REGULATION",
            Self::Other(label) => label,
        }
    }

    /// Rank used when overlapping spans compete; higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            Self::CaseCitation => 10,
            Self::Statute => 9,
            Self::Law => 8,
            Self::LegalTerm => 7,
            Self::Judge => 6,
            Self::Court => 5,
            Self::Jurisdiction => 4,
            Self::Party => 3,
            Self::Person => 2,
            Self::Org => 1,
            _ => 0,
        }
    }

    /// Highlight color for this type.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Person => "#FFC107",
            Self::Org => "#2196F3",
            Self::Gpe => "#4CAF50",
            Self::Date => "#9C27B0",
            Self::Money => "#F44336",
            Self::Law => "#FF9800",
            Self::Court => "#795548",
            Self::Judge => "#607D8B",
            Self::Statute => "#E91E63",
            Self::Regulation => "#009688",
            Self::CaseCitation => "#673AB7",
            Self::LegalTerm => "#3F51B5",
            Self::Party => "#8BC34A",
            Self::Jurisdiction => "#00BCD4",
            Self::Other(_) => DEFAULT_COLOR,
        }
    }
}

/// Color used for labels without an assigned palette entry.
pub const DEFAULT_COLOR: &str = "#9E9E9E";

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.label().to_string()
    }
}

/// One entity span inside a document.
///
/// `start` and `end` are byte offsets into the document text and always fall on char
/// boundaries, so `&text[start..end] == entity.text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalEntity {
    /// Matched text.
    pub text: String,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Assigned category.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl LegalEntity {
    /// Build an entity from a span of `source`.
    pub(crate) fn from_span(source: &str, start: usize, end: usize, entity_type: EntityType) -> Self {
        Self {
            text: source[start..end].to_string(),
            start,
            end,
            entity_type,
        }
    }

    /// Span length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this span shares at least one byte with `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        !(self.end <= start || self.start >= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn labels_round_trip_and_unknowns_are_preserved() {
        assert_eq!(EntityType::from_label("case_citation"), EntityType::CaseCitation);
        assert_eq!(EntityType::from_label(" Legal Term "), EntityType::LegalTerm);
        assert_eq!(
            EntityType::from_label("CONTRACT_CLAUSE"),
            EntityType::Other("CONTRACT_CLAUSE".into())
        );
        for known in EntityType::KNOWN {
            assert_eq!(EntityType::from_label(known.label()), known);
        }
    }

    #[test]
    fn priorities_follow_specificity() {
        assert_eq!(EntityType::CaseCitation.priority(), 10);
        assert_eq!(EntityType::Org.priority(), 1);
        assert_eq!(EntityType::Money.priority(), 0);
        assert_eq!(EntityType::Other("X".into()).priority(), 0);
        assert_eq!(EntityType::Other("X".into()).color(), DEFAULT_COLOR);
    }

    #[test]
    fn entity_serializes_type_as_label() {
        let entity = LegalEntity::from_span("Pay $500 now", 4, 8, EntityType::Money);
        assert_eq!(entity.text, "$500");
        assert_eq!(
            serde_json::to_value(&entity).expect("json"),
            json!({"text": "$500", "start": 4, "end": 8, "type": "MONEY"})
        );
    }
}
