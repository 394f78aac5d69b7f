//! Overlap resolution between entity passes.

use super::types::LegalEntity;

/// Resolve overlapping spans, preferring more specific entity types.
///
/// Entities are visited by start offset, longest first on ties. A span overlapping an already
/// kept span replaces the first such span when its priority is strictly higher and is dropped
/// otherwise. The result is ordered by start offset.
pub fn remove_duplicate_entities(mut entities: Vec<LegalEntity>) -> Vec<LegalEntity> {
    entities.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.len().cmp(&a.len())));

    let mut kept: Vec<LegalEntity> = Vec::with_capacity(entities.len());
    for entity in entities {
        if entity.is_empty() {
            continue;
        }
        match kept
            .iter()
            .position(|existing| existing.overlaps(entity.start, entity.end))
        {
            Some(index) => {
                if entity.entity_type.priority() > kept[index].entity_type.priority() {
                    kept[index] = entity;
                }
            }
            None => kept.push(entity),
        }
    }

    kept.sort_by_key(|entity| entity.start);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ner::types::EntityType;

    fn entity(start: usize, end: usize, entity_type: EntityType) -> LegalEntity {
        LegalEntity {
            text: "x".repeat(end - start),
            start,
            end,
            entity_type,
        }
    }

    #[test]
    fn higher_priority_overlap_replaces_existing_span() {
        let result = remove_duplicate_entities(vec![
            entity(0, 10, EntityType::Org),
            entity(2, 8, EntityType::CaseCitation),
        ]);
        assert_eq!(result, vec![entity(2, 8, EntityType::CaseCitation)]);
    }

    #[test]
    fn equal_or_lower_priority_overlap_is_dropped() {
        let result = remove_duplicate_entities(vec![
            entity(5, 9, EntityType::Date),
            entity(5, 12, EntityType::Money),
            entity(6, 7, EntityType::Other("CLAUSE".into())),
        ]);
        assert_eq!(result, vec![entity(5, 12, EntityType::Money)]);
    }

    #[test]
    fn disjoint_spans_are_all_kept_in_order() {
        let result = remove_duplicate_entities(vec![
            entity(20, 25, EntityType::Person),
            entity(0, 4, EntityType::Date),
            entity(4, 9, EntityType::Money),
        ]);
        let starts: Vec<_> = result.iter().map(|entity| entity.start).collect();
        assert_eq!(starts, vec![0, 4, 20]);
    }

    #[test]
    fn identical_spans_from_two_passes_collapse() {
        let result = remove_duplicate_entities(vec![
            entity(3, 9, EntityType::Party),
            entity(3, 9, EntityType::Party),
            entity(3, 9, EntityType::Judge),
        ]);
        assert_eq!(result, vec![entity(3, 9, EntityType::Judge)]);
    }
}
