//! Name filtering for discovery lists.

use crate::models::NamedEntity;

/// Filter entities by a free-text query.
///
/// A query in pipeline form (`a|b|c`) only uses its last segment. An empty
/// query keeps every entity. Otherwise an entity matches when, ignoring case,
/// the query contains its name or its name contains the query. Relative order
/// is preserved.
pub fn filter_names(query: &str, entities: &[NamedEntity]) -> Vec<NamedEntity> {
    let query = query.rsplit('|').next().unwrap_or_default();

    if query.is_empty() {
        return entities.to_vec();
    }

    let query = query.to_lowercase();
    entities
        .iter()
        .filter(|entity| {
            let name = entity.name.to_lowercase();
            query.contains(&name) || name.contains(&query)
        })
        .cloned()
        .collect()
}
