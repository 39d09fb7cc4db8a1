use std::sync::Arc;
use uuid::Uuid;

/// Source of identifiers for newly created entities. Sessions take one of
/// these so tests can mint predictable ids.
pub type IdProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Returns a collision-resistant identifier for a new entity.
///
/// Ids are client-generated: the remote store upserts by id, so the same
/// entity saved twice must carry the same identifier.
pub fn generate_entity_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn default_id_provider() -> IdProvider {
    Arc::new(generate_entity_id)
}
