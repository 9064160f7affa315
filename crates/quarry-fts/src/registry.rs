//! Record type registry.
//!
//! Tracks which record types are searchable and keeps a closure table of
//! their ancestry. Each registered type is resolved once into a
//! [`ResolvedType`]: its lineage (itself first, then each registered
//! ancestor) and its effective field list, with subtype declarations
//! overriding inherited fields of the same name. An override stays
//! filterable when the inherited field was, so subtype documents still
//! answer filters on their ancestors.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use quarry_core::record::{IndexedField, RecordType};

/// A registered record type with inheritance applied.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    name: String,
    lineage: Vec<String>,
    fields: Vec<IndexedField>,
}

impl ResolvedType {
    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type itself followed by its registered ancestors, nearest first.
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// Effective fields, inherited ones first.
    pub fn fields(&self) -> &[IndexedField] {
        &self.fields
    }

    /// Look up an effective field.
    pub fn field(&self, name: &str) -> Option<&IndexedField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Whether this type is `ancestor` or descends from it.
    pub fn is_a(&self, ancestor: &str) -> bool {
        self.lineage.iter().any(|n| n == ancestor)
    }
}

/// Outcome of [`RecordTypeRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The type was not registered before.
    Added,
    /// The type was registered with a different schema, now replaced.
    Replaced,
    /// The same schema was already registered.
    Unchanged,
}

impl Registration {
    /// Whether the registry's view of the type changed.
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Set of searchable record types.
#[derive(Debug, Clone, Default)]
pub struct RecordTypeRegistry {
    types: BTreeMap<String, RecordType>,
    resolved: BTreeMap<String, Arc<ResolvedType>>,
}

impl RecordTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type. Re-registering replaces the prior schema.
    pub fn register(&mut self, record_type: RecordType) -> Registration {
        let outcome = match self.types.get(record_type.name()) {
            None => Registration::Added,
            Some(existing) if existing.same_schema(&record_type) => Registration::Unchanged,
            Some(_) => Registration::Replaced,
        };

        if outcome.is_change() {
            self.types
                .insert(record_type.name().to_string(), record_type);
            self.rebuild_closure();
        }
        outcome
    }

    /// Resolved view of a registered type.
    pub fn resolve(&self, name: &str) -> Option<Arc<ResolvedType>> {
        self.resolved.get(name).cloned()
    }

    /// The type itself plus every registered descendant.
    ///
    /// Empty when `name` is not registered.
    pub fn resolve_subtypes(&self, name: &str) -> BTreeSet<String> {
        if !self.types.contains_key(name) {
            return BTreeSet::new();
        }
        self.resolved
            .values()
            .filter(|r| r.is_a(name))
            .map(|r| r.name.clone())
            .collect()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Declared schema of a registered type.
    pub fn get(&self, name: &str) -> Option<&RecordType> {
        self.types.get(name)
    }

    /// Registered type names in order.
    pub fn names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn rebuild_closure(&mut self) {
        self.resolved = self
            .types
            .keys()
            .map(|name| (name.clone(), Arc::new(self.resolve_uncached(name))))
            .collect();
    }

    fn resolve_uncached(&self, name: &str) -> ResolvedType {
        let mut lineage = vec![name.to_string()];
        let mut current = name;
        while let Some(parent) = self.types.get(current).and_then(|t| t.parent()) {
            if lineage.iter().any(|n| n == parent) {
                log::warn!("Record type '{name}' has a cyclic parent chain at '{parent}'");
                break;
            }
            if !self.types.contains_key(parent) {
                break;
            }
            lineage.push(parent.to_string());
            current = parent;
        }

        // Root first so nearer declarations override.
        let mut fields: Vec<IndexedField> = Vec::new();
        for type_name in lineage.iter().rev() {
            let Some(record_type) = self.types.get(type_name) else {
                continue;
            };
            for field in record_type.fields() {
                match fields.iter_mut().find(|f| f.name() == field.name()) {
                    Some(existing) if existing.is_filterable() => {
                        *existing = field.clone().filterable();
                    }
                    Some(existing) => *existing = field.clone(),
                    None => fields.push(field.clone()),
                }
            }
        }

        ResolvedType {
            name: name.to_string(),
            lineage,
            fields,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::record::FieldKind;

    fn base() -> RecordType {
        RecordType::new("SearchTest")
            .field(IndexedField::text("title").filterable())
            .field(IndexedField::text("content"))
            .field(IndexedField::boolean("live"))
    }

    fn child() -> RecordType {
        RecordType::new("SearchTestChild")
            .child_of("SearchTest")
            .field(IndexedField::text("extra_content"))
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = RecordTypeRegistry::new();
        assert_eq!(registry.register(base()), Registration::Added);
        assert_eq!(registry.register(base()), Registration::Unchanged);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_changed_schema_replaces() {
        let mut registry = RecordTypeRegistry::new();
        registry.register(base());

        let changed = RecordType::new("SearchTest").field(IndexedField::text("title"));
        assert_eq!(registry.register(changed), Registration::Replaced);

        let resolved = registry.resolve("SearchTest").unwrap();
        assert_eq!(resolved.fields().len(), 1);
    }

    #[test]
    fn test_resolve_subtypes_includes_self_and_children() {
        let mut registry = RecordTypeRegistry::new();
        registry.register(base());
        registry.register(child());

        let subtypes = registry.resolve_subtypes("SearchTest");
        assert_eq!(subtypes.len(), 2);
        assert!(subtypes.contains("SearchTest"));
        assert!(subtypes.contains("SearchTestChild"));

        let only_child = registry.resolve_subtypes("SearchTestChild");
        assert_eq!(only_child.len(), 1);
        assert!(only_child.contains("SearchTestChild"));
    }

    #[test]
    fn test_resolve_subtypes_is_transitive() {
        let mut registry = RecordTypeRegistry::new();
        registry.register(base());
        registry.register(child());
        registry.register(RecordType::new("GrandChild").child_of("SearchTestChild"));

        let subtypes = registry.resolve_subtypes("SearchTest");
        assert!(subtypes.contains("GrandChild"));

        let lineage = registry.resolve("GrandChild").unwrap().lineage().to_vec();
        assert_eq!(lineage, vec!["GrandChild", "SearchTestChild", "SearchTest"]);
    }

    #[test]
    fn test_resolve_subtypes_unregistered_is_empty() {
        let registry = RecordTypeRegistry::new();
        assert!(registry.resolve_subtypes("Nope").is_empty());
    }

    #[test]
    fn test_inherited_fields_with_override() {
        let mut registry = RecordTypeRegistry::new();
        registry.register(base());
        registry.register(
            child().field(IndexedField::text("title").boost(2.0)),
        );

        let resolved = registry.resolve("SearchTestChild").unwrap();
        let names: Vec<&str> = resolved.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["title", "content", "live", "extra_content"]);
        assert_eq!(resolved.field("title").unwrap().boost_factor(), 2.0);
        assert!(resolved.field("title").unwrap().is_filterable());
    }

    #[test]
    fn test_override_does_not_add_filterability() {
        let mut registry = RecordTypeRegistry::new();
        registry.register(base());
        registry.register(child().field(IndexedField::text("content").boost(2.0)));

        let resolved = registry.resolve("SearchTestChild").unwrap();
        assert!(!resolved.field("content").unwrap().is_filterable());
    }

    #[test]
    fn test_child_registered_before_parent() {
        let mut registry = RecordTypeRegistry::new();
        registry.register(child());
        assert_eq!(
            registry.resolve("SearchTestChild").unwrap().lineage().len(),
            1
        );

        registry.register(base());
        let resolved = registry.resolve("SearchTestChild").unwrap();
        assert_eq!(resolved.lineage().len(), 2);
        assert_eq!(resolved.field("live").unwrap().kind(), FieldKind::Boolean);
    }

    #[test]
    fn test_cyclic_parents_terminate() {
        let mut registry = RecordTypeRegistry::new();
        registry.register(RecordType::new("A").child_of("B"));
        registry.register(RecordType::new("B").child_of("A"));

        let a = registry.resolve("A").unwrap();
        assert_eq!(a.lineage(), ["A".to_string(), "B".to_string()]);
    }
}
