//! Named schema registry
//!
//! Holds every object schema discovered so far under a name, and decides on each
//! registration whether the candidate is the same shape as something already
//! stored (merge in place) or a new variant (store under a suffixed name).

use super::fragment::{json_type_name, ObjectSchema, Property, SchemaFragment};
use crate::error::RegistryError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Store of named object schemas plus the per-name collision counter.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, ObjectSchema>,
    // Registration order, used for output
    order: Vec<String>,
    // Base name -> highest suffix allocated for it
    collisions: BTreeMap<String, usize>,
    // Seeded names whose schemas are not objects; never written to
    reserved: BTreeSet<String>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registry from an existing `components.schemas` mapping.
    ///
    /// Every entry must be an object schema with a `properties` mapping. Entries
    /// that look like suffixed variants of another entry (`user`, `user1`) count
    /// towards that name's collision counter so new variants never overwrite them.
    pub fn from_components(components: &Value) -> Result<Self, RegistryError> {
        let (registry, rejected) = Self::from_components_lenient(components)?;
        match rejected.into_iter().next() {
            Some((name, reason)) => Err(RegistryError::InvalidSeedSchema { name, reason }),
            None => Ok(registry),
        }
    }

    /// Seed like [`SchemaRegistry::from_components`], but keep going past
    /// entries that are not object schemas (enums, `allOf` compositions, ...).
    ///
    /// Rejected entries are returned as name -> reason. Their names stay
    /// reserved: registration never stores a schema under them, so a caller
    /// writing [`SchemaRegistry::to_components`] back into the same mapping
    /// leaves them untouched.
    pub fn from_components_lenient(
        components: &Value,
    ) -> Result<(Self, BTreeMap<String, String>), RegistryError> {
        let schemas = components.as_object().ok_or_else(|| RegistryError::SeedNotAnObject {
            actual: json_type_name(components).to_string(),
        })?;

        let mut registry = SchemaRegistry::new();
        let mut rejected = BTreeMap::new();
        for (name, schema) in schemas {
            match ObjectSchema::from_value(schema) {
                Ok(object) => registry.insert(name.clone(), object),
                Err(reason) => {
                    registry.reserved.insert(name.clone());
                    rejected.insert(name.clone(), reason);
                }
            }
        }

        let seeded_variants: Vec<(String, usize)> = schemas
            .keys()
            .filter_map(|name| split_suffix(name))
            .filter(|(base, _)| registry.is_occupied(base))
            .map(|(base, suffix)| (base.to_string(), suffix))
            .collect();
        for (base, suffix) in seeded_variants {
            let count = registry.collisions.entry(base).or_insert(0);
            *count = (*count).max(suffix);
        }

        debug!(
            schemas = registry.len(),
            rejected = rejected.len(),
            "seeded schema registry"
        );
        Ok((registry, rejected))
    }

    /// Register `candidate` under `name` and return the name it ended up under.
    ///
    /// 1. unused name: store it there
    /// 2. stored schema under `name` is equivalent: merge into it
    /// 3. an allocated variant `name1..nameN` is equivalent: merge into that
    /// 4. otherwise allocate the next free suffix
    pub fn register(&mut self, name: &str, candidate: ObjectSchema) -> String {
        if self.merge_if_equivalent(name, &candidate) {
            return name.to_string();
        }
        if !self.is_occupied(name) {
            debug!(schema = name, properties = candidate.len(), "registered schema");
            self.insert(name.to_string(), candidate);
            return name.to_string();
        }

        let count = self.collision_count(name);
        for suffix in 1..=count {
            let variant = format!("{name}{suffix}");
            if self.merge_if_equivalent(&variant, &candidate) {
                return variant;
            }
        }

        let mut suffix = count + 1;
        let mut variant = format!("{name}{suffix}");
        while self.is_occupied(&variant) {
            suffix += 1;
            variant = format!("{name}{suffix}");
        }
        self.collisions.insert(name.to_string(), suffix);

        debug!(schema = name, variant = %variant, "schema shape collision, allocated new variant");
        self.insert(variant.clone(), candidate);
        variant
    }

    /// Fold another registry into this one.
    ///
    /// Entries are replayed in the other registry's registration order under
    /// their base name, so the same equivalence and merge rules apply.
    /// References inside replayed schemas are rewritten to the names their
    /// targets ended up under. Returns the mapping from the other registry's
    /// names to names in `self`.
    pub fn absorb(&mut self, mut other: SchemaRegistry) -> BTreeMap<String, String> {
        let mut renames = BTreeMap::new();

        for name in std::mem::take(&mut other.order) {
            let Some(schema) = other.schemas.remove(&name) else {
                continue;
            };
            let base = other.base_name(&name).to_string();
            let schema = rename_object_references(schema, &renames);
            let effective = self.register(&base, schema);
            renames.insert(name, effective);
        }

        renames
    }

    pub fn get(&self, name: &str) -> Option<&ObjectSchema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Named schemas in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectSchema)> {
        self.order
            .iter()
            .filter_map(|name| self.schemas.get(name).map(|schema| (name.as_str(), schema)))
    }

    /// True if `name` was seeded with a schema this registry cannot hold
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Highest suffix allocated for `base` so far (0 if none)
    pub fn collision_count(&self, base: &str) -> usize {
        self.collisions.get(base).copied().unwrap_or(0)
    }

    /// Serialize as an OpenAPI `components.schemas` object
    pub fn to_components(&self) -> Value {
        let schemas: Map<String, Value> = self
            .iter()
            .map(|(name, schema)| (name.to_string(), schema.to_value()))
            .collect();
        Value::Object(schemas)
    }

    fn is_occupied(&self, name: &str) -> bool {
        self.schemas.contains_key(name) || self.reserved.contains(name)
    }

    fn insert(&mut self, name: String, schema: ObjectSchema) {
        if self.schemas.insert(name.clone(), schema).is_none() {
            self.order.push(name);
        }
    }

    fn merge_if_equivalent(&mut self, name: &str, candidate: &ObjectSchema) -> bool {
        let Some(stored) = self.schemas.get_mut(name) else {
            return false;
        };
        if !equivalent(stored, candidate) {
            return false;
        }

        *stored = merge(stored, candidate);
        debug!(schema = name, properties = stored.len(), "merged schema into existing entry");
        true
    }

    /// Base name a stored name was allocated from (`user2` -> `user`)
    fn base_name<'a>(&self, name: &'a str) -> &'a str {
        match split_suffix(name) {
            Some((base, suffix)) if self.collision_count(base) >= suffix => base,
            _ => name,
        }
    }
}

/// Decide whether two object schemas describe the same shape.
///
/// One property set must contain the other. Properties present on both sides
/// must agree on the schemas they reference; primitive type drift is tolerated.
pub fn equivalent(a: &ObjectSchema, b: &ObjectSchema) -> bool {
    if !a.is_subset_of(b) && !b.is_subset_of(a) {
        return false;
    }

    a.iter().all(|(name, left)| match b.get(name) {
        Some(right) => properties_compatible(&left.schema, &right.schema),
        None => true,
    })
}

fn properties_compatible(a: &SchemaFragment, b: &SchemaFragment) -> bool {
    if a.is_untyped() || b.is_untyped() {
        return true;
    }

    match (a, b) {
        (SchemaFragment::Reference { name: left }, SchemaFragment::Reference { name: right }) => left == right,
        (SchemaFragment::Reference { .. }, _) | (_, SchemaFragment::Reference { .. }) => false,
        (SchemaFragment::Array { items: left }, SchemaFragment::Array { items: right }) => {
            items_compatible(left, right)
        }
        (SchemaFragment::Object(left), SchemaFragment::Object(right)) => equivalent(left, right),
        _ => true,
    }
}

fn items_compatible(a: &SchemaFragment, b: &SchemaFragment) -> bool {
    match (a, b) {
        (SchemaFragment::Reference { name: left }, SchemaFragment::Reference { name: right }) => left == right,
        (SchemaFragment::Array { items: left }, SchemaFragment::Array { items: right }) => {
            items_compatible(left, right)
        }
        (SchemaFragment::Object(left), SchemaFragment::Object(right)) => equivalent(left, right),
        _ => true,
    }
}

/// Merge `candidate` into `stored`, producing the union of both shapes.
///
/// The side with the larger property set is the base and keeps its property
/// order. Properties seen on only one side become nullable. For properties on
/// both sides the most recent (candidate) schema wins, except that untyped
/// observations never erase a known type.
pub fn merge(stored: &ObjectSchema, candidate: &ObjectSchema) -> ObjectSchema {
    let candidate_is_base = !candidate.is_subset_of(stored);
    let (base, other) = if candidate_is_base {
        (candidate, stored)
    } else {
        (stored, candidate)
    };

    let mut merged = ObjectSchema::new();
    for (name, base_property) in base.iter() {
        let property = match other.get(name) {
            Some(other_property) if candidate_is_base => merge_property(other_property, base_property),
            Some(other_property) => merge_property(base_property, other_property),
            None => Property::nullable(base_property.schema.clone()),
        };
        merged.insert(name, property);
    }

    for (name, other_property) in other.iter() {
        if !merged.contains_key(name) {
            merged.insert(name, Property::nullable(other_property.schema.clone()));
        }
    }

    merged
}

fn merge_property(older: &Property, newer: &Property) -> Property {
    let mut nullable = older.nullable || newer.nullable;
    let schema = match (&older.schema, &newer.schema) {
        (SchemaFragment::Null, SchemaFragment::Null) => SchemaFragment::Null,
        (known, SchemaFragment::Null) => {
            nullable = true;
            known.clone()
        }
        (SchemaFragment::Null, observed) => {
            nullable = true;
            observed.clone()
        }
        (older, newer) => merge_fragment(older, newer),
    };
    Property { schema, nullable }
}

fn merge_fragment(older: &SchemaFragment, newer: &SchemaFragment) -> SchemaFragment {
    match (older, newer) {
        (SchemaFragment::Array { items: left }, SchemaFragment::Array { items: right }) => {
            SchemaFragment::array(merge_fragment(left, right))
        }
        (SchemaFragment::Object(left), SchemaFragment::Object(right)) => SchemaFragment::Object(merge(left, right)),
        (known, observed) if observed.is_untyped() && !known.is_untyped() => known.clone(),
        (_, observed) => observed.clone(),
    }
}

fn rename_object_references(object: ObjectSchema, renames: &BTreeMap<String, String>) -> ObjectSchema {
    object
        .iter()
        .map(|(name, property)| {
            let property = Property {
                schema: rename_references(&property.schema, renames),
                nullable: property.nullable,
            };
            (name.to_string(), property)
        })
        .collect()
}

fn rename_references(fragment: &SchemaFragment, renames: &BTreeMap<String, String>) -> SchemaFragment {
    match fragment {
        SchemaFragment::Reference { name } => {
            SchemaFragment::reference(renames.get(name).cloned().unwrap_or_else(|| name.clone()))
        }
        SchemaFragment::Array { items } => SchemaFragment::array(rename_references(items, renames)),
        SchemaFragment::Object(object) => SchemaFragment::Object(rename_object_references(object.clone(), renames)),
        other => other.clone(),
    }
}

/// Split `user12` into (`user`, 12). Names without a digit suffix, or made only
/// of digits, yield `None`.
fn split_suffix(name: &str) -> Option<(&str, usize)> {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[base.len()..];
    // Allocated suffixes start at 1 and never carry a leading zero
    if base.is_empty() || digits.is_empty() || digits.starts_with('0') {
        return None;
    }
    digits.parse().ok().map(|suffix| (base, suffix))
}
