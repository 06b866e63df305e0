//! Array item unification
//!
//! Folds the fragments inferred for every element of an array into the single
//! item schema the array is documented with.

use super::fragment::SchemaFragment;

/// Fold element fragments left to right into one item schema.
///
/// Object elements are shallow-merged: later elements win on a shared property
/// and new properties are appended. For any other element kind the last seen
/// fragment wins, except that untyped elements (`null`, `{}`) never replace a
/// typed accumulator.
pub fn unify<I>(fragments: I) -> SchemaFragment
where
    I: IntoIterator<Item = SchemaFragment>,
{
    fragments
        .into_iter()
        .fold(SchemaFragment::Empty, |accumulator, element| match (accumulator, element) {
            (SchemaFragment::Object(mut merged), SchemaFragment::Object(object)) => {
                for (name, property) in object.iter() {
                    merged.insert(name, property.clone());
                }
                SchemaFragment::Object(merged)
            }
            (accumulator, element) if element.is_untyped() && !accumulator.is_untyped() => accumulator,
            (_, element) => element,
        })
}
