//! Collection naming.
//!
//! A collection name is derived from the document type and optionally
//! prefixed with a partition key: `orders` becomes `eu-west-orders` for the
//! partition key `eu-west`.

use crate::error::{RepositoryError, RepositoryResult};

/// Separator placed between a partition key and the base collection name.
pub const PARTITION_SEPARATOR: char = '-';

/// Returns the collection name for `base` within the given partition.
///
/// A missing or empty partition key yields `base` unchanged.
///
/// # Examples
///
/// ```
/// use mongo_repository::document::naming::collection_name;
///
/// assert_eq!(collection_name("orders", None), "orders");
/// assert_eq!(collection_name("orders", Some("")), "orders");
/// assert_eq!(collection_name("orders", Some("eu")), "eu-orders");
/// ```
pub fn collection_name(base: &str, partition_key: Option<&str>) -> String {
    match partition_key {
        Some(key) if !key.is_empty() => format!("{}{}{}", key, PARTITION_SEPARATOR, base),
        _ => base.to_string(),
    }
}

/// Like [`collection_name`], but rejects names MongoDB would refuse.
pub fn resolve_collection_name(base: &str, partition_key: Option<&str>) -> RepositoryResult<String> {
    if base.is_empty() {
        return Err(RepositoryError::invalid_argument(
            "collection name must not be empty",
        ));
    }
    if let Some(key) = partition_key {
        if key.contains('$') || key.contains('\0') {
            return Err(RepositoryError::invalid_argument(format!(
                "partition key {:?} contains '$' or NUL",
                key
            )));
        }
    }

    let name = collection_name(base, partition_key);
    if name.contains('\0') {
        return Err(RepositoryError::invalid_argument(format!(
            "collection name {:?} contains NUL",
            name
        )));
    }
    if name.starts_with("system.") {
        return Err(RepositoryError::invalid_argument(format!(
            "collection name {:?} is in the reserved system namespace",
            name
        )));
    }
    Ok(name)
}

/// Default collection name for a document type.
///
/// The short type name is pluralized and its first letter lowercased:
/// `TestDocument` maps to `testDocuments`. Generic arguments are ignored.
pub fn default_collection_name<T: ?Sized>() -> String {
    let pluralized = pluralize(short_type_name::<T>());
    lower_first(&pluralized)
}

/// Returns the last path segment of `T`'s type name, without generics.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// English pluralization covering the regular cases.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_ascii_lowercase();
    if let Some(stem) = word.strip_suffix(['y', 'Y']) {
        let before_y = stem.chars().last();
        if before_y.is_some_and(|c| !"aeiouAEIOU".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

fn lower_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
