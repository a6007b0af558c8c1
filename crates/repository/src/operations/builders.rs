//! Pure builders for the filter, update, sort and pipeline documents the
//! operation handlers pass to the driver.

use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use serde::Serialize;

use crate::document::{DocumentKey, ID_FIELD};
use crate::error::{RepositoryError, RepositoryResult};
use crate::options::SortDirection;

/// Name of the accumulator field produced by [`sum_pipeline`].
pub const SUM_FIELD: &str = "total";

/// `{_id: id}`
pub fn id_filter<K: DocumentKey>(id: &K) -> BsonDocument {
    doc! { ID_FIELD: id.to_bson() }
}

/// `{_id: {$in: [ids...]}}`
pub fn ids_filter<'a, K, I>(ids: I) -> BsonDocument
where
    K: DocumentKey,
    I: IntoIterator<Item = &'a K>,
{
    let ids: Vec<Bson> = ids.into_iter().map(DocumentKey::to_bson).collect();
    doc! { ID_FIELD: { "$in": ids } }
}

/// `{$set: {field: value}}`
pub fn set_field<V: Serialize + ?Sized>(field: &str, value: &V) -> RepositoryResult<BsonDocument> {
    check_field(field)?;
    let value = bson::to_bson(value)?;
    Ok(doc! { "$set": { field: value } })
}

/// `{field: 1}` or `{field: -1}`
pub fn sort_by(field: &str, direction: SortDirection) -> BsonDocument {
    doc! { field: direction.as_i32() }
}

/// Projection returning only `field` (and `_id`, which MongoDB includes
/// unless told otherwise).
pub fn field_projection(field: &str) -> BsonDocument {
    if field == ID_FIELD {
        doc! { ID_FIELD: 1 }
    } else {
        doc! { field: 1, ID_FIELD: 0 }
    }
}

/// `"$field"`, the aggregation expression referring to a field path.
pub fn field_path(field: &str) -> String {
    format!("${}", field)
}

/// `[{$match: filter}, {$group: {_id: null, total: {$sum: "$field"}}}]`
pub fn sum_pipeline(filter: BsonDocument, field: &str) -> Vec<BsonDocument> {
    vec![
        doc! { "$match": filter },
        doc! {
            "$group": {
                ID_FIELD: Bson::Null,
                SUM_FIELD: { "$sum": field_path(field) },
            }
        },
    ]
}

/// `[{$match: filter}, {$group: {_id: "$key", ...accumulators}}]`
///
/// `accumulators` maps output field names to accumulator expressions, e.g.
/// `{count: {$sum: 1}, latest: {$max: "$createdAt"}}`. An `_id` entry in
/// `accumulators` is rejected because it would replace the group key.
pub fn group_pipeline(
    filter: BsonDocument,
    group_key: &str,
    accumulators: BsonDocument,
) -> RepositoryResult<Vec<BsonDocument>> {
    check_field(group_key)?;
    if accumulators.contains_key(ID_FIELD) {
        return Err(RepositoryError::invalid_argument(
            "group accumulators must not redefine _id",
        ));
    }

    let mut group = doc! { ID_FIELD: field_path(group_key) };
    group.extend(accumulators);

    Ok(vec![doc! { "$match": filter }, doc! { "$group": group }])
}

/// Follows a dotted `path` through nested documents.
pub fn lookup_path<'a>(document: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

/// Reads the numeric total produced by [`sum_pipeline`] as an integer.
pub fn sum_as_i64(result: Option<&BsonDocument>) -> RepositoryResult<i64> {
    match result.and_then(|d| d.get(SUM_FIELD)) {
        None | Some(Bson::Null) => Ok(0),
        Some(Bson::Int32(v)) => Ok(i64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v),
        Some(other) => Err(RepositoryError::Deserialization {
            message: format!("expected an integer sum, found {}", other),
        }),
    }
}

/// Reads the numeric total produced by [`sum_pipeline`] as a float.
pub fn sum_as_f64(result: Option<&BsonDocument>) -> RepositoryResult<f64> {
    match result.and_then(|d| d.get(SUM_FIELD)) {
        None | Some(Bson::Null) => Ok(0.0),
        Some(Bson::Int32(v)) => Ok(f64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v as f64),
        Some(Bson::Double(v)) => Ok(*v),
        Some(other) => Err(RepositoryError::Deserialization {
            message: format!("expected a numeric sum, found {}", other),
        }),
    }
}

fn check_field(field: &str) -> RepositoryResult<()> {
    if field.is_empty() {
        return Err(RepositoryError::invalid_argument("field name must not be empty"));
    }
    if field.starts_with('$') {
        return Err(RepositoryError::invalid_argument(format!(
            "field name {:?} must not start with '$'",
            field
        )));
    }
    Ok(())
}
