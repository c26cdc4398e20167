//! Naming of uploaded traveler photos.
//!
//! Uploads are stored as `<person-key>-<unix-millis>.<ext>`; a bucket listing
//! can be mapped back to person keys from the object names alone.

pub const PLACEHOLDER_OBJECT: &str = ".emptyFolderPlaceholder";

pub fn photo_object_name(person_key: &str, timestamp_ms: i64, extension: &str) -> String {
    let extension = extension.trim_start_matches('.').to_lowercase();
    format!("{person_key}-{timestamp_ms}.{extension}")
}

/// Person key encoded in an object name: the stem minus its last
/// `-<suffix>`. Returns `None` for the bucket placeholder or an empty stem.
pub fn person_key_from_photo_name(object_name: &str) -> Option<String> {
    if object_name == PLACEHOLDER_OBJECT {
        return None;
    }

    let stem = match object_name.rfind('.') {
        Some(dot) => &object_name[..dot],
        None => object_name,
    };

    let key = match stem.rfind('-') {
        Some(hyphen) => &stem[..hyphen],
        None => stem,
    };

    (!key.is_empty()).then(|| key.to_string())
}
