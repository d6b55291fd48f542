//! Physical field naming
//!
//! `physical = attribute name + suffix(format)`. Every suffix starts with
//! `_` and no suffix is a trailing substring of another, so stripping the
//! one suffix a field name ends with recovers (name, format) exactly.
//!
//! This table is the persisted layout of every written document. Changing
//! a suffix orphans every field previously written under it.

use crate::record::AttributeFormat;

/// Reserved field carrying the metacard type name.
pub const TYPE_NAME_FIELD: &str = "metacard_type_name_txt";

/// Reserved field carrying the JSON metacard type definition.
pub const TYPE_OBJECT_FIELD: &str = "metacard_type_obj";

/// Unique-key field of every document (the `id` attribute as STRING).
pub const ID_FIELD: &str = "id_txt";

/// Backend score pseudo-field.
pub const SCORE_FIELD: &str = "score";

/// Backend optimistic-concurrency bookkeeping.
pub const VERSION_FIELD: &str = "_version_";

const PRIVATE_FIELDS: [&str; 4] = [TYPE_NAME_FIELD, TYPE_OBJECT_FIELD, SCORE_FIELD, VERSION_FIELD];

pub fn suffix_of(format: AttributeFormat) -> &'static str {
    match format {
        AttributeFormat::String => "_txt",
        AttributeFormat::Xml => "_xml",
        AttributeFormat::Date => "_tdt",
        AttributeFormat::Boolean => "_b",
        AttributeFormat::Binary => "_bin",
        AttributeFormat::Geometry => "_geo",
        AttributeFormat::Object => "_obj",
        AttributeFormat::Integer => "_int",
        AttributeFormat::Long => "_lng",
        AttributeFormat::Short => "_shr",
        AttributeFormat::Float => "_flt",
        AttributeFormat::Double => "_dbl",
    }
}

pub fn format_of_suffix(suffix: &str) -> Option<AttributeFormat> {
    AttributeFormat::ALL
        .iter()
        .copied()
        .find(|format| suffix_of(*format) == suffix)
}

pub fn physical_name(attribute: &str, format: AttributeFormat) -> String {
    format!("{}{}", attribute, suffix_of(format))
}

/// Splits a physical field into (attribute name, format).
///
/// Returns `None` when no suffix matches or the attribute part is empty.
/// Does not consult the private-field list.
pub fn split_physical(field: &str) -> Option<(&str, AttributeFormat)> {
    AttributeFormat::ALL.iter().find_map(|format| {
        field
            .strip_suffix(suffix_of(*format))
            .filter(|name| !name.is_empty())
            .map(|name| (name, *format))
    })
}

pub fn is_private_field(field: &str) -> bool {
    PRIVATE_FIELDS.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_suffixes_are_unique_and_invertible() {
        let mut seen = HashSet::new();
        for format in AttributeFormat::ALL {
            let suffix = suffix_of(format);
            assert!(seen.insert(suffix), "duplicate suffix {}", suffix);
            assert!(suffix.starts_with('_'));
            assert_eq!(format_of_suffix(suffix), Some(format));
        }
    }

    #[test]
    fn test_no_suffix_ends_another() {
        for a in AttributeFormat::ALL {
            for b in AttributeFormat::ALL {
                if a != b {
                    assert!(!suffix_of(a).ends_with(suffix_of(b)), "{} ends with {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_split_recovers_name_containing_suffix_text() {
        assert_eq!(split_physical("title_txt"), Some(("title", AttributeFormat::String)));
        assert_eq!(split_physical("note_txt_txt"), Some(("note_txt", AttributeFormat::String)));
        assert_eq!(split_physical("flag_b"), Some(("flag", AttributeFormat::Boolean)));
        assert_eq!(split_physical("blob_bin"), Some(("blob", AttributeFormat::Binary)));
        assert_eq!(split_physical("_txt"), None);
        assert_eq!(split_physical("plain"), None);
    }

    #[test]
    fn test_id_field_follows_the_naming_rule() {
        assert_eq!(ID_FIELD, physical_name(crate::record::names::ID, AttributeFormat::String));
    }

    #[test]
    fn test_reserved_fields_are_private() {
        assert!(is_private_field(TYPE_NAME_FIELD));
        assert!(is_private_field(TYPE_OBJECT_FIELD));
        assert!(is_private_field("score"));
        assert!(!is_private_field(ID_FIELD));
    }
}
