use serde::{Deserialize, Deserializer};

/// Three-state field used by partial updates.
///
/// `None` = field absent (keep the stored value), `Some(None)` = explicit
/// `null` (clear to NULL), `Some(Some(v))` = overwrite with `v`. Plain
/// `Option<T>` cannot tell the first two apart once deserialized, which is
/// exactly the distinction the encounter write path needs.
pub type Patch<T> = Option<Option<T>>;

/// Deserializer for [`Patch`] fields. Must be paired with `#[serde(default)]`
/// on the field: a missing key stays `None`, while a present key (including
/// an explicit `null`) becomes `Some(..)`.
pub fn patch<'de, T, D>(deserializer: D) -> Result<Patch<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "patch")]
        notes: Patch<String>,
    }

    #[test]
    fn absent_field_is_none() {
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.notes, None);
    }

    #[test]
    fn null_field_is_explicit_clear() {
        let p: Probe = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(p.notes, Some(None));
    }

    #[test]
    fn value_field_is_overwrite() {
        let p: Probe = serde_json::from_str(r#"{"notes": "bloodied"}"#).unwrap();
        assert_eq!(p.notes, Some(Some("bloodied".to_string())));
    }
}
