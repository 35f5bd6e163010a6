// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error;

/// A collection as the backend may return it: either a bare list or an
/// object carrying the list under a known field.
#[derive(Debug, PartialEq)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Enveloped(Vec<T>),
}

impl<T: DeserializeOwned> Listing<T> {
    pub(crate) fn from_value(value: Value, field: &str) -> Result<Self, error::Api> {
        match value {
            Value::Array(_) => serde_json::from_value(value)
                .map(Self::Bare)
                .map_err(|e| error::Api::InvalidResponse(e.to_string())),
            Value::Object(mut map) => match map.remove(field) {
                Some(inner @ Value::Array(_)) => serde_json::from_value(inner)
                    .map(Self::Enveloped)
                    .map_err(|e| error::Api::InvalidResponse(e.to_string())),
                Some(_) | None => Err(error::Api::InvalidResponse(format!(
                    r#"expected an object with a "{}" list"#,
                    field.escape_default()
                ))),
            },
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Err(
                error::Api::InvalidResponse("expected a list of items".to_owned()),
            ),
        }
    }
}

impl<T> Listing<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Enveloped(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_and_enveloped_lists_normalize_alike() {
        let bare = Listing::<String>::from_value(json!(["a", "b"]), "movies");
        let enveloped =
            Listing::<String>::from_value(json!({ "movies": ["a", "b"], "total": 2 }), "movies");

        assert_eq!(bare, Ok(Listing::Bare(vec!["a".to_owned(), "b".to_owned()])));
        assert_eq!(
            enveloped.map(Listing::into_items),
            Ok(vec!["a".to_owned(), "b".to_owned()])
        );
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        assert!(matches!(
            Listing::<String>::from_value(json!({ "items": [] }), "movies"),
            Err(error::Api::InvalidResponse(_))
        ));
        assert!(matches!(
            Listing::<String>::from_value(json!({ "movies": "none" }), "movies"),
            Err(error::Api::InvalidResponse(_))
        ));
        assert!(matches!(
            Listing::<String>::from_value(json!(null), "movies"),
            Err(error::Api::InvalidResponse(_))
        ));
    }
}
