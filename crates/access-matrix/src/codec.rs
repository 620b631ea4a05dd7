//! JSON (de)serialization of the access matrix.
//!
//! Document shape:
//!
//! ```json
//! { "objects": ["A", "B"], "subjects": { "alice": ["A"] } }
//! ```
//!
//! Missing fields default to empty. On decode, `objects` and every
//! permission list are deduplicated keeping first-seen order.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matrix::{AccessMatrix, Object, PermissionSet, SubjectName};

/// Wire form of an [`AccessMatrix`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixDocument {
    #[serde(default)]
    pub objects: Vec<Object>,

    #[serde(default)]
    pub subjects: IndexMap<SubjectName, Vec<Object>>,
}

impl MatrixDocument {
    /// Convert to a matrix, dropping duplicates.
    pub fn into_matrix(self) -> AccessMatrix {
        let objects: IndexSet<Object> = self.objects.into_iter().collect();
        let subjects: IndexMap<SubjectName, PermissionSet> = self
            .subjects
            .into_iter()
            .map(|(name, perms)| (name, perms.into_iter().collect()))
            .collect();
        AccessMatrix::from_parts(objects, subjects)
    }
}

impl From<&AccessMatrix> for MatrixDocument {
    fn from(matrix: &AccessMatrix) -> Self {
        Self {
            objects: matrix.objects().iter().copied().collect(),
            subjects: matrix
                .subjects()
                .map(|(name, perms)| (name.clone(), perms.iter().copied().collect()))
                .collect(),
        }
    }
}

/// Parse a JSON document into a matrix.
pub fn decode(input: &str) -> Result<AccessMatrix> {
    let doc: MatrixDocument = serde_json::from_str(input)?;
    Ok(doc.into_matrix())
}

/// Render a matrix as indented JSON with a trailing newline.
pub fn encode(matrix: &AccessMatrix) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&MatrixDocument::from(matrix))?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn missing_fields_default_to_empty() {
        assert!(decode("{}").unwrap().is_empty());
        let m = decode(r#"{"objects": ["A"]}"#).unwrap();
        assert_eq!(m.object_count(), 1);
        assert_eq!(m.subject_count(), 0);
        let m = decode(r#"{"subjects": {"alice": []}}"#).unwrap();
        assert!(m.contains_subject("alice"));
    }

    #[test]
    fn deduplicates_keeping_first_seen_order() {
        let m = decode(r#"{"objects": ["B", "A", "B"], "subjects": {"alice": ["A", "A", "B"]}}"#)
            .unwrap();
        let objects: String = m.objects().iter().map(|o| o.as_char()).collect();
        assert_eq!(objects, "BA");
        let perms: String = m
            .permissions("alice")
            .unwrap()
            .iter()
            .map(|o| o.as_char())
            .collect();
        assert_eq!(perms, "AB");
    }

    #[test]
    fn ignores_unknown_fields() {
        let m = decode(r#"{"objects": ["A"], "version": 3}"#).unwrap();
        assert_eq!(m.object_count(), 1);
    }

    #[test]
    fn rejects_invalid_tokens() {
        let err = decode(r#"{"objects": ["AB"]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(decode(r#"{"subjects": {"": []}}"#).is_err());
        assert!(decode(r#"{"objects": ["1"]}"#).is_err());
        assert!(decode("not json").is_err());
    }

    #[test]
    fn encode_is_indented_and_ordered() {
        let m = decode(r#"{"subjects": {"bob": ["b"], "alice": ["A"]}, "objects": ["A", "b"]}"#)
            .unwrap();
        let text = encode(&m).unwrap();
        let expected = "{\n  \"objects\": [\n    \"A\",\n    \"b\"\n  ],\n  \"subjects\": {\n    \"bob\": [\n      \"b\"\n    ],\n    \"alice\": [\n      \"A\"\n    ]\n  }\n}\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn non_ascii_subject_names_are_written_verbatim() {
        let m = decode(r#"{"subjects": {"пользователь": []}}"#).unwrap();
        assert!(encode(&m).unwrap().contains("пользователь"));
    }
}
