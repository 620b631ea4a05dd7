//! In-memory access matrix.
//!
//! Holds the object set and the subject → permission-set relation, and
//! exposes the primitive mutators that keep the two consistent:
//!
//! - every object held by a subject is also present in the object set
//! - permission sets never contain duplicates
//! - a subject stays in the matrix until it is explicitly removed

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MatrixError, Result};

/// Maximum subject name length, in characters.
pub const MAX_SUBJECT_LEN: usize = 256;

/// A single case-sensitive ASCII letter naming a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Object(char);

impl Object {
    /// Create an object from a character.
    ///
    /// Only `A`–`Z` and `a`–`z` are accepted; letters outside the ASCII
    /// range are rejected.
    pub fn new(c: char) -> Result<Self> {
        if c.is_ascii_alphabetic() {
            Ok(Self(c))
        } else {
            Err(MatrixError::validation(format!(
                "invalid object '{}': an object is a single Latin letter (case-sensitive)",
                c
            )))
        }
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl FromStr for Object {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Object::new(c),
            _ => Err(MatrixError::validation(format!(
                "invalid object '{}': an object is a single Latin letter (case-sensitive)",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Object {
    type Error = MatrixError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Object> for String {
    fn from(o: Object) -> Self {
        o.0.to_string()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated subject name: non-empty, at most [`MAX_SUBJECT_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectName(String);

impl SubjectName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(MatrixError::validation("empty subject name"));
        }
        if name.chars().count() > MAX_SUBJECT_LEN {
            return Err(MatrixError::validation(format!(
                "subject name exceeds {} characters",
                MAX_SUBJECT_LEN
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SubjectName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectName {
    type Error = MatrixError;

    fn try_from(s: String) -> Result<Self> {
        SubjectName::new(s)
    }
}

impl From<SubjectName> for String {
    fn from(s: SubjectName) -> Self {
        s.0
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Objects a subject may access, in grant order.
pub type PermissionSet = IndexSet<Object>;

/// The aggregate of all subjects, objects and their permission relation.
///
/// Equality is set-based: two matrices are equal when they hold the same
/// objects and the same subject → permission pairs, whatever the order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessMatrix {
    objects: IndexSet<Object>,
    subjects: IndexMap<SubjectName, PermissionSet>,
}

impl AccessMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matrix from raw parts, repairing dangling object references.
    pub(crate) fn from_parts(
        mut objects: IndexSet<Object>,
        subjects: IndexMap<SubjectName, PermissionSet>,
    ) -> Self {
        for (name, perms) in &subjects {
            for obj in perms {
                if objects.insert(*obj) {
                    tracing::warn!(
                        subject = %name,
                        object = %obj,
                        "subject references unknown object; adding it to the object set"
                    );
                }
            }
        }
        Self { objects, subjects }
    }

    pub fn objects(&self) -> &IndexSet<Object> {
        &self.objects
    }

    /// Iterate subjects in matrix order.
    pub fn subjects(&self) -> impl Iterator<Item = (&SubjectName, &PermissionSet)> {
        self.subjects.iter()
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &SubjectName> {
        self.subjects.keys()
    }

    pub fn permissions(&self, subject: &str) -> Option<&PermissionSet> {
        self.subjects.get(subject)
    }

    pub fn contains_subject(&self, subject: &str) -> bool {
        self.subjects.contains_key(subject)
    }

    pub fn contains_object(&self, object: Object) -> bool {
        self.objects.contains(&object)
    }

    /// Whether `subject` may access `object`.
    pub fn allows(&self, subject: &str, object: Object) -> bool {
        self.permissions(subject)
            .map(|perms| perms.contains(&object))
            .unwrap_or(false)
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.subjects.is_empty()
    }

    /// Insert an object. Returns `false` if it was already present.
    pub fn add_object(&mut self, object: Object) -> bool {
        let inserted = self.objects.insert(object);
        if inserted {
            debug!(object = %object, "object added");
        }
        inserted
    }

    /// Remove an object from the object set and from every permission set.
    ///
    /// Returns `false` if the object was absent.
    pub fn remove_object(&mut self, object: Object) -> bool {
        if !self.objects.shift_remove(&object) {
            return false;
        }
        for perms in self.subjects.values_mut() {
            perms.shift_remove(&object);
        }
        debug!(object = %object, "object removed");
        true
    }

    /// Insert a subject with no rights. Returns `false` if it already existed.
    pub fn ensure_subject(&mut self, subject: SubjectName) -> bool {
        if self.subjects.contains_key(&subject) {
            return false;
        }
        debug!(subject = %subject, "subject added");
        self.subjects.insert(subject, PermissionSet::new());
        true
    }

    /// Delete a subject and its permission set.
    ///
    /// Returns the removed permission set, or `None` if the subject was absent.
    pub fn remove_subject(&mut self, subject: &str) -> Option<PermissionSet> {
        let removed = self.subjects.shift_remove(subject);
        if removed.is_some() {
            debug!(subject, "subject removed");
        }
        removed
    }

    /// Move a subject's permission set under a new name.
    ///
    /// The renamed subject moves to the end of the matrix order.
    pub fn rename_subject(&mut self, old: &str, new: SubjectName) -> Result<()> {
        if new.as_str() == old {
            return Err(MatrixError::conflict(format!(
                "subject '{}' already has that name",
                old
            )));
        }
        if self.subjects.contains_key(&new) {
            return Err(MatrixError::conflict(format!(
                "subject '{}' already exists",
                new
            )));
        }
        let perms = self
            .subjects
            .shift_remove(old)
            .ok_or_else(|| MatrixError::not_found(old))?;
        debug!(from = old, to = %new, "subject renamed");
        self.subjects.insert(new, perms);
        Ok(())
    }

    /// Rename an object everywhere it appears, keeping its position.
    pub fn rename_object(&mut self, old: Object, new: Object) -> Result<()> {
        if self.objects.contains(&new) {
            return Err(MatrixError::conflict(format!(
                "object '{}' already exists",
                new
            )));
        }
        if !self.objects.contains(&old) {
            return Err(MatrixError::validation(format!(
                "object '{}' does not exist",
                old
            )));
        }
        let substitute = |o: &Object| if *o == old { new } else { *o };
        self.objects = self.objects.iter().map(substitute).collect();
        for perms in self.subjects.values_mut() {
            if perms.contains(&old) {
                *perms = perms.iter().map(substitute).collect();
            }
        }
        debug!(from = %old, to = %new, "object renamed");
        Ok(())
    }

    pub(crate) fn permissions_mut(&mut self, subject: &str) -> Option<&mut PermissionSet> {
        self.subjects.get_mut(subject)
    }

    pub(crate) fn insert_subject(&mut self, subject: SubjectName, perms: PermissionSet) {
        self.subjects.insert(subject, perms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(c: char) -> Object {
        Object::new(c).unwrap()
    }

    fn subject(name: &str) -> SubjectName {
        SubjectName::new(name).unwrap()
    }

    #[test]
    fn object_accepts_only_ascii_letters() {
        assert!(Object::new('A').is_ok());
        assert!(Object::new('z').is_ok());
        assert!(Object::new('1').is_err());
        assert!(Object::new('é').is_err());
        assert!(Object::new('Ж').is_err());
        assert!("AB".parse::<Object>().is_err());
        assert!("".parse::<Object>().is_err());
    }

    #[test]
    fn subject_name_bounds() {
        assert!(SubjectName::new("").is_err());
        assert!(SubjectName::new("a".repeat(MAX_SUBJECT_LEN)).is_ok());
        assert!(SubjectName::new("a".repeat(MAX_SUBJECT_LEN + 1)).is_err());
        // Length counts characters, not bytes
        assert!(SubjectName::new("ж".repeat(MAX_SUBJECT_LEN)).is_ok());
    }

    #[test]
    fn add_object_is_idempotent() {
        let mut m = AccessMatrix::new();
        assert!(m.add_object(obj('A')));
        let once = m.clone();
        assert!(!m.add_object(obj('A')));
        assert_eq!(m, once);
        assert_eq!(m.object_count(), 1);
    }

    #[test]
    fn remove_object_cascades_to_subjects() {
        let mut m = AccessMatrix::new();
        m.add_object(obj('A'));
        m.add_object(obj('B'));
        m.ensure_subject(subject("alice"));
        m.permissions_mut("alice").unwrap().extend([obj('A'), obj('B')]);

        assert!(m.remove_object(obj('B')));
        assert!(!m.contains_object(obj('B')));
        assert!(!m.allows("alice", obj('B')));
        assert!(m.allows("alice", obj('A')));
        assert!(!m.remove_object(obj('B')));
    }

    #[test]
    fn ensure_subject_keeps_existing_rights() {
        let mut m = AccessMatrix::new();
        m.add_object(obj('A'));
        assert!(m.ensure_subject(subject("alice")));
        m.permissions_mut("alice").unwrap().insert(obj('A'));
        assert!(!m.ensure_subject(subject("alice")));
        assert!(m.allows("alice", obj('A')));
    }

    #[test]
    fn remove_subject_deletes_rights() {
        let mut m = AccessMatrix::new();
        m.ensure_subject(subject("alice"));
        assert!(m.remove_subject("alice").is_some());
        assert!(!m.contains_subject("alice"));
        assert!(m.remove_subject("alice").is_none());
    }

    #[test]
    fn rename_subject_moves_rights() {
        let mut m = AccessMatrix::new();
        m.add_object(obj('A'));
        m.ensure_subject(subject("alice"));
        m.permissions_mut("alice").unwrap().insert(obj('A'));

        m.rename_subject("alice", subject("alicia")).unwrap();
        assert!(!m.contains_subject("alice"));
        assert!(m.allows("alicia", obj('A')));
    }

    #[test]
    fn rename_subject_conflicts() {
        let mut m = AccessMatrix::new();
        m.ensure_subject(subject("alice"));
        m.ensure_subject(subject("bob"));

        let err = m.rename_subject("alice", subject("bob")).unwrap_err();
        assert!(matches!(err, MatrixError::Conflict(_)));
        let err = m.rename_subject("alice", subject("alice")).unwrap_err();
        assert!(matches!(err, MatrixError::Conflict(_)));
        let err = m.rename_subject("carol", subject("dave")).unwrap_err();
        assert!(matches!(err, MatrixError::NotFound { .. }));
        assert!(m.contains_subject("alice"));
        assert!(m.contains_subject("bob"));
    }

    #[test]
    fn rename_object_substitutes_everywhere() {
        let mut m = AccessMatrix::new();
        m.add_object(obj('A'));
        m.add_object(obj('B'));
        m.ensure_subject(subject("alice"));
        m.ensure_subject(subject("bob"));
        m.permissions_mut("alice").unwrap().insert(obj('A'));
        m.permissions_mut("bob").unwrap().insert(obj('B'));

        m.rename_object(obj('A'), obj('x')).unwrap();
        let objects: Vec<char> = m.objects().iter().map(|o| o.as_char()).collect();
        assert_eq!(objects, vec!['x', 'B']);
        assert!(m.allows("alice", obj('x')));
        assert!(!m.allows("alice", obj('A')));
        assert!(m.allows("bob", obj('B')));

        let err = m.rename_object(obj('x'), obj('B')).unwrap_err();
        assert!(matches!(err, MatrixError::Conflict(_)));
    }

    #[test]
    fn from_parts_repairs_dangling_objects() {
        let mut subjects = IndexMap::new();
        subjects.insert(subject("alice"), PermissionSet::from([obj('Q')]));
        let m = AccessMatrix::from_parts(IndexSet::new(), subjects);
        assert!(m.contains_object(obj('Q')));
    }
}
