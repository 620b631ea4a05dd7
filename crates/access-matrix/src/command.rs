//! Validated, list-oriented matrix operations.
//!
//! Every operation checks all of its inputs before touching the matrix, so a
//! failing call never leaves a partially applied batch behind. None of them
//! persist anything; saving is a separate step owned by the caller.

use tracing::debug;

use crate::error::{MatrixError, Result};
use crate::matrix::{AccessMatrix, Object, PermissionSet, SubjectName};

/// Result of [`AccessMatrix::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new subject was inserted
    Created,
    /// The subject already existed; the objects were granted to it
    Existing,
}

impl CreateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreateOutcome::Created => "created",
            CreateOutcome::Existing => "existing",
        }
    }
}

/// Split free text into subject names on whitespace and commas.
pub fn parse_subjects(text: &str) -> Vec<String> {
    text.replace(',', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Treat every non-whitespace character of `text` as one object token.
///
/// Fails on the first token that is not a single ASCII letter.
pub fn parse_objects(text: &str) -> Result<Vec<Object>> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(Object::new)
        .collect()
}

impl AccessMatrix {
    /// Create `subject` holding `objects`.
    ///
    /// If the subject already exists this behaves like [`grant`](Self::grant)
    /// and reports [`CreateOutcome::Existing`].
    pub fn create(&mut self, subject: &str, objects: &[Object]) -> Result<CreateOutcome> {
        let name = SubjectName::new(subject)?;
        if self.contains_subject(subject) {
            self.grant(&[subject], objects)?;
            return Ok(CreateOutcome::Existing);
        }
        for obj in objects {
            self.add_object(*obj);
        }
        let perms: PermissionSet = objects.iter().copied().collect();
        debug!(subject, objects = perms.len(), "subject created");
        self.insert_subject(name, perms);
        Ok(CreateOutcome::Created)
    }

    /// Grant every object to every subject, adding unknown objects to the
    /// object set.
    pub fn grant<S: AsRef<str>>(&mut self, subjects: &[S], objects: &[Object]) -> Result<()> {
        self.require_subjects(subjects)?;
        for obj in objects {
            self.add_object(*obj);
        }
        for s in subjects {
            if let Some(perms) = self.permissions_mut(s.as_ref()) {
                perms.extend(objects.iter().copied());
            }
        }
        debug!(subjects = subjects.len(), objects = objects.len(), "grant applied");
        Ok(())
    }

    /// Withdraw every object from every subject.
    pub fn remove<S: AsRef<str>>(&mut self, subjects: &[S], objects: &[Object]) -> Result<()> {
        self.require_subjects(subjects)?;
        for s in subjects {
            if let Some(perms) = self.permissions_mut(s.as_ref()) {
                for obj in objects {
                    perms.shift_remove(obj);
                }
            }
        }
        debug!(subjects = subjects.len(), objects = objects.len(), "remove applied");
        Ok(())
    }

    /// Give every subject the full current object set.
    pub fn grant_all<S: AsRef<str>>(&mut self, subjects: &[S]) -> Result<()> {
        self.require_subjects(subjects)?;
        let all = self.objects().clone();
        for s in subjects {
            if let Some(perms) = self.permissions_mut(s.as_ref()) {
                *perms = all.clone();
            }
        }
        debug!(subjects = subjects.len(), "grant_all applied");
        Ok(())
    }

    /// Clear every subject's permission set.
    pub fn remove_all<S: AsRef<str>>(&mut self, subjects: &[S]) -> Result<()> {
        self.require_subjects(subjects)?;
        for s in subjects {
            if let Some(perms) = self.permissions_mut(s.as_ref()) {
                perms.clear();
            }
        }
        debug!(subjects = subjects.len(), "remove_all applied");
        Ok(())
    }

    fn require_subjects<S: AsRef<str>>(&self, subjects: &[S]) -> Result<()> {
        if subjects.is_empty() {
            return Err(MatrixError::validation("no subjects given"));
        }
        for s in subjects {
            SubjectName::new(s.as_ref())?;
        }
        match subjects.iter().find(|s| !self.contains_subject(s.as_ref())) {
            Some(missing) => Err(MatrixError::not_found(missing.as_ref())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::matrix::MAX_SUBJECT_LEN;

    fn objs(text: &str) -> Vec<Object> {
        parse_objects(text).unwrap()
    }

    fn seeded() -> AccessMatrix {
        let mut m = AccessMatrix::new();
        m.create("alice", &objs("AB")).unwrap();
        m.create("bob", &[]).unwrap();
        m
    }

    fn rights(m: &AccessMatrix, subject: &str) -> String {
        let mut chars: Vec<char> = m
            .permissions(subject)
            .unwrap()
            .iter()
            .map(|o| o.as_char())
            .collect();
        chars.sort_unstable();
        chars.into_iter().collect()
    }

    #[test]
    fn parse_subjects_splits_on_commas_and_whitespace() {
        assert_eq!(
            parse_subjects(" alice, bob\tcarol ,,dave "),
            vec!["alice", "bob", "carol", "dave"]
        );
        assert!(parse_subjects("  , ").is_empty());
    }

    #[test]
    fn parse_objects_rejects_non_letters() {
        assert_eq!(objs("A b"), vec![Object::new('A').unwrap(), Object::new('b').unwrap()]);
        let err = parse_objects("A1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("'1'"));
        assert!(parse_objects("Aé").is_err());
    }

    #[test]
    fn create_new_and_existing() {
        let mut m = AccessMatrix::new();
        assert_eq!(m.create("alice", &objs("AB")).unwrap(), CreateOutcome::Created);
        assert_eq!(m.create("alice", &objs("C")).unwrap(), CreateOutcome::Existing);
        assert_eq!(rights(&m, "alice"), "ABC");
        assert_eq!(m.object_count(), 3);
    }

    #[test]
    fn create_rejects_bad_names() {
        let mut m = AccessMatrix::new();
        assert_eq!(m.create("", &[]).unwrap_err().kind(), ErrorKind::Validation);
        let long = "x".repeat(257);
        assert_eq!(m.create(&long, &[]).unwrap_err().kind(), ErrorKind::Validation);
        assert!(m.is_empty());
    }

    #[test]
    fn create_deduplicates_objects() {
        let mut m = AccessMatrix::new();
        m.create("alice", &objs("AAB")).unwrap();
        assert_eq!(m.permissions("alice").unwrap().len(), 2);
    }

    #[test]
    fn grant_is_all_or_nothing() {
        let mut m = seeded();
        let before = m.clone();
        let err = m.grant(&["alice", "ghost", "bob"], &objs("Z")).unwrap_err();
        match err {
            MatrixError::NotFound { subject } => assert_eq!(subject, "ghost"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(m, before);
        assert!(!m.contains_object(Object::new('Z').unwrap()));
    }

    #[test]
    fn batch_operations_are_all_or_nothing() {
        let mut m = seeded();
        let before = m.clone();
        let batch = ["alice", "ghost", "bob"];

        let err = m.remove(&batch, &objs("A")).unwrap_err();
        assert!(matches!(err, MatrixError::NotFound { ref subject } if subject == "ghost"));
        assert_eq!(m, before);

        let err = m.grant_all(&batch).unwrap_err();
        assert!(matches!(err, MatrixError::NotFound { ref subject } if subject == "ghost"));
        assert_eq!(m, before);

        let err = m.remove_all(&batch).unwrap_err();
        assert!(matches!(err, MatrixError::NotFound { ref subject } if subject == "ghost"));
        assert_eq!(m, before);
    }

    #[test]
    fn batch_operations_validate_names_before_lookup() {
        let mut m = seeded();
        let before = m.clone();
        let long = "x".repeat(MAX_SUBJECT_LEN + 1);

        let err = m.grant(&[long.as_str()], &objs("A")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = m.remove(&["alice", ""], &objs("A")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = m.grant_all(&[long.as_str()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = m.remove_all(&[""]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(m, before);
    }

    #[test]
    fn grant_requires_subjects() {
        let mut m = seeded();
        let empty: [&str; 0] = [];
        assert_eq!(m.grant(&empty, &objs("A")).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(m.remove(&empty, &objs("A")).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(m.grant_all(&empty).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(m.remove_all(&empty).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn grant_adds_new_objects_and_is_idempotent() {
        let mut m = seeded();
        m.grant(&["alice", "bob"], &objs("c")).unwrap();
        let once = m.clone();
        m.grant(&["alice", "bob"], &objs("c")).unwrap();
        assert_eq!(m, once);
        assert_eq!(rights(&m, "alice"), "ABc");
        assert_eq!(rights(&m, "bob"), "c");
        assert!(m.contains_object(Object::new('c').unwrap()));
        assert!(!m.contains_object(Object::new('C').unwrap()));
    }

    #[test]
    fn remove_ignores_absent_objects() {
        let mut m = seeded();
        m.remove(&["alice"], &objs("Bz")).unwrap();
        assert_eq!(rights(&m, "alice"), "A");
        // Global object set is untouched by remove
        assert!(m.contains_object(Object::new('B').unwrap()));
    }

    #[test]
    fn grant_all_then_remove_all() {
        let mut m = seeded();
        m.grant(&["bob"], &objs("Q")).unwrap();
        m.grant_all(&["bob"]).unwrap();
        assert_eq!(rights(&m, "bob"), "ABQ");
        m.remove_all(&["bob", "alice"]).unwrap();
        assert!(m.permissions("bob").unwrap().is_empty());
        assert!(m.permissions("alice").unwrap().is_empty());
        // Subjects survive losing all rights
        assert!(m.contains_subject("alice"));
    }
}
