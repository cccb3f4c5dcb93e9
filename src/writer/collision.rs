//! Deterministic resolution of output filename collisions

use ahash::AHashSet;

use super::errors::WriteError;

/// Names handed out so far in one output location.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: AHashSet<String>,
    limit: usize,
}

impl NameRegistry {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            taken: AHashSet::new(),
            limit,
        }
    }

    /// Claim `{stem}{suffix}`, or `{stem}_{i}{suffix}` with the smallest free
    /// `i` in `1..=limit`. `exists` reports names already present on disk.
    pub fn claim(
        &mut self,
        stem: &str,
        suffix: &str,
        exists: impl Fn(&str) -> bool,
    ) -> Result<String, WriteError> {
        let free = |taken: &AHashSet<String>, name: &str| !taken.contains(name) && !exists(name);

        let plain = format!("{stem}{suffix}");
        if free(&self.taken, &plain) {
            self.taken.insert(plain.clone());
            return Ok(plain);
        }
        for i in 1..=self.limit {
            let candidate = format!("{stem}_{i}{suffix}");
            if free(&self.taken, &candidate) {
                self.taken.insert(candidate.clone());
                return Ok(candidate);
            }
        }
        Err(WriteError::CollisionLimit {
            name: plain,
            limit: self.limit,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes_are_sequential() {
        let mut names = NameRegistry::new(100);
        let claim = |names: &mut NameRegistry| names.claim("a/x", ".xml", |_| false).expect("free name");
        assert_eq!(claim(&mut names), "a/x.xml");
        assert_eq!(claim(&mut names), "a/x_1.xml");
        assert_eq!(claim(&mut names), "a/x_2.xml");
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_existing_files_are_skipped() {
        let mut names = NameRegistry::new(100);
        let name = names
            .claim("x", ".xml", |n| n == "x.xml" || n == "x_1.xml")
            .expect("free name");
        assert_eq!(name, "x_2.xml");
    }

    #[test]
    fn test_limit_aborts() {
        let mut names = NameRegistry::new(2);
        for _ in 0..3 {
            names.claim("x", ".xml", |_| false).expect("within limit");
        }
        assert!(matches!(
            names.claim("x", ".xml", |_| false),
            Err(WriteError::CollisionLimit { limit: 2, .. })
        ));
    }
}
