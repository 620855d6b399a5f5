use std::sync::Arc;

/// Name-keyed collection that remembers first insertion order.
/// Re-registering a name replaces the entry in place.
pub struct Registry<T: ?Sized> {
    entries: Vec<(String, Arc<T>)>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    /// Returns the displaced entry, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: Arc<T>) -> Option<Arc<T>> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn first(&self) -> Option<(&str, &Arc<T>)> {
        self.entries.first().map(|(n, v)| (n.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<T>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_original_position() {
        let mut reg: Registry<str> = Registry::default();
        assert!(reg.insert("a", Arc::from("one")).is_none());
        reg.insert("b", Arc::from("two"));
        let displaced = reg.insert("a", Arc::from("three"));

        assert_eq!(displaced.as_deref(), Some("one"));
        assert_eq!(reg.iter().count(), 2);
        assert_eq!(reg.names(), vec!["a".to_string(), "b".to_string()]);
        let (first_name, first) = reg.first().unwrap();
        assert_eq!(first_name, "a");
        assert_eq!(&**first, "three");
    }

    #[test]
    fn lookups_on_empty_registry() {
        let reg: Registry<str> = Registry::default();
        assert!(reg.names().is_empty());
        assert!(reg.first().is_none());
        assert!(reg.get("x").is_none());
    }
}
