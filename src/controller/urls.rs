/// Ordered set of source URLs handed to the scraper.
///
/// Insertion order is kept and every entry is unique and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlSet {
    urls: Vec<String>,
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `url` (trimmed) unless it is blank or already present.
    ///
    /// Returns whether the set changed.
    pub fn add(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || self.contains(url) {
            return false;
        }
        self.urls.push(url.to_owned());
        true
    }

    pub fn clear(&mut self) {
        self.urls.clear();
    }

    /// Removes the entry equal to `url`. Returns whether one was found.
    pub fn remove(&mut self, url: &str) -> bool {
        match self.urls.iter().position(|u| u == url) {
            Some(idx) => {
                self.urls.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Removes the entry at `index`, returning it.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        (index < self.urls.len()).then(|| self.urls.remove(index))
    }

    /// Replaces the whole set, e.g. with the sources the service lists for a
    /// topic. Blank and repeated entries in `urls` are dropped.
    pub fn replace<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.urls.clear();
        for url in urls {
            self.add(url.as_ref());
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_add_keeps_order() {
        let mut urls = UrlSet::new();
        assert!(urls.add("http://a"));
        assert!(urls.add("http://b"));
        assert_eq!(urls.as_slice(), ["http://a", "http://b"]);
    }

    #[test]
    fn test_add_blank_is_noop() {
        let mut urls = UrlSet::new();
        urls.add("http://a");
        assert!(!urls.add(""));
        assert!(!urls.add("   \t"));
        assert_eq!(urls.as_slice(), ["http://a"]);
    }

    #[test]
    fn test_add_duplicate_is_noop() {
        let mut urls = UrlSet::new();
        urls.add("http://a");
        assert!(!urls.add("http://a"));
        assert!(!urls.add("  http://a  "));
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut urls = UrlSet::new();
        urls.replace(["http://a", "http://b", "http://c"]);
        assert!(urls.remove("http://b"));
        assert!(!urls.remove("http://b"));
        assert_eq!(urls.as_slice(), ["http://a", "http://c"]);
        assert_eq!(urls.remove_at(5), None);
        assert_eq!(urls.remove_at(0).as_deref(), Some("http://a"));
    }

    #[test]
    fn test_replace_dedups() {
        let mut urls = UrlSet::new();
        urls.add("http://old");
        urls.replace(vec!["http://x", "", "http://y", "http://x"]);
        assert_eq!(urls.as_slice(), ["http://x", "http://y"]);
    }

    proptest! {
        #[test]
        fn prop_clear_always_empties(entries in proptest::collection::vec(".{0,20}", 0..30)) {
            let mut urls = UrlSet::new();
            for entry in &entries {
                urls.add(entry);
            }
            urls.clear();
            prop_assert!(urls.is_empty());
        }

        #[test]
        fn prop_entries_unique_and_non_blank(entries in proptest::collection::vec("[ab ]{0,4}", 0..30)) {
            let mut urls = UrlSet::new();
            for entry in &entries {
                urls.add(entry);
            }
            let mut seen = std::collections::HashSet::new();
            for url in urls.iter() {
                prop_assert!(!url.trim().is_empty());
                prop_assert!(seen.insert(url.to_owned()));
            }
        }
    }
}
