// src/process/raw_table.rs

use tracing::debug;

/// Properties scraped from one snapshot, before any typing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPropertyTable {
    /// Incident name, from the page heading.
    pub label: String,
    /// (normalized key, value) pairs in document order; keys are unique.
    pub properties: Vec<(String, String)>,
}

impl RawPropertyTable {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            properties: Vec::new(),
        }
    }

    /// Insert a property. A repeated key keeps its first position and takes the later value.
    pub fn insert(&mut self, key: String, value: String) {
        if let Some(slot) = self.properties.iter_mut().find(|(k, _)| *k == key) {
            debug!(key = %key, old = %slot.1, new = %value, "duplicate property, keeping later value");
            slot.1 = value;
        } else {
            self.properties.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_duplicate_wins_in_place() {
        let mut t = RawPropertyTable::new("Oak Fire");
        t.insert("size".into(), "10 Acres".into());
        t.insert("cause".into(), "Unknown".into());
        t.insert("size".into(), "12 Acres".into());
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("size"), Some("12 Acres"));
        assert_eq!(t.properties[0].0, "size");
    }
}
