use crate::detection::domain::embedding::Embedding;

/// A known individual: label derived from the reference file name and the
/// embedding of the face in that file.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceEntry {
    pub label: String,
    pub embedding: Embedding,
}

/// Reference faces loaded at startup, held as two parallel sequences in
/// load order. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct ReferenceStore {
    embeddings: Vec<Embedding>,
    labels: Vec<String>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ReferenceEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.push(entry);
        }
        store
    }

    pub(crate) fn push(&mut self, entry: ReferenceEntry) {
        self.embeddings.push(entry.embedding);
        self.labels.push(entry.label);
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, v: Vec<f32>) -> ReferenceEntry {
        ReferenceEntry {
            label: label.to_string(),
            embedding: Embedding::normalized(v),
        }
    }

    #[test]
    fn test_parallel_sequences_keep_order() {
        let store = ReferenceStore::from_entries(vec![
            entry("carol", vec![1.0, 0.0]),
            entry("alice", vec![0.0, 1.0]),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.labels(), &["carol".to_string(), "alice".to_string()]);
        assert_eq!(store.embeddings()[1].as_slice(), &[0.0, 1.0]);
        assert_eq!(store.label(0), Some("carol"));
        assert_eq!(store.label(2), None);
    }

    #[test]
    fn test_duplicate_labels_are_kept() {
        let store = ReferenceStore::from_entries(vec![
            entry("alice", vec![1.0, 0.0]),
            entry("alice", vec![0.0, 1.0]),
        ]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_empty_store() {
        let store = ReferenceStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }
}
