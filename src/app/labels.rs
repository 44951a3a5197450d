use std::collections::HashMap;

/// Truncated display labels, keyed by node id and character budget.
///
/// Owned by the view model. Entries belong to one topology generation and
/// the whole cache is dropped when the generation moves on or when it
/// reaches capacity.
pub(super) struct LabelCache {
    capacity: usize,
    generation: u64,
    entries: HashMap<(String, usize), String>,
}

impl LabelCache {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            generation: 0,
            entries: HashMap::new(),
        }
    }

    pub(super) fn sync_generation(&mut self, generation: u64) {
        if self.generation != generation {
            self.generation = generation;
            self.entries.clear();
        }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn fit(&mut self, id: &str, label: &str, max_chars: usize) -> &str {
        let key = (id.to_owned(), max_chars);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        self.entries
            .entry(key)
            .or_insert_with(|| truncate_label(label, max_chars))
    }
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }
    if max_chars <= 1 {
        return "…".repeat(max_chars);
    }

    let mut truncated = label.chars().take(max_chars - 1).collect::<String>();
    truncated.push('…');
    truncated
}
