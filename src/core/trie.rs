// --- File: src/core/trie.rs
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct SuffixNode {
    children: HashMap<char, usize>,
    /// Index into `SuffixTrie::payloads` when a suffix ends here.
    payload: Option<usize>,
}

impl SuffixNode {
    fn new() -> Self {
        Self { children: HashMap::new(), payload: None }
    }
}

/// A suffix trie stored as an arena of nodes. Keys are inserted reversed, so a
/// walk from the end of a word visits every registered suffix of that word,
/// shortest first.
#[derive(Clone, Debug)]
pub struct SuffixTrie<T> {
    nodes: Vec<SuffixNode>,
    payloads: Vec<(String, T)>,
}

/// A suffix found at the end of a word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuffixMatch<'a, T> {
    pub suffix: &'a str,
    pub payload: &'a T,
    /// Byte offset where the suffix starts in the searched word.
    pub split_at: usize,
}

impl<T> Default for SuffixTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SuffixTrie<T> {
    pub fn new() -> Self {
        Self { nodes: vec![SuffixNode::new()], payloads: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Registers a suffix. Re-inserting an existing suffix replaces its payload.
    /// O(k) where k is the suffix length.
    pub fn insert(&mut self, suffix: &str, payload: T) {
        let mut node_idx = 0;
        for c in suffix.chars().rev() {
            let next_idx = if let Some(&id) = self.nodes[node_idx].children.get(&c) {
                id
            } else {
                let new_node_id = self.nodes.len();
                self.nodes.push(SuffixNode::new());
                self.nodes[node_idx].children.insert(c, new_node_id);
                new_node_id
            };
            node_idx = next_idx;
        }
        match self.nodes[node_idx].payload {
            Some(existing) => self.payloads[existing] = (suffix.to_string(), payload),
            None => {
                self.nodes[node_idx].payload = Some(self.payloads.len());
                self.payloads.push((suffix.to_string(), payload));
            }
        }
    }

    /// Every registered suffix of `word`, longest first.
    /// O(k) where k is the length of the longest matching suffix.
    pub fn matches<'a>(&'a self, word: &str) -> Vec<SuffixMatch<'a, T>> {
        let mut found = Vec::new();
        let mut node_idx = 0;
        for (pos, c) in word.char_indices().rev() {
            match self.nodes[node_idx].children.get(&c) {
                Some(&next) => node_idx = next,
                None => break,
            }
            if let Some(p) = self.nodes[node_idx].payload {
                let (suffix, payload) = &self.payloads[p];
                found.push(SuffixMatch { suffix: suffix.as_str(), payload, split_at: pos });
            }
        }
        found.reverse();
        found
    }

    pub fn longest<'a>(&'a self, word: &str) -> Option<SuffixMatch<'a, T>> {
        self.matches(word).into_iter().next()
    }

    pub fn get(&self, suffix: &str) -> Option<&T> {
        let mut node_idx = 0;
        for c in suffix.chars().rev() {
            node_idx = *self.nodes[node_idx].children.get(&c)?;
        }
        self.nodes[node_idx].payload.map(|p| &self.payloads[p].1)
    }

    pub fn contains(&self, suffix: &str) -> bool {
        self.get(suffix).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_suffix_wins() {
        let mut trie = SuffixTrie::new();
        trie.insert("서", 1);
        trie.insert("에서", 2);
        trie.insert("다", 3);
        let m = trie.longest("학교에서").unwrap();
        assert_eq!(m.suffix, "에서");
        assert_eq!(*m.payload, 2);
        assert_eq!(&"학교에서"[..m.split_at], "학교");
    }

    #[test]
    fn all_matches_are_longest_first() {
        let mut trie = SuffixTrie::new();
        trie.insert("다", "decl");
        trie.insert("었다", "past");
        let found: Vec<&str> = trie.matches("먹었다").iter().map(|m| m.suffix).collect();
        assert_eq!(found, vec!["었다", "다"]);
        assert!(trie.matches("학교").is_empty());
    }

    #[test]
    fn reinsert_replaces_payload() {
        let mut trie = SuffixTrie::new();
        trie.insert("ing", 1);
        trie.insert("ing", 2);
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.get("ing"), Some(&2));
        assert!(!trie.contains("ng"));
    }
}
