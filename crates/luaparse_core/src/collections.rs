//! Collection aliases used throughout the front end.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// An insertion-ordered map hashed with `FxHasher`.
///
/// Scope frames and the globals list both need first-occurrence order
/// together with O(1) name lookup.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_map_keeps_insertion_order() {
        let mut map: FxIndexMap<&str, u32> = FxIndexMap::default();
        map.insert("b", 1);
        map.insert("a", 2);
        map.insert("b", 3);
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map["b"], 3);
    }
}
