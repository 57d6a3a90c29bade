//! Grow-only Map - keys map to lattice values, keys are never removed
//!
//! Accessing an absent key materializes the neutral value; join is per-key.
//! Serialized as an entry list because keys may be composite (the bounded
//! counter keys its transfer map by replica pairs).

use crate::lattice::Lattice;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A grow-only map of joinable values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GMap<N: Ord + Clone, V: Lattice + Default> {
    entries: BTreeMap<N, V>,
}

impl<N: Ord + Clone, V: Lattice + Default> GMap<N, V> {
    /// Create a new empty map.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Mutable access to the value under `key`, inserting the neutral
    /// value if absent.
    pub fn entry(&mut self, key: N) -> &mut V {
        self.entries.entry(key).or_default()
    }

    /// The value under `key`, if it was ever touched.
    pub fn get(&self, key: &N) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&N, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Ord + Clone, V: Lattice + Default> Default for GMap<N, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Ord + Clone, V: Lattice + Default> Lattice for GMap<N, V> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join_assign(&mut self, other: &Self) {
        for (k, v) in &other.entries {
            match self.entries.get_mut(k) {
                Some(mine) => mine.join_assign(v),
                None => {
                    self.entries.insert(k.clone(), v.clone());
                }
            }
        }
    }
}

impl<N: Ord + Clone + Serialize, V: Lattice + Default + Serialize> Serialize for GMap<N, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<(&N, &V)> = self.entries.iter().collect();
        entries.serialize(serializer)
    }
}

impl<'de, N, V> Deserialize<'de> for GMap<N, V>
where
    N: Ord + Clone + Deserialize<'de>,
    V: Lattice + Default + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Vec<(N, V)> = Vec::deserialize(deserializer)?;
        Ok(Self {
            entries: entries.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::join;

    #[test]
    fn entry_materializes_neutral() {
        let mut m: GMap<char, u64> = GMap::new();
        assert_eq!(*m.entry('a'), 0);
        *m.entry('a') += 3;
        assert_eq!(m.get(&'a'), Some(&3));
    }

    #[test]
    fn join_is_per_key() {
        let mut x: GMap<char, u64> = GMap::new();
        *x.entry('a') = 1;
        *x.entry('b') = 0;
        let mut y = GMap::new();
        *y.entry('a') = 3;
        *y.entry('c') = 0;

        x.join_assign(&y);
        assert_eq!(x.get(&'a'), Some(&3));
        assert_eq!(x.get(&'b'), Some(&0));
        assert_eq!(x.get(&'c'), Some(&0));

        // Joining again changes nothing.
        let before = x.clone();
        x.join_assign(&y);
        assert_eq!(x, before);
    }

    #[test]
    fn join_laws_with_composite_keys() {
        let mut a: GMap<(u8, u8), u64> = GMap::new();
        *a.entry((1, 2)) = 5;
        let mut b = GMap::new();
        *b.entry((2, 1)) = 3;
        *b.entry((1, 2)) = 4;

        assert_eq!(join(&a, &b), join(&b, &a));
        assert_eq!(join(&a, &a), a);
        assert_eq!(join(&a, &GMap::bottom()), a);
    }

    #[test]
    fn serde_round_trip() {
        let mut m: GMap<(String, String), u64> = GMap::new();
        *m.entry(("a".into(), "b".into())) = 9;
        let encoded = serde_json::to_string(&m).unwrap();
        let decoded: GMap<(String, String), u64> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, m);
    }
}
