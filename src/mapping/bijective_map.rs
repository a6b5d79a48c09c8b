//! A one-to-one mapping between two value sets, navigable in both directions.
//!
//! [`BiMap`] is what lets every provider speak its own vocabulary while the rest of
//! the crate only deals in [`crate::WeatherParam`] and [`crate::WeatherModel`]: the
//! forward view turns a domain value into the provider's wire name, the backward view
//! turns a provider column name back into the domain value.

use crate::mapping::error::MappingNotFoundError;
use indexmap::IndexMap;
use std::borrow::Borrow;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

/// A bijective mapping from `L` (domain side) to `R` (provider side).
///
/// Both directions are owned by the same value and updated together, so at any point
/// each left value maps to at most one right value and vice versa.
///
/// Inserting a pair that collides with an existing entry on either side evicts the old
/// pair in both directions:
///
/// ```
/// use forecast_arbiter::BiMap;
///
/// let mut map: BiMap<u8, char> = [(0, 'a'), (1, 'b')].into_iter().collect();
///
/// // 0 already points at 'a' and 'b' is already claimed by 1:
/// // both old pairs disappear, only 0 → 'b' remains.
/// let evicted = map.insert(0, 'b');
///
/// assert_eq!(evicted, vec![(0, 'a'), (1, 'b')]);
/// assert_eq!(map.len(), 1);
/// assert_eq!(map.get(&0), Ok(&'b'));
/// assert_eq!(map.backward().get(&'b'), Ok(&0));
/// assert!(map.backward().get(&'a').is_err());
/// ```
///
/// Iteration follows the insertion order of the live forward keys. Re-assigning an
/// existing key keeps its position. Equality only looks at the forward view and ignores
/// order.
#[derive(Debug, Clone)]
pub struct BiMap<L, R> {
    forward: IndexMap<L, R>,
    backward: IndexMap<R, L>,
}

/// Read-only reverse view of a [`BiMap`], obtained through [`BiMap::backward`].
#[derive(Debug)]
pub struct Backward<'a, L, R> {
    map: &'a BiMap<L, R>,
}

fn lookup<'m, K, V, Q>(map: &'m IndexMap<K, V>, key: &Q) -> Result<&'m V, MappingNotFoundError>
where
    K: Borrow<Q> + Hash + Eq + Display,
    Q: Hash + Eq + Display + ?Sized,
{
    map.get(key).ok_or_else(|| MappingNotFoundError {
        value: key.to_string(),
        known: map.keys().map(ToString::to_string).collect(),
    })
}

impl<L, R> BiMap<L, R>
where
    L: Hash + Eq + Clone + Display,
    R: Hash + Eq + Clone + Display,
{
    pub fn new() -> Self {
        Self {
            forward: IndexMap::new(),
            backward: IndexMap::new(),
        }
    }

    /// Returns the right-hand value mapped from `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingNotFoundError`] naming `key` and every known left-hand value
    /// if `key` is not mapped.
    pub fn get<Q>(&self, key: &Q) -> Result<&R, MappingNotFoundError>
    where
        L: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        lookup(&self.forward, key)
    }

    /// Inserts the pair `left ↔ right`, evicting whatever pairs collide with it.
    ///
    /// If `left` already points at another value, that value's reverse entry is
    /// dropped. If `right` is already claimed by another left value, that left value's
    /// forward entry is dropped. The evicted pairs are returned, forward collision
    /// first. Re-inserting an identical pair is a no-op and evicts nothing.
    pub fn insert(&mut self, left: L, right: R) -> Vec<(L, R)> {
        let mut evicted = Vec::new();

        if let Some(old_right) = self.forward.get(&left).cloned() {
            if old_right == right {
                return evicted;
            }
            self.backward.shift_remove(&old_right);
            evicted.push((left.clone(), old_right));
        }

        if let Some(old_left) = self.backward.shift_remove(&right) {
            self.forward.shift_remove(&old_left);
            evicted.push((old_left, right.clone()));
        }

        // IndexMap keeps the position of an existing key on insert.
        self.forward.insert(left.clone(), right.clone());
        self.backward.insert(right, left);
        evicted
    }

    /// Removes the pair whose left-hand value is `key`, from both directions.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<R>
    where
        L: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let right = self.forward.shift_remove(key)?;
        self.backward.shift_remove(&right);
        Some(right)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        L: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.contains_key(key)
    }

    pub fn contains_value<Q>(&self, value: &Q) -> bool
    where
        R: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.backward.contains_key(value)
    }

    /// The reverse (right → left) view.
    pub fn backward(&self) -> Backward<'_, L, R> {
        Backward { map: self }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.backward.clear();
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, L, R> {
        self.forward.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, L, R> {
        self.forward.keys()
    }

    /// Right-hand values in the order of their forward keys.
    pub fn values(&self) -> indexmap::map::Values<'_, L, R> {
        self.forward.values()
    }
}

impl<'a, L, R> Backward<'a, L, R>
where
    L: Hash + Eq + Clone + Display,
    R: Hash + Eq + Clone + Display,
{
    /// Returns the left-hand value that maps to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingNotFoundError`] naming `key` and every known right-hand value
    /// if nothing maps to `key`.
    pub fn get<Q>(&self, key: &Q) -> Result<&'a L, MappingNotFoundError>
    where
        R: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        lookup(&self.map.backward, key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        R: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.backward.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.backward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.backward.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'a, R, L> {
        self.map.backward.iter()
    }
}

impl<L, R> Default for BiMap<L, R>
where
    L: Hash + Eq + Clone + Display,
    R: Hash + Eq + Clone + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<L, R> PartialEq for BiMap<L, R>
where
    L: Hash + Eq,
    R: Hash + Eq,
{
    fn eq(&self, other: &Self) -> bool {
        self.forward == other.forward
    }
}

impl<L, R> Eq for BiMap<L, R>
where
    L: Hash + Eq,
    R: Hash + Eq,
{
}

impl<L, R> FromIterator<(L, R)> for BiMap<L, R>
where
    L: Hash + Eq + Clone + Display,
    R: Hash + Eq + Clone + Display,
{
    fn from_iter<I: IntoIterator<Item = (L, R)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<L, R> Extend<(L, R)> for BiMap<L, R>
where
    L: Hash + Eq + Clone + Display,
    R: Hash + Eq + Clone + Display,
{
    fn extend<I: IntoIterator<Item = (L, R)>>(&mut self, iter: I) {
        for (left, right) in iter {
            self.insert(left, right);
        }
    }
}

impl<'a, L, R> IntoIterator for &'a BiMap<L, R> {
    type Item = (&'a L, &'a R);
    type IntoIter = indexmap::map::Iter<'a, L, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.forward.iter()
    }
}

impl<L: Display, R: Display> Display for BiMap<L, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.forward.is_empty() {
            return write!(f, "{{→}}");
        }
        write!(f, "{{")?;
        for (index, (left, right)) in self.forward.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{left} → {right}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample() -> BiMap<String, String> {
        [("temperature", "t_2m:C"), ("wind_speed", "wind_speed_10m:kmh")]
            .into_iter()
            .map(|(l, r)| (l.to_string(), r.to_string()))
            .collect()
    }

    fn assert_one_to_one(map: &BiMap<String, String>) {
        assert_eq!(map.len(), map.backward().len());
        let values: HashSet<&String> = map.values().collect();
        assert_eq!(values.len(), map.len(), "two keys share a value");
        for (left, right) in map.iter() {
            assert_eq!(map.backward().get(right.as_str()), Ok(left));
        }
    }

    #[test]
    fn test_insert_is_visible_in_both_directions() {
        let mut map = BiMap::new();
        map.insert("gusts".to_string(), "wpgt".to_string());

        assert_eq!(map.get("gusts").map(String::as_str), Ok("wpgt"));
        assert_eq!(map.backward().get("wpgt").map(String::as_str), Ok("gusts"));
        assert_one_to_one(&map);
    }

    #[test]
    fn test_forward_collision_evicts_old_reverse_entry() {
        let mut map = sample();
        let evicted = map.insert("temperature".to_string(), "temp".to_string());

        assert_eq!(
            evicted,
            vec![("temperature".to_string(), "t_2m:C".to_string())]
        );
        assert!(!map.backward().contains_key("t_2m:C"));
        assert_eq!(map.get("temperature").map(String::as_str), Ok("temp"));
        assert_eq!(map.len(), 2);
        assert_one_to_one(&map);
    }

    #[test]
    fn test_backward_collision_evicts_old_forward_entry() {
        let mut map = sample();
        let evicted = map.insert("gusts".to_string(), "t_2m:C".to_string());

        assert_eq!(
            evicted,
            vec![("temperature".to_string(), "t_2m:C".to_string())]
        );
        assert!(!map.contains_key("temperature"));
        assert_eq!(map.backward().get("t_2m:C").map(String::as_str), Ok("gusts"));
        assert_eq!(map.len(), 2);
        assert_one_to_one(&map);
    }

    #[test]
    fn test_double_collision_collapses_two_pairs_into_one() {
        let mut map: BiMap<u8, u8> = [(0, 0), (1, 1)].into_iter().collect();
        let evicted = map.insert(0, 1);

        assert_eq!(evicted, vec![(0, 0), (1, 1)]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&0), Ok(&1));
        assert_eq!(map.backward().get(&1), Ok(&0));
        assert_eq!(map.to_string(), "{0 → 1}");
    }

    #[test]
    fn test_reinserting_same_pair_is_noop() {
        let mut map = sample();
        let evicted = map.insert("temperature".to_string(), "t_2m:C".to_string());

        assert!(evicted.is_empty());
        assert_eq!(map, sample());
        assert_eq!(
            map.keys().cloned().collect::<Vec<_>>(),
            vec!["temperature".to_string(), "wind_speed".to_string()]
        );
    }

    #[test]
    fn test_reassigning_key_keeps_its_position() {
        let mut map = sample();
        map.insert("temperature".to_string(), "temp".to_string());

        assert_eq!(
            map.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["temperature", "wind_speed"]
        );
    }

    #[test]
    fn test_remove_drops_both_directions() {
        let mut map = sample();
        assert_eq!(map.remove("wind_speed"), Some("wind_speed_10m:kmh".to_string()));
        assert!(!map.backward().contains_key("wind_speed_10m:kmh"));
        assert_eq!(map.remove("wind_speed"), None);
        assert_one_to_one(&map);
    }

    #[test]
    fn test_missing_key_names_value_and_known_keys() {
        let map = sample();
        let error = map.get("pressure").unwrap_err();

        assert_eq!(error.value, "pressure");
        assert_eq!(error.known, vec!["temperature", "wind_speed"]);
        assert!(error.to_string().contains("pressure"));

        let error = map.backward().get("temp").unwrap_err();
        assert_eq!(error.known, vec!["t_2m:C", "wind_speed_10m:kmh"]);
    }

    #[test]
    fn test_equality_ignores_order_and_backward_view() {
        let a: BiMap<u8, char> = [(1, 'a'), (2, 'b')].into_iter().collect();
        let b: BiMap<u8, char> = [(2, 'b'), (1, 'a')].into_iter().collect();
        let c: BiMap<u8, char> = [(1, 'a'), (2, 'c')].into_iter().collect();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_invariant_holds_after_mixed_mutations() {
        let mut map: BiMap<String, String> = BiMap::new();
        let ops = [
            ("a", "1"),
            ("b", "2"),
            ("c", "1"),
            ("a", "3"),
            ("b", "3"),
            ("d", "2"),
            ("c", "c"),
        ];
        for (left, right) in ops {
            map.insert(left.to_string(), right.to_string());
            assert_one_to_one(&map);
        }
        map.remove("b");
        assert_one_to_one(&map);
        map.clear();
        assert!(map.is_empty());
        assert!(map.backward().is_empty());
        assert_eq!(map.to_string(), "{→}");
    }
}
