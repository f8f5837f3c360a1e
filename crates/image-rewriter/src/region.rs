//! Region indexing shared by the rule engines.

use indexmap::IndexMap;

/// Values for one provider, keyed by region.
///
/// A value recorded without regions applies to every region of its provider.
/// An explicitly recorded region always wins over that any-region entry.
#[derive(Debug, Clone)]
pub(crate) struct RegionMap<T> {
    by_region: IndexMap<String, T>,
    any_region: Option<T>,
}

// Derived `Default` would require `T: Default`.
impl<T> Default for RegionMap<T> {
    fn default() -> Self {
        Self {
            by_region: IndexMap::new(),
            any_region: None,
        }
    }
}

impl<T: Clone> RegionMap<T> {
    /// Records `value` for every region in `regions`, or as the any-region
    /// entry when `regions` is empty.
    pub(crate) fn insert(&mut self, regions: &[String], value: T) {
        if regions.is_empty() {
            self.any_region = Some(value);
        } else {
            for region in regions {
                self.by_region.insert(region.clone(), value.clone());
            }
        }
    }

    /// Looks up the value for `region`, falling back to the any-region
    /// entry.
    pub(crate) fn lookup(&self, region: &str) -> Option<&T> {
        self.by_region.get(region).or(self.any_region.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::RegionMap;

    #[test]
    fn explicit_region_wins_over_any_region() {
        let mut map = RegionMap::default();
        map.insert(&[], "anywhere");
        map.insert(&["west".into()], "west-only");

        assert_eq!(map.lookup("west"), Some(&"west-only"));
        assert_eq!(map.lookup("east"), Some(&"anywhere"));
    }

    #[test]
    fn without_any_region_entry_unknown_regions_miss() {
        let mut map = RegionMap::default();
        map.insert(&["west".into(), "east".into()], "value");

        assert_eq!(map.lookup("west"), Some(&"value"));
        assert_eq!(map.lookup("central"), None);
    }
}
