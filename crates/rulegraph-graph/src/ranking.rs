use rulegraph_core::Group;
use std::collections::HashMap;

/// Normalized group name → layer ordinal (1 = base layer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRanking {
    ordinals: HashMap<String, u32>,
    /// Normalized names in ordinal order.
    ordered: Vec<String>,
}

impl GroupRanking {
    /// Rank groups by `display_order`, ties keeping their input order.
    ///
    /// A name that appears twice keeps the ordinal of its first occurrence.
    pub fn from_groups(groups: &[Group]) -> Self {
        let mut sorted: Vec<&Group> = groups.iter().collect();
        // `sort_by_key` is stable, which is what breaks ties.
        sorted.sort_by_key(|group| group.display_order);

        let mut ranking = Self::default();
        for group in sorted {
            let name = group.normalized_name();
            if ranking.ordinals.contains_key(&name) {
                tracing::debug!("Group {:?} listed more than once; ignoring repeat", name);
                continue;
            }
            let ordinal = ranking.ordered.len() as u32 + 1;
            ranking.ordinals.insert(name.clone(), ordinal);
            ranking.ordered.push(name);
        }
        ranking
    }

    pub fn ordinal(&self, group: &str) -> Option<u32> {
        self.ordinals.get(group).copied()
    }

    /// Normalized group name holding `ordinal`.
    pub fn group_at(&self, ordinal: u32) -> Option<&str> {
        let idx = usize::try_from(ordinal).ok()?.checked_sub(1)?;
        self.ordered.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.ordered
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx as u32 + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_display_order() {
        let ranking = GroupRanking::from_groups(&[
            Group::new("bonus", "Bonus", "orange", 20),
            Group::new("core", "Core", "blue", 5),
            Group::new("total", "Total", "purple", 100),
        ]);
        assert_eq!(ranking.ordinal("core"), Some(1));
        assert_eq!(ranking.ordinal("bonus"), Some(2));
        assert_eq!(ranking.ordinal("total"), Some(3));
        assert_eq!(ranking.ordinal("missing"), None);
        assert_eq!(ranking.len(), 3);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranking = GroupRanking::from_groups(&[
            Group::new("b", "", "", 1),
            Group::new("a", "", "", 1),
            Group::new("c", "", "", 0),
        ]);
        let order: Vec<(&str, u32)> = ranking.iter().collect();
        assert_eq!(order, vec![("c", 1), ("b", 2), ("a", 3)]);
    }

    #[test]
    fn test_names_are_normalized() {
        let ranking = GroupRanking::from_groups(&[Group::new("Core", "", "", 1)]);
        assert_eq!(ranking.ordinal("core"), Some(1));
        assert_eq!(ranking.group_at(1), Some("core"));
        assert_eq!(ranking.group_at(0), None);
        assert_eq!(ranking.group_at(2), None);
    }

    #[test]
    fn test_duplicates_keep_first_ordinal() {
        let ranking = GroupRanking::from_groups(&[
            Group::new("core", "", "", 1),
            Group::new("CORE", "", "", 3),
            Group::new("bonus", "", "", 2),
        ]);
        assert_eq!(ranking.ordinal("core"), Some(1));
        assert_eq!(ranking.ordinal("bonus"), Some(2));
        assert_eq!(ranking.len(), 2);
    }

    #[test]
    fn test_negative_and_sparse_orders() {
        let ranking = GroupRanking::from_groups(&[
            Group::new("high", "", "", 1000),
            Group::new("low", "", "", -5),
        ]);
        assert_eq!(ranking.ordinal("low"), Some(1));
        assert_eq!(ranking.ordinal("high"), Some(2));
    }

    #[test]
    fn test_empty_catalog() {
        let ranking = GroupRanking::from_groups(&[]);
        assert!(ranking.is_empty());
        assert_eq!(ranking.ordinal("core"), None);
    }
}
