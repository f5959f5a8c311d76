//! Batch partitioning
//!
//! Pure, total function: no error conditions. Empty input yields zero groups
//! and the coordinator short-circuits to an immediate success.

use crate::types::{DeliveryGroup, MessageEntry};

/// Hard batch limit of the downstream transport
pub const MAX_GROUP_SIZE: usize = 10;

/// Split an ordered message list into delivery groups
///
/// Produces ⌈N/G⌉ groups preserving input order, the last group possibly
/// short. The effective group size is clamped to `1..=MAX_GROUP_SIZE` so a
/// misconfigured size can never exceed the transport's batch limit.
#[must_use]
pub fn partition(entries: Vec<MessageEntry>, group_size: usize) -> Vec<DeliveryGroup> {
    let size = group_size.clamp(1, MAX_GROUP_SIZE);

    let mut groups = Vec::with_capacity(entries.len().div_ceil(size));
    let mut iter = entries.into_iter();
    loop {
        let chunk: Vec<MessageEntry> = iter.by_ref().take(size).collect();
        if chunk.is_empty() {
            break;
        }
        groups.push(DeliveryGroup::new(chunk));
    }

    groups
}

#[cfg(test)]
mod tests {
    use courier_common::RecordKey;

    use super::*;

    fn entries(n: usize) -> Vec<MessageEntry> {
        (0..n)
            .map(|i| MessageEntry::new(RecordKey::new(format!("record-{i}")), "{}"))
            .collect()
    }

    #[test]
    fn test_empty_input_yields_zero_groups() {
        assert!(partition(Vec::new(), MAX_GROUP_SIZE).is_empty());
    }

    #[test]
    fn test_group_count_is_ceiling_division() {
        for (n, expected) in [(1, 1), (9, 1), (10, 1), (11, 2), (25, 3), (100, 10)] {
            let groups = partition(entries(n), MAX_GROUP_SIZE);
            assert_eq!(groups.len(), expected, "n = {n}");
            assert!(groups.iter().all(|g| g.len() <= MAX_GROUP_SIZE));
        }
    }

    #[test]
    fn test_concatenating_groups_preserves_order() {
        let input = entries(25);
        let expected: Vec<_> = input.iter().map(|e| e.record_key.clone()).collect();

        let groups = partition(input, MAX_GROUP_SIZE);
        assert_eq!(groups[0].len(), 10);
        assert_eq!(groups[1].len(), 10);
        assert_eq!(groups[2].len(), 5);

        let flattened: Vec<_> = groups
            .iter()
            .flat_map(|g| g.entries().iter().map(|e| e.record_key.clone()))
            .collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn test_group_size_is_clamped_to_transport_limit() {
        let groups = partition(entries(30), 100);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == MAX_GROUP_SIZE));

        // A zero size cannot produce empty groups either
        let groups = partition(entries(3), 0);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == 1));
    }
}
