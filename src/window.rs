//! Which block indices the explorer shows.
//!
//! All functions here are pure. Starts use `i64` with `-1` meaning "not
//! pinned", matching the view state the panel exchanges.

use crate::types::UNSET;

/// Where the window starts: `pinned_start` if it names an existing block,
/// otherwise the head. `None` when there are no blocks.
pub fn effective_start(pinned_start: i64, height: u64) -> Option<u64> {
    let head = height.checked_sub(1)?;
    match u64::try_from(pinned_start) {
        Ok(s) if s <= head => Some(s),
        _ => Some(head),
    }
}

/// Up to `page_size` indices counting down from the effective start, stopping
/// at block 0.
pub fn compute_range(pinned_start: i64, height: u64, page_size: usize) -> Vec<u64> {
    let Some(start) = effective_start(pinned_start, height) else {
        return Vec::new();
    };
    let len = (page_size as u64).min(start + 1);
    (0..len).map(|i| start - i).collect()
}

/// Normalize a requested pin: negative means "track the head", anything past
/// the head is clamped onto it.
pub fn clamp_start(start: i64, height: u64) -> i64 {
    if start < 0 || height == 0 {
        return UNSET;
    }
    let head = (height - 1).min(i64::MAX as u64) as i64;
    start.min(head)
}

/// Pin that keeps `selected` visible with two newer blocks above it.
pub fn select_start(selected: i64, height: u64) -> i64 {
    if height == 0 {
        return UNSET;
    }
    clamp_start(selected.saturating_add(2).max(0), height)
}

/// Pin for paging `distance` blocks back in history.
pub fn older_page_start(start_at_block: i64, height: u64, distance: u64) -> i64 {
    match effective_start(start_at_block, height) {
        Some(start) => start.saturating_sub(distance) as i64,
        None => UNSET,
    }
}

/// Pin for paging `distance` blocks towards the head. Reaching the head
/// unpins, so the view goes back to following new blocks.
pub fn newer_page_start(start_at_block: i64, height: u64, distance: u64) -> i64 {
    let Some(head) = height.checked_sub(1) else {
        return UNSET;
    };
    match effective_start(start_at_block, height) {
        Some(start) if start.saturating_add(distance) < head => (start + distance) as i64,
        _ => UNSET,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpinned_tracks_head() {
        let w = compute_range(-1, 100, 50);
        assert_eq!(w, (50..=99).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_pinned_clipped_at_zero() {
        let w = compute_range(30, 100, 50);
        assert_eq!(w.len(), 31);
        assert_eq!(w.first(), Some(&30));
        assert_eq!(w.last(), Some(&0));
    }

    #[test]
    fn test_unpinned_length_for_all_sizes() {
        for height in 0..120u64 {
            for page in 0..60usize {
                let w = compute_range(UNSET, height, page);
                assert_eq!(w.len() as u64, (page as u64).min(height));
                if let Some(first) = w.first() {
                    assert_eq!(*first, height - 1);
                }
                assert!(w.windows(2).all(|p| p[0] == p[1] + 1));
            }
        }
    }

    #[test]
    fn test_pinned_in_range_starts_exactly_there() {
        for height in 1..80u64 {
            for s in 0..height {
                let w = compute_range(s as i64, height, 10);
                assert_eq!(w[0], s);
                assert!(w.len() <= 10);
            }
        }
    }

    #[test]
    fn test_out_of_range_pin_is_unpinned() {
        for height in 1..40u64 {
            let head = compute_range(UNSET, height, 7);
            assert_eq!(compute_range(height as i64, height, 7), head);
            assert_eq!(compute_range(height as i64 + 9, height, 7), head);
            assert_eq!(compute_range(-5, height, 7), head);
        }
    }

    #[test]
    fn test_empty_chain() {
        assert!(compute_range(UNSET, 0, 50).is_empty());
        assert!(compute_range(3, 0, 50).is_empty());
        assert_eq!(effective_start(0, 0), None);
    }

    #[test]
    fn test_select_keeps_two_newer_blocks() {
        assert_eq!(select_start(10, 100), 12);
        assert_eq!(select_start(98, 100), 99);
        assert_eq!(select_start(99, 100), 99);
        assert_eq!(select_start(0, 1), 0);
        assert_eq!(select_start(5, 0), UNSET);
    }

    #[test]
    fn test_clamp_start() {
        assert_eq!(clamp_start(-1, 100), UNSET);
        assert_eq!(clamp_start(-20, 100), UNSET);
        assert_eq!(clamp_start(0, 100), 0);
        assert_eq!(clamp_start(150, 100), 99);
        assert_eq!(clamp_start(4, 0), UNSET);
    }

    #[test]
    fn test_paging() {
        // unpinned at height 100 shows 99..; older page starts 15 back
        assert_eq!(older_page_start(UNSET, 100, 15), 84);
        assert_eq!(older_page_start(10, 100, 15), 0);
        assert_eq!(newer_page_start(0, 100, 15), 15);
        assert_eq!(newer_page_start(84, 100, 15), UNSET);
        assert_eq!(newer_page_start(UNSET, 100, 15), UNSET);
        assert_eq!(older_page_start(UNSET, 0, 15), UNSET);
    }
}
