//! Outlier filter for discovered episode numbers.
//!
//! Stray digit runs (resolutions, bit depths, CRC fragments) show up as
//! numbers far away from the real episode run. The filter keeps the first
//! number and then every number whose distance to its neighbour in the
//! *input* list is at most `max_gap`. A rejected number still serves as the
//! neighbour of the next one, so two strays close to each other both
//! survive; this is a known quirk, not a contiguity check.

use super::{EpisodeNumber, Result, ScanError};
use tracing::debug;

/// Filter a sorted, duplicate-free list of episode numbers.
///
/// # Errors
///
/// Returns [`ScanError::NoEpisodes`] when `numbers` is empty.
pub fn filter_episode_numbers(
    numbers: &[EpisodeNumber],
    max_gap: u64,
) -> Result<Vec<EpisodeNumber>> {
    let (first, _) = numbers.split_first().ok_or(ScanError::NoEpisodes)?;

    let mut kept = vec![first.clone()];
    for pair in numbers.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let gap = current.value().abs_diff(previous.value());

        if gap <= max_gap {
            kept.push(current.clone());
        } else {
            debug!(
                "Dropping episode number {} ({} away from {})",
                current, gap, previous
            );
        }
    }

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eps(items: &[&str]) -> Vec<EpisodeNumber> {
        items.iter().map(|s| EpisodeNumber::from_digits(s)).collect()
    }

    fn run(items: &[&str]) -> Vec<String> {
        filter_episode_numbers(&eps(items), 5)
            .unwrap()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    #[test]
    fn test_empty_input_fails() {
        let err = filter_episode_numbers(&[], 5).unwrap_err();
        assert!(matches!(err, ScanError::NoEpisodes));
    }

    #[test]
    fn test_single_number_kept() {
        assert_eq!(run(&["42"]), ["42"]);
    }

    #[test]
    fn test_far_outlier_dropped() {
        assert_eq!(run(&["01", "02", "10"]), ["01", "02"]);
    }

    #[test]
    fn test_gap_of_exactly_max_kept() {
        assert_eq!(run(&["01", "02", "07", "08"]), ["01", "02", "07", "08"]);
    }

    #[test]
    fn test_resolution_tokens_dropped() {
        assert_eq!(
            run(&["01", "02", "03", "04", "264", "1080"]),
            ["01", "02", "03", "04"]
        );
    }

    #[test]
    fn test_compares_against_original_predecessor() {
        // 20 is dropped (gap 18), yet 22 is kept because its neighbour in the
        // input is 20, not the last kept number 02.
        assert_eq!(run(&["01", "02", "20", "22"]), ["01", "02", "22"]);
    }

    #[test]
    fn test_first_always_kept_and_order_preserved() {
        let input = ["50", "51", "90", "93"];
        let out = run(&input);
        assert_eq!(out[0], "50");
        let positions: Vec<_> = out
            .iter()
            .map(|n| input.iter().position(|i| i == n).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
