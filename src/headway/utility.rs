use super::types::Minutes;

/// Rounded arithmetic mean of whole-minute values. Returns 0 for empty input.
///
/// Halves round up, so a mean of 6.5 becomes 7.
pub fn rounded_mean(values: &[Minutes]) -> Minutes {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    (sum as f64 / values.len() as f64).round() as Minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_mean_empty_is_zero() {
        assert_eq!(rounded_mean(&[]), 0);
    }

    #[test]
    fn test_rounded_mean_rounds_half_up() {
        assert_eq!(rounded_mean(&[6, 7]), 7);
        assert_eq!(rounded_mean(&[4, 8]), 6);
        assert_eq!(rounded_mean(&[1, 1, 2]), 1);
    }
}
