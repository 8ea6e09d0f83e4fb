/// Arithmetic mean of the samples, `None` when there are none
pub fn average(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: u64 = samples.iter().sum();
    Some(sum as f64 / samples.len() as f64)
}

/// Population standard deviation, `None` when there are no samples
pub fn std_dev(samples: &[u64]) -> Option<f64> {
    let mean = average(samples)?;
    let var = samples
        .iter()
        .map(|&x| (x as f64 - mean).powi(2))
        .sum::<f64>()
        / samples.len() as f64;
    Some(var.sqrt())
}

/// Clicks per minute over `elapsed_secs` whole seconds of active time
pub fn clicks_per_minute(clicks: u32, elapsed_secs: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    (clicks as f64 / elapsed_secs as f64 * 60.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_samples() {
        assert_eq!(average(&[200, 250, 300]), Some(250.0));
        assert_eq!(average(&[301]), Some(301.0));
        assert_eq!(average(&[1, 2]), Some(1.5));
    }

    #[test]
    fn average_of_nothing_is_none() {
        assert_eq!(average(&[]), None);
    }

    #[test]
    fn std_dev_of_samples() {
        assert_eq!(std_dev(&[]), None);
        assert_eq!(std_dev(&[250]), Some(0.0));
        assert_eq!(std_dev(&[200, 300]), Some(50.0));
    }

    #[test]
    fn cpm_rounds_to_nearest() {
        assert_eq!(clicks_per_minute(10, 1), 600);
        assert_eq!(clicks_per_minute(7, 3), 140);
        // 5 / 7 * 60 = 42.857
        assert_eq!(clicks_per_minute(5, 7), 43);
    }

    #[test]
    fn cpm_is_zero_before_the_first_second() {
        assert_eq!(clicks_per_minute(12, 0), 0);
    }
}
