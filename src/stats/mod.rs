//! Ping statistics over successful samples

use crate::models::{round2, AttemptStatus, PingAttempt, PingStatistics};

/// Build statistics for a ping run
///
/// `sent` counts every attempt; min/max/avg/stddev are computed only over
/// attempts that produced a reply.
pub fn ping_statistics(attempts: &[PingAttempt]) -> PingStatistics {
    let sent = attempts.len() as u32;
    let times: Vec<f64> = attempts
        .iter()
        .filter(|a| a.status == AttemptStatus::Reply)
        .filter_map(|a| a.time_ms)
        .collect();
    let received = times.len() as u32;

    let success_rate = if sent == 0 {
        0.0
    } else {
        f64::from(received) / f64::from(sent) * 100.0
    };

    let avg = mean(&times);
    PingStatistics {
        sent,
        received,
        lost: sent - received,
        success_rate,
        min: times.iter().copied().reduce(f64::min),
        max: times.iter().copied().reduce(f64::max),
        avg: avg.map(round2),
        stddev: avg.map_or(0.0, |m| round2(standard_deviation(&times, m))),
        times,
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation, 0 with fewer than two values
pub fn standard_deviation(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let variance = values.iter()
        .map(|x| (x - mean).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_statistics_over_replies_only() {
        let attempts = vec![
            PingAttempt::reply(1, 10.0, Some(64)),
            PingAttempt::timeout(2, "no reply"),
            PingAttempt::reply(3, 20.0, Some(64)),
            PingAttempt::reply(4, 30.0, None),
        ];

        let stats = ping_statistics(&attempts);
        assert_eq!(stats.sent, 4);
        assert_eq!(stats.received, 3);
        assert_eq!(stats.lost, 1);
        assert_eq!(stats.success_rate, 75.0);
        assert_eq!(stats.min, Some(10.0));
        assert_eq!(stats.max, Some(30.0));
        assert_eq!(stats.avg, Some(20.0));
        assert_eq!(stats.stddev, 10.0);
        assert_eq!(stats.times, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_single_sample_has_zero_stddev() {
        let stats = ping_statistics(&[PingAttempt::reply(1, 5.5, None)]);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.avg, Some(5.5));
    }

    #[test]
    fn test_all_lost() {
        let attempts: Vec<_> = (1..=3).map(|i| PingAttempt::timeout(i, "no reply")).collect();
        let stats = ping_statistics(&attempts);
        assert_eq!(stats.received, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.min.is_none());
        assert!(stats.avg.is_none());
    }

    #[test]
    fn test_empty_run() {
        let stats = ping_statistics(&[]);
        assert_eq!(stats.sent, 0);
        assert_eq!(stats.success_rate, 0.0);
    }

    proptest! {
        #[test]
        fn prop_counts_are_consistent(samples in proptest::collection::vec(proptest::option::of(0.1f64..500.0), 1..20)) {
            let attempts: Vec<PingAttempt> = samples
                .iter()
                .enumerate()
                .map(|(i, s)| match s {
                    Some(t) => PingAttempt::reply(i as u32 + 1, *t, None),
                    None => PingAttempt::timeout(i as u32 + 1, "no reply"),
                })
                .collect();

            let stats = ping_statistics(&attempts);
            prop_assert_eq!(stats.sent as usize, samples.len());
            prop_assert!(stats.received <= stats.sent);
            prop_assert_eq!(stats.lost, stats.sent - stats.received);
            let expected = f64::from(stats.received) / f64::from(stats.sent) * 100.0;
            prop_assert!((stats.success_rate - expected).abs() < 1e-9);
            if let (Some(min), Some(max)) = (stats.min, stats.max) {
                prop_assert!(min <= max);
            }
            prop_assert!(stats.stddev >= 0.0);
        }
    }
}
