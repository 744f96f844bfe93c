//! Statistics over the accumulated trial samples.

use serde::Serialize;
use surge_core::rules::ServiceType;

/// Mean / median / standard deviation of one sample set.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// Revenue percentiles. Non-decreasing by construction: all indices come
/// from the same sorted sample vector.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RevenuePercentiles {
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueProjection {
    pub projected: SummaryStats,
    pub percentiles: RevenuePercentiles,
    pub confidence_interval: ConfidenceInterval,
    pub baseline_total: f64,
    pub change_vs_baseline_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceSplit {
    pub service_type: ServiceType,
    pub mean_trips: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripProjection {
    pub projected: SummaryStats,
    pub baseline_total: f64,
    pub by_service_type: Vec<ServiceSplit>,
}

/// Sort a sample vector and compute its summary statistics.
/// Returns the sorted samples alongside so percentiles reuse the sort.
pub fn sorted_summary(mut samples: Vec<f64>) -> (Vec<f64>, SummaryStats) {
    if samples.is_empty() {
        return (samples, SummaryStats::default());
    }
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let median = percentile(&samples, 0.50);
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (
        samples,
        SummaryStats {
            mean,
            median,
            std_dev: variance.sqrt(),
        },
    )
}

/// Nearest-rank percentile over a sorted slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

pub fn revenue_percentiles(sorted: &[f64]) -> RevenuePercentiles {
    RevenuePercentiles {
        p10: percentile(sorted, 0.10),
        p25: percentile(sorted, 0.25),
        p75: percentile(sorted, 0.75),
        p90: percentile(sorted, 0.90),
        p95: percentile(sorted, 0.95),
        p99: percentile(sorted, 0.99),
    }
}

/// Normal-approximation confidence interval for the sample mean.
pub fn confidence_interval(stats: &SummaryStats, level: f64, n: usize) -> ConfidenceInterval {
    let z = if (level - 0.99).abs() < 1e-9 {
        2.576
    } else if (level - 0.95).abs() < 1e-9 {
        1.960
    } else {
        1.645
    };
    let half_width = if n == 0 {
        0.0
    } else {
        z * stats.std_dev / (n as f64).sqrt()
    };
    ConfidenceInterval {
        level,
        lower: stats.mean - half_width,
        upper: stats.mean + half_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_known_samples() {
        let (sorted, stats) = sorted_summary(vec![4.0, 1.0, 3.0, 2.0, 5.0]);
        assert_eq!(sorted, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert!((stats.std_dev - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn percentiles_are_non_decreasing() {
        let samples: Vec<f64> = (0..1000).map(|i| (i * 37 % 997) as f64).collect();
        let (sorted, _) = sorted_summary(samples);
        let p = revenue_percentiles(&sorted);
        assert!(p.p10 <= p.p25);
        assert!(p.p25 <= p.p75);
        assert!(p.p75 <= p.p90);
        assert!(p.p90 <= p.p95);
        assert!(p.p95 <= p.p99);
    }

    #[test]
    fn empty_samples_do_not_panic() {
        let (sorted, stats) = sorted_summary(Vec::new());
        assert!(sorted.is_empty());
        assert_eq!(stats.mean, 0.0);
        assert_eq!(percentile(&sorted, 0.9), 0.0);
    }

    #[test]
    fn wider_confidence_levels_widen_the_interval() {
        let stats = SummaryStats {
            mean: 100.0,
            median: 100.0,
            std_dev: 10.0,
        };
        let narrow = confidence_interval(&stats, 0.90, 1000);
        let wide = confidence_interval(&stats, 0.99, 1000);
        assert!(wide.upper - wide.lower > narrow.upper - narrow.lower);
        assert!(narrow.lower < 100.0 && narrow.upper > 100.0);
    }
}
