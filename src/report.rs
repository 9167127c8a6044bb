//! Plain-text rendering of a comparison for the `report` command.

use crate::analysis::{ComparisonRequest, ComparisonResult, RegionAggregate};
use crate::data::Metric;

/// Format the whole comparison: period, counts table, test and verdicts.
pub fn format_comparison(request: &ComparisonRequest, result: &ComparisonResult) -> String {
    let mut out = String::new();

    out.push_str("=== A/B testing: test for proportions ===\n");
    out.push_str(&format!(
        "Period: {} .. {} ({} days)\n",
        result.range.start,
        result.range.end,
        result.range.days()
    ));
    out.push_str(&format!(
        "Successes: {}\nTrials: {}\n\n",
        metric_list(&request.success_metrics),
        metric_list(&request.trial_metrics)
    ));

    out.push_str(&format!(
        "{:<24} {:>12} {:>12} {:>10}\n",
        "Region", "Successes", "Trials", "Success %"
    ));
    out.push_str(&format_row(&result.first));
    out.push_str(&format_row(&result.second));
    out.push('\n');

    match &result.test {
        Ok(test) => {
            out.push_str(&format!("Z-statistic: {}\n", test.z));
            out.push_str(&format!("P-value: {}\n", test.p_value));
            for verdict in &result.verdicts {
                out.push_str(&format!("{verdict}\n"));
            }
        }
        Err(e) => out.push_str(&format!("Test not computed: {e}\n")),
    }

    if !result.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &result.warnings {
            out.push_str(&format!("  - {w}\n"));
        }
    }

    out
}

fn format_row(aggregate: &RegionAggregate) -> String {
    let percent = aggregate
        .success_percent()
        .map(|p| format!("{p:.3}"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<24} {:>12} {:>12} {:>10}\n",
        aggregate.region, aggregate.successes, aggregate.trials, percent
    )
}

/// Comma-separated metric names, `(none)` when empty.
pub fn metric_list(metrics: &[Metric]) -> String {
    if metrics.is_empty() {
        return "(none)".to_string();
    }
    metrics
        .iter()
        .map(|m| m.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DateRange, ProcessorError};
    use crate::stats::{StatsCalculator, StatsError, ZTestResult};
    use chrono::NaiveDate;

    fn aggregate(region: &str, successes: i64, trials: i64) -> RegionAggregate {
        RegionAggregate {
            region: region.to_string(),
            successes,
            trials,
            daily_successes: Vec::new(),
        }
    }

    fn fixture() -> (ComparisonRequest, ComparisonResult) {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 5, 7).unwrap(),
        );
        let request = ComparisonRequest {
            first_region: "Москва".to_string(),
            second_region: "Санкт-Петербург".to_string(),
            range,
            success_metrics: vec![Metric::Deaths],
            trial_metrics: vec![Metric::Infections, Metric::Recoveries],
            significance_levels: vec![0.01, 0.05],
        };
        let test = ZTestResult { z: -1.98, p_value: 0.0477 };
        let result = ComparisonResult {
            first: aggregate("Москва", 10, 100),
            second: aggregate("Санкт-Петербург", 20, 100),
            range,
            test: Ok(test),
            verdicts: StatsCalculator::verdicts(test.p_value, &request.significance_levels),
            warnings: Vec::new(),
        };
        (request, result)
    }

    #[test]
    fn report_lists_counts_and_verdicts() {
        let (request, result) = fixture();
        let text = format_comparison(&request, &result);

        assert!(text.contains("Period: 2021-05-01 .. 2021-05-07 (7 days)"));
        assert!(text.contains("Trials: Infections, Recoveries"));
        assert!(text.contains("10.000"));
        assert!(text.contains("20.000"));
        assert!(text.contains("P-value: 0.0477"));
        assert!(text.contains("α = 0.01 ⇒ the hypothesis of equal proportions is not rejected"));
        assert!(text.contains("α = 0.05 ⇒ the hypothesis of equal proportions is rejected"));
        assert!(!text.contains("Warnings"));
    }

    #[test]
    fn failed_test_and_warnings_are_shown() {
        let (request, mut result) = fixture();
        result.second = aggregate("Санкт-Петербург", 20, 0);
        result.test = Err(StatsError::EmptyTrials(0));
        result.verdicts.clear();
        result.warnings.push(ProcessorError::PopulationUnknown {
            region: "Санкт-Петербург".to_string(),
        });

        let text = format_comparison(&request, &result);
        assert!(text.contains("Test not computed: Number of trials must be positive (got 0)"));
        assert!(text.contains("No population figure for region \"Санкт-Петербург\""));
        assert!(!text.contains("Z-statistic"));
    }

    #[test]
    fn empty_metric_list() {
        assert_eq!(metric_list(&[]), "(none)");
    }
}
