use contracts::dashboards::d410_sales_overview::{
    Change, PeriodChange, PeriodPoint, Totals, TotalsChanges,
};

/// Round to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `delta = current - previous`, `percent = round(delta / previous * 100, 1)`.
///
/// `percent` is `0` whenever `previous == 0`, whatever `current` is.
pub fn compare(current: f64, previous: f64) -> Change {
    let delta = current - previous;
    let percent = if previous == 0.0 {
        0.0
    } else {
        round1(delta / previous * 100.0)
    };
    Change {
        current,
        previous,
        delta,
        percent,
    }
}

pub fn compare_counts(current: u64, previous: u64) -> Change {
    compare(current as f64, previous as f64)
}

pub fn compare_totals(current: &Totals, previous: &Totals) -> TotalsChanges {
    TotalsChanges {
        contracts: compare_counts(current.contracts, previous.contracts),
        realization: compare_counts(current.realization, previous.realization),
        cancellation: compare_counts(current.cancellation, previous.cancellation),
    }
}

fn point_totals(point: &PeriodPoint) -> Totals {
    Totals {
        contracts: point.contracts,
        realization: point.realization,
        cancellation: point.cancellation,
    }
}

/// Position-aligned comparison of two series (e.g. this year vs last year).
///
/// A current point without a counterpart is compared with zero; surplus
/// previous points are ignored.
pub fn compare_series(current: &[PeriodPoint], previous: &[PeriodPoint]) -> Vec<PeriodChange> {
    current
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let prev = previous.get(i).map(point_totals).unwrap_or_default();
            let changes = compare_totals(&point_totals(point), &prev);
            PeriodChange {
                period_key: point.period_key.clone(),
                period_label: point.period_label.clone(),
                contracts: changes.contracts,
                realization: changes.realization,
                cancellation: changes.cancellation,
            }
        })
        .collect()
}

/// Last period of a chronological series against the one before it.
/// With fewer than two periods the missing side counts as zero.
pub fn last_period_changes(series: &[PeriodPoint]) -> TotalsChanges {
    let current = series.last().map(point_totals).unwrap_or_default();
    let previous = series
        .len()
        .checked_sub(2)
        .and_then(|i| series.get(i))
        .map(point_totals)
        .unwrap_or_default();
    compare_totals(&current, &previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(key: &str, contracts: u64, realization: u64, cancellation: u64) -> PeriodPoint {
        PeriodPoint {
            period_key: key.to_string(),
            period_label: key.to_string(),
            contracts,
            realization,
            cancellation,
        }
    }

    #[test]
    fn test_compare_growth_and_zero_base() {
        let change = compare(120.0, 100.0);
        assert_eq!(change.delta, 20.0);
        assert_eq!(change.percent, 20.0);

        let from_zero = compare(50.0, 0.0);
        assert_eq!(from_zero.delta, 50.0);
        assert_eq!(from_zero.percent, 0.0);
    }

    #[test]
    fn test_zero_previous_is_always_zero_percent() {
        for current in [0.0, 1.0, -3.0, 1e9] {
            assert_eq!(compare(current, 0.0).percent, 0.0);
        }
    }

    #[test]
    fn test_percent_rounds_to_one_decimal() {
        assert_eq!(compare(1.0, 3.0).percent, -66.7);
        assert_eq!(compare(4.0, 3.0).percent, 33.3);
        assert_eq!(compare(80.0, 100.0).percent, -20.0);
    }

    #[test]
    fn test_compare_series_aligns_by_position() {
        let current = vec![point("2024-01", 12, 6, 0), point("2024-02", 10, 5, 1)];
        let previous = vec![point("2023-01", 10, 0, 2)];

        let changes = compare_series(&current, &previous);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].period_key, "2024-01");
        assert_eq!(changes[0].contracts.percent, 20.0);
        assert_eq!(changes[0].realization.percent, 0.0);
        assert_eq!(changes[0].cancellation.delta, -2.0);
        assert_eq!(changes[0].cancellation.percent, -100.0);
        // no previous counterpart
        assert_eq!(changes[1].contracts.previous, 0.0);
        assert_eq!(changes[1].contracts.percent, 0.0);
    }

    #[test]
    fn test_last_period_changes() {
        let series = vec![
            point("2024-01", 1, 1, 1),
            point("2024-02", 100, 10, 4),
            point("2024-03", 120, 5, 4),
        ];
        let changes = last_period_changes(&series);
        assert_eq!(changes.contracts.delta, 20.0);
        assert_eq!(changes.contracts.percent, 20.0);
        assert_eq!(changes.realization.percent, -50.0);
        assert_eq!(changes.cancellation.percent, 0.0);

        let single = last_period_changes(&series[..1]);
        assert_eq!(single.contracts.current, 1.0);
        assert_eq!(single.contracts.percent, 0.0);

        assert_eq!(last_period_changes(&[]), TotalsChanges::default());
    }
}
