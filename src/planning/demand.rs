//! 预测摘要适配：ForecastResult -> DemandSummary
//!
//! 取序列最后 forecast_days 个点（未来段，排除历史拟合），点估计求和后向下取整，
//! 末点日期作为 period_end_date。

use crate::planning::{DemandSummary, ForecastResult};
use crate::tools::ToolError;

pub fn summarize_demand(
    forecast: &ForecastResult,
    forecast_days: u32,
) -> Result<DemandSummary, ToolError> {
    if forecast_days == 0 {
        return Err(ToolError::invalid_input("forecast_days must be at least 1"));
    }
    let window = forecast_days as usize;
    let future = forecast.future_len();
    if future < window {
        return Err(ToolError::invalid_input(format!(
            "forecast for product {} has {} future-dated entries, {} requested",
            forecast.product_id, future, forecast_days
        )));
    }

    let tail = &forecast.points[forecast.points.len() - window..];
    let sum: f64 = tail.iter().map(|p| p.point_estimate).sum();
    if !sum.is_finite() {
        return Err(ToolError::invalid_input(format!(
            "forecast for product {} contains non-finite estimates",
            forecast.product_id
        )));
    }
    // future_len >= window >= 1，tail 非空
    let period_end_date = tail[tail.len() - 1].date;

    Ok(DemandSummary {
        product_id: forecast.product_id,
        horizon_days: forecast_days,
        total_units: sum.floor() as i64,
        period_end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::ForecastPoint;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn series(history: usize, future: usize, value: impl Fn(usize) -> f64) -> ForecastResult {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..history + future)
            .map(|i| {
                let v = value(i);
                ForecastPoint {
                    date: start + Duration::days(i as i64),
                    point_estimate: v,
                    lower_bound: v - 1.0,
                    upper_bound: v + 1.0,
                }
            })
            .collect();
        ForecastResult {
            product_id: 151,
            horizon_days: future as u32,
            history_end: if history == 0 {
                None
            } else {
                Some(start + Duration::days(history as i64 - 1))
            },
            points,
        }
    }

    #[test]
    fn test_sums_future_tail_only() {
        // 历史段 1000/天，未来段 10.5/天
        let f = series(100, 90, |i| if i < 100 { 1000.0 } else { 10.5 });
        let s = summarize_demand(&f, 90).unwrap();
        assert_eq!(s.horizon_days, 90);
        assert_eq!(s.total_units, 945);
        assert_eq!(s.product_id, 151);
        assert_eq!(s.period_end_date, f.points.last().unwrap().date);
    }

    #[test]
    fn test_floor_not_round() {
        let f = series(0, 3, |_| 1.9);
        assert_eq!(summarize_demand(&f, 3).unwrap().total_units, 5);
    }

    #[test]
    fn test_shorter_window_than_future() {
        let f = series(5, 10, |i| i as f64);
        // 最后 3 个点：12 + 13 + 14
        assert_eq!(summarize_demand(&f, 3).unwrap().total_units, 39);
    }

    #[test]
    fn test_insufficient_future_entries() {
        let f = series(100, 30, |_| 1.0);
        let err = summarize_demand(&f, 90).unwrap_err();
        assert_eq!(err.kind, crate::tools::ToolErrorKind::InvalidInput);
    }

    #[test]
    fn test_zero_days_rejected() {
        let f = series(0, 3, |_| 1.0);
        assert!(summarize_demand(&f, 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_independent_of_history_length(
            history in 0usize..200,
            days in 1usize..60,
            values in proptest::collection::vec(0.0f64..500.0, 60),
        ) {
            let f = series(history, days, |i| if i < history { 9999.0 } else { values[i - history] });
            let s = summarize_demand(&f, days as u32).unwrap();
            let expected: f64 = values[..days].iter().sum();
            prop_assert_eq!(s.total_units, expected.floor() as i64);
        }
    }
}
