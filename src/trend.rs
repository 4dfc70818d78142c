//! Finding the forecaster whose daily errors fell the most over a season.
use crate::{
    record::{Record, Semester},
    roster::Roster,
    table::{Filter, ForecastTable},
};
use std::cmp::Ordering;

/// Least squares fit of daily error against contest index.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
}

impl LinearFit {
    /// Fit `ys` against `0, 1, 2, ...`. Needs at least two points.
    pub fn fit(ys: &[f64]) -> Option<Self> {
        let n = ys.len();
        if n < 2 {
            return None;
        }
        let n = n as f64;

        let x_mean = (n - 1.0) / 2.0;
        let y_mean = ys.iter().sum::<f64>() / n;

        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (i, y) in ys.iter().enumerate() {
            let dx = i as f64 - x_mean;
            let dy = y - y_mean;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }

        let slope = sxy / sxx;
        let r = if syy > 0.0 {
            sxy / (sxx * syy).sqrt()
        } else {
            0.0
        };

        Some(LinearFit {
            slope,
            intercept: y_mean - slope * x_mean,
            r,
        })
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Trend {
    pub forecaster_id: String,
    pub days: usize,
    pub fit: LinearFit,
}

/// Trends for every roster entry enrolled in a class, sorted by correlation, most negative
/// first.
pub fn calc_trends(
    forecasts: &ForecastTable,
    roster: &Roster,
    semester: Semester,
    year: i32,
) -> Vec<Trend> {
    let mut trends: Vec<Trend> = roster
        .entries()
        .iter()
        .filter(|entry| entry.has_class())
        .filter_map(|entry| {
            let filter = Filter::new()
                .name(&entry.forecaster_id)
                .semester(semester)
                .year(year);

            let mut rows: Vec<&Record> = forecasts.query(&filter);
            rows.sort_by_key(|r| (r.date(), r.identifier().to_owned()));

            let errors: Vec<f64> = rows.iter().map(|r| r.err.total).collect();
            LinearFit::fit(&errors).map(|fit| Trend {
                forecaster_id: entry.forecaster_id.clone(),
                days: errors.len(),
                fit,
            })
        })
        .collect();

    trends.sort_by(|a, b| a.fit.r.partial_cmp(&b.fit.r).unwrap_or(Ordering::Equal));
    trends
}

/// The forecaster with the most negative correlation among those whose errors went down.
pub fn most_improved(trends: &[Trend]) -> Option<&Trend> {
    trends
        .iter()
        .filter(|t| t.fit.slope < 0.0 && t.fit.r < 0.0)
        .min_by(|a, b| a.fit.r.partial_cmp(&b.fit.r).unwrap_or(Ordering::Equal))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fit_perfect_line() {
        let fit = LinearFit::fit(&[10.0, 8.0, 6.0, 4.0]).unwrap();
        assert!((fit.slope + 2.0).abs() < 1.0e-12);
        assert!((fit.intercept - 10.0).abs() < 1.0e-12);
        assert!((fit.r + 1.0).abs() < 1.0e-12);

        assert!(LinearFit::fit(&[1.0]).is_none());

        let flat = LinearFit::fit(&[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(flat.slope, 0.0);
        assert_eq!(flat.r, 0.0);
    }

    #[test]
    fn test_most_improved_skips_worsening() {
        let trend = |id: &str, slope: f64, r: f64| Trend {
            forecaster_id: id.to_owned(),
            days: 8,
            fit: LinearFit {
                slope,
                intercept: 0.0,
                r,
            },
        };

        let trends = vec![
            trend("worse", 1.0, 0.9),
            trend("some", -0.5, -0.4),
            trend("most", -0.2, -0.8),
        ];
        assert_eq!(most_improved(&trends).unwrap().forecaster_id, "most");
        assert!(most_improved(&trends[..1]).is_none());
    }
}
