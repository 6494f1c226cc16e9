//! Small statistics helpers shared by multi-period and peer formulas.
//!
//! All functions are total: degenerate inputs return `None` (or a neutral value
//! where documented) instead of NaN.

/// Arithmetic mean; zero for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    match data.len() {
        0 => 0.0,
        n => data.iter().sum::<f64>() / n as f64,
    }
}

/// Sample standard deviation (n - 1 denominator); zero below two points.
pub fn std_dev(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(data);
    let squared: f64 = data.iter().map(|x| (x - m) * (x - m)).sum();
    (squared / (n - 1) as f64).sqrt()
}

/// Standard deviation relative to the absolute mean.
/// `None` when the mean is zero or there are fewer than two points.
pub fn coefficient_of_variation(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data).abs();
    if m < f64::EPSILON {
        return None;
    }
    Some(std_dev(data) / m)
}

/// Compound annual growth rate between two positive values, as a fraction.
pub fn cagr(start: f64, end: f64, years: f64) -> Option<f64> {
    if start <= 0.0 || end <= 0.0 || years <= 0.0 {
        return None;
    }
    Some((end / start).powf(1.0 / years) - 1.0)
}

/// Least-squares slope of `(x, y)` points.
pub fn linear_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if sxx < f64::EPSILON {
        return None;
    }
    let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    Some(sxy / sxx)
}

/// Share of `data` below `value`, with ties counted half, in 0..=1.
/// An empty peer set ranks in the middle.
pub fn percentile_rank(value: f64, data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.5;
    }
    let weight: f64 = data
        .iter()
        .map(|&x| {
            if (x - value).abs() < f64::EPSILON {
                0.5
            } else if x < value {
                1.0
            } else {
                0.0
            }
        })
        .sum();
    weight / data.len() as f64
}
