/// Calculate Simple Moving Average over the trailing `period` values
///
/// Returns None if insufficient data
pub fn calculate_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let sum: f64 = values[values.len() - period..].iter().sum();
    Some(sum / period as f64)
}

/// Calculate Exponential Moving Average with smoothing factor 2/(period+1)
///
/// Seeded with the SMA of the first `period` values, then smoothed across
/// the remainder of the series. Returns None if insufficient data.
pub fn calculate_ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;

    let mut ema = seed;
    for value in &values[period..] {
        ema = alpha * value + (1.0 - alpha) * ema;
    }

    Some(ema)
}
