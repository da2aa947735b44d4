/// Accuracy from the sum of absolute channel differences: `1 - SAD / (len * 255)`.
///
/// Returns `0.0` for empty or mismatched buffers.
pub(crate) fn sad_accuracy(target: &[u8], candidate: &[u8]) -> f32 {
    if target.len() != candidate.len() || target.is_empty() {
        return 0.0;
    }
    let sad: u64 = target
        .iter()
        .zip(candidate)
        .map(|(&a, &b)| a.abs_diff(b) as u64)
        .sum();
    1.0 - (sad as f64 / (target.len() as f64 * 255.0)) as f32
}

/// Accuracy from the sum of squared channel differences: `1 - SSD / (len * 255^2)`.
pub(crate) fn mse_accuracy(target: &[u8], candidate: &[u8]) -> f32 {
    if target.len() != candidate.len() || target.is_empty() {
        return 0.0;
    }
    let ssd: u64 = target
        .iter()
        .zip(candidate)
        .map(|(&a, &b)| {
            let d = a.abs_diff(b) as u64;
            d * d
        })
        .sum();
    1.0 - (ssd as f64 / (target.len() as f64 * 255.0 * 255.0)) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/engine/scoring.rs"]
mod tests;
