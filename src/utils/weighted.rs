use rand::Rng;

/// Weighted pick over integer weight units: P(i) = weights[i] / total.
/// Zero and negative weights never win. Returns the chosen index, or
/// None when nothing has positive weight.
///
/// Rolls one value in [0, total) and walks the cumulative sum, so the
/// cost is one RNG call per pick.
pub fn pick_weighted_index<R: Rng + ?Sized>(weights: &[i64], rng: &mut R) -> Option<usize> {
    let total: i64 = weights.iter().filter(|w| **w > 0).sum();
    if total <= 0 {
        return None;
    }

    let roll = rng.random_range(0..total);
    let mut acc = 0i64;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0 {
            continue;
        }
        acc += w;
        if roll < acc {
            return Some(i);
        }
    }
    None
}
