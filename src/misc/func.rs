use rand::distributions::Open01;
use rand::Rng;
use std::cmp::Ordering;
use std::ops::AddAssign;

/// Safely compute `ln(sum(exp(xs)))`
///
/// The maximum entry is subtracted before exponentiation, so the result is
/// stable for very small log weights.
///
/// # Example
///
/// ```rust
/// # use provar::misc::logsumexp;
/// let xs: Vec<f64> = vec![0.0; 5];
/// assert!((logsumexp(&xs) - 5.0_f64.ln()).abs() < 1E-12);
/// ```
///
/// # Panics
///
/// Panics on an empty container.
pub fn logsumexp(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        panic!("Empty container");
    }
    xs.iter().copied().logsumexp()
}

/// Iterator extension for the online log-sum-exp
///
/// Keeps a running maximum and rescales the accumulated sum whenever a new
/// maximum appears, so only a single pass over the items is needed.
pub trait LogSumExp: Iterator<Item = f64> + Sized {
    fn logsumexp(self) -> f64 {
        let (sum, maxval) = self.fold(
            (0.0_f64, f64::NEG_INFINITY),
            |(sum, maxval), x| {
                if x == f64::NEG_INFINITY {
                    // exp(-inf) contributes nothing
                    (sum, maxval)
                } else if x > maxval {
                    (sum.mul_add((maxval - x).exp(), 1.0), x)
                } else {
                    (sum + (x - maxval).exp(), maxval)
                }
            },
        );
        if maxval == f64::NEG_INFINITY {
            f64::NEG_INFINITY
        } else {
            sum.ln() + maxval
        }
    }
}

impl<I: Iterator<Item = f64>> LogSumExp for I {}

/// Index of the largest element in `xs`; the first such index on ties
///
/// Returns `None` for an empty slice.
///
/// # Example
///
/// ```rust
/// # use provar::misc::argmax;
/// let xs: Vec<f64> = vec![1.0, 5.0, 3.0, 5.0];
/// assert_eq!(argmax(&xs), Some(1));
/// ```
pub fn argmax(xs: &[f64]) -> Option<usize> {
    if xs.is_empty() {
        return None;
    }
    let mut max_ix = 0;
    let mut maxval = xs[0];
    for (i, &x) in xs.iter().enumerate().skip(1) {
        if let Some(Ordering::Greater) = x.partial_cmp(&maxval) {
            maxval = x;
            max_ix = i;
        }
    }
    Some(max_ix)
}

/// Cumulative sum of `xs`
pub fn cumsum<T>(xs: &[T]) -> Vec<T>
where
    T: AddAssign + Copy + Default,
{
    xs.iter()
        .scan(T::default(), |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

#[inline]
fn binary_search(cws: &[f64], r: f64) -> usize {
    let mut left: usize = 0;
    let mut right: usize = cws.len();
    while left < right {
        let mid = (left + right) / 2;
        if cws[mid] < r {
            left = mid + 1;
        } else {
            right = mid;
        }
    }
    left
}

fn catflip(cws: &[f64], r: f64) -> Option<usize> {
    if cws.len() > 9 {
        let ix = binary_search(cws, r);
        if ix < cws.len() {
            Some(ix)
        } else {
            None
        }
    } else {
        cws.iter().position(|&w| w > r)
    }
}

/// Draw `n` indices in proportion to their `weights`
///
/// The weights need not be normalized.
///
/// # Panics
///
/// Panics if `weights` is empty or a draw lands outside the cumulative
/// weights (all-zero weights).
pub fn pflip<R: Rng + ?Sized>(
    weights: &[f64],
    n: usize,
    rng: &mut R,
) -> Vec<usize> {
    if weights.is_empty() {
        panic!("Empty container");
    }
    let cws: Vec<f64> = cumsum(weights);
    let scale: f64 = *cws.last().unwrap();

    (0..n)
        .map(|_| {
            let r: f64 = rng.sample(Open01);
            match catflip(&cws, r * scale) {
                Some(ix) => ix,
                None => {
                    let wsvec = weights.to_vec();
                    panic!("Could not draw from {:?}", wsvec)
                }
            }
        })
        .collect()
}
