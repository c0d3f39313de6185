//! Named, batched variable values
use nalgebra::DMatrix;
use std::collections::BTreeMap;

/// Mapping from variable name to a batched value.
///
/// Rows are the batch axis; for series variables the rows are the time axis.
/// Columns are the event dimensions of the variable.
pub type VarMap = BTreeMap<String, DMatrix<f64>>;

/// Subset of `x` restricted to the variables named in `keys`
///
/// Names absent from `x` are silently skipped; callers that require a
/// variable surface the error at evaluation time.
///
/// # Example
///
/// ```rust
/// # use provar::data::get_values;
/// # use provar::varmap;
/// use nalgebra::DMatrix;
///
/// let x = varmap! {
///     "x" => DMatrix::from_element(2, 1, 0.5),
///     "h" => DMatrix::from_element(2, 3, 0.1)
/// };
/// let xs = get_values(&x, &["x".to_string()]);
///
/// assert_eq!(xs.len(), 1);
/// assert!(xs.contains_key("x"));
/// ```
pub fn get_values(x: &VarMap, keys: &[String]) -> VarMap {
    keys.iter()
        .filter_map(|k| x.get(k).map(|v| (k.clone(), v.clone())))
        .collect()
}

/// Build a [`VarMap`] from `name => value` pairs
///
/// # Example
///
/// ```rust
/// # use provar::varmap;
/// use nalgebra::DMatrix;
///
/// let x = varmap! { "x" => DMatrix::from_element(4, 2, 1.0) };
/// assert_eq!(x["x"].nrows(), 4);
/// ```
#[macro_export]
macro_rules! varmap {
    () => { $crate::data::VarMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::data::VarMap::new();
        $(
            map.insert(String::from($key), $value);
        )+
        map
    }};
}
