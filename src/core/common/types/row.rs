use super::value::Value;
use crate::core::common::OxiheapError;

/// A row's column values paired with their null-validity flags.
///
/// `validity[i] == false` marks position `i` as NULL; the paired value slot
/// then holds `Value::Null`. The two vectors always have the same length, and
/// a tuple lives exactly as long as the single operation that produced it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tuple {
    values: Vec<Value>,
    validity: Vec<bool>,
}

impl Tuple {
    /// Pairs explicit values with explicit validity flags.
    ///
    /// A `false` flag marks the position NULL regardless of the paired value;
    /// the row codec persists the flag, not the value, for such positions.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::InvalidInput` if the lengths differ.
    pub fn new(values: Vec<Value>, validity: Vec<bool>) -> Result<Self, OxiheapError> {
        if values.len() != validity.len() {
            return Err(OxiheapError::InvalidInput {
                message: format!(
                    "tuple has {} values but {} validity flags",
                    values.len(),
                    validity.len()
                ),
            });
        }
        Ok(Self { values, validity })
    }

    /// Builds a tuple whose validity flags are derived from `Value::Null` slots.
    #[must_use]
    pub fn from_values(values: Vec<Value>) -> Self {
        let validity = values.iter().map(|v| !v.is_null()).collect();
        Self { values, validity }
    }

    /// Internal constructor for callers that maintain the length invariant
    /// themselves.
    pub(crate) fn from_parts(values: Vec<Value>, validity: Vec<bool>) -> Self {
        debug_assert_eq!(values.len(), validity.len());
        Self { values, validity }
    }

    /// Number of columns in the tuple.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn validity(&self) -> &[bool] {
        &self.validity
    }

    /// Get a value by column index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Whether the column at `index` is NULL. `None` if out of range.
    #[must_use]
    pub fn is_null(&self, index: usize) -> Option<bool> {
        self.validity.get(index).map(|valid| !valid)
    }

    /// Consumes the tuple, handing back its paired vectors.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, Vec<bool>) {
        (self.values, self.validity)
    }
}
