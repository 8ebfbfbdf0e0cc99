use crate::core::common::types::{TransactionId, Tuple, Value};
use crate::core::common::OxiheapError;

/// How declared output columns map onto a table's base columns. Resolved
/// once when a scan opens, then reused for every row it yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Output arity equals the base column count.
    Plain,
    /// Two trailing columns carry the raw creator and deleter transaction
    /// ids of each row version.
    Annotated,
}

/// Validates a declared output arity against the table's base arity.
///
/// # Errors
///
/// Returns `OxiheapError::SchemaMismatch` unless the declared arity is the
/// base arity or the base arity plus two.
pub fn reconcile(base_arity: usize, declared_arity: usize) -> Result<ProjectionMode, OxiheapError> {
    if declared_arity == base_arity {
        Ok(ProjectionMode::Plain)
    } else if declared_arity == base_arity + 2 {
        Ok(ProjectionMode::Annotated)
    } else {
        Err(OxiheapError::SchemaMismatch { declared: declared_arity, base: base_arity })
    }
}

/// One decoded physical row version: its column values with validity flags,
/// and the raw transaction counters stamped on it. Produced by one pull of
/// the scan, consumed by projection in that same pull.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTupleVersion {
    pub tuple: Tuple,
    pub creator: TransactionId,
    pub deleter: TransactionId,
}

/// Shapes a raw row version into the declared output row.
///
/// Base columns pass through value-for-value with their validity flags. In
/// annotated mode the creator and deleter counters are appended as two
/// trailing non-null integers, zero-extended from u32 so every raw counter
/// value survives, wraparound values included. The bits are never
/// reinterpreted as a signed 32-bit quantity.
#[must_use]
pub fn project(raw: RawTupleVersion, mode: ProjectionMode) -> Tuple {
    match mode {
        ProjectionMode::Plain => raw.tuple,
        ProjectionMode::Annotated => {
            let (mut values, mut validity) = raw.tuple.into_parts();
            values.push(Value::Integer(i64::from(raw.creator.0)));
            validity.push(true);
            values.push(Value::Integer(i64::from(raw.deleter.0)));
            validity.push(true);
            Tuple::from_parts(values, validity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: Vec<Value>, creator: u32, deleter: u32) -> RawTupleVersion {
        RawTupleVersion {
            tuple: Tuple::from_values(values),
            creator: TransactionId(creator),
            deleter: TransactionId(deleter),
        }
    }

    #[test]
    fn reconcile_accepts_base_arity() {
        assert_eq!(reconcile(2, 2).unwrap(), ProjectionMode::Plain);
        assert_eq!(reconcile(0, 0).unwrap(), ProjectionMode::Plain);
    }

    #[test]
    fn reconcile_accepts_base_arity_plus_two() {
        assert_eq!(reconcile(2, 4).unwrap(), ProjectionMode::Annotated);
        assert_eq!(reconcile(0, 2).unwrap(), ProjectionMode::Annotated);
    }

    #[test]
    fn reconcile_rejects_everything_else() {
        for declared in [0, 1, 3, 5, 7] {
            match reconcile(2, declared) {
                Err(OxiheapError::SchemaMismatch { declared: d, base }) => {
                    assert_eq!(d, declared);
                    assert_eq!(base, 2);
                }
                other => panic!("arity {}: expected SchemaMismatch, got {:?}", declared, other),
            }
        }
    }

    #[test]
    fn plain_projection_is_a_passthrough() {
        let source = raw(vec![Value::Integer(1), Value::Null], 100, 0);
        let expected = source.tuple.clone();
        let out = project(source, ProjectionMode::Plain);
        assert_eq!(out, expected);
        assert_eq!(out.arity(), 2);
    }

    #[test]
    fn annotated_projection_appends_raw_counters() {
        let out = project(raw(vec![Value::Text("x".into()), Value::Null], 101, 105),
            ProjectionMode::Annotated);
        assert_eq!(out.arity(), 4);
        assert_eq!(out.get(0), Some(&Value::Text("x".into())));
        assert_eq!(out.is_null(1), Some(true));
        assert_eq!(out.get(2), Some(&Value::Integer(101)));
        assert_eq!(out.get(3), Some(&Value::Integer(105)));
        // metadata columns are never null, a zero deleter included
        assert_eq!(out.is_null(2), Some(false));
        assert_eq!(out.is_null(3), Some(false));
    }

    #[test]
    fn zero_deleter_passes_through_as_zero_not_null() {
        let out = project(raw(vec![Value::Integer(1)], 100, 0), ProjectionMode::Annotated);
        assert_eq!(out.get(2), Some(&Value::Integer(0)));
        assert_eq!(out.is_null(2), Some(false));
    }

    #[test]
    fn counters_at_the_wraparound_boundary_are_not_resigned() {
        let out = project(
            raw(vec![], u32::MAX, u32::MAX - 1),
            ProjectionMode::Annotated,
        );
        assert_eq!(out.get(0), Some(&Value::Integer(i64::from(u32::MAX))));
        assert_eq!(out.get(1), Some(&Value::Integer(i64::from(u32::MAX) - 1)));
    }
}
