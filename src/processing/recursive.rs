//! Leaf-wise transformation of nested example structures.

use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::error::{IteratorError, IteratorResult};
use crate::types::{ArrayValue, Map, Value};

/// Default nesting limit for [`recursive_transform`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options for [`recursive_transform_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Stack every list node (at every depth) into an array after transforming its items.
    pub list_to_array: bool,
    /// Maximum nesting depth before failing with [`IteratorError::RecursionLimit`].
    pub max_depth: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            list_to_array: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Applies `func` to every leaf of `value`, keeping the map/list structure.
///
/// Maps and lists are walked; everything else (scalars, strings, arrays, null) is a leaf. With
/// `list_to_array`, lists are stacked via [`stack_values`], e.g. a list of audio paths becomes one
/// array indexed by list position while a map of paths stays a map of arrays.
pub fn recursive_transform<F>(func: F, value: &Value, list_to_array: bool) -> IteratorResult<Value>
where
    F: FnMut(&Value) -> IteratorResult<Value>,
{
    recursive_transform_with(
        func,
        value,
        TransformOptions {
            list_to_array,
            ..Default::default()
        },
    )
}

pub fn recursive_transform_with<F>(
    mut func: F,
    value: &Value,
    options: TransformOptions,
) -> IteratorResult<Value>
where
    F: FnMut(&Value) -> IteratorResult<Value>,
{
    walk(&mut func, value, options, 0)
}

fn walk<F>(func: &mut F, value: &Value, options: TransformOptions, depth: usize) -> IteratorResult<Value>
where
    F: FnMut(&Value) -> IteratorResult<Value>,
{
    if depth > options.max_depth {
        return Err(IteratorError::RecursionLimit {
            limit: options.max_depth,
        });
    }
    match value {
        Value::Map(map) => {
            let out = map
                .iter()
                .map(|(k, v)| -> IteratorResult<(String, Value)> {
                    Ok((k.clone(), walk(func, v, options, depth + 1)?))
                })
                .collect::<IteratorResult<Map>>()?;
            Ok(Value::Map(out))
        }
        Value::List(items) => {
            let out = items
                .iter()
                .map(|v| walk(func, v, options, depth + 1))
                .collect::<IteratorResult<Vec<_>>>()?;
            if options.list_to_array {
                stack_values(out)
            } else {
                Ok(Value::List(out))
            }
        }
        leaf => func(leaf),
    }
}

/// Stacks a list into an array.
///
/// - empty list: 1-d float array of length 0
/// - all integers: 1-d int array; integers mixed with floats: 1-d float array
/// - all arrays of one kind and shape: array with a new leading axis
/// - anything else without arrays or numbers mixed in (strings, maps, ...): left as a list
///
/// Arrays of different shapes or kinds, or arrays mixed with other values, fail.
pub fn stack_values(items: Vec<Value>) -> IteratorResult<Value> {
    if items.is_empty() {
        return Ok(Value::Array(ArrayValue::float_vector(Vec::new())));
    }
    if items.iter().all(|v| matches!(v, Value::Int64(_))) {
        let ints = items.iter().filter_map(Value::as_i64).collect();
        return Ok(Value::Array(ArrayValue::int_vector(ints)));
    }
    if items
        .iter()
        .all(|v| matches!(v, Value::Int64(_) | Value::Float64(_)))
    {
        let floats = items
            .iter()
            .map(|v| match v {
                Value::Int64(i) => *i as f64,
                Value::Float64(f) => *f,
                _ => unreachable!("checked numeric above"),
            })
            .collect();
        return Ok(Value::Array(ArrayValue::float_vector(floats)));
    }
    if items.iter().all(|v| matches!(v, Value::Array(ArrayValue::Float(_)))) {
        let views: Vec<ArrayViewD<'_, f64>> = items
            .iter()
            .filter_map(|v| match v {
                Value::Array(ArrayValue::Float(a)) => Some(a.view()),
                _ => None,
            })
            .collect();
        return Ok(Value::Array(ArrayValue::Float(stack_views(&views)?)));
    }
    if items.iter().all(|v| matches!(v, Value::Array(ArrayValue::Int(_)))) {
        let views: Vec<ArrayViewD<'_, i64>> = items
            .iter()
            .filter_map(|v| match v {
                Value::Array(ArrayValue::Int(a)) => Some(a.view()),
                _ => None,
            })
            .collect();
        return Ok(Value::Array(ArrayValue::Int(stack_views(&views)?)));
    }
    if let Some(bad) = items.iter().find(|v| {
        matches!(v, Value::Array(_) | Value::Int64(_) | Value::Float64(_))
    }) {
        return Err(IteratorError::Stack {
            message: format!("list mixes {} with incompatible values", bad.type_name()),
        });
    }
    Ok(Value::List(items))
}

fn stack_views<T: Clone>(views: &[ArrayViewD<'_, T>]) -> IteratorResult<ArrayD<T>> {
    if let Some(first) = views.first() {
        if let Some(other) = views.iter().find(|v| v.shape() != first.shape()) {
            return Err(IteratorError::Stack {
                message: format!(
                    "arrays have different shapes {:?} and {:?}",
                    first.shape(),
                    other.shape()
                ),
            });
        }
    }
    Ok(ndarray::stack(Axis(0), views)?)
}

#[cfg(test)]
mod tests {
    use super::{TransformOptions, recursive_transform, recursive_transform_with, stack_values};
    use crate::error::{IteratorError, IteratorResult};
    use crate::types::{ArrayValue, Value};
    use serde_json::json;

    fn path_len(v: &Value) -> IteratorResult<Value> {
        match v {
            Value::Utf8(s) => Ok(Value::Array(ArrayValue::float_vector(vec![s.len() as f64; 2]))),
            other => Ok(other.clone()),
        }
    }

    #[test]
    fn leaves_are_transformed_and_structure_kept() {
        let input = Value::from(json!({"a": ["x", "yy"], "b": {"c": "zzz"}}));
        let out = recursive_transform(
            |v: &Value| -> IteratorResult<Value> {
                Ok(Value::Int64(v.as_str().map(str::len).unwrap_or(0) as i64))
            },
            &input,
            false,
        )
        .unwrap();
        assert_eq!(out, Value::from(json!({"a": [1, 2], "b": {"c": 3}})));
    }

    #[test]
    fn list_to_array_stacks_at_every_depth() {
        let input = Value::from(json!({"blue": [["a", "b"], ["c", "d"]], "red": {"c0": "e"}}));
        let out = recursive_transform(path_len, &input, true).unwrap();
        let map = out.as_map().unwrap();
        match &map["blue"] {
            Value::Array(a) => assert_eq!(a.shape(), &[2, 2, 2]),
            other => panic!("expected array, got {other:?}"),
        }
        match &map["red"] {
            Value::Map(red) => assert_eq!(red["c0"].sequence_len(), Some(2)),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn scalars_stack_into_typed_vectors() {
        assert_eq!(
            stack_values(vec![Value::Int64(1), Value::Int64(2)]).unwrap(),
            Value::Array(ArrayValue::int_vector(vec![1, 2]))
        );
        assert_eq!(
            stack_values(vec![Value::Int64(1), Value::Float64(0.5)]).unwrap(),
            Value::Array(ArrayValue::float_vector(vec![1.0, 0.5]))
        );
        assert_eq!(
            stack_values(vec![Value::from("a"), Value::from("b")]).unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn ragged_or_mixed_arrays_fail() {
        let ragged = vec![
            Value::Array(ArrayValue::float_vector(vec![1.0])),
            Value::Array(ArrayValue::float_vector(vec![1.0, 2.0])),
        ];
        assert!(matches!(stack_values(ragged), Err(IteratorError::Stack { .. })));

        let mixed = vec![
            Value::Array(ArrayValue::float_vector(vec![1.0])),
            Value::Array(ArrayValue::int_vector(vec![1])),
        ];
        assert!(matches!(stack_values(mixed), Err(IteratorError::Stack { .. })));
    }

    #[test]
    fn depth_guard_rejects_deep_nesting() {
        let mut value = Value::from("leaf");
        for _ in 0..10 {
            value = Value::List(vec![value]);
        }
        let options = TransformOptions {
            list_to_array: false,
            max_depth: 5,
        };
        assert!(matches!(
            recursive_transform_with(|v: &Value| -> IteratorResult<Value> { Ok(v.clone()) }, &value, options),
            Err(IteratorError::RecursionLimit { limit: 5 })
        ));
    }
}
