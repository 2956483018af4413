//! # Column Reducers
//!
//! Per-column reduction functions used by group-by aggregation.
//!
//! Built-in reducers skip nulls. `First` and `Last` pick the earliest and
//! latest non-null value in table order. Integer sums saturate instead of
//! overflowing.

use crate::{DataType, SttnError, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Signature of a user-supplied reducer.
pub type ReduceFn = dyn Fn(&[&Value]) -> Result<Value, SttnError> + Send + Sync;

/// A reduction applied to one column within each group.
#[derive(Clone)]
pub enum Reducer {
    Sum,
    Mean,
    Min,
    Max,
    First,
    Last,
    Count,
    /// User-supplied reducer with a declared output type.
    Custom {
        name: String,
        output: DataType,
        func: Arc<ReduceFn>,
    },
}

impl Reducer {
    /// Wrap a closure as a reducer producing values of type `output`.
    pub fn custom<F>(name: impl Into<String>, output: DataType, func: F) -> Self
    where
        F: Fn(&[&Value]) -> Result<Value, SttnError> + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            output,
            func: Arc::new(func),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
            Self::Count => "count",
            Self::Custom { name, .. } => name,
        }
    }

    /// Output type of this reducer for an input column of type `input`.
    pub fn output_type(&self, input: DataType) -> Result<DataType, SttnError> {
        match self {
            Self::Sum => match input {
                DataType::Boolean | DataType::Int32 | DataType::Int64 => Ok(DataType::Int64),
                DataType::Float64 => Ok(DataType::Float64),
                other => Err(self.unsupported(other)),
            },
            Self::Mean => {
                if input.is_numeric() || input == DataType::Boolean {
                    Ok(DataType::Float64)
                } else {
                    Err(self.unsupported(input))
                }
            }
            Self::Min | Self::Max => {
                if input == DataType::Geometry {
                    Err(self.unsupported(input))
                } else {
                    Ok(input)
                }
            }
            Self::First | Self::Last => Ok(input),
            Self::Count => Ok(DataType::Int64),
            Self::Custom { output, .. } => Ok(*output),
        }
    }

    /// Reduce the values of one group. `input` is the column type.
    pub fn reduce(&self, input: DataType, values: &[&Value]) -> Result<Value, SttnError> {
        let mut present = values.iter().copied().filter(|v| !v.is_null());
        match self {
            Self::Sum => match self.output_type(input)? {
                DataType::Float64 => Ok(Value::Float64(
                    present.filter_map(Value::as_f64).sum::<f64>(),
                )),
                _ => Ok(Value::Int64(
                    present
                        .filter_map(Value::as_i64)
                        .fold(0i64, i64::saturating_add),
                )),
            },
            Self::Mean => {
                self.output_type(input)?;
                let numbers: Vec<f64> = present.filter_map(Value::as_f64).collect();
                if numbers.is_empty() {
                    return Ok(Value::Null);
                }
                Ok(Value::Float64(
                    numbers.iter().sum::<f64>() / numbers.len() as f64,
                ))
            }
            Self::Min | Self::Max => {
                self.output_type(input)?;
                let mut best: Option<(&Value, crate::SortKey)> = None;
                for value in present {
                    let key = value.sort_key()?;
                    let replace = match &best {
                        None => true,
                        Some((_, current)) => match self {
                            Self::Min => key < *current,
                            _ => key > *current,
                        },
                    };
                    if replace {
                        best = Some((value, key));
                    }
                }
                Ok(best.map_or(Value::Null, |(v, _)| v.clone()))
            }
            Self::First => Ok(present.next().cloned().unwrap_or(Value::Null)),
            Self::Last => Ok(present.last().cloned().unwrap_or(Value::Null)),
            Self::Count => Ok(Value::Int64(present.count() as i64)),
            Self::Custom { func, .. } => func(values),
        }
    }

    fn unsupported(&self, input: DataType) -> SttnError {
        SttnError::TypeMismatch(format!(
            "reducer '{}' cannot be applied to {} columns",
            self.name(),
            input
        ))
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { name, output, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("output", output)
                .finish(),
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reducer {
    type Err = SttnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "mean" | "avg" => Ok(Self::Mean),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "count" => Ok(Self::Count),
            _ => Err(SttnError::UnknownReducer(s.to_string())),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
