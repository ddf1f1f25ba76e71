//! Label conversion and the single-row prediction engine.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::error::{HyperError, HyperResult};
use crate::common::time;
use crate::data::{load_records, Cell};
use crate::pipeline::FittedPipeline;

use super::service::project;

/// Type a prediction is delivered as.
pub trait Label: Sized {
    fn from_cell(cell: &Cell) -> HyperResult<Self>;
}

fn unreadable(cell: &Cell, target: &str) -> HyperError {
    HyperError::InvalidData(format!("prediction `{cell}` cannot be read as {target}"))
}

impl Label for bool {
    fn from_cell(cell: &Cell) -> HyperResult<Self> {
        cell.as_bool().ok_or_else(|| unreadable(cell, "bool"))
    }
}

impl Label for String {
    fn from_cell(cell: &Cell) -> HyperResult<Self> {
        Ok(cell.to_string())
    }
}

impl Label for Cell {
    fn from_cell(cell: &Cell) -> HyperResult<Self> {
        Ok(cell.clone())
    }
}

macro_rules! float_label {
    ($($ty:ty),*) => {$(
        impl Label for $ty {
            fn from_cell(cell: &Cell) -> HyperResult<Self> {
                cell.as_f64()
                    .map(|v| v as $ty)
                    .ok_or_else(|| unreadable(cell, stringify!($ty)))
            }
        }
    )*};
}

macro_rules! integer_label {
    ($($ty:ty),*) => {$(
        impl Label for $ty {
            fn from_cell(cell: &Cell) -> HyperResult<Self> {
                let range = <$ty>::MIN as f64..=<$ty>::MAX as f64;
                cell.as_f64()
                    .filter(|v| v.fract() == 0.0 && range.contains(v))
                    .map(|v| v as $ty)
                    .ok_or_else(|| unreadable(cell, stringify!($ty)))
            }
        }
    )*};
}

float_label!(f32, f64);
integer_label!(i32, i64, u32, u64, usize);

/// Single-row predictor bound to one fitted pipeline.
///
/// Not shareable: every call takes `&mut self`.
pub struct PredictionEngine<T, L> {
    pipeline: FittedPipeline,
    served: u64,
    _marker: PhantomData<fn(&T) -> L>,
}

impl<T, L> PredictionEngine<T, L>
where
    T: Serialize + DeserializeOwned,
    L: Label,
{
    pub fn new(pipeline: FittedPipeline) -> Self {
        Self {
            pipeline,
            served: 0,
            _marker: PhantomData,
        }
    }

    pub fn predict(&mut self, item: &T) -> HyperResult<L> {
        let start = time::now_ms();
        let records = load_records(std::slice::from_ref(item))?;
        let view = self.pipeline.transform(&records)?;
        let label = project::<L>(&view)?
            .pop()
            .ok_or_else(|| HyperError::InvalidData("pipeline produced no rows".into()))?;
        self.served += 1;
        tracing::trace!(
            served = self.served,
            latency_ms = time::elapsed_ms(start) as u64,
            "single-row prediction"
        );
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_must_be_whole() {
        assert_eq!(u32::from_cell(&Cell::Number(3.0)).unwrap(), 3);
        assert!(u32::from_cell(&Cell::Number(2.5)).is_err());
        assert!(u32::from_cell(&Cell::Number(-1.0)).is_err());
        assert_eq!(i64::from_cell(&Cell::Number(-4.0)).unwrap(), -4);
    }

    #[test]
    fn labels_convert_from_cells() {
        assert!(bool::from_cell(&Cell::Bool(true)).unwrap());
        assert!(bool::from_cell(&Cell::Text("setosa".into())).is_err());
        let species = Cell::Text("setosa".into());
        assert_eq!(String::from_cell(&species).unwrap(), "setosa");
        assert_eq!(f32::from_cell(&Cell::Number(1.5)).unwrap(), 1.5);
        assert_eq!(String::from_cell(&Cell::Bool(false)).unwrap(), "false");
    }
}
