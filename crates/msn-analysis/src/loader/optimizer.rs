//! Column storage narrowing.
//!
//! Integer columns, and float columns holding only whole numbers, are cast
//! to the smallest integer type that fits their value range. Values are not
//! changed, only their physical representation.
//!
//! Text columns (see [`is_text_column`]) are left alone even when they hold
//! numbers, since casting `1.0` to an integer would turn id `"1.0"` into
//! `"1"`.

use crate::error::Result;
use crate::loader::column_names;
use crate::schema::is_text_column;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One column whose dtype was narrowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConversion {
    pub column: String,
    pub from: String,
    pub to: String,
}

/// Outcome of [`MemoryOptimizer::optimize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub conversions: Vec<ColumnConversion>,
    /// Estimated in-memory size before narrowing.
    pub bytes_before: usize,
    /// Estimated in-memory size after narrowing.
    pub bytes_after: usize,
}

/// Narrows numeric column storage of a DataFrame.
pub struct MemoryOptimizer;

impl MemoryOptimizer {
    /// Narrow every numeric column that allows it.
    pub fn optimize(mut df: DataFrame) -> Result<(DataFrame, OptimizationReport)> {
        let bytes_before = df.estimated_size();
        let mut conversions = Vec::new();

        for name in column_names(&df) {
            if is_text_column(&name) {
                continue;
            }
            let series = df.column(&name)?.as_materialized_series().clone();
            let Some(target) = Self::narrowest_dtype(&series)? else {
                continue;
            };
            if &target == series.dtype() {
                continue;
            }

            let narrowed = series.cast(&target)?;
            debug!("Narrowed column '{}' from {} to {}", name, series.dtype(), target);
            conversions.push(ColumnConversion {
                column: name.clone(),
                from: series.dtype().to_string(),
                to: target.to_string(),
            });
            df.replace(&name, narrowed)?;
        }

        let report = OptimizationReport {
            conversions,
            bytes_before,
            bytes_after: df.estimated_size(),
        };

        info!(
            "Memory optimization: {} columns narrowed, {} -> {} bytes",
            report.conversions.len(),
            report.bytes_before,
            report.bytes_after
        );

        Ok((df, report))
    }

    /// Smallest integer dtype able to hold every value of `series`.
    ///
    /// `None` for non-numeric columns, all-null columns and float columns
    /// with fractional values.
    fn narrowest_dtype(series: &Series) -> Result<Option<DataType>> {
        let dtype = series.dtype();
        if !is_numeric_dtype(dtype) {
            return Ok(None);
        }

        if !dtype.is_integer() && !Self::all_whole_numbers(series)? {
            return Ok(None);
        }

        let (Some(min), Some(max)) = (series.min::<f64>()?, series.max::<f64>()?) else {
            return Ok(None);
        };

        Ok(integer_dtype_for_range(min, max))
    }

    fn all_whole_numbers(series: &Series) -> Result<bool> {
        let floats = series.cast(&DataType::Float64)?;
        let whole = floats
            .f64()?
            .into_iter()
            .flatten()
            .all(|v| v.is_finite() && v.fract() == 0.0);
        Ok(whole)
    }
}

/// Narrowest integer type covering `[min, max]`, up to 32 bits.
pub(crate) fn integer_dtype_for_range(min: f64, max: f64) -> Option<DataType> {
    if min >= 0.0 {
        if max <= u8::MAX as f64 {
            Some(DataType::UInt8)
        } else if max <= u16::MAX as f64 {
            Some(DataType::UInt16)
        } else if max <= u32::MAX as f64 {
            Some(DataType::UInt32)
        } else {
            None
        }
    } else if min >= i8::MIN as f64 && max <= i8::MAX as f64 {
        Some(DataType::Int8)
    } else if min >= i16::MIN as f64 && max <= i16::MAX as f64 {
        Some(DataType::Int16)
    } else if min >= i32::MIN as f64 && max <= i32::MAX as f64 {
        Some(DataType::Int32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DOCUMENT_ID, PAGE_VIEWS, SOURCE_ID};
    use crate::utils::{count_values, string_values};

    #[test]
    fn test_integer_dtype_for_range() {
        assert_eq!(integer_dtype_for_range(0.0, 200.0), Some(DataType::UInt8));
        assert_eq!(integer_dtype_for_range(0.0, 60_000.0), Some(DataType::UInt16));
        assert_eq!(integer_dtype_for_range(0.0, 5e9), None);
        assert_eq!(integer_dtype_for_range(-5.0, 100.0), Some(DataType::Int8));
        assert_eq!(integer_dtype_for_range(-5.0, 1000.0), Some(DataType::Int16));
    }

    #[test]
    fn test_optimize_narrows_and_preserves_values() {
        let df = df!(
            "views" => [10i64, 20_000, 3],
            "likes" => [Some(1.0f64), None, Some(4.0)],
            "rate" => [0.5f64, 1.25, 2.0],
            "title" => ["a", "b", "c"]
        )
        .unwrap();

        let (optimized, report) = MemoryOptimizer::optimize(df.clone()).unwrap();

        assert_eq!(optimized.column("views").unwrap().dtype(), &DataType::UInt16);
        assert_eq!(optimized.column("likes").unwrap().dtype(), &DataType::UInt8);
        assert_eq!(optimized.column("rate").unwrap().dtype(), &DataType::Float64);
        assert_eq!(optimized.column("title").unwrap().dtype(), &DataType::String);
        assert_eq!(report.conversions.len(), 2);
        assert!(report.bytes_after <= report.bytes_before);

        assert_eq!(
            count_values(&optimized, "views").unwrap(),
            count_values(&df, "views").unwrap()
        );
        assert_eq!(
            optimized.column("likes").unwrap().null_count(),
            df.column("likes").unwrap().null_count()
        );
    }

    #[test]
    fn test_optimize_leaves_id_columns_untouched() {
        let df = df!(
            DOCUMENT_ID => [1.0f64, 2.0],
            SOURCE_ID => [5i64, 6],
            PAGE_VIEWS => [10.0f64, 20.0]
        )
        .unwrap();

        let (optimized, report) = MemoryOptimizer::optimize(df.clone()).unwrap();

        assert_eq!(optimized.column(DOCUMENT_ID).unwrap().dtype(), &DataType::Float64);
        assert_eq!(optimized.column(SOURCE_ID).unwrap().dtype(), &DataType::Int64);
        assert_eq!(optimized.column(PAGE_VIEWS).unwrap().dtype(), &DataType::UInt8);
        assert_eq!(report.conversions.len(), 1);
        assert_eq!(report.conversions[0].column, PAGE_VIEWS);
        assert_eq!(
            string_values(&optimized, DOCUMENT_ID).unwrap(),
            string_values(&df, DOCUMENT_ID).unwrap()
        );
    }

    #[test]
    fn test_optimize_skips_all_null_column() {
        let df = df!("empty" => [None::<i64>, None]).unwrap();
        let (optimized, report) = MemoryOptimizer::optimize(df).unwrap();
        assert!(report.conversions.is_empty());
        assert_eq!(optimized.column("empty").unwrap().dtype(), &DataType::Int64);
    }
}
