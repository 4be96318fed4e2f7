//! Travel times from a matrix of areas by units.
//!
//! The matrix is a [`ValueTable`] with one column per unit (e.g. a
//! hospital postcode) holding the travel time in minutes from each area.

use crate::data_loader::ValueTable;
use crate::error::{BandMapError, Result};

/// Column holding `unit1 - unit2` in a comparison table
pub const DIFF_COLUMN: &str = "diff";

/// Travel times to one unit
pub fn travel_time<'a>(table: &'a ValueTable, unit: &str) -> Result<&'a [f64]> {
    table.column(unit).map_err(|_| unknown_unit(unit))
}

/// Per-area `unit1 - unit2`; all zeros when the two units are the same.
///
/// A positive value means `unit2` is closer.
pub fn time_difference(table: &ValueTable, unit1: &str, unit2: &str) -> Result<Vec<f64>> {
    let first = travel_time(table, unit1)?;
    if unit1 == unit2 {
        return Ok(vec![0.0; first.len()]);
    }
    let second = travel_time(table, unit2)?;
    Ok(first.iter().zip(second).map(|(a, b)| a - b).collect())
}

/// Table of the two units' times plus their difference in [`DIFF_COLUMN`]
pub fn compare_units(table: &ValueTable, unit1: &str, unit2: &str) -> Result<ValueTable> {
    let diff = time_difference(table, unit1, unit2)?;
    let mut columns = std::collections::BTreeMap::new();
    columns.insert(unit1.to_string(), travel_time(table, unit1)?.to_vec());
    columns.insert(unit2.to_string(), travel_time(table, unit2)?.to_vec());

    ValueTable {
        id_column: table.id_column.clone(),
        ids: table.ids.clone(),
        columns,
    }
    .with_column(DIFF_COLUMN, diff)
}

fn unknown_unit(unit: &str) -> BandMapError {
    BandMapError::DataNotFound {
        message: format!("Unit '{}' not found in travel time matrix", unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::read_value_table;

    fn matrix() -> ValueTable {
        let csv = "LSOA,LE15WW,TA15DA\n\
                   Area 001A,12.0,80.5\n\
                   Area 001B,45.0,30.0\n\
                   Area 001C,,20.0\n";
        read_value_table(csv.as_bytes(), "LSOA").unwrap()
    }

    #[test]
    fn test_travel_time() {
        let table = matrix();
        assert_eq!(travel_time(&table, "TA15DA").unwrap(), &[80.5, 30.0, 20.0]);
        assert!(matches!(
            travel_time(&table, "XX11XX").unwrap_err(),
            BandMapError::DataNotFound { .. }
        ));
    }

    #[test]
    fn test_time_difference() {
        let table = matrix();
        let diff = time_difference(&table, "LE15WW", "TA15DA").unwrap();
        assert_eq!(diff[0], -68.5);
        assert_eq!(diff[1], 15.0);
        assert!(diff[2].is_nan());
    }

    #[test]
    fn test_same_unit_is_zero() {
        let table = matrix();
        let diff = time_difference(&table, "LE15WW", "LE15WW").unwrap();
        assert_eq!(diff, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unknown_second_unit() {
        let table = matrix();
        assert!(time_difference(&table, "LE15WW", "nope").is_err());
    }

    #[test]
    fn test_compare_units() {
        let table = matrix();
        let comparison = compare_units(&table, "LE15WW", "TA15DA").unwrap();
        assert_eq!(
            comparison.column_names(),
            vec!["LE15WW", "TA15DA", DIFF_COLUMN]
        );
        assert_eq!(comparison.column(DIFF_COLUMN).unwrap()[1], 15.0);
        assert_eq!(comparison.ids, table.ids);
    }
}
