use crate::table::{Table, TableError};
use crate::types::Capital;

pub const NAME_FIELD: &str = "Capital";
pub const LATITUDE_FIELD: &str = "Latitude";
pub const LONGITUDE_FIELD: &str = "Longitude";

/// Builds one `Capital` per table row, in row order.
///
/// Values are taken as-is: coordinates outside the valid range are not
/// rejected. The first row missing a required field aborts the whole parse.
pub fn parse_capitals(table: &Table) -> Result<Vec<Capital>, TableError> {
    table
        .rows()
        .map(|row| {
            Ok(Capital {
                name: row.text(NAME_FIELD)?.to_string(),
                latitude: row.number(LATITUDE_FIELD)?,
                longitude: row.number(LONGITUDE_FIELD)?,
            })
        })
        .collect()
}
