//! Builds the projected beverage listing.
//!
//! Callers pick the columns, the join against `locations` and one of a fixed set
//! of filters. Filter values are always sent as bound parameters.

use crate::models::FINISHED_LOCATION_ID;

/// A column that can be projected into a `BeverageRow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeverageColumn {
    Id,
    Name,
    Year,
    PurchaseDate,
    DrinkBefore,
    Notes,
    LocationId,
    LocationName,
}

impl BeverageColumn {
    pub const ALL: [BeverageColumn; 8] = [
        BeverageColumn::Id,
        BeverageColumn::Name,
        BeverageColumn::Year,
        BeverageColumn::PurchaseDate,
        BeverageColumn::DrinkBefore,
        BeverageColumn::Notes,
        BeverageColumn::LocationId,
        BeverageColumn::LocationName,
    ];

    /// The columns shown on the listing pages.
    pub const LISTING: [BeverageColumn; 5] = [
        BeverageColumn::Id,
        BeverageColumn::Name,
        BeverageColumn::Year,
        BeverageColumn::LocationId,
        BeverageColumn::LocationName,
    ];

    const DEFAULT: [BeverageColumn; 2] = [BeverageColumn::Id, BeverageColumn::Name];

    /// Stores written by older clients hold `''` for blank years and dates, so
    /// those read back as NULL.
    pub(super) fn expression(self) -> &'static str {
        match self {
            Self::Id => "beverages.beverageId",
            Self::Name => "beverages.beverageName",
            Self::Year => "NULLIF(beverages.beverageYear, '')",
            Self::PurchaseDate => "NULLIF(beverages.beveragePurchaseDate, '')",
            Self::DrinkBefore => "NULLIF(beverages.beverageDrinkBefore, '')",
            Self::Notes => "beverages.beverageNotes",
            Self::LocationId => "beverages.beverageLocationId",
            Self::LocationName => "locations.locationName",
        }
    }

    /// Must match the field names of `BeverageRow`.
    fn alias(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Year => "year",
            Self::PurchaseDate => "purchase_date",
            Self::DrinkBefore => "drink_before",
            Self::Notes => "notes",
            Self::LocationId => "location_id",
            Self::LocationName => "location_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    Inner,
    LeftOuter,
}

impl Default for JoinMode {
    fn default() -> Self {
        JoinMode::LeftOuter
    }
}

impl JoinMode {
    fn keyword(self) -> &'static str {
        match self {
            JoinMode::Inner => "INNER JOIN",
            JoinMode::LeftOuter => "LEFT JOIN",
        }
    }
}

/// Restriction applied to a beverage listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeverageFilter {
    NoFilter,
    LocationEquals(i32),
    /// Finished beverages.
    LocationIsZero,
    /// Beverages still in storage.
    LocationIsNonZero,
}

impl Default for BeverageFilter {
    fn default() -> Self {
        BeverageFilter::NoFilter
    }
}

impl BeverageFilter {
    fn clause(self) -> Option<(&'static str, i32)> {
        match self {
            BeverageFilter::NoFilter => None,
            BeverageFilter::LocationEquals(id) => Some(("beverages.beverageLocationId = ?", id)),
            BeverageFilter::LocationIsZero => {
                Some(("beverages.beverageLocationId = ?", FINISHED_LOCATION_ID))
            }
            BeverageFilter::LocationIsNonZero => {
                Some(("beverages.beverageLocationId <> ?", FINISHED_LOCATION_ID))
            }
        }
    }
}

/// SQL text plus the integer parameters to bind, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub sql: String,
    pub binds: Vec<i32>,
}

/// Assemble the listing query.
///
/// Requested columns come first, in the caller's order and including repeats.
/// Every other `BeverageRow` field is selected as `NULL` so rows always decode.
/// An empty column list selects id and name.
pub fn build(columns: &[BeverageColumn], join: JoinMode, filter: BeverageFilter) -> SelectQuery {
    let columns = if columns.is_empty() {
        &BeverageColumn::DEFAULT[..]
    } else {
        columns
    };

    let mut projection: Vec<String> = columns
        .iter()
        .map(|c| format!("{} AS {}", c.expression(), c.alias()))
        .collect();
    projection.extend(
        BeverageColumn::ALL
            .iter()
            .filter(|c| !columns.contains(c))
            .map(|c| format!("NULL AS {}", c.alias())),
    );

    let mut sql = format!(
        "SELECT {} FROM beverages {} locations ON beverages.beverageLocationId = locations.locationId",
        projection.join(", "),
        join.keyword()
    );

    let mut binds = Vec::new();
    if let Some((clause, value)) = filter.clause() {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
        binds.push(value);
    }

    sql.push_str(" ORDER BY beverages.beverageName ASC");

    SelectQuery { sql, binds }
}
