use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{Date, Integer, Nullable};
use diesel::sqlite::{Sqlite, SqliteConnection};

use super::query::{self, BeverageColumn, BeverageFilter, JoinMode};
use super::Query;
use crate::error::{Error, Result};
use crate::models::{Beverage, BeverageFields, BeverageRow, FINISHED_LOCATION_ID};
use crate::schema::{beverages, locations};

/// Beverages may only point at an existing location or at the finished sentinel.
fn ensure_location(conn: &mut SqliteConnection, location_id: i32) -> Result<()> {
    if location_id == FINISHED_LOCATION_ID {
        return Ok(());
    }

    let exists = diesel::select(diesel::dsl::exists(locations::table.find(location_id)))
        .get_result::<bool>(conn)?;
    if !exists {
        return Err(Error::ConstraintViolation(format!(
            "location {} does not exist",
            location_id
        )));
    }
    Ok(())
}

/*************************************/
/** Get Beverage query              **/
/*************************************/

/// Look up one beverage. The location is outer-joined so finished beverages
/// and beverages whose location is gone still resolve.
#[derive(Clone)]
pub struct GetBeverage {
    pub id: i32,
}

impl Query for GetBeverage {
    type Item = Beverage;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        beverages::table
            .left_join(locations::table)
            .filter(beverages::id.eq(self.id))
            .select((
                beverages::id,
                beverages::name,
                sql::<Nullable<Integer>>(BeverageColumn::Year.expression()),
                sql::<Nullable<Date>>(BeverageColumn::PurchaseDate.expression()),
                sql::<Nullable<Date>>(BeverageColumn::DrinkBefore.expression()),
                beverages::notes,
                beverages::location_id,
                locations::name.nullable(),
            ))
            .first::<Beverage>(conn)
            .optional()?
            .ok_or(Error::NotFound("Beverage"))
    }
}

/*************************************/
/** List Beverages query            **/
/*************************************/

#[derive(Clone, Debug)]
pub struct ListBeverages {
    pub columns: Vec<BeverageColumn>,
    pub join: JoinMode,
    pub filter: BeverageFilter,
}

impl ListBeverages {
    /// The projection used by the listing pages, outer-joined.
    pub fn listing(filter: BeverageFilter) -> ListBeverages {
        ListBeverages {
            columns: BeverageColumn::LISTING.to_vec(),
            join: JoinMode::LeftOuter,
            filter,
        }
    }
}

impl Query for ListBeverages {
    type Item = Vec<BeverageRow>;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        let select = query::build(&self.columns, self.join, self.filter);

        let mut statement = diesel::sql_query(select.sql).into_boxed::<Sqlite>();
        for value in select.binds {
            statement = statement.bind::<Integer, _>(value);
        }

        statement
            .load::<BeverageRow>(conn)
            .map_err(Error::QueryError)
    }
}

/*************************************/
/** Create Beverage message         **/
/*************************************/

#[derive(Clone)]
pub struct CreateBeverage {
    pub fields: BeverageFields,
}

impl Query for CreateBeverage {
    type Item = Beverage;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        let new_beverage = self.fields.validate()?;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            ensure_location(conn, new_beverage.location_id)?;

            let id = diesel::insert_into(beverages::table)
                .values(&new_beverage)
                .returning(beverages::id)
                .get_result::<i32>(conn)?;

            GetBeverage { id }.execute(conn)
        })
    }
}

/*************************************/
/** Update Beverage message         **/
/*************************************/

#[derive(Clone)]
pub struct UpdateBeverage {
    pub id: i32,
    pub fields: BeverageFields,
}

impl Query for UpdateBeverage {
    type Item = Beverage;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        let changes = self.fields.validate()?;
        let id = self.id;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            ensure_location(conn, changes.location_id)?;

            let updated = diesel::update(beverages::table.find(id))
                .set(&changes)
                .execute(conn)?;
            if updated == 0 {
                return Err(Error::NotFound("Beverage"));
            }

            GetBeverage { id }.execute(conn)
        })
    }
}

/*************************************/
/** Finish Beverage message         **/
/*************************************/

/// Move a beverage to the finished sentinel. Finishing twice is the same as
/// finishing once. Returns the beverage as it was before the change.
#[derive(Clone)]
pub struct FinishBeverage {
    pub id: i32,
}

impl Query for FinishBeverage {
    type Item = Beverage;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        let id = self.id;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            let beverage = GetBeverage { id }.execute(conn)?;

            diesel::update(beverages::table.find(id))
                .set(beverages::location_id.eq(FINISHED_LOCATION_ID))
                .execute(conn)?;

            Ok(beverage)
        })
    }
}

/*************************************/
/** Delete Beverage message         **/
/*************************************/

/// Permanently remove a beverage. Returns the deleted record.
#[derive(Clone)]
pub struct DeleteBeverage {
    pub id: i32,
}

impl Query for DeleteBeverage {
    type Item = Beverage;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        let id = self.id;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            let beverage = GetBeverage { id }.execute(conn)?;
            diesel::delete(beverages::table.find(id)).execute(conn)?;
            Ok(beverage)
        })
    }
}
