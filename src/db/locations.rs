use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use super::Query;
use crate::error::{Error, Result};
use crate::models::{Location, NewLocation};
use crate::schema::{beverages, locations};

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::ValidationError("Name is required.".to_owned()));
    }
    Ok(name)
}

/*************************************/
/** List Locations query            **/
/*************************************/

/// All locations, sorted by name.
#[derive(Clone, Copy)]
pub struct ListLocations;

impl Query for ListLocations {
    type Item = Vec<Location>;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        Ok(locations::table
            .order(locations::name.asc())
            .load::<Location>(conn)?)
    }
}

/*************************************/
/** Get Location query              **/
/*************************************/

#[derive(Clone)]
pub struct GetLocation {
    pub id: i32,
}

impl Query for GetLocation {
    type Item = Location;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        locations::table
            .find(self.id)
            .first::<Location>(conn)
            .optional()?
            .ok_or(Error::NotFound("Location"))
    }
}

/*************************************/
/** Create Location message         **/
/*************************************/

#[derive(Clone)]
pub struct CreateLocation {
    pub name: String,
}

impl Query for CreateLocation {
    type Item = Location;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        let new_location = NewLocation {
            name: validate_name(&self.name)?,
        };

        Ok(diesel::insert_into(locations::table)
            .values(&new_location)
            .get_result(conn)?)
    }
}

/*************************************/
/** Rename Location message         **/
/*************************************/

#[derive(Clone)]
pub struct RenameLocation {
    pub id: i32,
    pub name: String,
}

impl Query for RenameLocation {
    type Item = Location;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        let name = validate_name(&self.name)?;

        diesel::update(locations::table.find(self.id))
            .set(locations::name.eq(name))
            .get_result::<Location>(conn)
            .optional()?
            .ok_or(Error::NotFound("Location"))
    }
}

/*************************************/
/** Delete Location message         **/
/*************************************/

/// Delete a location that no beverage refers to.
///
/// The existence check, the dependents check and the delete share one
/// immediate transaction, so no beverage can be moved into the location
/// between the check and the delete.
#[derive(Clone)]
pub struct DeleteLocation {
    pub id: i32,
}

impl Query for DeleteLocation {
    type Item = Location;

    fn execute(&self, conn: &mut SqliteConnection) -> Result<Self::Item> {
        let id = self.id;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            let location = GetLocation { id }.execute(conn)?;

            let dependents = beverages::table
                .filter(beverages::location_id.eq(id))
                .count()
                .get_result::<i64>(conn)?;
            if dependents > 0 {
                return Err(Error::HasDependents {
                    location_id: id,
                    beverages: dependents,
                });
            }

            diesel::delete(locations::table.find(id)).execute(conn)?;
            Ok(location)
        })
    }
}
