use chrono::naive::NaiveDate;
use diesel::prelude::*;
use diesel::sql_types::{Date, Integer, Nullable, Text};

use super::api::ResponseObject;
use super::error::{Error, Result};
use super::schema::{beverages, locations};

/// Location id meaning "finished / not currently stored". No row in `locations`
/// carries this id.
pub const FINISHED_LOCATION_ID: i32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
pub struct Location {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = locations)]
pub struct NewLocation<'a> {
    pub name: &'a str,
}

/// A beverage joined with the name of the location it is stored in.
///
/// `location_name` is `None` for finished beverages and for beverages whose
/// location no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct Beverage {
    pub id: i32,
    pub name: String,
    pub year: Option<i32>,
    pub purchase_date: Option<NaiveDate>,
    pub drink_before: Option<NaiveDate>,
    pub notes: Option<String>,
    pub location_id: i32,
    pub location_name: Option<String>,
}

impl Beverage {
    pub fn is_finished(&self) -> bool {
        self.location_id == FINISHED_LOCATION_ID
    }
}

/// One row of a projected beverage listing. Columns that were not projected
/// are left out of the serialized row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, QueryableByName)]
#[serde(rename_all = "camelCase")]
pub struct BeverageRow {
    #[diesel(sql_type = Nullable<Integer>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,

    #[diesel(sql_type = Nullable<Text>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[diesel(sql_type = Nullable<Integer>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[diesel(sql_type = Nullable<Date>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,

    #[diesel(sql_type = Nullable<Date>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drink_before: Option<NaiveDate>,

    #[diesel(sql_type = Nullable<Text>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[diesel(sql_type = Nullable<Integer>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i32>,

    #[diesel(sql_type = Nullable<Text>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}

/// Caller-supplied values for creating or editing a beverage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeverageFields {
    pub name: String,
    pub location_id: Option<i32>,
    pub year: Option<i32>,
    pub purchase_date: Option<NaiveDate>,
    pub drink_before: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl BeverageFields {
    /// Checks the required fields and returns the row to write.
    pub fn validate(&self) -> Result<BeverageChanges<'_>> {
        let location_id = self
            .location_id
            .ok_or_else(|| Error::ValidationError("Location is required.".to_owned()))?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::ValidationError("Name is required.".to_owned()));
        }

        Ok(BeverageChanges {
            name,
            location_id,
            year: self.year,
            purchase_date: self.purchase_date,
            drink_before: self.drink_before,
            notes: self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
        })
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = beverages, treat_none_as_null = true)]
pub struct BeverageChanges<'a> {
    pub name: &'a str,
    pub location_id: i32,
    pub year: Option<i32>,
    pub purchase_date: Option<NaiveDate>,
    pub drink_before: Option<NaiveDate>,
    pub notes: Option<&'a str>,
}

/// Everything the edit form needs: the beverage and the locations it can move to.
#[derive(Debug, Serialize)]
pub struct BeverageFormData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beverage: Option<Beverage>,
    pub locations: Vec<Location>,
}

/// A location together with the beverages stored in it.
#[derive(Debug, Serialize)]
pub struct LocationContents {
    #[serde(flatten)]
    pub location: Location,
    pub beverages: Vec<BeverageRow>,
}

impl ResponseObject for Location {
    const NAME: &'static str = "location";
}

impl ResponseObject for Vec<Location> {
    const NAME: &'static str = "locations";
}

impl ResponseObject for LocationContents {
    const NAME: &'static str = "location";
}

impl ResponseObject for Beverage {
    const NAME: &'static str = "beverage";
}

impl ResponseObject for Vec<BeverageRow> {
    const NAME: &'static str = "beverages";
}

impl ResponseObject for BeverageFormData {
    const NAME: &'static str = "form";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_requires_location_before_name() {
        let fields = BeverageFields::default();
        match fields.validate() {
            Err(Error::ValidationError(msg)) => assert_eq!(msg, "Location is required."),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn blank_name_is_rejected() {
        let fields = BeverageFields {
            name: "   ".into(),
            location_id: Some(1),
            ..Default::default()
        };
        match fields.validate() {
            Err(Error::ValidationError(msg)) => assert_eq!(msg, "Name is required."),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn blank_notes_are_stored_as_null() {
        let fields = BeverageFields {
            name: " Merlot ".into(),
            location_id: Some(0),
            notes: Some("  ".into()),
            ..Default::default()
        };
        let changes = fields.validate().unwrap();
        assert_eq!(changes.name, "Merlot");
        assert_eq!(changes.location_id, FINISHED_LOCATION_ID);
        assert_eq!(changes.notes, None);
    }

    #[test]
    fn unprojected_columns_are_omitted() {
        let row = BeverageRow {
            id: Some(4),
            name: Some("Merlot".into()),
            location_name: Some("Kitchen".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({ "id": 4, "name": "Merlot", "locationName": "Kitchen" })
        );
    }
}
