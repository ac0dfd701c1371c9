// The bootstrap DDL lives in `schema.sql`; column names there are camelCase and are
// mapped onto snake_case Rust names here.

diesel::table! {
    beverages (id) {
        #[sql_name = "beverageId"]
        id -> Integer,
        #[sql_name = "beverageName"]
        name -> Text,
        #[sql_name = "beverageLocationId"]
        location_id -> Integer,
        #[sql_name = "beverageYear"]
        year -> Nullable<Integer>,
        #[sql_name = "beveragePurchaseDate"]
        purchase_date -> Nullable<Date>,
        #[sql_name = "beverageDrinkBefore"]
        drink_before -> Nullable<Date>,
        #[sql_name = "beverageNotes"]
        notes -> Nullable<Text>,
    }
}

diesel::table! {
    locations (id) {
        #[sql_name = "locationId"]
        id -> Integer,
        #[sql_name = "locationName"]
        name -> Text,
    }
}

diesel::joinable!(beverages -> locations (location_id));

diesel::allow_tables_to_appear_in_same_query!(beverages, locations,);
