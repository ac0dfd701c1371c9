use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::naive::NaiveDate;

use super::api;
use super::db::query::{BeverageColumn, BeverageFilter, JoinMode};
use super::db::{self, Pool};
use super::error::{Error, Result};
use super::models::{BeverageFields, BeverageFormData, LocationContents};

/// Mount every route on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| Error::ValidationError(err.to_string()).into()),
    )
    // Ids that match `\d+` but overflow an i32 can't name any record.
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        debug!("Rejected path: {}", err);
        Error::NotFound("Record").into()
    }))
    .route("/", web::get().to(stored_beverages))
    .route("/stored", web::get().to(stored_beverages))
    .route("/finished", web::get().to(finished_beverages))
    .route("/all", web::get().to(all_beverages))
    .service(
        web::scope("/beverage")
            .service(
                web::resource("/add_beverage")
                    .route(web::get().to(add_beverage_form))
                    .route(web::post().to(add_beverage)),
            )
            .route("/view/{id:\\d+}", web::get().to(view_beverage))
            .service(
                web::resource("/edit/{id:\\d+}")
                    .route(web::get().to(edit_beverage_form))
                    .route(web::post().to(edit_beverage)),
            )
            .route("/finished/{id:\\d+}", web::post().to(finish_beverage))
            .route("/delete/{id:\\d+}", web::post().to(delete_beverage)),
    )
    .service(
        web::scope("/locations")
            .route("", web::get().to(list_locations))
            .route("/", web::get().to(list_locations))
            .route("/{id:\\d+}", web::get().to(view_location))
            .route("/add_location", web::post().to(add_location))
            .route("/edit_location/{id:\\d+}", web::post().to(edit_location))
            .route("/delete_location/{id:\\d+}", web::post().to(delete_location)),
    );
}

/// `303 See Other` back to a listing page.
fn redirect(to: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, to))
        .finish()
}

/*********************************************/
/*  Beverage listings                        */
/*********************************************/

async fn list_beverages(pool: &Pool, filter: BeverageFilter) -> Result<HttpResponse> {
    let beverages = db::execute(pool, db::ListBeverages::listing(filter)).await?;
    Ok(api::ok(beverages))
}

/// Beverages currently in storage.
async fn stored_beverages(pool: web::Data<Pool>) -> Result<HttpResponse> {
    list_beverages(&pool, BeverageFilter::LocationIsNonZero).await
}

async fn finished_beverages(pool: web::Data<Pool>) -> Result<HttpResponse> {
    list_beverages(&pool, BeverageFilter::LocationIsZero).await
}

async fn all_beverages(pool: web::Data<Pool>) -> Result<HttpResponse> {
    list_beverages(&pool, BeverageFilter::NoFilter).await
}

/*********************************************/
/*  Single beverage                          */
/*********************************************/

/// Fields posted by the add and edit forms. HTML forms send empty strings for
/// blank inputs, so everything arrives as text and is parsed here.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BeverageForm {
    location: String,
    name: String,
    year: String,
    purchase_date: String,
    drink_before: String,
    notes: String,
}

fn optional<T, F>(value: &str, field: &str, parse: F) -> Result<Option<T>>
where
    F: FnOnce(&str) -> Option<T>,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse(value)
        .map(Some)
        .ok_or_else(|| Error::ValidationError(format!("{} is not valid: {:?}", field, value)))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

impl BeverageForm {
    fn into_fields(self) -> Result<BeverageFields> {
        Ok(BeverageFields {
            location_id: optional(&self.location, "Location", |v| v.parse().ok())?,
            year: optional(&self.year, "Year", |v| v.parse().ok())?,
            purchase_date: optional(&self.purchase_date, "Purchase date", parse_date)?,
            drink_before: optional(&self.drink_before, "Drink before", parse_date)?,
            notes: Some(self.notes).filter(|n| !n.trim().is_empty()),
            name: self.name,
        })
    }
}

/// Data for the add form: the locations a new beverage can go to.
async fn add_beverage_form(pool: web::Data<Pool>) -> Result<HttpResponse> {
    let locations = db::execute(&pool, db::ListLocations).await?;
    Ok(api::ok(BeverageFormData {
        beverage: None,
        locations,
    }))
}

/// Route handler for creating new beverage records
///
/// Expects the following POST data:
///
/// - `location`: The id of the location it's stored in, `0` if already finished
/// - `name`: The name of the beverage
/// - `year`: Optional vintage
/// - `purchaseDate`: Optional purchase date (yyyy-mm-dd)
/// - `drinkBefore`: Optional best-before date (yyyy-mm-dd)
/// - `notes`: Optional free text
async fn add_beverage(
    form: web::Form<BeverageForm>,
    pool: web::Data<Pool>,
) -> Result<HttpResponse> {
    let fields = form.into_inner().into_fields()?;
    let beverage = db::execute(&pool, db::CreateBeverage { fields }).await?;

    info!("{} has been saved.", beverage.name);
    Ok(redirect("/"))
}

async fn view_beverage(path: web::Path<i32>, pool: web::Data<Pool>) -> Result<HttpResponse> {
    let beverage = db::execute(&pool, db::GetBeverage { id: *path }).await?;
    Ok(api::ok(beverage))
}

async fn edit_beverage_form(path: web::Path<i32>, pool: web::Data<Pool>) -> Result<HttpResponse> {
    let beverage = db::execute(&pool, db::GetBeverage { id: *path }).await?;
    let locations = db::execute(&pool, db::ListLocations).await?;

    Ok(api::ok(BeverageFormData {
        beverage: Some(beverage),
        locations,
    }))
}

/// Route handler for editing a beverage. Takes the same POST data as `add_beverage`.
async fn edit_beverage(
    path: web::Path<i32>,
    form: web::Form<BeverageForm>,
    pool: web::Data<Pool>,
) -> Result<HttpResponse> {
    let fields = form.into_inner().into_fields()?;
    let beverage = db::execute(
        &pool,
        db::UpdateBeverage {
            id: path.into_inner(),
            fields,
        },
    )
    .await?;

    info!("{} has been updated.", beverage.name);
    Ok(redirect("/"))
}

async fn finish_beverage(path: web::Path<i32>, pool: web::Data<Pool>) -> Result<HttpResponse> {
    let beverage = db::execute(&pool, db::FinishBeverage { id: *path }).await?;

    if beverage.is_finished() {
        debug!("{} was already finished.", beverage.name);
    } else {
        info!("{} has been marked as finished.", beverage.name);
    }
    Ok(redirect("/"))
}

async fn delete_beverage(path: web::Path<i32>, pool: web::Data<Pool>) -> Result<HttpResponse> {
    let beverage = db::execute(&pool, db::DeleteBeverage { id: *path }).await?;

    info!("{} has been deleted.", beverage.name);
    Ok(redirect("/"))
}

/*********************************************/
/*  Locations                                */
/*********************************************/

#[derive(Debug, Deserialize)]
pub struct LocationForm {
    #[serde(default)]
    name: String,
}

async fn list_locations(pool: web::Data<Pool>) -> Result<HttpResponse> {
    let locations = db::execute(&pool, db::ListLocations).await?;
    Ok(api::ok(locations))
}

/// A location and the beverages stored in it.
async fn view_location(path: web::Path<i32>, pool: web::Data<Pool>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let location = db::execute(&pool, db::GetLocation { id }).await?;
    let beverages = db::execute(
        &pool,
        db::ListBeverages {
            columns: BeverageColumn::LISTING.to_vec(),
            join: JoinMode::Inner,
            filter: BeverageFilter::LocationEquals(id),
        },
    )
    .await?;

    Ok(api::ok(LocationContents {
        location,
        beverages,
    }))
}

/// Expects POST data `name`: the name of the new location.
async fn add_location(form: web::Form<LocationForm>, pool: web::Data<Pool>) -> Result<HttpResponse> {
    let name = form.into_inner().name;
    let location = db::execute(&pool, db::CreateLocation { name }).await?;

    info!("{} has been added.", location.name);
    Ok(redirect("/locations"))
}

async fn edit_location(
    path: web::Path<i32>,
    form: web::Form<LocationForm>,
    pool: web::Data<Pool>,
) -> Result<HttpResponse> {
    let location = db::execute(
        &pool,
        db::RenameLocation {
            id: path.into_inner(),
            name: form.into_inner().name,
        },
    )
    .await?;

    info!("{} has been updated.", location.name);
    Ok(redirect("/locations"))
}

async fn delete_location(path: web::Path<i32>, pool: web::Data<Pool>) -> Result<HttpResponse> {
    let location = db::execute(&pool, db::DeleteLocation { id: *path }).await?;

    info!("{} has been deleted.", location.name);
    Ok(redirect("/locations"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;
    use std::time::Duration;

    macro_rules! post {
        ($app:expr, $uri:expr, $form:expr) => {{
            let form: &[(&str, &str)] = $form;
            let req = test::TestRequest::post()
                .uri($uri)
                .set_form(form)
                .to_request();
            test::call_service(&$app, req).await
        }};
    }

    macro_rules! get_json {
        ($app:expr, $uri:expr) => {{
            let req = test::TestRequest::get().uri($uri).to_request();
            let resp = test::call_service(&$app, req).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    fn test_pool(dir: &tempfile::TempDir) -> Pool {
        db::connect(&Config {
            database_url: dir.path().join("cellar.db").to_string_lossy().into_owned(),
            pool_size: 2,
            pool_timeout: Duration::from_secs(2),
            ..Config::default()
        })
        .unwrap()
    }

    fn location_header<B>(resp: &ServiceResponse<B>) -> String {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    }

    #[actix_rt::test]
    async fn merlot_moves_from_stored_to_finished() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_pool(&dir)))
                .configure(configure),
        )
        .await;

        let resp = post!(app, "/locations/add_location", &[("name", "Kitchen")]);
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location_header(&resp), "/locations");

        let (_, body) = get_json!(app, "/locations");
        let kitchen = body["data"]["locations"][0]["id"].as_i64().unwrap().to_string();

        let resp = post!(
            app,
            "/beverage/add_beverage",
            &[
                ("location", kitchen.as_str()),
                ("name", "Merlot"),
                ("year", "2020"),
                ("purchaseDate", ""),
                ("drinkBefore", "2030-12-31"),
                ("notes", ""),
            ]
        );
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location_header(&resp), "/");

        let (status, body) = get_json!(app, "/");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Success");
        let stored = body["data"]["beverages"].as_array().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["name"], "Merlot");
        assert_eq!(stored[0]["year"], 2020);
        assert_eq!(stored[0]["locationName"], "Kitchen");
        let merlot = stored[0]["id"].as_i64().unwrap();

        let (_, body) = get_json!(app, &format!("/beverage/view/{}", merlot));
        assert_eq!(body["data"]["beverage"]["drinkBefore"], "2030-12-31");
        assert_eq!(body["data"]["beverage"]["purchaseDate"], Value::Null);

        let resp = post!(app, &format!("/beverage/finished/{}", merlot), &[]);
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let (_, body) = get_json!(app, "/stored");
        assert!(body["data"]["beverages"].as_array().unwrap().is_empty());
        let (_, body) = get_json!(app, "/finished");
        assert_eq!(body["data"]["beverages"][0]["name"], "Merlot");
        let (_, body) = get_json!(app, "/all");
        assert_eq!(body["data"]["beverages"].as_array().unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn location_with_beverages_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_pool(&dir)))
                .configure(configure),
        )
        .await;

        post!(app, "/locations/add_location", &[("name", "Kitchen")]);
        let (_, body) = get_json!(app, "/locations");
        let kitchen = body["data"]["locations"][0]["id"].as_i64().unwrap().to_string();

        post!(
            app,
            "/beverage/add_beverage",
            &[("location", kitchen.as_str()), ("name", "Merlot")]
        );

        let (_, body) = get_json!(app, &format!("/locations/{}", kitchen));
        assert_eq!(body["data"]["location"]["name"], "Kitchen");
        assert_eq!(body["data"]["location"]["beverages"][0]["name"], "Merlot");
        let merlot = body["data"]["location"]["beverages"][0]["id"].as_i64().unwrap();

        let resp = post!(app, &format!("/locations/delete_location/{}", kitchen), &[]);
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "Fail");

        let resp = post!(app, &format!("/beverage/delete/{}", merlot), &[]);
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let resp = post!(app, &format!("/locations/delete_location/{}", kitchen), &[]);
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let (_, body) = get_json!(app, "/locations");
        assert!(body["data"]["locations"].as_array().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn bad_input_is_reported_to_the_user() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_pool(&dir)))
                .configure(configure),
        )
        .await;

        let resp = post!(app, "/beverage/add_beverage", &[("name", "Merlot")]);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["messages"][0], "Location is required.");

        let resp = post!(
            app,
            "/beverage/add_beverage",
            &[("location", "0"), ("name", "Merlot"), ("year", "last year")]
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = post!(app, "/locations/add_location", &[("name", "")]);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let (status, body) = get_json!(app, "/beverage/view/404");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["messages"][0], "Beverage not found");

        let (status, body) = get_json!(app, "/beverage/view/99999999999");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "Fail");
        assert_eq!(body["messages"][0], "Record not found");

        let resp = post!(app, "/locations/edit_location/7", &[("name", "Attic")]);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let (_, body) = get_json!(app, "/all");
        assert!(body["data"]["beverages"].as_array().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn edit_form_lists_locations() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_pool(&dir)))
                .configure(configure),
        )
        .await;

        post!(app, "/locations/add_location", &[("name", "Pantry")]);
        post!(app, "/locations/add_location", &[("name", "Cellar")]);
        post!(
            app,
            "/beverage/add_beverage",
            &[("location", "0"), ("name", "Rioja")]
        );

        let (_, body) = get_json!(app, "/all");
        let rioja = body["data"]["beverages"][0]["id"].as_i64().unwrap();

        let (status, body) = get_json!(app, &format!("/beverage/edit/{}", rioja));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["form"]["beverage"]["name"], "Rioja");
        assert_eq!(body["data"]["form"]["locations"][0]["name"], "Cellar");
        assert_eq!(body["data"]["form"]["locations"][1]["name"], "Pantry");

        let cellar = body["data"]["form"]["locations"][0]["id"]
            .as_i64()
            .unwrap()
            .to_string();
        let resp = post!(
            app,
            &format!("/beverage/edit/{}", rioja),
            &[
                ("location", cellar.as_str()),
                ("name", "Rioja Reserva"),
                ("notes", "Back in the cellar"),
            ]
        );
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let (_, body) = get_json!(app, &format!("/beverage/view/{}", rioja));
        assert_eq!(body["data"]["beverage"]["name"], "Rioja Reserva");
        assert_eq!(body["data"]["beverage"]["locationName"], "Cellar");
        assert_eq!(body["data"]["beverage"]["notes"], "Back in the cellar");
    }
}
