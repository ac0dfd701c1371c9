use actix_web::HttpResponse;
use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ResponseStatus {
    Success,
    Error,
    Fail,
}

/// A payload that can be placed inside an API response.
///
/// `NAME` is the field under `data` that will hold the payload, so a `Location`
/// comes back as `{"data": {"location": {...}}}`.
pub trait ResponseObject: Serialize {
    const NAME: &'static str;
}

impl ResponseObject for () {
    const NAME: &'static str = "nothing";
}

/// Envelope type for API responses
///
/// When serializing as JSON, this will result in a JSON object with the inner object returned
/// using the field name given by `T::NAME`.
pub struct ApiResponseEnvelope<T>(T);

#[derive(Serialize)]
#[serde(bound = "T: ResponseObject")]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ApiResponseEnvelope<T>>,
    pub messages: Option<Vec<String>>,
}

impl<T> Serialize for ApiResponseEnvelope<T>
where
    T: ResponseObject,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ApiResponseEnvelope", 1)?;
        state.serialize_field(T::NAME, &self.0)?;
        state.end()
    }
}

impl<T> ApiResponse<T>
where
    T: ResponseObject,
{
    pub fn new(data: T) -> ApiResponse<T> {
        ApiResponse {
            status: ResponseStatus::Success,
            data: Some(ApiResponseEnvelope(data)),
            messages: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(status: ResponseStatus, message: String) -> ApiResponse<()> {
        ApiResponse {
            status,
            data: None,
            messages: Some(vec![message]),
        }
    }
}

/// `200 OK` with `data` wrapped in the response envelope.
pub fn ok<T: ResponseObject>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Shelf {
        label: &'static str,
    }

    impl ResponseObject for Shelf {
        const NAME: &'static str = "shelf";
    }

    #[test]
    fn payload_is_nested_under_its_name() {
        let json = serde_json::to_value(ApiResponse::new(Shelf { label: "top" })).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "Success",
                "data": { "shelf": { "label": "top" } },
                "messages": null
            })
        );
    }

    #[test]
    fn failures_carry_messages_and_no_data() {
        let json =
            serde_json::to_value(ApiResponse::failure(ResponseStatus::Fail, "Name is required.".into()))
                .unwrap();
        assert_eq!(json["status"], "Fail");
        assert!(json.get("data").is_none());
        assert_eq!(json["messages"][0], "Name is required.");
    }
}
