use crate::error::{Result, TicketflowError};
use reqwest::blocking::Response;
use serde::de::DeserializeOwned;

/// Body of a successful response; anything else becomes `TicketflowError::Api`.
pub(crate) fn success_body(service: &'static str, resp: Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text()?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(TicketflowError::Api {
            service,
            status: status.as_u16(),
            body,
        })
    }
}

pub(crate) fn success_json<T: DeserializeOwned>(service: &'static str, resp: Response) -> Result<T> {
    let body = success_body(service, resp)?;
    serde_json::from_str(&body).map_err(|e| TicketflowError::UnexpectedResponse {
        service,
        detail: e.to_string(),
    })
}

/// True when a service answered 404.
pub(crate) fn is_not_found(err: &TicketflowError) -> bool {
    matches!(err, TicketflowError::Api { status: 404, .. })
}
