//! Outgoing request interceptor.

use reqwest::header::{HeaderName, HeaderValue};
use tracing::warn;

use crate::models::credential::Credential;
use crate::models::request::RequestDescriptor;

/// Stamp `request` with `Bearer <token>` under `header`, or strip a stale
/// header when there is no credential.
///
/// Anonymous requests are valid: public endpoints need no credential.
pub fn apply_credential(
    request: &mut RequestDescriptor,
    credential: Option<&Credential>,
    header: &HeaderName,
) {
    let Some(credential) = credential.filter(|c| !c.is_empty()) else {
        request.headers.remove(header);
        return;
    };

    match HeaderValue::from_str(&credential.bearer()) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers.insert(header.clone(), value);
        }
        Err(_) => {
            warn!(request_id = %request.id, "Credential is not a valid header value; sending anonymously");
            request.headers.remove(header);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    #[test]
    fn test_attaches_bearer() {
        let mut req = RequestDescriptor::get("/api/item/today");
        apply_credential(&mut req, Some(&Credential::new("t1")), &AUTHORIZATION);
        assert_eq!(req.headers.get(AUTHORIZATION).unwrap(), "Bearer t1");
        assert!(req.headers.get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn test_replaces_existing_header() {
        let mut req = RequestDescriptor::get("/x");
        apply_credential(&mut req, Some(&Credential::new("t1")), &AUTHORIZATION);
        apply_credential(&mut req, Some(&Credential::new("t2")), &AUTHORIZATION);
        assert_eq!(req.headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(req.headers.get(AUTHORIZATION).unwrap(), "Bearer t2");
    }

    #[test]
    fn test_strips_stale_header_without_credential() {
        let mut req = RequestDescriptor::get("/x")
            .header("authorization", "Bearer stale")
            .unwrap();
        apply_credential(&mut req, None, &AUTHORIZATION);
        assert!(req.headers.get(AUTHORIZATION).is_none());

        let mut req = RequestDescriptor::get("/x").header("authorization", "Bearer stale").unwrap();
        apply_credential(&mut req, Some(&Credential::new("")), &AUTHORIZATION);
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_custom_header_name() {
        let header = HeaderName::from_static("access_token");
        let mut req = RequestDescriptor::get("/x");
        apply_credential(&mut req, Some(&Credential::new("t1")), &header);
        assert_eq!(req.headers.get("ACCESS_TOKEN").unwrap(), "Bearer t1");
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_token_sends_anonymously() {
        let mut req = RequestDescriptor::get("/x");
        apply_credential(&mut req, Some(&Credential::new("bad\ntoken")), &AUTHORIZATION);
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }
}
