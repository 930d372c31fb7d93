//! Caller identity extractor.
//!
//! The session layer in front of the gateway authenticates the user and
//! forwards who they are in `X-User-Id` / `X-User-Name`.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};

use scribe_core::domain::Commenter;

use super::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_NAME_HEADER: &str = "X-User-Name";

/// Signed-in caller. Use as a handler argument to require a session:
/// ```ignore
/// async fn protected(caller: Caller) -> impl Responder {
///     format!("Hello, {}!", caller.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub name: Option<String>,
}

impl Caller {
    pub fn commenter(&self) -> Commenter {
        Commenter::new(self.user_id.clone(), self.name.clone())
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(user_id) = header(req, USER_ID_HEADER) else {
            return ready(Err(AppError::Unauthorized));
        };
        ready(Ok(Caller {
            user_id: user_id.to_string(),
            name: header(req, USER_NAME_HEADER).map(str::to_string),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_extracts_id_and_name() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "u1"))
            .insert_header((USER_NAME_HEADER, "Bob"))
            .to_http_request();

        let caller = Caller::extract(&req).await.unwrap();
        assert_eq!(caller.user_id, "u1");
        assert_eq!(caller.commenter().name.as_deref(), Some("Bob"));
    }

    #[actix_web::test]
    async fn test_blank_id_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "  "))
            .to_http_request();

        assert!(matches!(
            Caller::extract(&req).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[actix_web::test]
    async fn test_name_is_optional() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "u1"))
            .to_http_request();

        assert_eq!(Caller::extract(&req).await.unwrap().name, None);
    }
}
