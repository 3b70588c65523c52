use std::error::Error as StdError;

use axum::async_trait;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Json, Path, Query, RequestParts};
use axum::BoxError;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::auth::{Role, User};
use crate::error::Error;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Caller identity as forwarded by the authenticating gateway. Requests
/// without both headers are rejected before reaching a handler.
#[async_trait]
impl<B> FromRequest<B> for User
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let headers = req.headers();

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .ok_or(Error::Unauthenticated)
        };

        let id: Uuid = header(USER_ID_HEADER)?
            .parse()
            .map_err(|_| Error::Unauthenticated)?;
        let role: Role = header(USER_ROLE_HEADER)?.parse()?;

        tracing::Span::current().record("user_id", &tracing::field::display(id));

        Ok(User::new(id, role))
    }
}

/// JSON body that rejects malformed input with a validation error instead of
/// axum's plain-text response.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, B> FromRequest<B> for ValidJson<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::validation(describe(&rejection))),
        }
    }
}

/// Query string counterpart of [`ValidJson`].
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, B> FromRequest<B> for ValidQuery<T>
where
    T: DeserializeOwned,
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request(req).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::validation(describe(&rejection))),
        }
    }
}

/// The `:id` path segment. An id that is not a uuid names no ride.
pub struct RideId(pub Uuid);

#[async_trait]
impl<B> FromRequest<B> for RideId
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request(req).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                tracing::debug!(%rejection, "malformed ride id");
                Err(Error::NotFound)
            }
        }
    }
}

// rejection Display only carries axum's summary, the serde detail sits in
// the source chain
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    message
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::Request;
    use tracing::field::{Field, Visit};
    use tracing::{span, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<String>>>);

    struct Fields<'a>(&'a mut Vec<String>);

    impl Visit for Fields<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
            self.0.push(format!("{}={:?}", field.name(), value));
        }
    }

    impl<S: Subscriber> Layer<S> for Recorded {
        fn on_record(&self, _id: &span::Id, values: &span::Record<'_>, _ctx: Context<'_, S>) {
            let mut recorded = self.0.lock().unwrap();
            values.record(&mut Fields(&mut recorded));
        }
    }

    fn request(id: &str, role: &str) -> RequestParts<Body> {
        RequestParts::new(
            Request::builder()
                .header(USER_ID_HEADER, id)
                .header(USER_ROLE_HEADER, role)
                .body(Body::empty())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn identity_is_recorded_on_the_request_span() {
        let recorded = Recorded::default();
        let _default = tracing::subscriber::set_default(Registry::default().with(recorded.clone()));

        let span = tracing::info_span!("http_request", user_id = tracing::field::Empty);
        let _entered = span.enter();

        let id = Uuid::new_v4();
        let user = User::from_request(&mut request(&id.to_string(), "driver"))
            .await
            .unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Driver);
        assert!(recorded
            .0
            .lock()
            .unwrap()
            .contains(&format!("user_id={}", id)));
    }

    #[tokio::test]
    async fn malformed_identity_is_rejected() {
        let result = User::from_request(&mut request("nobody", "driver")).await;
        assert!(matches!(result, Err(Error::Unauthenticated)));

        let id = Uuid::new_v4().to_string();
        let result = User::from_request(&mut request(&id, "pilot")).await;
        assert!(matches!(result, Err(Error::Unauthenticated)));
    }

    #[test]
    fn describes_the_whole_error_chain() {
        #[derive(Debug)]
        struct Outer(std::io::Error);

        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "Failed to deserialize")
            }
        }

        impl StdError for Outer {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "expected f64",
        ));
        assert_eq!(describe(&err), "Failed to deserialize: expected f64");
    }
}
