use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponseParts, ResponseParts},
};
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use super::cookie;
use crate::{db::ChatStore, error::ApiError};

/// Anonymous caller identity taken from the `user_id` cookie.
///
/// First-time callers get a new user row and a `Set-Cookie` header, which is
/// emitted when the identity is returned as part of the response.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    set_cookie: Option<HeaderValue>,
}

impl UserIdentity {
    pub fn is_new(&self) -> bool {
        self.set_cookie.is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
    ChatStore: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Any cookie value is trusted as-is; it is not looked up in the store.
        if let Some(user_id) = cookie::read_user_id(&parts.headers) {
            return Ok(Self {
                user_id,
                set_cookie: None,
            });
        }

        let store = ChatStore::from_ref(state);
        let user_id = Uuid::new_v4().to_string();
        if let Err(e) = store.create_user(&user_id).await {
            error!(error = %e, "create user failed");
            return Err(ApiError::Identity);
        }
        let set_cookie = cookie::issue(&user_id, OffsetDateTime::now_utc()).map_err(|e| {
            error!(error = %e, %user_id, "build identity cookie failed");
            ApiError::Identity
        })?;

        info!(%user_id, "new anonymous user");
        Ok(Self {
            user_id,
            set_cookie: Some(set_cookie),
        })
    }
}

impl IntoResponseParts for UserIdentity {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(value) = self.set_cookie {
            res.headers_mut().append(header::SET_COOKIE, value);
        }
        Ok(res)
    }
}
