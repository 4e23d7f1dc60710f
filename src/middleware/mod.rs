use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::convert::Infallible;

/// Контекст пользователя для одного запроса.
///
/// Заменяет глобальные флаги вроде "залогинен" и "токен": обработчики получают
/// его явно. Без заголовка `Authorization: Bearer ...` пользователь - гость.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Option<String>,
}

impl SessionContext {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

// Bearer extractor. Отсутствующий или чужой заголовок - гость, а не отказ
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToString::to_string);

        Ok(SessionContext { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(auth: Option<&str>) -> SessionContext {
        let mut builder = Request::builder().uri("/");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        SessionContext::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn bearer_token_marks_user_logged_in() {
        let ctx = extract(Some("Bearer abc.def")).await;
        assert!(ctx.logged_in());
        assert_eq!(ctx.token(), Some("abc.def"));
    }

    #[tokio::test]
    async fn missing_or_foreign_auth_is_guest() {
        assert_eq!(extract(None).await, SessionContext::guest());
        assert_eq!(extract(Some("Basic dXNlcjpwdw==")).await, SessionContext::guest());
        assert_eq!(extract(Some("Bearer   ")).await, SessionContext::guest());
    }
}
