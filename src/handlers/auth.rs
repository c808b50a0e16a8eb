use crate::{
    auth::SESSION_COOKIE,
    errors::{ApiError, ServiceError},
    handlers::render,
    AppState,
};
use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_form() -> Result<Html<String>, ApiError> {
    render(&LoginTemplate {
        error: None,
        email: String::new(),
    })
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    match state.services.auth.login(&form.email, &form.password).await {
        Ok(user) => {
            let token = state.services.auth.issue_session(user.id)?;
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            Ok((jar.add(cookie), Redirect::to("/")).into_response())
        }
        Err(ServiceError::AuthError(message)) => {
            let page = render(&LoginTemplate {
                error: Some(message),
                email: form.email,
            })?;
            Ok(page.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Redirect::to("/login")).into_response()
}
