//! Index authentication using credentials from `~/.reqfold/config.toml`:
//!
//! ```toml
//! [index]
//! url = "https://nexus.co/repository/pypi/simple"
//! username = "ci"
//! password = "s3cret"
//! ```
//!
//! A password without a username is sent as a bearer token.

use reqwest::blocking::RequestBuilder;

use crate::repository::PackageIndex;

/// Apply authentication to a request if the index has credentials.
pub fn apply_auth(request: RequestBuilder, index: &PackageIndex) -> RequestBuilder {
    match (&index.username, &index.password) {
        (Some(user), Some(pass)) => request.basic_auth(user, Some(pass)),
        (Some(user), None) => request.basic_auth(user, None::<&str>),
        (None, Some(token)) => request.bearer_auth(token),
        (None, None) => request,
    }
}
