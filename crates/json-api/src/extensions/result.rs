//! `or_500` for failures a client cannot act on.

use std::fmt::Display;

use salvo::prelude::StatusError;
use tracing::error;

pub(crate) trait ResultExt<T> {
    /// Log `context` with the error and answer 500 without leaking details.
    fn or_500(self, context: &str) -> Result<T, StatusError>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn or_500(self, context: &str) -> Result<T, StatusError> {
        self.map_err(|source| {
            error!(error = %source, "{context}");

            StatusError::internal_server_error().brief("Internal Server Error")
        })
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn errors_become_opaque_500s() {
        let result: Result<(), &str> = Err("header value contained a newline");

        let status = result.or_500("failed to set location header").err();

        assert_eq!(status.as_ref().map(|e| e.code), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(
            status.is_some_and(|e| !e.brief.contains("newline")),
            "internal detail leaked"
        );
    }

    #[test]
    fn ok_passes_through() {
        let result: Result<u8, &str> = Ok(7);

        assert_eq!(result.or_500("unused").ok(), Some(7));
    }
}
