use std::fmt;

use http::{HeaderMap, StatusCode, Version};

use crate::Error;

/// The result of a transported HTTP exchange.
///
/// Transport success does not imply application success. A response either carries a
/// decoded body (2xx) or the raw bytes of an error body (everything else).
#[derive(Clone)]
pub struct Response<T> {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    payload: Payload<T>,
}

#[derive(Clone)]
enum Payload<T> {
    Body(T),
    ErrorBody(Vec<u8>),
}

impl<T> Response<T> {
    /// Create a successful response from a decoded `http::Response`.
    ///
    /// Fails with [`Error::BadSuccessStatus`] if the status is not 2xx.
    pub fn success(response: http::Response<T>) -> Result<Self, Error> {
        let (parts, body) = response.into_parts();

        if !parts.status.is_success() {
            return Err(Error::BadSuccessStatus(parts.status));
        }

        Ok(Response {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            payload: Payload::Body(body),
        })
    }

    /// Create an unsuccessful response holding the raw error body.
    ///
    /// Fails with [`Error::BadErrorStatus`] if the status is 2xx.
    pub fn error(response: http::Response<Vec<u8>>) -> Result<Self, Error> {
        let (parts, body) = response.into_parts();

        if parts.status.is_success() {
            return Err(Error::BadErrorStatus(parts.status));
        }

        Ok(Response {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            payload: Payload::ErrorBody(body),
        })
    }

    /// The HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Canonical reason phrase for the status.
    pub fn message(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    /// Tell if the status is in the 2xx range.
    pub fn is_successful(&self) -> bool {
        matches!(self.payload, Payload::Body(_))
    }

    /// The decoded body, if the response is successful.
    pub fn body(&self) -> Option<&T> {
        match &self.payload {
            Payload::Body(v) => Some(v),
            Payload::ErrorBody(_) => None,
        }
    }

    /// Take the decoded body, if the response is successful.
    pub fn into_body(self) -> Option<T> {
        match self.payload {
            Payload::Body(v) => Some(v),
            Payload::ErrorBody(_) => None,
        }
    }

    /// The raw error body, if the response is unsuccessful.
    pub fn error_body(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Body(_) => None,
            Payload::ErrorBody(v) => Some(v),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Response<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Response");
        d.field("status", &self.status)
            .field("version", &self.version)
            .field("headers", &self.headers);
        match &self.payload {
            Payload::Body(v) => d.field("body", v),
            Payload::ErrorBody(v) => d.field("error_body", &v.len()),
        };
        d.finish()
    }
}

/// Either a [`Response`] or the failure that prevented one.
///
/// Used by the `Result` stream shape to deliver every outcome as a value.
#[derive(Debug, Clone)]
pub enum CallResult<T> {
    /// The call was executed and produced a response. The status may be an error status.
    Response(Response<T>),
    /// The call failed to execute.
    Error(Error),
}

impl<T> CallResult<T> {
    /// Wrap a response.
    pub fn response(response: Response<T>) -> Self {
        CallResult::Response(response)
    }

    /// Wrap an execution failure.
    pub fn error(error: Error) -> Self {
        CallResult::Error(error)
    }

    /// Tell if this holds an execution failure.
    pub fn is_error(&self) -> bool {
        matches!(self, CallResult::Error(_))
    }

    /// The response, if any.
    pub fn as_response(&self) -> Option<&Response<T>> {
        match self {
            CallResult::Response(v) => Some(v),
            CallResult::Error(_) => None,
        }
    }

    /// The failure, if any.
    pub fn as_error(&self) -> Option<&Error> {
        match self {
            CallResult::Response(_) => None,
            CallResult::Error(e) => Some(e),
        }
    }

    /// Convert to a std `Result`.
    pub fn into_response(self) -> Result<Response<T>, Error> {
        match self {
            CallResult::Response(v) => Ok(v),
            CallResult::Error(e) => Err(e),
        }
    }
}
