//! A call answered from a recorded HTTP/1.1 response.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use http::{header, StatusCode, Version};

use crate::{Call, Error, Response};

/// Max number of headers to parse from a recorded response
pub const MAX_RESPONSE_HEADERS: usize = 128;

type Converter<T> = dyn Fn(Vec<u8>) -> Result<T, Error> + Send + Sync;

/// A [`Call`] that replays a recorded HTTP/1.1 response.
///
/// The raw bytes are parsed on execution, which makes this a stand-in for a live transport
/// in tests and demos. The body is delimited by `content-length`, or runs to the end of the
/// recording when the header is absent. Chunked bodies are not decoded.
///
/// 2xx bodies are decoded with the converter. Any other status keeps the raw bytes as the
/// error body.
pub struct CannedCall<T> {
    raw: Arc<[u8]>,
    convert: Arc<Converter<T>>,
    executed: AtomicBool,
    canceled: AtomicBool,
}

impl<T> CannedCall<T> {
    /// Create a call replaying `raw`, decoding success bodies with `convert`.
    pub fn new<F>(raw: impl Into<Vec<u8>>, convert: F) -> Self
    where
        F: Fn(Vec<u8>) -> Result<T, Error> + Send + Sync + 'static,
    {
        let raw: Vec<u8> = raw.into();
        CannedCall {
            raw: raw.into(),
            convert: Arc::new(convert),
            executed: AtomicBool::new(false),
            canceled: AtomicBool::new(false),
        }
    }
}

impl CannedCall<String> {
    /// Create a call replaying `raw`, decoding success bodies as UTF-8.
    pub fn utf8(raw: impl Into<Vec<u8>>) -> Self {
        CannedCall::new(raw, |body| {
            String::from_utf8(body).map_err(|e| Error::Conversion(e.to_string()))
        })
    }
}

impl<T: Send + 'static> Call for CannedCall<T> {
    type Body = T;

    fn execute(&self) -> Result<Response<T>, Error> {
        if self.executed.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyExecuted);
        }

        if self.is_canceled() {
            return Err(Error::Canceled);
        }

        let (input_used, head) = try_parse_response::<MAX_RESPONSE_HEADERS>(&self.raw)?
            .ok_or(Error::IncompleteResponse)?;

        let body = body_slice(&head, &self.raw[input_used..])?.to_vec();

        debug!("Replay {:?} with {} body bytes", head.status(), body.len());

        if head.status().is_success() {
            let decoded = (self.convert)(body)?;
            Response::success(head.map(|_| decoded))
        } else {
            Response::error(head.map(|_| body))
        }
    }

    fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    fn is_executed(&self) -> bool {
        self.executed.load(Ordering::Acquire)
    }

    fn clone_call(&self) -> Self {
        CannedCall {
            raw: self.raw.clone(),
            convert: self.convert.clone(),
            executed: AtomicBool::new(false),
            canceled: AtomicBool::new(false),
        }
    }
}

impl<T> fmt::Debug for CannedCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CannedCall")
            .field("len", &self.raw.len())
            .field("executed", &self.executed.load(Ordering::Relaxed))
            .field("canceled", &self.canceled.load(Ordering::Relaxed))
            .finish()
    }
}

fn try_parse_response<const N: usize>(
    input: &[u8],
) -> Result<Option<(usize, http::Response<()>)>, Error> {
    let mut headers = [httparse::EMPTY_HEADER; N];
    let mut res = httparse::Response::new(&mut headers);

    let input_used = match res.parse(input) {
        Ok(httparse::Status::Complete(v)) => v,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(httparse::Error::TooManyHeaders) => return Err(Error::HttpParseTooManyHeaders),
        Err(e) => return Err(e.into()),
    };

    let version = match res.version {
        Some(0) => Version::HTTP_10,
        Some(1) => Version::HTTP_11,
        _ => return Err(Error::UnsupportedVersion),
    };

    let status = res
        .code
        .ok_or_else(|| Error::HttpParseFail("missing status code".into()))?;
    let status =
        StatusCode::from_u16(status).map_err(|e| Error::HttpParseFail(e.to_string()))?;

    let mut builder = http::Response::builder().version(version).status(status);

    for h in res.headers.iter() {
        builder = builder.header(h.name, h.value);
    }

    let response = builder
        .body(())
        .map_err(|e| Error::HttpParseFail(e.to_string()))?;

    Ok(Some((input_used, response)))
}

fn body_slice<'a>(head: &http::Response<()>, rest: &'a [u8]) -> Result<&'a [u8], Error> {
    let Some(value) = head.headers().get(header::CONTENT_LENGTH) else {
        return Ok(rest);
    };

    let len: usize = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or(Error::BadContentLengthHeader)?;

    if rest.len() < len {
        return Err(Error::IncompleteResponse);
    }

    Ok(&rest[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    const HI: &[u8] = b"\
        HTTP/1.1 200 OK\r\n\
        Content-Length: 2\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        Hi";

    #[test]
    fn replay_success() {
        let call = CannedCall::utf8(HI);
        assert!(!call.is_executed());

        let res = call.execute().unwrap();

        assert!(call.is_executed());
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.version(), Version::HTTP_11);
        assert_eq!(res.headers().get("content-type").unwrap(), "text/plain");
        assert_eq!(res.body().map(|s| s.as_str()), Some("Hi"));
    }

    #[test]
    fn replay_error_status_keeps_raw_body() {
        let call = CannedCall::utf8(
            &b"HTTP/1.1 404 Not Found\r\nContent-Length: 4\r\n\r\nnope"[..],
        );

        let res = call.execute().unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(!res.is_successful());
        assert_eq!(res.error_body(), Some(&b"nope"[..]));
    }

    #[test]
    fn body_without_content_length_runs_to_end() {
        let call = CannedCall::utf8(&b"HTTP/1.0 200 OK\r\n\r\nhello world"[..]);
        let res = call.execute().unwrap();
        assert_eq!(res.version(), Version::HTTP_10);
        assert_eq!(res.into_body().unwrap(), "hello world");
    }

    #[test]
    fn content_length_truncates_trailing_bytes() {
        let call = CannedCall::utf8(&b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabcdef"[..]);
        assert_eq!(call.execute().unwrap().into_body().unwrap(), "abc");
    }

    #[test]
    fn executes_only_once() {
        let call = CannedCall::utf8(HI);
        call.execute().unwrap();
        assert_eq!(call.execute().unwrap_err(), Error::AlreadyExecuted);
    }

    #[test]
    fn clone_is_fresh() {
        let call = CannedCall::utf8(HI);
        call.cancel();
        let _ = call.execute();

        let fresh = call.clone_call();
        assert!(!fresh.is_executed());
        assert!(!fresh.is_canceled());
        assert_eq!(fresh.execute().unwrap().into_body().unwrap(), "Hi");
    }

    #[test]
    fn canceled_before_execute() {
        let call = CannedCall::utf8(HI);
        call.cancel();
        call.cancel();
        assert!(call.is_canceled());
        assert_eq!(call.execute().unwrap_err(), Error::Canceled);
    }

    #[test]
    fn incomplete_head() {
        let call = CannedCall::utf8(&b"HTTP/1.1 200 OK\r\nContent-Len"[..]);
        assert_eq!(call.execute().unwrap_err(), Error::IncompleteResponse);
    }

    #[test]
    fn incomplete_body() {
        let call = CannedCall::utf8(&b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nHi"[..]);
        assert_eq!(call.execute().unwrap_err(), Error::IncompleteResponse);
    }

    #[test]
    fn bad_content_length() {
        let call = CannedCall::utf8(&b"HTTP/1.1 200 OK\r\nContent-Length: ten\r\n\r\nHi"[..]);
        assert_eq!(call.execute().unwrap_err(), Error::BadContentLengthHeader);
    }

    #[test]
    fn parse_fail() {
        let call = CannedCall::utf8(&b"HTTP/1.1200 OK\r\n\r\n"[..]);
        assert!(matches!(call.execute().unwrap_err(), Error::HttpParseFail(_)));
    }

    #[test]
    fn too_many_headers() {
        let mut res = String::from("HTTP/1.1 200 OK\r\n");
        for i in 0..1000 {
            res.push_str(&format!("X-Header-{}: value\r\n", i));
        }
        res.push_str("\r\n");

        let call = CannedCall::utf8(res);
        assert_eq!(call.execute().unwrap_err(), Error::HttpParseTooManyHeaders);
    }

    #[test]
    fn conversion_failure() {
        let call = CannedCall::utf8(&b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n\xFF\xFE"[..]);
        let err = call.execute().unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn custom_converter() {
        let call = CannedCall::new(HI, |body| Ok(body.len()));
        assert_eq!(call.execute().unwrap().into_body(), Some(2));
    }
}
