use crate::{CallResult, Emitter, Error, Response};

pub trait Named {
    fn name() -> &'static str;
}

macro_rules! shape {
    ($n:tt, $doc:literal) => {
        #[doc = $doc]
        pub struct $n(());
        impl Named for $n {
            fn name() -> &'static str {
                stringify!($n)
            }
        }
    };
}

shape!(BodyShape, "Stream of the decoded body.");
shape!(ResponseShape, "Stream of the full [`Response`].");
shape!(ResultShape, "Stream of [`CallResult`] values, never failing.");

/// How the outcome of an execution maps to subscriber signals.
///
/// Only the completed and failed outcomes reach a shape, a cancelled execution
/// delivers nothing.
pub trait Shape<B>: Named + 'static {
    /// The type of values emitted.
    type Item: Send + 'static;

    /// Emit the signals for `outcome`.
    fn deliver(outcome: Result<Response<B>, Error>, emitter: Emitter<Self::Item>);
}

impl<B: Send + 'static> Shape<B> for ResponseShape {
    type Item = Response<B>;

    fn deliver(outcome: Result<Response<B>, Error>, mut emitter: Emitter<Response<B>>) {
        match outcome {
            Ok(response) => {
                emitter.next(response);
                emitter.complete();
            }
            Err(e) => emitter.error(e),
        }
    }
}

impl<B: Send + 'static> Shape<B> for ResultShape {
    type Item = CallResult<B>;

    fn deliver(outcome: Result<Response<B>, Error>, mut emitter: Emitter<CallResult<B>>) {
        let value = match outcome {
            Ok(response) => CallResult::response(response),
            Err(e) => CallResult::error(e),
        };
        emitter.next(value);
        emitter.complete();
    }
}

impl<B: Send + 'static> Shape<B> for BodyShape {
    type Item = B;

    fn deliver(outcome: Result<Response<B>, Error>, mut emitter: Emitter<B>) {
        let response = match outcome {
            Ok(v) => v,
            Err(e) => return emitter.error(e),
        };

        let status = response.status();

        match response.into_body() {
            Some(body) => {
                emitter.next(body);
                emitter.complete();
            }
            None => emitter.error(Error::Http(status)),
        }
    }
}
