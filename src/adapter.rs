use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::scheduler::Scheduler;
use crate::source::{BodySource, ResponseSource, ResultSource, ScheduledSource};
use crate::{Call, CallResult, Error, Response, Source, Stream};

/// Raw type name of the stream shape handled by [`CallAdapterFactory`].
pub const STREAM: &str = "Stream";

/// Raw type name of a [`Response`] parameter.
pub const RESPONSE: &str = "Response";

/// Raw type name of a [`CallResult`] parameter.
pub const RESULT: &str = "Result";

/// A declared return type, such as `Stream<Response<String>>`.
///
/// This is the description an adapter is selected from. It is either built with
/// [`ReturnType::named`] and [`ReturnType::with_arg`], or parsed from its textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnType {
    name: String,
    args: Vec<ReturnType>,
}

impl ReturnType {
    /// A type without parameters.
    pub fn named(name: impl Into<String>) -> Self {
        ReturnType {
            name: name.into(),
            args: vec![],
        }
    }

    /// Append a type parameter.
    pub fn with_arg(mut self, arg: ReturnType) -> Self {
        self.args.push(arg);
        self
    }

    /// Parse the textual form, e.g. `Stream<Result<Vec<u8>>>`.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut parser = Parser { input, pos: 0 };
        let ty = parser.parse_type(0)?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.fail("trailing input"));
        }
        Ok(ty)
    }

    /// The raw type name, without parameters.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type parameters.
    pub fn args(&self) -> &[ReturnType] {
        &self.args
    }

    fn single_arg(&self) -> Result<&ReturnType, Error> {
        match self.args.as_slice() {
            [v] => Ok(v),
            [] => Err(Error::UnsupportedReturnType(format!(
                "{} return type must be parameterized as {}<Foo>",
                self.name, self.name
            ))),
            _ => Err(Error::UnsupportedReturnType(format!(
                "{} takes exactly one type parameter, got {}",
                self.name, self
            ))),
        }
    }
}

impl FromStr for ReturnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReturnType::parse(s)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{}", first)?;
            for a in rest {
                write!(f, ", {}", a)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Deepest type parameter nesting accepted by [`ReturnType::parse`].
const MAX_NESTING: usize = 32;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_type(&mut self, depth: usize) -> Result<ReturnType, Error> {
        if depth > MAX_NESTING {
            return Err(self.fail("type parameters nested too deep"));
        }

        self.skip_ws();

        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == ':' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        if start == self.pos {
            return Err(self.fail("expected type name"));
        }

        let mut ty = ReturnType::named(&self.input[start..self.pos]);

        self.skip_ws();
        if self.peek() != Some('<') {
            return Ok(ty);
        }
        self.pos += 1;

        loop {
            ty.args.push(self.parse_type(depth + 1)?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('>') => {
                    self.pos += 1;
                    return Ok(ty);
                }
                _ => return Err(self.fail("expected ',' or '>'")),
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn fail(&self, msg: &str) -> Error {
        Error::BadReturnType(format!("{} at {} in {:?}", msg, self.pos, self.input))
    }
}

/// Which of the stream shapes an adapter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// `Stream<T>`
    Body,
    /// `Stream<Response<T>>`
    Response,
    /// `Stream<Result<T>>`
    Result,
}

/// Creates call adapters for `Stream` return types.
///
/// By default the streams execute their call on the subscribing thread. With
/// [`CallAdapterFactory::create_with_scheduler`], every stream defers execution onto a
/// worker of the scheduler.
#[derive(Clone, Default)]
pub struct CallAdapterFactory {
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl CallAdapterFactory {
    /// Streams execute synchronously on subscribe.
    pub fn create() -> Self {
        CallAdapterFactory { scheduler: None }
    }

    /// Streams execute on workers of `scheduler`.
    pub fn create_with_scheduler<S: Scheduler>(scheduler: S) -> Self {
        CallAdapterFactory {
            scheduler: Some(Arc::new(scheduler)),
        }
    }

    /// Select an adapter for the declared `return_type`.
    ///
    /// Any raw type other than `Stream`, and a `Stream`, `Response` or `Result` without
    /// exactly one type parameter, is rejected with [`Error::UnsupportedReturnType`].
    pub fn get(&self, return_type: &ReturnType) -> Result<CallAdapter, Error> {
        if return_type.name() != STREAM {
            return Err(Error::UnsupportedReturnType(format!(
                "{} is not a {}<Foo>, {}<{}<Foo>> or {}<{}<Foo>>",
                return_type, STREAM, STREAM, RESPONSE, STREAM, RESULT
            )));
        }

        let item = return_type.single_arg()?;

        let (shape, response_type) = match item.name() {
            RESPONSE => (ReturnShape::Response, item.single_arg()?),
            RESULT => (ReturnShape::Result, item.single_arg()?),
            _ => (ReturnShape::Body, item),
        };

        debug!("Adapter for {}: {:?} of {}", return_type, shape, response_type);

        Ok(CallAdapter {
            shape,
            response_type: response_type.clone(),
            scheduler: self.scheduler.clone(),
        })
    }

    /// Adapt `call` to a stream of its body.
    pub fn body<C: Call>(&self, call: C) -> Stream<C::Body> {
        wrap(BodySource::new(call), &self.scheduler)
    }

    /// Adapt `call` to a stream of its response.
    pub fn response<C: Call>(&self, call: C) -> Stream<Response<C::Body>> {
        wrap(ResponseSource::new(call), &self.scheduler)
    }

    /// Adapt `call` to a stream of results.
    pub fn result<C: Call>(&self, call: C) -> Stream<CallResult<C::Body>> {
        wrap(ResultSource::new(call), &self.scheduler)
    }
}

impl fmt::Debug for CallAdapterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallAdapterFactory")
            .field("scheduled", &self.scheduler.is_some())
            .finish()
    }
}

/// Adapts calls to the stream shape selected by [`CallAdapterFactory::get`].
#[derive(Clone)]
pub struct CallAdapter {
    shape: ReturnShape,
    response_type: ReturnType,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl CallAdapter {
    /// The selected shape.
    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// The body type the call must produce, e.g. `String` for `Stream<Response<String>>`.
    pub fn response_type(&self) -> &ReturnType {
        &self.response_type
    }

    /// Adapt `call` to the selected shape.
    pub fn adapt<C: Call>(&self, call: C) -> Adapted<C::Body> {
        match self.shape {
            ReturnShape::Body => Adapted::Body(wrap(BodySource::new(call), &self.scheduler)),
            ReturnShape::Response => {
                Adapted::Response(wrap(ResponseSource::new(call), &self.scheduler))
            }
            ReturnShape::Result => Adapted::Result(wrap(ResultSource::new(call), &self.scheduler)),
        }
    }
}

impl fmt::Debug for CallAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallAdapter")
            .field("shape", &self.shape)
            .field("response_type", &self.response_type)
            .field("scheduled", &self.scheduler.is_some())
            .finish()
    }
}

/// A stream in one of the three shapes.
#[derive(Debug)]
pub enum Adapted<T> {
    /// `Stream<T>`
    Body(Stream<T>),
    /// `Stream<Response<T>>`
    Response(Stream<Response<T>>),
    /// `Stream<Result<T>>`
    Result(Stream<CallResult<T>>),
}

impl<T> Adapted<T> {
    /// The shape of this stream.
    pub fn shape(&self) -> ReturnShape {
        match self {
            Adapted::Body(_) => ReturnShape::Body,
            Adapted::Response(_) => ReturnShape::Response,
            Adapted::Result(_) => ReturnShape::Result,
        }
    }

    /// The body stream, if that is the shape.
    pub fn into_body(self) -> Option<Stream<T>> {
        match self {
            Adapted::Body(v) => Some(v),
            _ => None,
        }
    }

    /// The response stream, if that is the shape.
    pub fn into_response(self) -> Option<Stream<Response<T>>> {
        match self {
            Adapted::Response(v) => Some(v),
            _ => None,
        }
    }

    /// The result stream, if that is the shape.
    pub fn into_result(self) -> Option<Stream<CallResult<T>>> {
        match self {
            Adapted::Result(v) => Some(v),
            _ => None,
        }
    }
}

fn wrap<S: Source>(source: S, scheduler: &Option<Arc<dyn Scheduler>>) -> Stream<S::Item> {
    match scheduler {
        Some(s) => Stream::new(ScheduledSource::new(source, s.clone())),
        None => Stream::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualScheduler;

    fn parse(s: &str) -> ReturnType {
        ReturnType::parse(s).unwrap()
    }

    #[test]
    fn parse_nested() {
        let ty = parse("Stream<Response<Vec<u8>>>");
        let expected = ReturnType::named("Stream").with_arg(
            ReturnType::named("Response")
                .with_arg(ReturnType::named("Vec").with_arg(ReturnType::named("u8"))),
        );
        assert_eq!(ty, expected);
        assert_eq!(ty.to_string(), "Stream<Response<Vec<u8>>>");
    }

    #[test]
    fn parse_whitespace_and_paths() {
        let ty: ReturnType = " Stream < std::string::String > ".parse().unwrap();
        assert_eq!(ty.name(), "Stream");
        assert_eq!(ty.args()[0].name(), "std::string::String");
    }

    #[test]
    fn parse_multiple_args() {
        let ty = parse("Stream<HashMap<String, u32>>");
        assert_eq!(ty.args()[0].args().len(), 2);
        assert_eq!(ty.to_string(), "Stream<HashMap<String, u32>>");
    }

    #[test]
    fn parse_malformed() {
        for bad in ["", "<String>", "Stream<", "Stream<String", "Stream<String>>", "Stream<,>"] {
            let err = ReturnType::parse(bad).unwrap_err();
            assert!(matches!(err, Error::BadReturnType(_)), "{:?}", bad);
        }
    }

    #[test]
    fn parse_nesting_limit() {
        let nested = |n: usize| format!("{}u8{}", "Vec<".repeat(n), ">".repeat(n));

        let ty = parse(&nested(MAX_NESTING));
        assert_eq!(ty.to_string(), nested(MAX_NESTING));

        let err = ReturnType::parse(&nested(MAX_NESTING + 1)).unwrap_err();
        assert!(matches!(err, Error::BadReturnType(_)));

        // Far past the limit fails the same way instead of exhausting the stack.
        let err = ReturnType::parse(&"A<".repeat(1_000_000)).unwrap_err();
        assert!(matches!(err, Error::BadReturnType(_)));
    }

    #[test]
    fn selects_body() {
        let factory = CallAdapterFactory::create();
        let adapter = factory.get(&parse("Stream<String>")).unwrap();
        assert_eq!(adapter.shape(), ReturnShape::Body);
        assert_eq!(adapter.response_type(), &parse("String"));
    }

    #[test]
    fn selects_response() {
        let factory = CallAdapterFactory::create();
        let adapter = factory
            .get(&parse("Stream<Response<String>>"))
            .unwrap();
        assert_eq!(adapter.shape(), ReturnShape::Response);
        assert_eq!(adapter.response_type(), &parse("String"));
    }

    #[test]
    fn selects_result() {
        let factory = CallAdapterFactory::create_with_scheduler(ManualScheduler::new());
        let adapter = factory
            .get(&parse("Stream<Result<Vec<u8>>>"))
            .unwrap();
        assert_eq!(adapter.shape(), ReturnShape::Result);
        assert_eq!(adapter.response_type(), &parse("Vec<u8>"));
    }

    #[test]
    fn rejects_other_raw_types() {
        let factory = CallAdapterFactory::create_with_scheduler(ManualScheduler::new());
        for ty in ["String", "Future<String>", "Response<String>", "Result<Stream<String>>"] {
            let err = factory.get(&parse(ty)).unwrap_err();
            assert!(matches!(err, Error::UnsupportedReturnType(_)), "{}", ty);
        }

        let err = factory.get(&parse("Future<String>")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported return type: Future<String> is not a Stream<Foo>, \
             Stream<Response<Foo>> or Stream<Result<Foo>>"
        );
    }

    #[test]
    fn rejects_unparameterized() {
        let factory = CallAdapterFactory::create();
        for ty in [
            "Stream",
            "Stream<Response>",
            "Stream<Result>",
            "Stream<String, String>",
            "Stream<Response<String, String>>",
        ] {
            let err = factory.get(&parse(ty)).unwrap_err();
            assert!(matches!(err, Error::UnsupportedReturnType(_)), "{}", ty);
        }
    }

    #[test]
    fn unparameterized_message() {
        let factory = CallAdapterFactory::create();
        let err = factory.get(&parse("Stream<Response>")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported return type: Response return type must be parameterized as Response<Foo>"
        );
    }
}
