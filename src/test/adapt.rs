use http::StatusCode;

use crate::{
    CallAdapterFactory, CallResult, Error, ManualScheduler, Response, ReturnShape, ReturnType,
};

use super::scenario::{Recorder, StubCall};

fn adapter(factory: &CallAdapterFactory, ty: &str) -> crate::CallAdapter {
    factory.get(&ReturnType::parse(ty).unwrap()).unwrap()
}

#[test]
fn adapted_body_stream() {
    let factory = CallAdapterFactory::create();
    let adapted = adapter(&factory, "Stream<String>").adapt(StubCall::ok("Hi"));
    assert_eq!(adapted.shape(), ReturnShape::Body);

    let stream = adapted.into_body().unwrap();
    let subscriber = Recorder::<String>::new();
    stream.subscribe(subscriber.clone());

    assert_eq!(subscriber.values(), vec!["Hi".to_string()]);
    subscriber.assert_completed();
}

#[test]
fn adapted_response_stream() {
    let factory = CallAdapterFactory::create();
    let adapted = adapter(&factory, "Stream<Response<String>>").adapt(StubCall::status(404));
    assert_eq!(adapted.shape(), ReturnShape::Response);

    let stream = adapted.into_response().unwrap();
    let subscriber = Recorder::<Response<String>>::new();
    stream.subscribe(subscriber.clone());

    subscriber.assert_value_count(1);
    subscriber.assert_completed();
    assert_eq!(subscriber.values()[0].status(), StatusCode::NOT_FOUND);
}

#[test]
fn adapted_result_stream() {
    let factory = CallAdapterFactory::create();
    let adapted = adapter(&factory, "Stream<Result<String>>")
        .adapt(StubCall::failing(Error::Transport("refused".into())));
    assert_eq!(adapted.shape(), ReturnShape::Result);

    let stream = adapted.into_result().unwrap();
    let subscriber = Recorder::<CallResult<String>>::new();
    stream.subscribe(subscriber.clone());

    subscriber.assert_completed();
    assert_eq!(
        subscriber.values()[0].as_error(),
        Some(&Error::Transport("refused".into()))
    );
}

#[test]
fn adapted_wrong_accessor_is_none() {
    let factory = CallAdapterFactory::create();
    let adapter = adapter(&factory, "Stream<Response<String>>");

    assert!(adapter.adapt(StubCall::ok("Hi")).into_body().is_none());
    assert!(adapter.adapt(StubCall::ok("Hi")).into_result().is_none());
}

#[test]
fn adapter_keeps_factory_scheduler() {
    let scheduler = ManualScheduler::new();
    let factory = CallAdapterFactory::create_with_scheduler(scheduler.clone());
    let stream = adapter(&factory, "Stream<String>")
        .adapt(StubCall::ok("Hi"))
        .into_body()
        .unwrap();

    let subscriber = Recorder::<String>::new();
    stream.subscribe(subscriber.clone());
    subscriber.assert_no_terminal_event();

    assert_eq!(scheduler.trigger_actions(), 1);
    assert_eq!(subscriber.values(), vec!["Hi".to_string()]);
    subscriber.assert_completed();
}

#[test]
fn one_adapter_many_calls() {
    let factory = CallAdapterFactory::create();
    let adapter = adapter(&factory, "Stream<Result<String>>");

    let ok = Recorder::<CallResult<String>>::new();
    adapter
        .adapt(StubCall::ok("Hi"))
        .into_result()
        .unwrap()
        .subscribe(ok.clone());

    let failed = Recorder::<CallResult<String>>::new();
    adapter
        .adapt(StubCall::status(500))
        .into_result()
        .unwrap()
        .subscribe(failed.clone());

    assert!(!ok.values()[0].is_error());
    let response = failed.values().remove(0).into_response().unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[cfg(feature = "canned")]
#[test]
fn hi_with_manual_scheduler() {
    use crate::CannedCall;

    let scheduler = ManualScheduler::new();
    let factory = CallAdapterFactory::create_with_scheduler(scheduler.clone());
    let call = CannedCall::utf8(&b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nHi"[..]);

    let stream = adapter(&factory, "Stream<String>")
        .adapt(call)
        .into_body()
        .unwrap();

    let subscriber = Recorder::<String>::new();
    stream.subscribe(subscriber.clone());
    subscriber.assert_no_values();

    scheduler.trigger_actions();
    assert_eq!(subscriber.values(), vec!["Hi".to_string()]);
    subscriber.assert_completed();
}
