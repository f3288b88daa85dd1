#![no_main]

use std::sync::{Arc, Mutex};

use callstream::{CallAdapterFactory, CallResult, CannedCall, Error, Response, Subscriber};
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Counts {
    values: usize,
    terminals: usize,
}

struct Count(Arc<Mutex<Counts>>);

impl<T> Subscriber<T> for Count {
    fn on_next(&mut self, _: T) {
        let mut c = self.0.lock().unwrap();
        assert_eq!(c.terminals, 0, "value after terminal");
        c.values += 1;
    }

    fn on_completed(&mut self) {
        self.0.lock().unwrap().terminals += 1;
    }

    fn on_error(&mut self, _: Error) {
        self.0.lock().unwrap().terminals += 1;
    }
}

fn run<T: Send + 'static>(stream: callstream::Stream<T>) -> Counts {
    let counts = Arc::new(Mutex::new(Counts::default()));
    stream.subscribe(Count(counts.clone()));
    let c = counts.lock().unwrap();
    Counts {
        values: c.values,
        terminals: c.terminals,
    }
}

fuzz_target!(|data: &[u8]| {
    let factory = CallAdapterFactory::create();

    // Every subscription ends in exactly one terminal signal with at most one value.
    let body = run::<String>(factory.body(CannedCall::utf8(data)));
    assert_eq!(body.terminals, 1);
    assert!(body.values <= 1);

    let response = run::<Response<String>>(factory.response(CannedCall::utf8(data)));
    assert_eq!(response.terminals, 1);
    assert!(response.values <= 1);

    // A result stream never errors, so it always carries a value.
    let result = run::<CallResult<String>>(factory.result(CannedCall::utf8(data)));
    assert_eq!(result.terminals, 1);
    assert_eq!(result.values, 1);
});
