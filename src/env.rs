use std::cell::RefCell;

#[derive(Clone, Copy)]
struct Env {
    trace_enabled: bool,
}

thread_local! {
    /// Written exactly once by `init`, before any reads.
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Snapshot the process environment. Call once at startup.
pub fn init() {
    let value = Env {
        trace_enabled: std::env::var("SATCHEL_TRACE").is_ok_and(|v| v == "1"),
    };
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(env.is_none(), "environment state initialized twice");
        *env = Some(value);
    });
}

pub fn is_trace_enabled() -> bool {
    ENV.with(|env| match *env.borrow() {
        Some(env) => env.trace_enabled,
        None => panic!("environment state read before initialization"),
    })
}
