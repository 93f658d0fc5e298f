//! importcheck-runner: Sends generated cases to a server and judges the replies

pub mod runner;
pub mod server;

pub use runner::{ImportRunner, run_endpoint_tests, run_import_tests};
pub use server::{
    HttpResponse, HttpTarget, ImportServer, RunnerError, ServerFn, TransportError, server_fn,
};
