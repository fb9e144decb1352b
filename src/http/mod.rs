mod exception;
mod request;
mod response;

pub use exception::{HttpException, HttpExceptionKind};
pub use request::{Body, Method, Request};
pub use response::Response;
