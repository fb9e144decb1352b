use crate::error::ServerError;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    finalized: bool,
}

impl Default for Response {
    fn default() -> Self {
        Response::new(200)
    }
}

impl Response {
    pub fn new(status: u16) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: String::new(),
            finalized: false,
        }
    }

    // Chainable status setter
    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    // Generic body setter
    pub fn body<T: AsRef<str>>(&mut self, body: T) -> &mut Self {
        self.body = body.as_ref().to_string();
        self
    }

    // Generic header setter
    pub fn header<K: AsRef<str>, V: AsRef<str>>(&mut self, name: K, value: V) -> &mut Self {
        self.headers.insert(name.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, ServerError> {
        let json_string = serde_json::to_string(value)
            .map_err(|e| ServerError::Internal(format!("JSON serialization error: {}", e)))?;
        self.header("Content-Type", "application/json");
        self.body(json_string);
        Ok(self)
    }

    /// Marks the response as complete. Pipeline stages after the one that
    /// ended the response are skipped.
    pub fn end(&mut self) -> &mut Self {
        self.finalized = true;
        self
    }

    /// Sets the body and ends the response in one step.
    pub fn send<T: AsRef<str>>(&mut self, body: T) -> &mut Self {
        self.body(body).end()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn ok<T: Serialize>(data: &T) -> Result<Response, ServerError> {
        let mut response = Response::new(200);
        response.json(data)?;
        Ok(response)
    }

    pub fn created<T: Serialize>(data: &T) -> Result<Response, ServerError> {
        let mut response = Response::new(201);
        response.json(data)?;
        Ok(response)
    }

    pub fn no_content() -> Response {
        Response::new(204)
    }

    pub fn text<T: AsRef<str>>(content: T) -> Response {
        let mut response = Response::new(200);
        response
            .header("Content-Type", "text/plain")
            .body(content);
        response
    }

    pub fn redirect(location: &str) -> Response {
        let mut response = Response::new(302);
        response.header("Location", location);
        response
    }

    /// Error response whose status follows the error; HTTP exceptions keep
    /// their kind name in the payload.
    pub fn error(err: &ServerError) -> Response {
        let status = err.status_code();
        let payload = match err.as_http() {
            Some(exception) => serde_json::json!({
                "error": {
                    "name": exception.name(),
                    "message": exception.message().unwrap_or(exception.name()),
                    "status": status
                }
            }),
            None => serde_json::json!({
                "error": {
                    "message": err.to_string(),
                    "status": status
                }
            }),
        };
        let mut response = Response::new(status);
        response
            .header("Content-Type", "application/json")
            .body(payload.to_string())
            .end();
        response
    }
}
