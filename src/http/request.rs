use crate::plugins::Services;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl Method {
    pub fn from_string(s: &str) -> Method {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            "CONNECT" => Method::CONNECT,
            "OPTIONS" => Method::OPTIONS,
            "TRACE" => Method::TRACE,
            "PATCH" => Method::PATCH,
            _ => Method::GET,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Body {
    pub(crate) content_type: String,
    pub(crate) data: Arc<[u8]>,
}

impl Body {
    pub fn new() -> Body {
        Body::default()
    }

    pub fn from_string(s: &str) -> Body {
        Body {
            content_type: "text/plain".to_string(),
            data: Arc::from(s.as_bytes()),
        }
    }

    pub fn from_bytes(b: Vec<u8>) -> Body {
        Body {
            content_type: "application/octet-stream".to_string(),
            data: Arc::from(b),
        }
    }

    pub fn from_json(value: &Value) -> Body {
        Body {
            content_type: "application/json".to_string(),
            data: Arc::from(value.to_string().into_bytes()),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.data).to_string()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn json<T>(&self) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if self.content_type == "application/json" {
            serde_json::from_slice(&self.data).ok()
        } else {
            None
        }
    }

    pub fn x_www_form_urlencoded<T>(&self) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if self.content_type == "application/x-www-form-urlencoded" {
            serde_json::from_value(Self::parse_urlencoded(&self.data)?).ok()
        } else {
            None
        }
    }

    fn parse_urlencoded(data: &[u8]) -> Option<Value> {
        let data_str = String::from_utf8_lossy(data);
        let mut json = Map::new();

        for pair in data_str.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                let key = urlencoding::decode(&key.replace('+', " ")).ok()?.into_owned();
                let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
                json.insert(key, Value::String(value));
            }
        }

        Some(Value::Object(json))
    }
}

/// An incoming request as seen by hooks and handlers.
///
/// Cloning a request is cheap for the payload and shares the per-request data
/// bag, so values stored by one pipeline stage are visible to the next.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Body,
    data: Arc<RwLock<HashMap<String, Value>>>,
    services: Services,
}

impl Default for Request {
    fn default() -> Self {
        Request::new(Method::GET, "/")
    }
}

impl Request {
    pub fn new(method: Method, path: &str) -> Request {
        Request {
            method,
            path: path.to_string(),
            query: HashMap::new(),
            params: HashMap::new(),
            headers: HashMap::new(),
            body: Body::new(),
            data: Arc::new(RwLock::new(HashMap::new())),
            services: Services::new(),
        }
    }

    pub fn with_header<K: AsRef<str>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.as_ref().to_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = parse_query(query);
        self
    }

    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn get_method(&self) -> &Method {
        &self.method
    }

    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn get_data(&self, key: &str) -> Option<Value> {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    pub fn set_data<T>(&self, key: &str, value: T)
    where
        T: serde::Serialize,
    {
        if let Ok(value) = serde_json::to_value(value) {
            self.data
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(key.to_string(), value);
        }
    }

    pub fn get_typed_data<T>(&self, key: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.get_data(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Shared capabilities of the server this request is dispatched through.
    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn service<T: 'static>(&self) -> Option<&T> {
        self.services.get::<T>()
    }

    pub(crate) fn attach_services(&mut self, services: &Services) {
        if self.services.is_empty() {
            self.services = services.clone();
        }
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.split('=');
            let key = urlencoding::decode(parts.next()?).ok()?.into_owned();
            let value = urlencoding::decode(parts.next().unwrap_or("")).ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}
