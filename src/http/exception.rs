use std::fmt;

macro_rules! http_exceptions {
    ($($kind:ident => $code:literal),+ $(,)?) => {
        /// The closed set of status-bearing exceptions a hook or handler may raise.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HttpExceptionKind {
            $($kind,)+
        }

        impl HttpExceptionKind {
            /// Every kind, ordered by status code.
            pub const ALL: &'static [HttpExceptionKind] = &[$(HttpExceptionKind::$kind,)+];

            pub fn status_code(&self) -> u16 {
                match self {
                    $(HttpExceptionKind::$kind => $code,)+
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(HttpExceptionKind::$kind => stringify!($kind),)+
                }
            }

            pub fn from_status(status: u16) -> Option<HttpExceptionKind> {
                match status {
                    $($code => Some(HttpExceptionKind::$kind),)+
                    _ => None,
                }
            }
        }
    };
}

http_exceptions! {
    BadRequestException => 400,
    UnauthorizedException => 401,
    PaymentRequiredException => 402,
    ForbiddenException => 403,
    NotFoundException => 404,
    MethodNotAllowedException => 405,
    NotAcceptableException => 406,
    ProxyAuthenticationRequiredException => 407,
    RequestTimeoutException => 408,
    ConflictException => 409,
    GoneException => 410,
    LengthRequiredException => 411,
    PreconditionFailedException => 412,
    PayloadTooLargeException => 413,
    URITooLongException => 414,
    UnsupportedMediaTypeException => 415,
    RangeNotSatisfiableException => 416,
    ExpectationFailedException => 417,
    UnprocessableEntityException => 422,
    TooManyRequestsException => 429,
    UnavailableForLegalReasonsException => 451,
    InternalServerErrorException => 500,
    NotImplementedException => 501,
    ServiceUnavailableException => 503,
    InsufficientStorageException => 507,
}

impl fmt::Display for HttpExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A status-code-bearing error. Any layer may match on [`HttpException::kind`]
/// and turn it into a response with the matching status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpException {
    kind: HttpExceptionKind,
    message: Option<String>,
}

impl HttpException {
    pub fn new(kind: HttpExceptionKind) -> Self {
        Self { kind, message: None }
    }

    pub fn with_message<M: Into<String>>(kind: HttpExceptionKind, message: M) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn kind(&self) -> HttpExceptionKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn bad_request<M: Into<String>>(message: M) -> Self {
        Self::with_message(HttpExceptionKind::BadRequestException, message)
    }

    pub fn unauthorized<M: Into<String>>(message: M) -> Self {
        Self::with_message(HttpExceptionKind::UnauthorizedException, message)
    }

    pub fn forbidden<M: Into<String>>(message: M) -> Self {
        Self::with_message(HttpExceptionKind::ForbiddenException, message)
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::with_message(HttpExceptionKind::NotFoundException, message)
    }

    pub fn conflict<M: Into<String>>(message: M) -> Self {
        Self::with_message(HttpExceptionKind::ConflictException, message)
    }

    pub fn unprocessable_entity<M: Into<String>>(message: M) -> Self {
        Self::with_message(HttpExceptionKind::UnprocessableEntityException, message)
    }

    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::with_message(HttpExceptionKind::InternalServerErrorException, message)
    }
}

impl From<HttpExceptionKind> for HttpException {
    fn from(kind: HttpExceptionKind) -> Self {
        HttpException::new(kind)
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({}): {}", self.name(), self.status_code(), message),
            None => write!(f, "{} ({})", self.name(), self.status_code()),
        }
    }
}

impl std::error::Error for HttpException {}
