//! Named error conditions and their HTTP status mapping.
//!
//! # Responsibilities
//! - Define every error condition a handler can produce
//! - Map each condition to a status code and canonical reason phrase
//! - Provide one named helper per condition on [`Exchange`]
//!
//! # Design Decisions
//! - One flat enum instead of name-based method lookup; `from_name` covers
//!   the cases where the condition arrives as runtime data
//! - Several names share a status (e.g. `badRequestError` and
//!   `invalidContentError` are both 400)
//! - The table is generated by a single macro so the enum, the lookup
//!   functions and the helpers can never drift apart

use axum::http::StatusCode;

use crate::http::Exchange;

macro_rules! error_catalog {
    ($($kind:ident => $code:literal, $name:literal, $reason:literal, $helper:ident;)+) => {
        /// Every error condition known to the dispatcher.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorKind {
            $($kind,)+
        }

        impl ErrorKind {
            /// All conditions in status order.
            pub const ALL: &'static [ErrorKind] = &[$(ErrorKind::$kind,)+];

            /// Numeric HTTP status.
            pub fn code(self) -> u16 {
                match self {
                    $(ErrorKind::$kind => $code,)+
                }
            }

            /// Symbolic name, as used by handlers that pick an error at runtime.
            pub fn name(self) -> &'static str {
                match self {
                    $(ErrorKind::$kind => $name,)+
                }
            }

            /// Canonical reason phrase sent in JSON error bodies.
            pub fn reason(self) -> &'static str {
                match self {
                    $(ErrorKind::$kind => $reason,)+
                }
            }
        }

        impl Exchange {
            $(
                #[doc = concat!("Responds `", stringify!($code), " ", $reason, "`.")]
                pub fn $helper(&mut self) {
                    self.error(ErrorKind::$kind, None);
                }
            )+
        }
    };
}

error_catalog! {
    BadRequest => 400, "badRequestError", "Bad Request", bad_request_error;
    InvalidContent => 400, "invalidContentError", "Bad Request", invalid_content_error;
    MissingParameter => 400, "missingParameterError", "Bad Request", missing_parameter_error;
    Unauthorized => 401, "unauthorizedError", "Unauthorized", unauthorized_error;
    PaymentRequired => 402, "paymentRequiredError", "Payment Required", payment_required_error;
    Forbidden => 403, "forbiddenError", "Forbidden", forbidden_error;
    NotFound => 404, "notFoundError", "Not Found", not_found_error;
    MethodNotAllowed => 405, "methodNotAllowedError", "Method Not Allowed", method_not_allowed_error;
    NotAcceptable => 406, "notAcceptableError", "Not Acceptable", not_acceptable_error;
    WrongAccept => 406, "wrongAcceptError", "Not Acceptable", wrong_accept_error;
    ProxyAuthenticationRequired => 407, "proxyAuthenticationRequiredError", "Proxy Authentication Required", proxy_authentication_required_error;
    RequestTimeout => 408, "requestTimeoutError", "Request Timeout", request_timeout_error;
    Conflict => 409, "conflictError", "Conflict", conflict_error;
    Gone => 410, "goneError", "Gone", gone_error;
    LengthRequired => 411, "lengthRequiredError", "Length Required", length_required_error;
    PreconditionFailed => 412, "preconditionFailedError", "Precondition Failed", precondition_failed_error;
    PayloadTooLarge => 413, "payloadTooLargeError", "Payload Too Large", payload_too_large_error;
    UriTooLong => 414, "uriTooLongError", "URI Too Long", uri_too_long_error;
    UnsupportedMediaType => 415, "unsupportedMediaTypeError", "Unsupported Media Type", unsupported_media_type_error;
    RangeNotSatisfiable => 416, "rangeNotSatisfiableError", "Range Not Satisfiable", range_not_satisfiable_error;
    ExpectationFailed => 417, "expectationFailedError", "Expectation Failed", expectation_failed_error;
    ImATeapot => 418, "imATeapotError", "I'm a teapot", im_a_teapot_error;
    MisdirectedRequest => 421, "misdirectedRequestError", "Misdirected Request", misdirected_request_error;
    UnprocessableEntity => 422, "unprocessableEntityError", "Unprocessable Entity", unprocessable_entity_error;
    InvalidParameter => 422, "invalidParameterError", "Unprocessable Entity", invalid_parameter_error;
    Locked => 423, "lockedError", "Locked", locked_error;
    FailedDependency => 424, "failedDependencyError", "Failed Dependency", failed_dependency_error;
    TooEarly => 425, "tooEarlyError", "Too Early", too_early_error;
    UpgradeRequired => 426, "upgradeRequiredError", "Upgrade Required", upgrade_required_error;
    PreconditionRequired => 428, "preconditionRequiredError", "Precondition Required", precondition_required_error;
    TooManyRequests => 429, "tooManyRequestsError", "Too Many Requests", too_many_requests_error;
    RequestHeaderFieldsTooLarge => 431, "requestHeaderFieldsTooLargeError", "Request Header Fields Too Large", request_header_fields_too_large_error;
    UnavailableForLegalReasons => 451, "unavailableForLegalReasonsError", "Unavailable For Legal Reasons", unavailable_for_legal_reasons_error;
    InternalServer => 500, "internalServerError", "Internal Server Error", internal_server_error;
    NotImplemented => 501, "notImplementedError", "Not Implemented", not_implemented_error;
    BadGateway => 502, "badGatewayError", "Bad Gateway", bad_gateway_error;
    ServiceUnavailable => 503, "serviceUnavailableError", "Service Unavailable", service_unavailable_error;
    GatewayTimeout => 504, "gatewayTimeoutError", "Gateway Timeout", gateway_timeout_error;
    HttpVersionNotSupported => 505, "httpVersionNotSupportedError", "HTTP Version Not Supported", http_version_not_supported_error;
    VariantAlsoNegotiates => 506, "variantAlsoNegotiatesError", "Variant Also Negotiates", variant_also_negotiates_error;
    InsufficientStorage => 507, "insufficientStorageError", "Insufficient Storage", insufficient_storage_error;
    LoopDetected => 508, "loopDetectedError", "Loop Detected", loop_detected_error;
    BandwidthLimitExceeded => 509, "bandwidthLimitExceededError", "Bandwidth Limit Exceeded", bandwidth_limit_exceeded_error;
    NotExtended => 510, "notExtendedError", "Not Extended", not_extended_error;
    NetworkAuthenticationRequired => 511, "networkAuthenticationRequiredError", "Network Authentication Required", network_authentication_required_error;
}

impl ErrorKind {
    /// Status code as an [`http::StatusCode`](StatusCode).
    pub fn status(self) -> StatusCode {
        // Every code in the table is in the valid 100..=999 range.
        StatusCode::from_u16(self.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Looks up a condition by its symbolic name (`"notFoundError"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// First condition registered for a status code.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == status.as_u16())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
