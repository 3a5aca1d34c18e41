//! Header names, problem types, and stream tuning.

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const SSE_KEEP_ALIVE_SECS: u64 = 20;

pub(crate) const PROBLEM_INTERNAL: &str = "https://pdfpress.dev/problems/internal";
pub(crate) const PROBLEM_CONFIG_INVALID: &str = "https://pdfpress.dev/problems/config-invalid";
