//! C-compatible types for FFI boundary

use libc::c_char;
use tabstat_core::{EngineOptions, QueryError, UnmatchedPolicy};

/// Error codes for FFI boundary
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidInput = 1,
    ColumnNotFound = 2,
    InvalidSyntax = 3,
    DomainError = 4,
    UnsupportedOperation = 5,
    InvalidTable = 6,
    SerializationError = 7,
    InternalError = 99,
}

impl From<&QueryError> for ErrorCode {
    fn from(err: &QueryError) -> Self {
        match err {
            QueryError::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            QueryError::InvalidSyntax { .. } => ErrorCode::InvalidSyntax,
            QueryError::DomainError(_) => ErrorCode::DomainError,
            QueryError::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            QueryError::InvalidTable(_) => ErrorCode::InvalidTable,
            QueryError::Serialization(_) => ErrorCode::SerializationError,
        }
    }
}

/// Error information for FFI
#[repr(C)]
#[derive(Debug)]
pub struct TabstatError {
    pub code: ErrorCode,
    pub message: [c_char; 256],
}

impl TabstatError {
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            message: [0; 256],
        }
    }

    /// Store `msg`, truncated to 255 bytes and NUL-terminated
    pub fn set(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        let bytes = msg.as_bytes();
        let len = bytes.len().min(255);
        for (i, &b) in bytes[..len].iter().enumerate() {
            self.message[i] = b as c_char;
        }
        self.message[len] = 0;
    }

    /// Message up to the first NUL, lossily decoded
    pub fn message_str(&self) -> String {
        let bytes: Vec<u8> = self
            .message
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Engine options for FFI
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EngineOptionsFFI {
    /// Rows returned by `head()`/`tail()` without an argument
    pub default_head: usize,
    /// Largest accepted `head(n)`/`tail(n)`
    pub max_head: usize,
    /// Largest accepted forecast horizon (capped at 20)
    pub max_forecast_periods: usize,
    /// Significance level for the normality verdict
    pub normality_alpha: f64,
    /// Fail unmatched expressions instead of returning the table
    pub reject_unmatched: bool,
}

impl Default for EngineOptionsFFI {
    fn default() -> Self {
        let opts = EngineOptions::default();
        Self {
            default_head: opts.default_head,
            max_head: opts.max_head,
            max_forecast_periods: opts.max_forecast_periods,
            normality_alpha: opts.normality_alpha,
            reject_unmatched: opts.unmatched == UnmatchedPolicy::Reject,
        }
    }
}

impl From<EngineOptionsFFI> for EngineOptions {
    fn from(o: EngineOptionsFFI) -> Self {
        EngineOptions {
            default_head: o.default_head,
            max_head: o.max_head,
            max_forecast_periods: o.max_forecast_periods,
            normality_alpha: o.normality_alpha,
            unmatched: if o.reject_unmatched {
                UnmatchedPolicy::Reject
            } else {
                UnmatchedPolicy::ReturnTable
            },
        }
    }
}
