#[derive(thiserror::Error, Debug)]
pub enum VendorError {
    #[error("{call} failed: status {status}")]
    Status { call: &'static str, status: i32 },

    #[error("{call} failed: status {status} (error code {code}, detail {detail})")]
    Detailed {
        call: &'static str,
        status: i32,
        code: i32,
        detail: i32,
    },
}

impl VendorError {
    /// Raw status word returned by the vendor call.
    pub fn status(&self) -> i32 {
        match self {
            VendorError::Status { status, .. } | VendorError::Detailed { status, .. } => *status,
        }
    }

    /// Name of the vendor entry point that failed.
    pub fn call(&self) -> &'static str {
        match self {
            VendorError::Status { call, .. } | VendorError::Detailed { call, .. } => call,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("decoder session is not configured")]
    NotConfigured,

    #[error("decoder session is already configured")]
    AlreadyConfigured,

    #[error("input frame is empty")]
    EmptyInput,

    #[error("input frame of {size} bytes exceeds the {limit} byte frame maximum")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("output buffer holds {got} samples, need at least {needed}")]
    OutputTooSmall { got: usize, needed: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum AlcError {
    #[error("level control stage is not initialized")]
    NotInitialized,

    #[error("offset {offset} is out of range for a buffer of {len} samples")]
    BadOffset { offset: usize, len: usize },

    #[error("{call} failed with code {code}")]
    Kernel { call: &'static str, code: i32 },
}
