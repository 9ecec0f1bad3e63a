//! Generic collaborator status code.
//!
//! Mirrors Tock's `kernel::returncode::ReturnCode`: a small, `Copy`
//! status enum that every `hil` trait method returns, independent of any
//! mesh-protocol meaning. Capsules translate a `ReturnCode` into their own
//! richer error type (`capsules::net::errors::BssError`/`BdcError`) at the
//! point where it becomes host-facing.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReturnCode {
    SUCCESS,
    FAIL,
    EBUSY,
    EINVAL,
    ENOMEM,
    ENOSUPPORT,
    EOFF,
}

impl ReturnCode {
    pub fn is_success(&self) -> bool {
        *self == ReturnCode::SUCCESS
    }
}

impl core::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ReturnCode::SUCCESS => "success",
            ReturnCode::FAIL => "collaborator call failed",
            ReturnCode::EBUSY => "collaborator busy",
            ReturnCode::EINVAL => "invalid argument",
            ReturnCode::ENOMEM => "no memory",
            ReturnCode::ENOSUPPORT => "not supported",
            ReturnCode::EOFF => "not associated with network",
        };
        f.write_str(s)
    }
}
