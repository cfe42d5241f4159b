// This file is part of NOMA-Sim.
// Copyright (C) 2025-2026 NOMA-Sim contributors.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Error types for the allocation core.
use thiserror::Error;

/// Errors raised by pairing, allocation, rate evaluation and statistics.
///
/// All errors are raised at the call that violates the contract; nothing is
/// retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NomaError {
    /// A value is outside the domain of a formula (e.g. a zero SINR in the
    /// fair power split).
    #[error("domain error: {0}")]
    Domain(String),
    /// An operation was invoked before its inputs were prepared.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// Unknown policy name or invalid parameter.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, NomaError>;

/// Convert an `Option` into a [NomaError::Precondition] with a formatted message.
#[macro_export]
macro_rules! ok_or_precondition {
    ($opt:expr, $($arg:expr),*) => {
        $opt.ok_or_else(|| $crate::errors::NomaError::Precondition(format!($($arg),*)))
    };
}

/// Return a [NomaError::Configuration] unless the condition holds.
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $($arg:expr),*) => {
        if !$cond {
            return Err($crate::errors::NomaError::Configuration(format!($($arg),*)));
        }
    };
}

#[test]
fn test_precondition_macro() {
    let missing: Option<f64> = None;
    let res: Result<f64> = ok_or_precondition!(missing, "user {} has no power", 7);
    assert_eq!(
        res,
        Err(NomaError::Precondition("user 7 has no power".into()))
    );
}

#[test]
fn test_error_display() {
    let err = NomaError::Domain("zero SINR".into());
    assert_eq!(err.to_string(), "domain error: zero SINR");
}
