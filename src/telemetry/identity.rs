// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Detector identity resolution
//!
//! Every event carries a stable per-instance identifier: the hardware
//! address of the first known network interface present on the host.
//! Resolution happens once at startup and failure is fatal.

use sysinfo::Networks;
use thiserror::Error;

/// Interfaces checked, in order, for a usable hardware address.
const KNOWN_INTERFACES: &[&str] = &["eth0", "wlan0", "en1"];

/// Detector identity could not be determined.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// None of the candidate interfaces exist on this host.
    #[error("no detector id could be determined (tried interfaces {0:?})")]
    NoKnownInterface(Vec<String>),
}

/// Resolve the unique identifier of this detector.
pub fn resolve_detector_id() -> Result<String, IdentityError> {
    let networks = Networks::new_with_refreshed_list();
    resolve_from(&networks, KNOWN_INTERFACES)
}

fn resolve_from(networks: &Networks, candidates: &[&str]) -> Result<String, IdentityError> {
    for name in candidates {
        if let Some((_, data)) = networks.iter().find(|(n, _)| n.as_str() == *name) {
            return Ok(data.mac_address().to_string());
        }
    }

    Err(IdentityError::NoKnownInterface(
        candidates.iter().map(|s| s.to_string()).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_candidate_interface_is_an_error() {
        let networks = Networks::new_with_refreshed_list();
        let result = resolve_from(&networks, &["rayshed-test-no-such-if0"]);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("rayshed-test-no-such-if0"));
    }

    #[test]
    fn test_empty_candidate_list_is_an_error() {
        let networks = Networks::new_with_refreshed_list();
        assert!(resolve_from(&networks, &[]).is_err());
    }
}
