//! Offline gate for backend and embedder calls.
//!
//! Replayed sweeps must not reach a live model: with
//! `RAGSWEEP_NETWORK_POLICY=deny` (or a [`NetworkPolicyGuard`] in tests) a
//! cassette miss fails the unit instead of silently calling the backend.

use std::sync::Mutex;

pub const NETWORK_POLICY_ENV: &str = "RAGSWEEP_NETWORK_POLICY";

/// Deny reason; `None` allows outbound calls.
static DENY_REASON: Mutex<Option<String>> = Mutex::new(None);

fn swap_reason(reason: Option<String>) -> Option<String> {
    let mut slot = DENY_REASON.lock().unwrap_or_else(|p| p.into_inner());
    std::mem::replace(&mut *slot, reason)
}

/// Blocks outbound calls until dropped, then restores the previous state.
pub struct NetworkPolicyGuard {
    previous: Option<String>,
}

impl NetworkPolicyGuard {
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            previous: swap_reason(Some(reason.into())),
        }
    }
}

impl Drop for NetworkPolicyGuard {
    fn drop(&mut self) {
        swap_reason(self.previous.take());
    }
}

/// Fails when outbound calls to `target` are not allowed.
pub fn check_outbound(target: &str) -> anyhow::Result<()> {
    let env_denies = std::env::var(NETWORK_POLICY_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("deny"))
        .unwrap_or(false);
    let reason = if env_denies {
        Some(format!("{}=deny", NETWORK_POLICY_ENV))
    } else {
        DENY_REASON
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    };

    match reason {
        None => Ok(()),
        Some(reason) => anyhow::bail!(
            "outbound network blocked by policy (target={}): {}",
            target,
            reason
        ),
    }
}
