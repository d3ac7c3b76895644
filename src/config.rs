//! Kernel tunables.
//!
//! The defaults match the reference kernel library. Each value can be
//! overridden through the environment before the first kernel call:
//!
//! - `STRIDED_DENSE_RECURSION_THRESHOLD`: size below which triangular kernels stop splitting
//! - `STRIDED_DENSE_FROBENIUS_THRESHOLD`: size from which symmetric/hermitian Frobenius
//!   norms use the naive double-counting sum
//! - `STRIDED_DENSE_TRACE=1`: raise recursion dispatch events from `trace` to `debug`
//!
//! Frobenius fallback and operand expansion events are always emitted at `debug`.

use std::sync::OnceLock;

/// Default recursion threshold of the triangular bulk kernels.
pub const RECURSION_THRESHOLD: usize = 256;

/// Default size at which the symmetric/hermitian Frobenius norm switches to the naive sum.
pub const FROBENIUS_FALLBACK_THRESHOLD: usize = 128;

const ENV_RECURSION: &str = "STRIDED_DENSE_RECURSION_THRESHOLD";
const ENV_FROBENIUS: &str = "STRIDED_DENSE_FROBENIUS_THRESHOLD";
const ENV_TRACE: &str = "STRIDED_DENSE_TRACE";

/// Tunables read by the bulk and norm kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Triangular kernels of order `>= recursion_threshold` split in two.
    pub recursion_threshold: usize,
    /// Symmetric/hermitian matrices of order `>= frobenius_fallback_threshold`
    /// compute the Frobenius norm with the naive sum.
    pub frobenius_fallback_threshold: usize,
    /// Emit recursion dispatch events at `debug` instead of `trace`.
    pub trace: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            recursion_threshold: RECURSION_THRESHOLD,
            frobenius_fallback_threshold: FROBENIUS_FALLBACK_THRESHOLD,
            trace: false,
        }
    }
}

impl KernelConfig {
    /// Defaults overridden by the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Process-wide configuration, read from the environment once.
    pub fn global() -> &'static KernelConfig {
        static CONFIG: OnceLock<KernelConfig> = OnceLock::new();
        CONFIG.get_or_init(KernelConfig::from_env)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = parse_threshold(ENV_RECURSION, lookup(ENV_RECURSION)) {
            cfg.recursion_threshold = v;
        }
        if let Some(v) = parse_threshold(ENV_FROBENIUS, lookup(ENV_FROBENIUS)) {
            cfg.frobenius_fallback_threshold = v;
        }
        cfg.trace = matches!(lookup(ENV_TRACE), Some(ref v) if v == "1");
        cfg
    }
}

fn parse_threshold(key: &str, raw: Option<String>) -> Option<usize> {
    let raw = raw?;
    match raw.trim().parse::<usize>() {
        // a threshold of 1 would never terminate the split at n = 1
        Ok(v) if v >= 2 => Some(v),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid kernel threshold");
            None
        }
    }
}
