//! Runtime configuration.

use bitflags::bitflags;
use weft_core::DomainMarker;

bitflags! {
    /// Built-in domains a [`Runtime`](crate::runtime::Runtime) registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Domains: u8 {
        /// Aspect weaving.
        const ASPECT = 1 << 0;
        /// Event subscriptions.
        const EVENT = 1 << 1;
        /// Message handlers.
        const MESSAGE = 1 << 2;
        /// Input handlers.
        const INPUT = 1 << 3;
        /// Injection policies.
        const INJECT = 1 << 4;
        /// Pool callbacks.
        const POOL = 1 << 5;
        /// Exported functions.
        const API = 1 << 6;
    }
}

impl Domains {
    /// Selected domains, in registration order.
    pub fn markers(self) -> impl Iterator<Item = DomainMarker> {
        [
            (Domains::ASPECT, DomainMarker::ASPECT),
            (Domains::EVENT, DomainMarker::EVENT),
            (Domains::MESSAGE, DomainMarker::MESSAGE),
            (Domains::INPUT, DomainMarker::INPUT),
            (Domains::INJECT, DomainMarker::INJECT),
            (Domains::POOL, DomainMarker::POOL),
            (Domains::API, DomainMarker::API),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, marker)| marker)
    }
}

impl Default for Domains {
    fn default() -> Self {
        Domains::all()
    }
}

/// Configuration for [`Runtime`](crate::runtime::Runtime).
///
/// # Example
///
/// ```rust
/// use weft_std::config::{Domains, RuntimeConfig};
///
/// let config = RuntimeConfig::default()
///     .with_domains(Domains::EVENT | Domains::MESSAGE)
///     .with_strict_scan(true);
/// assert_eq!(config.domains.markers().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Built-in domains to register.
    pub domains: Domains,
    /// Fail a class load on its first malformed method instead of skipping it.
    pub strict_scan: bool,
}

impl RuntimeConfig {
    /// Select the built-in domains.
    pub fn with_domains(mut self, domains: Domains) -> Self {
        self.domains = domains;
        self
    }

    /// Enable or disable strict scanning.
    pub fn with_strict_scan(mut self, strict: bool) -> Self {
        self.strict_scan = strict;
        self
    }
}
