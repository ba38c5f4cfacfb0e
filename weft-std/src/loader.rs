//! # Code Loader
//!
//! Routes every marked type to the domains registered under its markers.
//!
//! Each domain is a [`BindingProcessor`]: `load` describes and installs a
//! type, `unload` removes one type, `cleanup` removes everything, and
//! `lookup` returns the stored Code Info. Domains can also be registered
//! from three closures with [`CodeLoader::register_callbacks`].
//!
//! Loading is partial-failure tolerant: a type (or a marker) that fails is
//! logged and recorded in the [`ScanReport`], and the scan moves on.
//!
//! The loader is generic over the context its domains install into. The
//! built-in domains use [`Controllers`](crate::controllers::Controllers).

use crate::{code_info::CodeInfo, symbols::SymbolTable};
use std::collections::HashMap;
use weft_core::{ClassSymbol, DomainMarker, LoadError, TypeKey};

// ============================================================================
// Domain registration
// ============================================================================

/// One binding domain.
pub trait BindingProcessor<C>: Send {
    /// Marker routed to this domain.
    fn marker(&self) -> DomainMarker;

    /// Describe `symbol` and install its entries into `ctx`.
    ///
    /// Without `reload`, a type that is already loaded is rejected with
    /// [`LoadError::Duplicate`] and its registration left untouched. With
    /// `reload`, the previous Code Info and entries are evicted first.
    fn load(&mut self, ctx: &mut C, symbol: &ClassSymbol, reload: bool) -> Result<(), LoadError>;

    /// Remove one type. Returns whether it was loaded.
    ///
    /// The default does nothing and returns `false`: a domain that does not
    /// override it keeps the type's entries until `cleanup`.
    fn unload(&mut self, ctx: &mut C, ty: TypeKey) -> bool {
        let _ = (ctx, ty);
        false
    }

    /// Remove every type.
    fn cleanup(&mut self, ctx: &mut C);

    /// Code Info stored for `symbol`.
    fn lookup(&self, symbol: &ClassSymbol) -> Option<CodeInfo>;
}

/// A domain built from closures.
pub struct FnDomain<L, U, K> {
    marker: DomainMarker,
    load: L,
    cleanup: U,
    lookup: K,
}

impl<L, U, K> FnDomain<L, U, K> {
    /// Create a domain from its `load`, `cleanup` and `lookup` callbacks.
    pub fn new(marker: DomainMarker, load: L, cleanup: U, lookup: K) -> Self {
        Self {
            marker,
            load,
            cleanup,
            lookup,
        }
    }
}

impl<C, L, U, K> BindingProcessor<C> for FnDomain<L, U, K>
where
    L: FnMut(&mut C, &ClassSymbol, bool) -> Result<(), LoadError> + Send,
    U: FnMut(&mut C) + Send,
    K: Fn(&ClassSymbol) -> Option<CodeInfo> + Send,
{
    fn marker(&self) -> DomainMarker {
        self.marker
    }

    fn load(&mut self, ctx: &mut C, symbol: &ClassSymbol, reload: bool) -> Result<(), LoadError> {
        (self.load)(ctx, symbol, reload)
    }

    fn cleanup(&mut self, ctx: &mut C) {
        (self.cleanup)(ctx)
    }

    fn lookup(&self, symbol: &ClassSymbol) -> Option<CodeInfo> {
        (self.lookup)(symbol)
    }
}

// ============================================================================
// Reports
// ============================================================================

/// A (type, domain) pair that failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// The type.
    pub ty: TypeKey,
    /// The domain, when the failure is tied to one.
    pub domain: Option<DomainMarker>,
    /// What went wrong.
    pub error: LoadError,
}

/// Outcome of a scan, a reload or a single load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Pairs that loaded.
    pub loaded: Vec<(TypeKey, DomainMarker)>,
    /// Pairs that failed.
    pub failures: Vec<LoadFailure>,
}

impl ScanReport {
    /// Whether nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: ScanReport) {
        self.loaded.extend(other.loaded);
        self.failures.extend(other.failures);
    }

    fn fail(&mut self, ty: TypeKey, domain: Option<DomainMarker>, error: LoadError) {
        tracing::warn!(%ty, domain = ?domain.map(|d| d.name()), %error, "load failed");
        self.failures.push(LoadFailure { ty, domain, error });
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Registry of binding domains.
pub struct CodeLoader<C> {
    domains: Vec<Box<dyn BindingProcessor<C>>>,
    loaded: HashMap<TypeKey, Vec<DomainMarker>>,
}

impl<C> Default for CodeLoader<C> {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            loaded: HashMap::new(),
        }
    }
}

impl<C: 'static> CodeLoader<C> {
    /// Create a loader with no domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a domain under its marker.
    pub fn register_domain<P>(&mut self, processor: P) -> Result<(), LoadError>
    where
        P: BindingProcessor<C> + 'static,
    {
        let marker = processor.marker();
        if self.domain(marker).is_some() {
            tracing::warn!(domain = %marker, "domain already registered");
            return Err(LoadError::DomainExists(marker));
        }
        tracing::debug!(domain = %marker, "domain registered");
        self.domains.push(Box::new(processor));
        Ok(())
    }

    /// Register a domain from its three callbacks.
    ///
    /// Such a domain has no per-type unload. [`CodeLoader::unload`] and a
    /// reload that drops the marker forget the type, but whatever `load`
    /// installed stays in place until `cleanup` runs. Implement
    /// [`BindingProcessor`] directly when entries must be evicted one type
    /// at a time.
    pub fn register_callbacks<L, U, K>(
        &mut self,
        marker: DomainMarker,
        load: L,
        cleanup: U,
        lookup: K,
    ) -> Result<(), LoadError>
    where
        L: FnMut(&mut C, &ClassSymbol, bool) -> Result<(), LoadError> + Send + 'static,
        U: FnMut(&mut C) + Send + 'static,
        K: Fn(&ClassSymbol) -> Option<CodeInfo> + Send + 'static,
    {
        self.register_domain(FnDomain::new(marker, load, cleanup, lookup))
    }

    /// Registered markers, in registration order.
    pub fn domains(&self) -> impl Iterator<Item = DomainMarker> + '_ {
        self.domains.iter().map(|domain| domain.marker())
    }

    fn domain(&self, marker: DomainMarker) -> Option<usize> {
        self.domains.iter().position(|domain| domain.marker() == marker)
    }

    /// Load `symbol` into every domain it is marked for.
    pub fn load(&mut self, ctx: &mut C, symbol: &ClassSymbol, reload: bool) -> ScanReport {
        let ty = symbol.key();
        let mut report = ScanReport::default();

        for &marker in symbol.markers() {
            let Some(index) = self.domain(marker) else {
                report.fail(ty, Some(marker), LoadError::MissingDomain(marker));
                continue;
            };
            match self.domains[index].load(ctx, symbol, reload) {
                Ok(()) => {
                    tracing::debug!(%ty, domain = %marker, reload, "loaded");
                    let markers = self.loaded.entry(ty).or_default();
                    if !markers.contains(&marker) {
                        markers.push(marker);
                    }
                    report.loaded.push((ty, marker));
                }
                Err(error) => {
                    // A rejected reload has already evicted the old entries.
                    if matches!(error, LoadError::Rejected { .. }) {
                        if let Some(markers) = self.loaded.get_mut(&ty) {
                            markers.retain(|m| *m != marker);
                        }
                    }
                    report.fail(ty, Some(marker), error);
                }
            }
        }

        report
    }

    /// Load every type in `types`.
    ///
    /// Types unknown to `symbols` are reported and skipped.
    pub fn scan_and_load<I>(&mut self, ctx: &mut C, symbols: &SymbolTable, types: I) -> ScanReport
    where
        I: IntoIterator<Item = TypeKey>,
    {
        let mut report = ScanReport::default();
        for ty in types {
            match symbols.symbol(ty) {
                Some(symbol) => report.merge(self.load(ctx, &symbol, false)),
                None => report.fail(ty, None, LoadError::UnknownType(ty.name())),
            }
        }
        tracing::debug!(
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "scan finished"
        );
        report
    }

    /// Rebuild `ty`'s symbol and reload it everywhere.
    ///
    /// Domains whose marker the new symbol no longer carries unload it.
    pub fn reload(&mut self, ctx: &mut C, symbols: &mut SymbolTable, ty: TypeKey) -> ScanReport {
        let mut report = ScanReport::default();
        symbols.invalidate(ty);
        let Some(symbol) = symbols.symbol(ty) else {
            report.fail(ty, None, LoadError::UnknownType(ty.name()));
            return report;
        };

        let previous = self.loaded.get(&ty).cloned().unwrap_or_default();
        for marker in previous {
            if symbol.has_marker(marker) {
                continue;
            }
            if let Some(index) = self.domain(marker) {
                self.domains[index].unload(ctx, ty);
                tracing::debug!(%ty, domain = %marker, "marker dropped on reload");
            }
            if let Some(markers) = self.loaded.get_mut(&ty) {
                markers.retain(|m| *m != marker);
            }
        }

        report.merge(self.load(ctx, &symbol, true));
        report
    }

    /// Remove `ty` from every domain it was loaded into.
    pub fn unload(&mut self, ctx: &mut C, ty: TypeKey) -> usize {
        let Some(markers) = self.loaded.remove(&ty) else {
            return 0;
        };
        let mut unloaded = 0;
        for marker in markers {
            if let Some(index) = self.domain(marker) {
                if self.domains[index].unload(ctx, ty) {
                    unloaded += 1;
                }
            }
        }
        tracing::debug!(%ty, unloaded, "type unloaded");
        unloaded
    }

    /// Run every domain's cleanup, in registration order.
    pub fn cleanup_all(&mut self, ctx: &mut C) {
        for domain in &mut self.domains {
            tracing::debug!(domain = %domain.marker(), "cleanup");
            domain.cleanup(ctx);
        }
        self.loaded.clear();
    }

    /// Code Info stored by `marker`'s domain for `symbol`.
    pub fn lookup(&self, marker: DomainMarker, symbol: &ClassSymbol) -> Option<CodeInfo> {
        let index = self.domain(marker)?;
        self.domains[index].lookup(symbol)
    }

    /// Domains `ty` is currently loaded into.
    pub fn loaded_domains(&self, ty: TypeKey) -> &[DomainMarker] {
        self.loaded.get(&ty).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `ty` is loaded into `marker`'s domain.
    pub fn is_loaded(&self, ty: TypeKey, marker: DomainMarker) -> bool {
        self.loaded_domains(ty).contains(&marker)
    }
}
