//! # Runtime
//!
//! The explicitly owned dispatch registry: symbol table, code loader and
//! controllers behind one value.
//!
//! Registration (`scan_and_load`, `reload`, `unload`) takes `&mut self`
//! and dispatch takes `&self`, so a reload can never overlap a dispatch in
//! flight.
//!
//! # Example
//!
//! ```rust
//! use weft_core::{ClassSymbol, DomainMarker, Invoker, MessageTag, MethodSymbol};
//! use weft_std::{runtime::Runtime, table::Delivery};
//!
//! struct Ping;
//! struct NetHandlers;
//!
//! let mut runtime = Runtime::new();
//! runtime.register::<NetHandlers, _>(|| {
//!     ClassSymbol::builder::<NetHandlers>()
//!         .static_class()
//!         .marker(DomainMarker::MESSAGE)
//!         .method(
//!             MethodSymbol::function("on_ping", Invoker::function_with(|_: &Ping| ()))
//!                 .tag(MessageTag::opcode(1)),
//!         )
//!         .build()
//! });
//! assert!(runtime.load_all().is_clean());
//!
//! assert_eq!(runtime.send_message(1, &Ping).unwrap(), Delivery::Handled(1));
//! assert_eq!(runtime.send_message(99, &()).unwrap(), Delivery::Dropped);
//! ```

use crate::{
    code_info::CodeInfo,
    config::RuntimeConfig,
    controllers::{Bean, Controllers},
    loader::{BindingProcessor, CodeLoader, ScanReport},
    processors::{
        ApiProcessor, AspectProcessor, EventProcessor, InjectProcessor, InputProcessor, Install,
        MessageProcessor, PoolProcessor, Processor,
    },
    symbols::SymbolTable,
    table::Delivery,
};
use std::any::Any;
use weft_core::{
    Behaviour, ClassSymbol, CutPoint, DispatchError, DomainMarker, InputCode, InputOp, LoadError,
    PoolAction, TypeKey,
};

/// Owns every piece of the binding pipeline.
pub struct Runtime {
    config: RuntimeConfig,
    symbols: SymbolTable,
    loader: CodeLoader<Controllers>,
    controllers: Controllers,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// A runtime with every built-in domain.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// A runtime with the domains selected by `config`.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut runtime = Self {
            config,
            symbols: SymbolTable::new(),
            loader: CodeLoader::new(),
            controllers: Controllers::new(),
        };
        runtime.register_builtin_domains();
        runtime
    }

    /// Replace the symbol table.
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    fn register_builtin_domains(&mut self) {
        for marker in self.config.domains.markers() {
            let registered = match marker {
                DomainMarker::ASPECT => self.register_builtin(AspectProcessor::new()),
                DomainMarker::EVENT => self.register_builtin(EventProcessor::new()),
                DomainMarker::MESSAGE => self.register_builtin(MessageProcessor::new()),
                DomainMarker::INPUT => self.register_builtin(InputProcessor::new()),
                DomainMarker::INJECT => self.register_builtin(InjectProcessor::new()),
                DomainMarker::POOL => self.register_builtin(PoolProcessor::new()),
                DomainMarker::API => self.register_builtin(ApiProcessor::new()),
                _ => Ok(()),
            };
            if let Err(err) = registered {
                tracing::warn!(domain = %marker, error = %err, "built-in domain not registered");
            }
        }
    }

    fn register_builtin<D: Install>(&mut self, processor: Processor<D>) -> Result<(), LoadError> {
        let strict = self.config.strict_scan;
        self.loader.register_domain(processor.strict(strict))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The configuration the runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The symbol table.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The symbol table, for registration and replacement.
    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// The controllers.
    pub fn controllers(&self) -> &Controllers {
        &self.controllers
    }

    /// The code loader.
    pub fn loader(&self) -> &CodeLoader<Controllers> {
        &self.loader
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register `T` in the symbol table.
    pub fn register<T, F>(&mut self, build: F) -> bool
    where
        T: ?Sized + 'static,
        F: Fn() -> ClassSymbol + Send + Sync + 'static,
    {
        self.symbols.register::<T, F>(build)
    }

    /// Register a custom domain.
    pub fn register_domain<P>(&mut self, processor: P) -> Result<(), LoadError>
    where
        P: BindingProcessor<Controllers> + 'static,
    {
        self.loader.register_domain(processor)
    }

    /// Register a custom domain from its three callbacks.
    ///
    /// Such a domain keeps its entries until cleanup; see
    /// [`CodeLoader::register_callbacks`].
    pub fn register_callbacks<L, U, K>(
        &mut self,
        marker: DomainMarker,
        load: L,
        cleanup: U,
        lookup: K,
    ) -> Result<(), LoadError>
    where
        L: FnMut(&mut Controllers, &ClassSymbol, bool) -> Result<(), LoadError> + Send + 'static,
        U: FnMut(&mut Controllers) + Send + 'static,
        K: Fn(&ClassSymbol) -> Option<CodeInfo> + Send + 'static,
    {
        self.loader.register_callbacks(marker, load, cleanup, lookup)
    }

    /// Load every type in `types`.
    pub fn scan_and_load<I>(&mut self, types: I) -> ScanReport
    where
        I: IntoIterator<Item = TypeKey>,
    {
        self.loader
            .scan_and_load(&mut self.controllers, &self.symbols, types)
    }

    /// Load every registered type.
    pub fn load_all(&mut self) -> ScanReport {
        let types: Vec<_> = self.symbols.types().collect();
        self.scan_and_load(types)
    }

    /// Rebuild `ty`'s symbol and reload it.
    ///
    /// Dispatch borrows the runtime, so a reload cannot run while a
    /// dispatch result still borrows it:
    ///
    /// ```compile_fail
    /// use weft_core::TypeKey;
    /// use weft_std::runtime::Runtime;
    ///
    /// let mut runtime = Runtime::new();
    /// let events = &runtime.controllers().events;
    /// runtime.reload(TypeKey::of::<u8>());
    /// let _ = events.publish(1, &());
    /// ```
    pub fn reload(&mut self, ty: TypeKey) -> ScanReport {
        self.loader
            .reload(&mut self.controllers, &mut self.symbols, ty)
    }

    /// Swap `T`'s definition and reload it.
    pub fn replace<T, F>(&mut self, build: F) -> ScanReport
    where
        T: ?Sized + 'static,
        F: Fn() -> ClassSymbol + Send + Sync + 'static,
    {
        self.symbols.replace::<T, F>(build);
        self.reload(TypeKey::of::<T>())
    }

    /// Remove `ty` from every domain.
    pub fn unload(&mut self, ty: TypeKey) -> usize {
        self.loader.unload(&mut self.controllers, ty)
    }

    /// Run every domain's cleanup.
    pub fn unload_all(&mut self) {
        self.loader.cleanup_all(&mut self.controllers);
    }

    /// Code Info stored by `marker`'s domain for `ty`.
    pub fn lookup(&self, marker: DomainMarker, ty: TypeKey) -> Option<CodeInfo> {
        let symbol = self.symbols.symbol(ty)?;
        self.loader.lookup(marker, &symbol)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Fire `behaviour` on `instance`, woven with its aspect advice.
    pub fn dispatch<T: Any>(
        &self,
        behaviour: Behaviour,
        instance: &mut T,
    ) -> Result<Delivery, DispatchError> {
        self.weave(instance, &CutPoint::Behaviour(behaviour), &[])
    }

    /// Call `instance`'s method `name`, woven with its aspect advice.
    pub fn call_function<T: Any>(
        &self,
        instance: &mut T,
        name: &str,
        args: &[&dyn Any],
    ) -> Result<Delivery, DispatchError> {
        self.weave(instance, &CutPoint::method(name.to_owned()), args)
    }

    fn weave<T: Any>(
        &self,
        instance: &mut T,
        cut: &CutPoint,
        args: &[&dyn Any],
    ) -> Result<Delivery, DispatchError> {
        let target = TypeKey::of::<T>();
        let symbol = self.symbols.symbol(target);
        let underlying = symbol
            .as_deref()
            .and_then(|symbol| symbol.method(cut.method_name()))
            .and_then(|method| method.invoker());
        let applicable = self.symbols.applicable_types(target);
        self.controllers
            .aspects
            .weave(target, &applicable, cut, instance, underlying, args)
    }

    /// Publish `payload` under event `id`.
    pub fn publish_event<P: Any>(&self, id: i32, payload: &P) -> Result<Delivery, DispatchError> {
        self.controllers.events.publish(id, payload)
    }

    /// Publish `payload` to the subscribers of its type.
    pub fn publish<P: Any>(&self, payload: &P) -> Result<Delivery, DispatchError> {
        self.controllers.events.publish_payload(payload)
    }

    /// Deliver `message` received under `opcode`.
    pub fn send_message<M: Any>(
        &self,
        opcode: u32,
        message: &M,
    ) -> Result<Delivery, DispatchError> {
        self.controllers.messages.send(opcode, message)
    }

    /// Deliver input operation `op` on `code`.
    pub fn on_input<P: Any>(
        &self,
        code: u32,
        op: InputOp,
        payload: &P,
    ) -> Result<Delivery, DispatchError> {
        self.controllers.inputs.on_input(InputCode(code), op, payload)
    }

    /// Run the `action` pool callbacks for `instance`.
    pub fn process_pool<T: Any>(
        &self,
        action: PoolAction,
        instance: &mut T,
    ) -> Result<Delivery, DispatchError> {
        self.controllers.pools.process(action, instance)
    }

    /// Call the function exported as `name`.
    pub fn call_api(&self, name: &str, args: &[&dyn Any]) -> Result<Delivery, DispatchError> {
        self.controllers.apis.call(name, args)
    }

    // ========================================================================
    // Injection
    // ========================================================================

    /// Activation policy of `ty`.
    pub fn policy_of(&self, ty: TypeKey) -> Option<Behaviour> {
        self.controllers.injection.policy_of(ty)
    }

    /// Whether `ty`'s dependencies should be populated at `behaviour`.
    pub fn should_activate(&self, ty: TypeKey, behaviour: Behaviour) -> bool {
        self.controllers.injection.should_activate(ty, behaviour)
    }

    /// Bean descriptor of `ty`.
    pub fn bean(&self, ty: TypeKey) -> Option<&Bean> {
        self.controllers.injection.bean(ty)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.loader.cleanup_all(&mut self.controllers);
    }
}
