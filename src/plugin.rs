// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Plugins: named transforms over a stylesheet tree.
//!
//! A [`Plugin`] couples a name with a callable that receives the tree and a
//! [`PluginContext`]. The callable edits the tree directly, registers event
//! listeners on it ([`Root::on`]), emits warnings, or injects further
//! plugins into the running pipeline. Sync and async callables are both
//! first-class; an async plugin in a pipeline forces the caller onto the
//! async completion path (see [`crate::processor::LazyResult`]).
//!
//! A [`PluginFactory`] is the distributable form: a named constructor that
//! turns JSON configuration into a plugin instance. Factories handed to a
//! processor unbuilt are *deferred*: the constructor does not run until the
//! pipeline actually processes something, so building a processor is free
//! of plugin side effects. Built plugins are stamped with the factory's
//! name and this crate's version, which is what warning attribution and
//! pipeline logs report.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Error;
use crate::nodes::{Node, Root};
use crate::processor::{LazyResult, ProcessOptions, Processor};
use crate::result::Warning;

type SyncFn = dyn Fn(&mut Root, &mut PluginContext) -> Result<(), Error> + Send + Sync;
type AsyncFn = dyn for<'a> Fn(&'a mut Root, &'a mut PluginContext) -> BoxFuture<'a, Result<(), Error>>
    + Send
    + Sync;

#[derive(Clone)]
enum Hook {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

/// A named transform. Cheap to clone; the callable is shared.
#[derive(Clone)]
pub struct Plugin {
    pub name: String,
    pub version: String,
    hook: Hook,
}

impl Plugin {
    pub fn new<F>(name: impl Into<String>, callable: F) -> Self
    where
        F: Fn(&mut Root, &mut PluginContext) -> Result<(), Error> + Send + Sync + 'static,
    {
        Plugin {
            name: name.into(),
            version: crate::VERSION.to_owned(),
            hook: Hook::Sync(Arc::new(callable)),
        }
    }

    pub fn new_async<F>(name: impl Into<String>, callable: F) -> Self
    where
        F: for<'a> Fn(&'a mut Root, &'a mut PluginContext) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        Plugin {
            name: name.into(),
            version: crate::VERSION.to_owned(),
            hook: Hook::Async(Arc::new(callable)),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self.hook, Hook::Async(_))
    }

    /// Run the callable on a synchronous pipeline.
    ///
    /// # Errors
    ///
    /// [`Error::AsyncPlugin`] when the callable is async; the caller must
    /// switch to the async completion path.
    pub(crate) fn run_sync(&self, root: &mut Root, ctx: &mut PluginContext) -> Result<(), Error> {
        match &self.hook {
            Hook::Sync(f) => f(root, ctx),
            Hook::Async(_) => Err(Error::AsyncPlugin {
                name: self.name.clone(),
            }),
        }
    }

    pub(crate) async fn run(&self, root: &mut Root, ctx: &mut PluginContext) -> Result<(), Error> {
        match &self.hook {
            Hook::Sync(f) => f(root, ctx),
            Hook::Async(f) => f(root, ctx).await,
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("async", &self.is_async())
            .finish()
    }
}

// ============================================================================
// Context
// ============================================================================

/// Per-run state a plugin callable can reach: warnings and dynamic plugin
/// injection.
#[derive(Debug, Default)]
pub struct PluginContext {
    pub(crate) current: String,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) added: Vec<Plugin>,
}

impl PluginContext {
    /// Name of the plugin currently running.
    pub fn plugin_name(&self) -> &str {
        &self.current
    }

    /// Record a warning attributed to the running plugin.
    pub fn warn(&mut self, text: impl Into<String>) {
        self.warnings.push(Warning {
            text: text.into(),
            plugin: Some(self.current.clone()),
            line: None,
            column: None,
        });
    }

    /// Record a warning pointing at a node's source position.
    pub fn warn_node(&mut self, text: impl Into<String>, node: &Node) {
        let start = node.source().and_then(|s| s.start);
        self.warnings.push(Warning {
            text: text.into(),
            plugin: Some(self.current.clone()),
            line: start.map(|p| p.line),
            column: start.map(|p| p.column),
        });
    }

    /// Append a plugin to the running pipeline. It executes after every
    /// plugin already queued, including ones added earlier this run.
    pub fn add_plugin(&mut self, plugin: Plugin) {
        self.added.push(plugin);
    }

    pub(crate) fn take_added(&mut self) -> Vec<Plugin> {
        std::mem::take(&mut self.added)
    }
}

// ============================================================================
// Factories
// ============================================================================

/// A named plugin constructor taking JSON configuration.
#[derive(Clone)]
pub struct PluginFactory {
    name: String,
    init: Arc<dyn Fn(Value) -> Plugin + Send + Sync>,
}

impl PluginFactory {
    pub fn new<F>(name: impl Into<String>, init: F) -> Self
    where
        F: Fn(Value) -> Plugin + Send + Sync + 'static,
    {
        PluginFactory {
            name: name.into(),
            init: Arc::new(init),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the constructor, stamping the result with the factory's name and
    /// this crate's version.
    pub fn build(&self, args: Value) -> Plugin {
        let mut plugin = (self.init)(args);
        plugin.name = self.name.clone();
        plugin.version = crate::VERSION.to_owned();
        plugin
    }

    /// One-shot convenience: a single-plugin pipeline over `css`.
    pub fn process(&self, css: &str, opts: ProcessOptions, args: Value) -> LazyResult {
        Processor::new()
            .use_plugin(self.build(args))
            .process(css, opts)
    }
}

impl fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginFactory")
            .field("name", &self.name)
            .finish()
    }
}

// ============================================================================
// What a processor accepts
// ============================================================================

/// Anything [`Processor::use_plugin`] accepts: a built plugin, an unbuilt
/// factory (deferred until process time), or a whole processor whose
/// pipeline is flattened in.
pub enum PluginSpec {
    Plugin(Plugin),
    Factory(PluginFactory),
    Processor(Processor),
}

impl From<Plugin> for PluginSpec {
    fn from(p: Plugin) -> Self {
        PluginSpec::Plugin(p)
    }
}

impl From<PluginFactory> for PluginSpec {
    fn from(f: PluginFactory) -> Self {
        PluginSpec::Factory(f)
    }
}

impl From<&PluginFactory> for PluginSpec {
    fn from(f: &PluginFactory) -> Self {
        PluginSpec::Factory(f.clone())
    }
}

impl From<Processor> for PluginSpec {
    fn from(p: Processor) -> Self {
        PluginSpec::Processor(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn build_stamps_name_and_version() {
        let factory = PluginFactory::new("cleaner", |_args| {
            Plugin::new("anonymous", |_root, _ctx| Ok(()))
        });
        let plugin = factory.build(Value::Null);
        assert_eq!(plugin.name, "cleaner");
        assert_eq!(plugin.version, crate::VERSION);
    }

    #[test]
    fn constructor_sees_its_args() {
        let factory = PluginFactory::new("sized", |args| {
            let size = args["size"].as_u64().unwrap_or(0);
            Plugin::new("sized", move |root, _ctx| {
                root.walk_decls(|d| d.value = size.to_string());
                Ok(())
            })
        });
        let plugin = factory.build(serde_json::json!({ "size": 7 }));
        let mut root = crate::parser::parse("a{width:0}", None).unwrap();
        let mut ctx = PluginContext::default();
        plugin.run_sync(&mut root, &mut ctx).unwrap();
        assert_eq!(crate::stringifier::stringify(&root), "a{width:7}");
    }

    fn noop_async<'a>(
        _root: &'a mut Root,
        _ctx: &'a mut PluginContext,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn async_plugin_refuses_sync_run() {
        let plugin = Plugin::new_async("later", noop_async);
        let mut root = Root::new();
        let mut ctx = PluginContext::default();
        let err = plugin.run_sync(&mut root, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::AsyncPlugin { .. }));
    }

    #[test]
    fn warnings_carry_the_plugin_name() {
        let mut ctx = PluginContext {
            current: "linter".to_owned(),
            ..PluginContext::default()
        };
        ctx.warn("suspicious selector");
        assert_eq!(ctx.warnings[0].plugin.as_deref(), Some("linter"));
    }

    #[test]
    fn factory_constructor_is_not_called_at_build_registration() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let factory = PluginFactory::new("counted", |_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Plugin::new("counted", |_, _| Ok(()))
        });
        let _processor = Processor::new().use_plugin(factory);
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }
}
