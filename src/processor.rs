// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The pipeline driver.
//!
//! A [`Processor`] is an ordered plugin list. Calling [`Processor::process`]
//! does no work yet: it returns a [`LazyResult`] holding the source and the
//! queue. The caller then picks a completion path — [`LazyResult::sync`]
//! for all-sync pipelines, or the async [`LazyResult::finish`] which drives
//! sync and async plugins alike.
//!
//! Execution is strictly sequential. For each queued entry the driver
//! realizes it (running a deferred factory constructor now, not earlier),
//! invokes the callable on the tree, then runs the event dispatcher to
//! fixpoint so listeners the plugin registered observe the whole tree
//! before the next plugin starts. Plugins injected mid-run via
//! [`PluginContext::add_plugin`] go to the back of the queue.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::Error;
use crate::map::MapOptions;
use crate::nodes::Root;
use crate::parser::parse;
use crate::plugin::{Plugin, PluginContext, PluginFactory, PluginSpec};
use crate::result::ProcessResult;
use crate::visitor::dispatch;

/// Options for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Origin file name, used in diagnostics and source maps.
    pub from: Option<String>,
    /// Output file name, used to annotate external source maps.
    pub to: Option<String>,
    /// Emit a source map. `None` skips map generation entirely.
    pub map: Option<MapOptions>,
}

/// What a pipeline can be asked to process.
pub enum CssSource {
    Text(String),
    Tree(Root),
    /// The caller had no CSS at all; surfaces [`Error::MissingInput`].
    Missing,
}

impl From<&str> for CssSource {
    fn from(css: &str) -> Self {
        CssSource::Text(css.to_owned())
    }
}

impl From<String> for CssSource {
    fn from(css: String) -> Self {
        CssSource::Text(css)
    }
}

impl From<Root> for CssSource {
    fn from(root: Root) -> Self {
        CssSource::Tree(root)
    }
}

impl From<Option<&str>> for CssSource {
    fn from(css: Option<&str>) -> Self {
        match css {
            Some(css) => CssSource::Text(css.to_owned()),
            None => CssSource::Missing,
        }
    }
}

impl From<Option<String>> for CssSource {
    fn from(css: Option<String>) -> Self {
        match css {
            Some(css) => CssSource::Text(css),
            None => CssSource::Missing,
        }
    }
}

/// A queued pipeline entry: realized, or a factory still waiting for its
/// constructor to run.
#[derive(Clone)]
pub(crate) enum PluginUnit {
    Ready(Plugin),
    Deferred(PluginFactory),
}

impl PluginUnit {
    fn realize(&self) -> Plugin {
        match self {
            PluginUnit::Ready(p) => p.clone(),
            PluginUnit::Deferred(f) => f.build(serde_json::Value::Null),
        }
    }

    fn name(&self) -> &str {
        match self {
            PluginUnit::Ready(p) => &p.name,
            PluginUnit::Deferred(f) => f.name(),
        }
    }
}

/// An ordered, reusable plugin pipeline.
#[derive(Clone, Default)]
pub struct Processor {
    pub(crate) plugins: Vec<PluginUnit>,
}

impl Processor {
    pub fn new() -> Self {
        Processor::default()
    }

    /// Add a plugin, factory or another processor's whole pipeline.
    pub fn use_plugin(mut self, spec: impl Into<PluginSpec>) -> Self {
        match spec.into() {
            PluginSpec::Plugin(p) => self.plugins.push(PluginUnit::Ready(p)),
            PluginSpec::Factory(f) => self.plugins.push(PluginUnit::Deferred(f)),
            PluginSpec::Processor(p) => self.plugins.extend(p.plugins),
        }
        self
    }

    /// Names of the queued plugins, in execution order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(PluginUnit::name).collect()
    }

    /// Stage a run. No parsing or plugin execution happens until the
    /// returned result is completed.
    pub fn process(&self, css: impl Into<CssSource>, opts: ProcessOptions) -> LazyResult {
        LazyResult {
            queue: self.plugins.clone(),
            source: css.into(),
            opts,
        }
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("plugins", &self.plugin_names())
            .finish()
    }
}

// ============================================================================
// Staged runs
// ============================================================================

/// A staged pipeline run. Nothing has executed yet; complete it with
/// [`sync`](LazyResult::sync) or [`finish`](LazyResult::finish).
pub struct LazyResult {
    queue: Vec<PluginUnit>,
    source: CssSource,
    opts: ProcessOptions,
}

impl LazyResult {
    fn into_parts(self) -> Result<(Root, VecDeque<PluginUnit>, ProcessOptions), Error> {
        let root = match self.source {
            CssSource::Text(css) => parse(&css, self.opts.from.as_deref())?,
            CssSource::Tree(root) => root,
            CssSource::Missing => return Err(Error::MissingInput),
        };
        Ok((root, self.queue.into(), self.opts))
    }

    /// Run the whole pipeline synchronously.
    ///
    /// # Errors
    ///
    /// Any parse, plugin or listener error; [`Error::AsyncPlugin`] as soon
    /// as an async plugin is reached.
    pub fn sync(self) -> Result<ProcessResult, Error> {
        let (mut root, mut queue, opts) = self.into_parts()?;
        let mut ctx = PluginContext::default();
        while let Some(unit) = queue.pop_front() {
            let plugin = unit.realize();
            debug!(plugin = %plugin.name, "running plugin");
            ctx.current = plugin.name.clone();
            plugin.run_sync(&mut root, &mut ctx)?;
            dispatch(&mut root)?;
            for added in ctx.take_added() {
                queue.push_back(PluginUnit::Ready(added));
            }
        }
        ProcessResult::build(root, std::mem::take(&mut ctx.warnings), &opts)
    }

    /// Run the whole pipeline, awaiting async plugins.
    pub async fn finish(self) -> Result<ProcessResult, Error> {
        let (mut root, mut queue, opts) = self.into_parts()?;
        let mut ctx = PluginContext::default();
        while let Some(unit) = queue.pop_front() {
            let plugin = unit.realize();
            debug!(plugin = %plugin.name, "running plugin");
            ctx.current = plugin.name.clone();
            plugin.run(&mut root, &mut ctx).await?;
            dispatch(&mut root)?;
            for added in ctx.take_added() {
                queue.push_back(PluginUnit::Ready(added));
            }
        }
        ProcessResult::build(root, std::mem::take(&mut ctx.warnings), &opts)
    }
}
