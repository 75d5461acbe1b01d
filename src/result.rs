// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The outcome of a pipeline run: final CSS, optional source map, warnings
//! and the transformed tree.

use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::map;
use crate::nodes::Root;
use crate::processor::ProcessOptions;
use crate::stringifier::stringify;

/// A non-fatal diagnostic emitted by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub text: String,
    /// Name of the emitting plugin.
    pub plugin: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin {
            Some(plugin) => write!(f, "{}: {}", plugin, self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// A completed run. The tree is kept alongside the rendered CSS so callers
/// can inspect or re-process it.
#[derive(Debug)]
pub struct ProcessResult {
    pub root: Root,
    css: String,
    map: Option<String>,
    warnings: Vec<Warning>,
    opts: ProcessOptions,
}

impl ProcessResult {
    pub(crate) fn build(
        root: Root,
        warnings: Vec<Warning>,
        opts: &ProcessOptions,
    ) -> Result<Self, Error> {
        let (css, map) = match &opts.map {
            Some(map_opts) => map::generate(&root, opts.to.as_deref(), map_opts)?,
            None => (stringify(&root), None),
        };
        Ok(ProcessResult {
            root,
            css,
            map,
            warnings,
            opts: opts.clone(),
        })
    }

    /// The rendered CSS, including any inline source map annotation.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// External source map JSON, when one was requested.
    pub fn map(&self) -> Option<&str> {
        self.map.as_deref()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// The options the run was processed with.
    pub fn opts(&self) -> &ProcessOptions {
        &self.opts
    }
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css)
    }
}

impl Root {
    /// Render this tree as a completed result without running any plugins.
    pub fn to_result(&self, opts: ProcessOptions) -> Result<ProcessResult, Error> {
        ProcessResult::build(self.clone(), Vec::new(), &opts)
    }
}
