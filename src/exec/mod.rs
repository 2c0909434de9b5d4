// src/exec/mod.rs

//! Pluggable command-executor seam.
//!
//! The controller talks to a [`CommandExecutor`] instead of spawning
//! processes itself: the general build scheduler owns process execution, and
//! tests substitute an executor that records runs and scripts exit codes.
//! The controller issues exactly one blocking run request per
//! `Evaluating -> Running` transition and awaits it before anything else
//! proceeds.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::Result;
use crate::graph::BuildEdge;

/// Everything an executor needs to run the manifest edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRequest {
    pub command: String,
    pub description: Option<String>,
    /// Exclusivity pool, if any (typically `console`). Honouring the pool is
    /// the external scheduler's job; it is carried through untouched.
    pub pool: Option<String>,
}

impl EdgeRequest {
    pub fn from_edge(edge: &BuildEdge) -> Self {
        Self {
            command: edge.command.clone(),
            description: edge.description.clone(),
            pool: edge.pool.clone(),
        }
    }
}

/// Trait abstracting how the manifest edge's command is executed.
///
/// Returns the process exit code; `0` is success. A command killed by a
/// signal (including user interrupt) reports non-zero, which the controller
/// treats the same as any failure: no cache write, signal retained.
pub trait CommandExecutor: Send {
    fn run_edge(
        &mut self,
        request: EdgeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>>;
}

/// Production executor: runs the command through the platform shell and
/// waits for it, inheriting stdio so console-pool output reaches the
/// terminal directly.
#[derive(Debug, Default)]
pub struct RealCommandExecutor;

impl CommandExecutor for RealCommandExecutor {
    fn run_edge(
        &mut self,
        request: EdgeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        Box::pin(async move {
            if let Some(description) = &request.description {
                info!(description = %description, "running manifest edge");
            }
            debug!(command = %request.command, "spawning manifest command");

            let mut cmd = if cfg!(windows) {
                let mut c = tokio::process::Command::new("cmd");
                c.arg("/C").arg(&request.command);
                c
            } else {
                let mut c = tokio::process::Command::new("sh");
                c.arg("-c").arg(&request.command);
                c
            };
            cmd.stdin(Stdio::null());

            let status = cmd
                .status()
                .await
                .with_context(|| format!("spawning manifest command '{}'", request.command))?;

            Ok(status.code().unwrap_or(-1))
        })
    }
}
