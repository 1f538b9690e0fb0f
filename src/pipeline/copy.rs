// src/pipeline/copy.rs

//! Copy task: every matched file is written unchanged below the
//! destination, keeping its path relative to the glob base.

use std::path::PathBuf;

use crate::errors::Result;

use super::{PipelineContext, TaskSpec};

pub fn run(ctx: &PipelineContext, spec: &TaskSpec) -> Result<Vec<PathBuf>> {
    let sources = spec.glob.resolve(ctx.fs(), ctx.root())?;

    let mut written = Vec::with_capacity(sources.len());
    for source in sources {
        let bytes = ctx.fs().read(&source.path)?;
        written.push(ctx.write_output(spec.dest.join(&source.base_rel), &bytes)?);
    }
    Ok(written)
}
