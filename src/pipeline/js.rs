// src/pipeline/js.rs

//! Script task: concatenate all sources into one bundle, then write a
//! minified copy next to it.

use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions};
use oxc::minifier::{Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use tracing::{debug, info};

use crate::errors::{AssetpipeError, Result};

use super::{PipelineContext, TaskSpec};

/// Separator placed between concatenated sources.
const JOIN_SEPARATOR: &str = "\n";

/// Write `<bundle>` and `<bundle stem>.min.<ext>`.
///
/// Sources are concatenated in glob order (sorted by path). Without any
/// source nothing is written. A bundle that does not parse fails the task
/// before anything is written.
pub fn run(ctx: &PipelineContext, spec: &TaskSpec) -> Result<Vec<PathBuf>> {
    let sources = spec.glob.resolve(ctx.fs(), ctx.root())?;
    if sources.is_empty() {
        info!(task = %spec.name, pattern = %spec.glob.pattern(), "no scripts matched; nothing to bundle");
        return Ok(Vec::new());
    }

    let mut parts = Vec::with_capacity(sources.len());
    for source in &sources {
        debug!(src = %source.rel, "adding script to bundle");
        parts.push(ctx.fs().read_to_string(&source.path)?);
    }

    let bundle_path = spec.dest.join(&spec.bundle);
    let bundle = concat(&parts);
    let minified = minify(&bundle_path, &bundle)?;

    let bundle_rel = ctx.write_output(bundle_path, bundle.as_bytes())?;
    let min_rel = ctx.write_output(
        spec.dest.join(minified_name(&spec.bundle)),
        minified.as_bytes(),
    )?;

    Ok(vec![bundle_rel, min_rel])
}

/// Join script sources in the given order.
pub fn concat(parts: &[String]) -> String {
    parts.join(JOIN_SEPARATOR)
}

/// Parse `source` as a classic script, compress and mangle it, and print it
/// without comments or insignificant whitespace.
///
/// `path` only labels errors.
pub fn minify(path: &Path, source: &str) -> Result<String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(err) = parsed.errors.first() {
        return Err(AssetpipeError::Js {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }

    let mut program = parsed.program;
    let minified = Minifier::new(MinifierOptions::default()).minify(&allocator, &mut program);

    let printed = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program);
    Ok(printed.code)
}

/// `main.js` → `main.min.js`.
pub fn minified_name(bundle: &str) -> String {
    match bundle.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}.min.{ext}"),
        _ => format!("{bundle}.min"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min(src: &str) -> String {
        minify(Path::new("dist/main.js"), src).unwrap()
    }

    fn parses(src: &str) -> bool {
        let allocator = Allocator::default();
        Parser::new(&allocator, src, SourceType::cjs())
            .parse()
            .errors
            .is_empty()
    }

    #[test]
    fn minified_names() {
        assert_eq!(minified_name("main.js"), "main.min.js");
        assert_eq!(minified_name("app.bundle.js"), "app.bundle.min.js");
        assert_eq!(minified_name("bundle"), "bundle.min");
    }

    #[test]
    fn concat_keeps_order() {
        let parts = vec!["var x=1;".to_string(), "var y=2;".to_string()];
        assert_eq!(concat(&parts), "var x=1;\nvar y=2;");
    }

    #[test]
    fn minify_strips_comments_and_whitespace() {
        let src = "// greeting\nfunction  greet( name ) {\n    return 'hi ' + name;   /* trailing */\n}\n";
        let out = min(src);
        assert!(!out.contains("greeting"), "{out}");
        assert!(!out.contains("trailing"), "{out}");
        assert!(out.contains("function greet("), "{out}");
        assert!(out.len() < src.len());
    }

    #[test]
    fn files_without_semicolons_stay_separate_statements() {
        let bundle = concat(&["var x = 1".to_string(), "var y = 2".to_string()]);
        let out = min(&bundle);
        assert!(parses(&out), "{out}");
        assert!(!out.contains("1var"), "{out}");
        assert!(out.contains("x=1") && out.contains("y=2"), "{out}");
    }

    #[test]
    fn newline_after_return_ends_the_statement() {
        let out = min("function f(){\n return\n 42\n}\n");
        assert!(parses(&out), "{out}");
        assert!(!out.contains("return 42"), "{out}");
    }

    #[test]
    fn prefix_increment_keeps_its_operand() {
        let out = min("a = b\n++c\n");
        assert!(parses(&out), "{out}");
        assert!(!out.contains("b++"), "{out}");
        assert!(out.contains("++c"), "{out}");
    }

    #[test]
    fn regex_literals_survive() {
        let out = min("var r = /ab+c/g.test(s)\nvar t = a / b / c;\n");
        assert!(parses(&out), "{out}");
        assert!(out.contains("/ab+c/g"), "{out}");
    }

    #[test]
    fn syntax_errors_fail_with_path() {
        let err = minify(Path::new("dist/main.js"), "var = ;").unwrap_err();
        match err {
            AssetpipeError::Js { path, message } => {
                assert_eq!(path, Path::new("dist/main.js"));
                assert!(!message.is_empty());
            }
            other => panic!("expected Js error, got {other:?}"),
        }
    }
}
