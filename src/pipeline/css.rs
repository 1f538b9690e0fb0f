// src/pipeline/css.rs

//! Stylesheet task: Sass compilation, vendor prefixing and minification.

use std::io;
use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

use crate::config::model::GridSection;
use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;

use super::{PipelineContext, TaskSpec};

/// Compile every non-partial stylesheet matched by the task glob and write
/// `<name>.min.css` files.
///
/// All sources are compiled before anything is written, so a syntax error in
/// any file leaves the destination untouched.
pub fn run(ctx: &PipelineContext, spec: &TaskSpec) -> Result<Vec<PathBuf>> {
    let sources = spec.glob.resolve(ctx.fs(), ctx.root())?;

    let mut outputs = Vec::new();
    for source in sources.iter().filter(|s| !is_partial(&s.path)) {
        let scss = ctx.fs().read_to_string(&source.path)?;
        let css = compile_sass(ctx.fs(), &source.path, &scss, ctx.grid())?;
        let minified = prefix_and_minify(&source.path, &css, ctx.targets())?;
        let rel = spec.dest.join(min_css_name(&source.base_rel));
        debug!(src = %source.rel, out = ?rel, "compiled stylesheet");
        outputs.push((rel, minified));
    }

    outputs
        .into_iter()
        .map(|(rel, contents)| ctx.write_output(rel, contents.as_bytes()))
        .collect()
}

/// Sass partials (`_name.scss`) are only compiled through imports.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// `sub/main.scss` → `sub/main.min.css`.
fn min_css_name(base_rel: &Path) -> PathBuf {
    let stem = base_rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    base_rel.with_file_name(format!("{stem}.min.css"))
}

/// Grid parameters exposed to every stylesheet as Sass variables.
///
/// Kept on one line and placed in front of the source's first line, so Sass
/// error line numbers match the file.
pub fn grid_prelude(grid: &GridSection) -> String {
    format!(
        "$grid-columns: {}; $grid-max-width: {}px; $grid-gutter: {}px; $grid-legacy: {}; ",
        grid.columns, grid.max_width, grid.gutter, grid.legacy
    )
}

/// Compile Sass source to plain (expanded) CSS.
///
/// Imports resolve against the stylesheet's own directory and are read
/// through `fs`.
pub fn compile_sass(
    fs: &dyn FileSystem,
    path: &Path,
    scss: &str,
    grid: &GridSection,
) -> Result<String> {
    let sass_fs = SassFs(fs);
    let mut options = grass::Options::default()
        .fs(&sass_fs)
        .style(grass::OutputStyle::Expanded);
    if let Some(dir) = path.parent() {
        options = options.load_path(dir);
    }

    let input = format!("{}{}", grid_prelude(grid), scss);
    grass::from_string(input, &options).map_err(|err| AssetpipeError::Sass {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Add vendor prefixes required by `targets` and minify.
pub fn prefix_and_minify(path: &Path, css: &str, targets: Targets) -> Result<String> {
    let css_error = |message: String| AssetpipeError::Css {
        path: path.to_path_buf(),
        message,
    };

    let parser_options = ParserOptions {
        filename: path.display().to_string(),
        ..ParserOptions::default()
    };
    let mut sheet =
        StyleSheet::parse(css, parser_options).map_err(|err| css_error(err.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|err| css_error(err.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|err| css_error(err.to_string()))?;

    Ok(printed.code)
}

/// Resolve browserslist queries into prefixing targets.
pub fn browser_targets(queries: &[String]) -> Result<Targets> {
    let browsers = Browsers::from_browserslist(queries.iter()).map_err(|err| {
        AssetpipeError::ConfigError(format!("invalid browserslist query: {err}"))
    })?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Lets the Sass compiler resolve imports through our [`FileSystem`].
#[derive(Debug)]
struct SassFs<'a>(&'a dyn FileSystem);

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0
            .read(path)
            .map_err(|err| io::Error::new(io::ErrorKind::NotFound, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn targets(queries: &[&str]) -> Targets {
        let queries: Vec<String> = queries.iter().map(|s| s.to_string()).collect();
        browser_targets(&queries).unwrap()
    }

    #[test]
    fn nested_rules_are_flattened() {
        let fs = MockFileSystem::new();
        let css = compile_sass(
            &fs,
            Path::new("./src/css/main.scss"),
            ".nav { a { color: red; } }",
            &GridSection::default(),
        )
        .unwrap();
        assert!(css.contains(".nav a"), "{css}");
    }

    #[test]
    fn grid_variables_are_available() {
        let fs = MockFileSystem::new();
        let css = compile_sass(
            &fs,
            Path::new("./src/css/grid.scss"),
            ".row { max-width: $grid-max-width; columns: $grid-columns; }",
            &GridSection::default(),
        )
        .unwrap();
        assert!(css.contains("max-width: 960px"), "{css}");
        assert!(css.contains("columns: 12"), "{css}");
    }

    #[test]
    fn partial_imports_resolve_through_filesystem() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/css/_colors.scss", "$brand: #336699;");
        let css = compile_sass(
            &fs,
            Path::new("./src/css/main.scss"),
            "@import 'colors';\nh1 { color: $brand; }",
            &GridSection::default(),
        )
        .unwrap();
        assert!(css.contains("#336699"), "{css}");
    }

    #[test]
    fn syntax_errors_are_reported_with_path() {
        let fs = MockFileSystem::new();
        let err = compile_sass(
            &fs,
            Path::new("./src/css/broken.scss"),
            ".a { color: red;",
            &GridSection::default(),
        )
        .unwrap_err();
        match err {
            AssetpipeError::Sass { path, .. } => {
                assert_eq!(path, PathBuf::from("./src/css/broken.scss"))
            }
            other => panic!("expected Sass error, got {other:?}"),
        }
    }

    #[test]
    fn error_line_numbers_match_the_source() {
        let fs = MockFileSystem::new();
        let err = compile_sass(
            &fs,
            Path::new("./src/css/main.scss"),
            ".a {\n  color: red;\n  @include missing;\n}\n",
            &GridSection::default(),
        )
        .unwrap_err();
        match err {
            AssetpipeError::Sass { message, .. } => {
                assert!(message.contains(":3:"), "{message}");
                assert!(!grid_prelude(&GridSection::default()).contains('\n'));
            }
            other => panic!("expected Sass error, got {other:?}"),
        }
    }

    #[test]
    fn flex_gets_prefixed_for_old_safari() {
        let out = prefix_and_minify(
            Path::new("main.css"),
            ".box {\n  display: flex;\n}\n",
            targets(&["safari 6"]),
        )
        .unwrap();
        assert!(out.contains("-webkit-"), "{out}");
        assert!(out.contains("display:flex"), "{out}");
        assert!(!out.contains('\n'), "{out}");
    }

    #[test]
    fn partial_detection() {
        assert!(is_partial(Path::new("src/css/_vars.scss")));
        assert!(!is_partial(Path::new("src/css/main.scss")));
    }

    #[test]
    fn min_name_keeps_relative_directory() {
        assert_eq!(
            min_css_name(Path::new("themes/dark.scss")),
            PathBuf::from("themes/dark.min.css")
        );
    }
}
