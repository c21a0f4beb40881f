use super::*;
use crate::extensions::{Abbreviation, Attributes, apply_abbreviations, apply_heading_ids, extract_abbreviations, insert_toc};
use crate::html::{build_html_document, render_markdown, strip_slide_breaks};
use crate::theme::rewrite_asset_path;
use std::cell::RefCell;
use std::rc::Rc;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Slide renderer that writes a placeholder PDF and remembers what it was asked.
#[derive(Default)]
struct FakeSlideRenderer {
    fail_on: Option<String>,
    calls: RefCell<Vec<(PathBuf, PathBuf, Option<PathBuf>)>>,
}

impl SlideRenderer for FakeSlideRenderer {
    fn name(&self) -> &str {
        "fake-marp"
    }

    fn render(&self, source: &Path, output: &Path, theme_css: Option<&Path>) -> Result<()> {
        self.calls.borrow_mut().push((
            source.to_path_buf(),
            output.to_path_buf(),
            theme_css.map(Path::to_path_buf),
        ));

        let name = source.file_name().unwrap().to_string_lossy().to_string();
        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(SlidesError::Render {
                tool: "fake-marp".to_string(),
                file: source.to_path_buf(),
                message: "boom".to_string(),
            });
        }

        fs::write(output, b"%PDF-1.4 fake")?;
        Ok(())
    }
}

/// PDF engine with scripted availability and outcome.
struct FakePdfEngine {
    name: &'static str,
    available: bool,
    succeed: bool,
    seen_html: Rc<RefCell<Vec<String>>>,
}

impl FakePdfEngine {
    fn new(name: &'static str, available: bool, succeed: bool) -> Self {
        Self {
            name,
            available,
            succeed,
            seen_html: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl PdfEngine for FakePdfEngine {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn render(&self, html_file: &Path, output: &Path) -> Result<()> {
        self.seen_html
            .borrow_mut()
            .push(fs::read_to_string(html_file)?);
        if self.succeed {
            fs::write(output, b"%PDF-1.4 fake")?;
            Ok(())
        } else {
            Err(SlidesError::Pdf {
                engine: self.name.to_string(),
                message: "scripted failure".to_string(),
            })
        }
    }
}

fn succeeding_renderer() -> PdfRenderer {
    PdfRenderer::new(vec![Box::new(FakePdfEngine::new("fake", true, true))])
}

// Slide-break rewriting

#[test]
fn test_rewrite_slide_breaks_inherits_last_heading() {
    let input = "# Course\n\n## Setup\n\nFirst part\n\n----\n\nSecond part";
    let output = rewrite_slide_breaks(input);

    assert!(output.contains("First part\n\n---\n\n## Setup\n\n\nSecond part"));
    assert!(!output.contains("----"));
    assert_eq!(output.matches("## Setup").count(), 2);
}

#[test]
fn test_rewrite_slide_breaks_exact_output() {
    let input = "## Intro\ntext\n----\nmore";
    assert_eq!(
        rewrite_slide_breaks(input),
        "## Intro\ntext\n---\n\n## Intro\n\nmore"
    );
}

#[test]
fn test_rewrite_slide_breaks_without_heading() {
    let input = "Preamble\n----\nAfter";
    assert_eq!(rewrite_slide_breaks(input), "Preamble\n---\n\nAfter");
}

#[test]
fn test_rewrite_slide_breaks_ignores_deep_headings() {
    let input = "## Section\n### Detail\n----\nNext";
    let output = rewrite_slide_breaks(input);
    assert_eq!(output, "## Section\n### Detail\n---\n\n## Section\n\nNext");
}

#[test]
fn test_rewrite_slide_breaks_leaves_other_rules_alone() {
    let input = "# Title\n---\nA\n-----\nB";
    assert_eq!(rewrite_slide_breaks(input), input);
}

#[test]
fn test_rewrite_slide_breaks_skips_code_fences() {
    let input = "## Shell\n```\n# comment\n----\n```\n----\nAfter";
    let output = rewrite_slide_breaks(input);
    assert_eq!(
        output,
        "## Shell\n```\n# comment\n----\n```\n---\n\n## Shell\n\nAfter"
    );
}

#[test]
fn test_heading_level() {
    assert_eq!(marp::heading_level("# One"), Some(1));
    assert_eq!(marp::heading_level("## Two"), Some(2));
    assert_eq!(marp::heading_level("#### Four"), Some(4));
    assert_eq!(marp::heading_level("#hashtag"), None);
    assert_eq!(marp::heading_level("plain"), None);
    assert_eq!(marp::heading_level("#"), Some(1));
}

// Marp header injection

#[test]
fn test_add_marp_header_minimal() {
    let theme = ThemeConfig::new();
    let output = add_marp_header("# Slide", &theme, None, None);
    assert_eq!(output, "---\nmarp: true\n---\n\n# Slide");
}

#[test]
fn test_add_marp_header_with_theme_only() {
    let theme = ThemeConfig::new().with_theme("gaia");
    let output = add_marp_header("# Slide", &theme, Some(Path::new("out/marp_slides")), None);
    assert_eq!(output, "---\nmarp: true\ntheme: gaia\n---\n\n# Slide");
}

#[test]
fn test_add_marp_header_background_is_rewritten() {
    let theme = ThemeConfig::new().with_background("themes/demo/img_src/bg.jpg");
    let output = add_marp_header(
        "# Slide",
        &theme,
        Some(Path::new("themes/demo/presentation/marp_slides")),
        None,
    );

    assert!(output.starts_with("---\nmarp: true\nstyle: |\n  section { position: relative; }\n"));
    assert!(output.contains("background-image: url('images/bg.jpg')"));
    assert!(output.contains("---\n\n# Slide"));
}

#[test]
fn test_add_marp_header_keeps_paths_without_reference_dir() {
    let theme = ThemeConfig::new().with_background("img_src/bg.jpg");
    let output = add_marp_header("# Slide", &theme, None, None);
    assert!(output.contains("url('img_src/bg.jpg')"));
}

#[test]
fn test_add_marp_header_header_with_logos() {
    let theme = ThemeConfig::new()
        .with_header("Fine-tuning course")
        .with_logos(
            Some(PathBuf::from("img_src/left.png")),
            Some(PathBuf::from("img_src/right.svg")),
        );
    let output = add_marp_header(
        "# Welcome\n\nHello",
        &theme,
        Some(Path::new("presentation/marp_slides")),
        None,
    );

    assert!(output.contains("section .header-text {"));
    assert!(output.contains("section .header-text .logo-left {"));
    assert!(output.contains("url('images/left.png')"));
    assert!(output.contains("url('images/right.svg')"));
    assert!(output.contains(
        "# Welcome\n<div class=\"header-text\"><div class=\"logo-left\"></div><div class=\"header-center\">Fine-tuning course</div><div class=\"logo-right\"></div></div>\n\nHello"
    ));
}

#[test]
fn test_add_marp_header_logos_without_header_are_pinned() {
    let theme = ThemeConfig::new().with_logos(Some(PathBuf::from("l.png")), None);
    let output = add_marp_header("# Slide", &theme, None, None);

    assert!(output.contains("section .logo-left { position: absolute; top: 5mm; left: 10mm;"));
    assert!(!output.contains(".header-text"));
    assert!(output.ends_with("# Slide\n<div class=\"logo-left\"></div>"));
}

#[test]
fn test_add_marp_header_footer() {
    let theme = ThemeConfig::new().with_footer("© 2026");
    let output = add_marp_header("# A\n\n---\n\n# B", &theme, None, None);

    assert!(output.contains("section .footer-text {"));
    assert_eq!(output.matches("<div class=\"footer-text\">© 2026</div>").count(), 2);
}

#[test]
fn test_add_marp_header_inlines_extra_css() {
    let theme = ThemeConfig::new();
    let output = add_marp_header("# Slide", &theme, None, Some("h1 { color: red; }\n"));
    assert_eq!(
        output,
        "---\nmarp: true\nstyle: |\n  section { position: relative; }\n  h1 { color: red; }\n---\n\n# Slide"
    );
}

#[test]
fn test_rewrite_asset_path_absolute() {
    let reference = Path::new("/work/theme/presentation/marp_slides");
    assert_eq!(
        rewrite_asset_path(Path::new("/work/theme/presentation/img/logo.png"), Some(reference)),
        "img/logo.png"
    );
    assert_eq!(
        rewrite_asset_path(Path::new("/elsewhere/logo.png"), Some(reference)),
        "/elsewhere/logo.png"
    );
}

// Slide decorations

#[test]
fn test_add_slide_decorations_after_first_heading() {
    let theme = ThemeConfig::new().with_header("H");
    let content = "# One\n## Sub\ntext\n---\nno heading here\n---\n# Three";
    let output = add_slide_decorations(content, &theme);

    let slides: Vec<&str> = output.split("\n---\n").collect();
    assert_eq!(slides.len(), 3);
    assert_eq!(
        slides[0],
        "# One\n<div class=\"header-text\"><div class=\"header-center\">H</div></div>\n## Sub\ntext"
    );
    assert_eq!(slides[1], "no heading here");
    assert!(slides[2].starts_with("# Three\n<div class=\"header-text\">"));
}

#[test]
fn test_add_slide_decorations_empty_segments_pass_through() {
    let theme = ThemeConfig::new().with_footer("F");
    let content = "\n---\n   \n---\n# Only";
    let output = add_slide_decorations(content, &theme);
    assert_eq!(output, "\n---\n   \n---\n# Only\n<div class=\"footer-text\">F</div>");
}

#[test]
fn test_add_slide_decorations_nothing_configured() {
    let theme = ThemeConfig::new().with_background("bg.png");
    assert_eq!(add_slide_decorations("# A", &theme), "# A");
}

// Markdown to Marp batch

#[test]
fn test_convert_md_to_marp_batch() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let src = temp.path().join("md_src");
    fs::create_dir(&src).unwrap();
    write_file(&src, "01-intro.md", "# Intro\n\n----\n\nMore");
    write_file(&src, "02-next.md", "# Next");
    write_file(&src, "notes.txt", "ignored");
    let program = write_file(temp.path(), "program.md", "# Program");

    let marp_dir = temp.path().join("marp_slides");
    let theme = ThemeConfig::new().with_theme("default");
    let summary = convert_md_to_marp(&src, &marp_dir, &theme, Some(&program)).unwrap();

    assert_eq!(summary.total(), 3);
    assert!(summary.is_complete());
    let intro = fs::read_to_string(marp_dir.join("01-intro.md")).unwrap();
    assert!(intro.starts_with("---\nmarp: true\ntheme: default\n---\n\n# Intro"));
    assert!(intro.contains("---\n\n# Intro\n\n"));
    assert!(marp_dir.join("program.md").exists());
    assert!(!marp_dir.join("notes.txt").exists());
}

#[test]
fn test_convert_md_to_marp_inlines_stylesheet() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let src = temp.path().join("md_src");
    fs::create_dir(&src).unwrap();
    write_file(&src, "a.md", "# A");
    let css = write_file(temp.path(), "style.css", "h1 { color: navy; }");

    let marp_dir = temp.path().join("out");
    let theme = ThemeConfig::new().with_stylesheet(&css);
    convert_md_to_marp(&src, &marp_dir, &theme, None).unwrap();

    let deck = fs::read_to_string(marp_dir.join("a.md")).unwrap();
    assert!(deck.contains("style: |\n  section { position: relative; }\n  h1 { color: navy; }\n"));
}

#[test]
fn test_convert_md_to_marp_missing_source_dir() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let marp_dir = temp.path().join("out");
    let result = convert_md_to_marp(
        &temp.path().join("missing"),
        &marp_dir,
        &ThemeConfig::new(),
        None,
    );

    assert!(matches!(result, Err(SlidesError::PathNotFound(_))));
    assert!(!marp_dir.exists());
}

#[test]
fn test_convert_md_to_marp_empty_source_dir() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let result = convert_md_to_marp(temp.path(), &temp.path().join("out"), &ThemeConfig::new(), None);
    assert!(matches!(result, Err(SlidesError::NoMarkdownFiles(_))));
}

// Marp to PDF

#[test]
fn test_generate_pdfs_from_marp_counts_and_creates_dir() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let marp_dir = temp.path().join("marp_slides");
    fs::create_dir(&marp_dir).unwrap();
    for name in ["a.md", "b.md", "c.md", "program.md"] {
        write_file(&marp_dir, name, "---\nmarp: true\n---\n\n# X");
    }

    let pdf_dir = temp.path().join("pdf_slides");
    let renderer = FakeSlideRenderer::default();
    let summary = generate_pdfs_from_marp(&marp_dir, &pdf_dir, None, &renderer).unwrap();

    assert_eq!(summary.total(), 3);
    assert_eq!(summary.succeeded(), 3);
    assert!(pdf_dir.is_dir());
    assert!(pdf_dir.join("a.pdf").exists());
    assert!(!pdf_dir.join("program.pdf").exists());
    assert_eq!(renderer.calls.borrow().len(), 3);
}

#[test]
fn test_generate_pdfs_from_marp_continues_after_failure() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    write_file(temp.path(), "a.md", "# A");
    write_file(temp.path(), "b.md", "# B");
    let css = write_file(temp.path(), "theme.css", "");

    let renderer = FakeSlideRenderer {
        fail_on: Some("a.md".to_string()),
        ..Default::default()
    };
    let pdf_dir = temp.path().join("pdf");
    let summary = generate_pdfs_from_marp(temp.path(), &pdf_dir, Some(&css), &renderer).unwrap();

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.succeeded(), 1);
    assert!(!summary.is_complete());
    assert_eq!(summary.failures[0].0.file_name().unwrap(), "a.md");
    assert!(renderer.calls.borrow().iter().all(|(_, _, theme)| theme.as_deref() == Some(css.as_path())));
}

#[test]
fn test_marp_cli_command_args() {
    let cli = MarpCli::new("marp");
    let args = cli.command_args(Path::new("deck.md"), Path::new("out/deck.pdf"), Some(Path::new("t.css")));
    let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
    assert_eq!(
        args,
        vec!["deck.md", "--pdf", "--output", "out/deck.pdf", "--allow-local-files", "--theme", "t.css"]
    );
}

#[test]
fn test_marp_cli_missing_binary() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let deck = write_file(temp.path(), "deck.md", "# A");
    let cli = MarpCli::new(temp.path().join("no-such-marp"));
    let result = cli.render(&deck, &temp.path().join("deck.pdf"), None);
    assert!(matches!(result, Err(SlidesError::ToolNotFound { .. })));
}

#[test]
fn test_resolve_theme_css() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    write_file(temp.path(), "corporate.css", "section {}");
    assert_eq!(
        render::resolve_theme_css(temp.path(), Some("corporate")),
        Some(temp.path().join("corporate.css"))
    );
    assert_eq!(render::resolve_theme_css(temp.path(), Some("missing")), None);
    assert_eq!(render::resolve_theme_css(temp.path(), None), None);
}

// Document rendering

#[test]
fn test_strip_slide_breaks() {
    let input = "# Title\n---\ntext\n  ----  \n-- \nab-\n---x\n-----";
    let (output, removed) = strip_slide_breaks(input);
    assert_eq!(output, "# Title\ntext\n-- \nab-\n---x");
    assert_eq!(removed, 3);
}

#[test]
fn test_strip_slide_breaks_keeps_equal_length_content() {
    let (output, removed) = strip_slide_breaks("---\n-a-\n--a");
    assert_eq!(output, "-a-\n--a");
    assert_eq!(removed, 1);
}

#[test]
fn test_render_markdown_features() {
    let md = "| A | B |\n|---|---|\n| 1 | 2 |\n\nText[^1]\n\n[^1]: Note\n\nTerm\n\n: Definition\n\n<div class=\"raw\">kept</div>\n";
    let html = render_markdown(md);

    assert!(html.contains("<table>"));
    assert!(html.contains("footnote"));
    assert!(html.contains("<dl>"));
    assert!(html.contains("<div class=\"raw\">kept</div>"));
}

#[test]
fn test_heading_ids_and_toc() {
    let html = render_markdown("[TOC]\n\n# One\n\n## Two\n\n# One\n");

    assert!(html.contains("<h1 id=\"one\">One</h1>"));
    assert!(html.contains("<h2 id=\"two\">Two</h2>"));
    assert!(html.contains("<h1 id=\"one-1\">One</h1>"));
    assert!(html.contains("<nav class=\"toc\">"));
    assert!(html.contains("<li class=\"toc-level-2\"><a href=\"#two\">Two</a></li>"));
    assert!(!html.contains("[TOC]"));
}

#[test]
fn test_heading_attribute_list() {
    let (html, entries) = apply_heading_ids("<h2>Setup {#install .wide}</h2>");
    assert_eq!(html, "<h2 id=\"install\" class=\"wide\">Setup</h2>");
    assert_eq!(entries[0].id, "install");
    assert_eq!(entries[0].title, "Setup");
}

#[test]
fn test_paragraph_attribute_list() {
    let html = render_markdown("Remember this. {.note}\n\nBraces {stay} here\n");
    assert!(html.contains("<p class=\"note\">Remember this.</p>"));
    assert!(html.contains("<p>Braces {stay} here</p>"));
}

#[test]
fn test_attributes_parse() {
    let attrs = Attributes::parse("#main .a .b data-x=1").unwrap();
    assert_eq!(attrs.id.as_deref(), Some("main"));
    assert_eq!(attrs.classes, vec!["a", "b"]);
    assert_eq!(attrs.render(), " id=\"main\" class=\"a b\" data-x=\"1\"");
    assert!(Attributes::parse("not an attr list").is_none());
}

#[test]
fn test_insert_toc_without_marker() {
    assert_eq!(insert_toc("<p>plain</p>", &[]), "<p>plain</p>");
}

#[test]
fn test_abbreviations() {
    let (md, abbrs) = extract_abbreviations("HTML and CSS\n\n*[HTML]: Hyper Text Markup Language\n");
    assert_eq!(abbrs.len(), 1);
    assert!(!md.contains("*[HTML]"));

    let html = apply_abbreviations("<p>HTML rocks, XHTML not</p><code>HTML</code>", &abbrs);
    assert_eq!(
        html,
        "<p><abbr title=\"Hyper Text Markup Language\">HTML</abbr> rocks, XHTML not</p><code>HTML</code>"
    );
}

#[test]
fn test_abbreviations_leave_entities_intact() {
    let abbrs = vec![Abbreviation {
        term: "amp".to_string(),
        title: "Amplifier".to_string(),
    }];
    assert_eq!(
        apply_abbreviations("<p>R &amp; D, amp on</p>", &abbrs),
        "<p>R &amp; D, <abbr title=\"Amplifier\">amp</abbr> on</p>"
    );

    let html = render_markdown("R & D needs an amp\n\n*[amp]: Amplifier\n");
    assert!(html.contains("R &amp; D"));
    assert!(html.contains("<abbr title=\"Amplifier\">amp</abbr>"));
}

#[test]
fn test_build_html_document() {
    let doc = build_html_document("Intro <1>", "es", "body { color: red; }", "<p>x</p>\n");
    assert!(doc.starts_with("<!DOCTYPE html>\n<html lang=\"es\">"));
    assert!(doc.contains("<title>Intro &lt;1&gt;</title>"));
    assert!(doc.contains("<style>\nbody { color: red; }\n</style>"));
    assert!(doc.contains("<body>\n<p>x</p>\n</body>"));
}

#[test]
fn test_document_html_removes_slide_breaks() {
    let doc = docs::document_html("# A\n\n----\n\nB\n", "a", "");
    assert!(!doc.contains("<hr"));
    assert!(doc.contains("<title>a</title>"));
}

// PDF engine strategy

#[test]
fn test_pdf_renderer_falls_back_in_order() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = temp.path().join("out.pdf");
    let renderer = PdfRenderer::new(vec![
        Box::new(FakePdfEngine::new("missing", false, true)),
        Box::new(FakePdfEngine::new("broken", true, false)),
        Box::new(FakePdfEngine::new("working", true, true)),
    ]);

    let engine = renderer
        .render_html("<html></html>", &output, Some(temp.path()))
        .unwrap();
    assert_eq!(engine, "working");
    assert!(output.exists());
    assert_eq!(renderer.engine_names(), vec!["missing", "broken", "working"]);
}

#[test]
fn test_pdf_renderer_reports_all_attempts() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let renderer = PdfRenderer::new(vec![
        Box::new(FakePdfEngine::new("missing", false, true)),
        Box::new(FakePdfEngine::new("broken", true, false)),
    ]);

    match renderer.render_html("<html></html>", &temp.path().join("out.pdf"), None) {
        Err(SlidesError::NoPdfEngine { attempts }) => {
            assert_eq!(attempts.len(), 2);
            assert!(attempts[0].starts_with("missing: not available"));
            assert!(attempts[1].contains("scripted failure"));
        }
        other => panic!("Expected NoPdfEngine, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_pdf_renderer_leaves_no_temp_html() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let renderer = succeeding_renderer();
    renderer
        .render_html("<html></html>", &temp.path().join("out.pdf"), Some(temp.path()))
        .unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".html"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_engine_kind_parse_list() {
    assert_eq!(
        EngineKind::parse_list("chrome, wkhtmltopdf").unwrap(),
        vec![EngineKind::Chrome, EngineKind::Wkhtmltopdf]
    );
    assert!(matches!(
        EngineKind::parse_list("prince"),
        Err(SlidesError::Config(_))
    ));
    assert_eq!(EngineKind::default_order()[0], EngineKind::WeasyPrint);
}

#[test]
fn test_wkhtmltopdf_args_use_a4_geometry() {
    let engine = pdf::WkhtmltopdfEngine::new("wkhtmltopdf");
    let args: Vec<String> = engine
        .command_args(Path::new("in.html"), Path::new("out.pdf"))
        .iter()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    assert!(args.windows(2).any(|w| w == ["--page-size", "A4"]));
    assert!(args.windows(2).any(|w| w == ["--margin-left", "2.5cm"]));
    assert!(args.contains(&"--enable-local-file-access".to_string()));
    assert_eq!(&args[args.len() - 2..], ["in.html", "out.pdf"]);
}

// Document batches

fn theme_with_sources(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let src = docs::md_src_dir(temp.path());
    fs::create_dir_all(&src).unwrap();
    for (name, content) in files {
        write_file(&src, name, content);
    }
    temp
}

#[test]
fn test_convert_all_md_files_default_output() {
    let theme = theme_with_sources(&[("a.md", "# A\n\n----\n\nx"), ("b.md", "# B")]);
    let summary = convert_all_md_files(
        theme.path(),
        None,
        &Stylesheet::Builtin("body { margin: 0; }"),
        &succeeding_renderer(),
    )
    .unwrap();

    assert_eq!(summary.total(), 2);
    assert!(summary.is_complete());
    let pdf_dir = docs::pdf_docs_dir(theme.path());
    assert_eq!(summary.outputs, vec![pdf_dir.join("a.pdf"), pdf_dir.join("b.pdf")]);
}

#[test]
fn test_convert_all_md_files_embeds_stylesheet() {
    let theme = theme_with_sources(&[("a.md", "# A\n\n----\n\nB")]);
    let css = write_file(theme.path(), "custom.css", "h1 { color: teal; }");
    let out = theme.path().join("out");

    let engine = FakePdfEngine::new("fake", true, true);
    let seen = Rc::clone(&engine.seen_html);
    let renderer = PdfRenderer::new(vec![Box::new(engine)]);
    convert_all_md_files(theme.path(), Some(&out), &Stylesheet::Local(css), &renderer).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("h1 { color: teal; }"));
    assert!(seen[0].contains("<h1 id=\"a\">A</h1>"));
    assert!(!seen[0].contains("<hr"));
    assert!(out.join("a.pdf").exists());
}

#[test]
fn test_convert_all_md_files_counts_failures() {
    let theme = theme_with_sources(&[("a.md", "# A"), ("b.md", "# B")]);
    let renderer = PdfRenderer::new(vec![Box::new(FakePdfEngine::new("broken", true, false))]);
    let summary = convert_all_md_files(
        theme.path(),
        None,
        &Stylesheet::Builtin(""),
        &renderer,
    )
    .unwrap();

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.succeeded(), 0);
    assert_eq!(summary.summary_line(), "Conversion completed: 0/2 files successful");
}

#[test]
fn test_convert_all_md_files_missing_sources() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let result = convert_all_md_files(
        temp.path(),
        None,
        &Stylesheet::Builtin(""),
        &succeeding_renderer(),
    );
    assert!(matches!(result, Err(SlidesError::PathNotFound(_))));
    assert!(!docs::pdf_docs_dir(temp.path()).exists());
}

#[test]
fn test_convert_program_to_pdf_default_output() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    write_file(temp.path(), "program.md", "# Program\n\n---\n\nWeek 1");

    let output = convert_program_to_pdf(
        temp.path(),
        None,
        &resources::find_program_stylesheet(temp.path()),
        &succeeding_renderer(),
    )
    .unwrap();

    assert_eq!(output, temp.path().join("program.pdf"));
    assert!(output.exists());
}

#[test]
fn test_program_html_keeps_rules() {
    let html = docs::program_html("# Program\n\n---\n\nWeek 1", "");
    assert!(html.contains("<hr />"));
    assert!(html.contains("<title>Course Program</title>"));
    assert!(html.contains("<html lang=\"en\">"));
}

#[test]
fn test_convert_program_to_pdf_missing_program() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let result = convert_program_to_pdf(
        temp.path(),
        None,
        &Stylesheet::Builtin(""),
        &succeeding_renderer(),
    );
    assert!(matches!(result, Err(SlidesError::PathNotFound(_))));
}

// Stylesheets

#[test]
fn test_find_program_stylesheet_priority() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    assert_eq!(
        resources::find_program_stylesheet(temp.path()),
        Stylesheet::Builtin(resources::DEFAULT_PROGRAM_CSS)
    );

    fs::create_dir_all(temp.path().join("styles")).unwrap();
    let styles = write_file(&temp.path().join("styles"), "program.css", "a {}");
    assert_eq!(
        resources::find_program_stylesheet(temp.path()),
        Stylesheet::Local(styles)
    );

    let root = write_file(temp.path(), "program.css", "b {}");
    assert_eq!(
        resources::find_program_stylesheet(temp.path()),
        Stylesheet::Local(root)
    );
}

#[test]
fn test_find_docs_stylesheet() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    assert_eq!(
        resources::find_docs_stylesheet(Some(temp.path())),
        Stylesheet::Builtin(resources::DEFAULT_DOCS_CSS)
    );
    let css = write_file(temp.path(), resources::DOCS_CSS_FILE_NAME, "c {}");
    assert_eq!(
        resources::find_docs_stylesheet(Some(temp.path())),
        Stylesheet::Local(css)
    );
    assert_eq!(
        resources::find_docs_stylesheet(None),
        Stylesheet::Builtin(resources::DEFAULT_DOCS_CSS)
    );
}

#[test]
fn test_default_stylesheets_are_a4() {
    assert!(resources::DEFAULT_DOCS_CSS.contains("size: 210mm 297mm"));
    assert!(resources::DEFAULT_PROGRAM_CSS.contains("counter(pages)"));
}

#[test]
fn test_stylesheet_from_location() {
    assert_eq!(
        Stylesheet::from_location("https://example.com/a.css"),
        Stylesheet::Remote("https://example.com/a.css".to_string())
    );
    assert_eq!(
        Stylesheet::from_location("styles/a.css"),
        Stylesheet::Local(PathBuf::from("styles/a.css"))
    );
    assert!(matches!(
        Stylesheet::Local(PathBuf::from("/no/such/file.css")).content(),
        Err(SlidesError::PathNotFound(_))
    ));
}

// Utilities and watch

#[test]
fn test_output_path_for() {
    assert_eq!(
        utils::output_path_for(Path::new("src/01-intro.md"), Path::new("out"), "pdf").unwrap(),
        PathBuf::from("out/01-intro.pdf")
    );
}

#[test]
fn test_find_markdown_files_sorted() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    write_file(temp.path(), "b.md", "");
    write_file(temp.path(), "a.md", "");
    write_file(temp.path(), "c.txt", "");
    fs::create_dir(temp.path().join("dir.md")).unwrap();

    let files = utils::find_markdown_files(temp.path()).unwrap();
    assert_eq!(files, vec![temp.path().join("a.md"), temp.path().join("b.md")]);
}

#[test]
fn test_watch_targets() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir_all(temp.path().join("md_src")).unwrap();
    fs::create_dir_all(temp.path().join("presentation")).unwrap();
    let program = write_file(temp.path(), "program.md", "# Program");

    let config = WatchConfig {
        md_src_dir: temp.path().join("md_src"),
        program_file: Some(program),
        theme: ThemeConfig::new().with_stylesheet(temp.path().join("presentation/style.css")),
        ..Default::default()
    };
    let targets = watch::WatchTargets::resolve(&config).unwrap();
    let root = fs::canonicalize(temp.path()).unwrap();

    assert_eq!(targets.source_dir, root.join("md_src"));
    assert!(targets.is_relevant(&root.join("md_src/a.md")));
    assert!(targets.is_relevant(&root.join("md_src/theme.CSS")));
    assert!(targets.is_relevant(&root.join("program.md")));
    assert!(targets.is_relevant(&root.join("presentation/style.css")));
    assert!(!targets.is_relevant(&root.join("README.md")));
    assert!(!targets.is_relevant(&root.join("md_src/image.png")));
    assert!(!targets.is_relevant(&root.join("md_src/.a.md.swp")));
    assert_eq!(
        targets.directories(),
        vec![root.join("md_src"), root.clone(), root.join("presentation")]
    );
}

fn wait_for(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(100));
    }
    false
}

#[test]
fn test_watch_rebuilds_when_program_changes() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let src = temp.path().join("md_src");
    fs::create_dir(&src).unwrap();
    write_file(&src, "a.md", "# A");
    let program = write_file(temp.path(), "program.md", "# Program v1");
    let marp_dir = temp.path().join("marp_slides");

    let config = WatchConfig {
        md_src_dir: src,
        marp_dir: marp_dir.clone(),
        program_file: Some(program.clone()),
        debounce_ms: 100,
        ..Default::default()
    };

    // The watch loop never returns; the thread ends with the test process.
    thread::spawn(move || {
        let renderer = FakeSlideRenderer::default();
        let _ = watch_sources(config, &renderer);
    });

    let deck = marp_dir.join("program.md");
    let deck_contains = |text: &str| fs::read_to_string(&deck).map_or(false, |c| c.contains(text));

    assert!(wait_for(|| deck_contains("v1")), "initial conversion did not run");
    thread::sleep(Duration::from_millis(500));

    fs::write(&program, "# Program v2").unwrap();
    assert!(wait_for(|| deck_contains("v2")), "program deck was not regenerated");
}

#[test]
fn test_regenerate_outputs_with_pdfs() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let src = temp.path().join("md_src");
    fs::create_dir(&src).unwrap();
    write_file(&src, "a.md", "# A");

    let config = WatchConfig {
        md_src_dir: src,
        marp_dir: temp.path().join("marp"),
        pdf_dir: Some(temp.path().join("pdf")),
        ..Default::default()
    };
    let renderer = FakeSlideRenderer::default();
    let summary = watch::regenerate_outputs(&config, &renderer).unwrap();

    assert!(summary.is_complete());
    assert!(temp.path().join("marp/a.md").exists());
    assert!(temp.path().join("pdf/a.pdf").exists());
}

#[test]
fn test_summary_counts() {
    let mut summary = ConversionSummary::new();
    assert!(!summary.is_complete());

    summary.record(Path::new("a.md"), Ok(PathBuf::from("a.pdf")));
    assert!(summary.is_complete());

    summary.record(
        Path::new("b.md"),
        Err(SlidesError::Validation("bad".to_string())),
    );
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.succeeded(), 1);
    assert!(!summary.is_complete());
}

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.marp_path, PathBuf::from("marp"));
    assert_eq!(config.pdf_engines, EngineKind::default_order());
    assert_eq!(
        config.pdf_renderer().engine_names(),
        vec!["weasyprint", "chrome", "wkhtmltopdf"]
    );
}

#[test]
fn test_config_pdf_settings() {
    let config = Config::default()
        .with_pdf_settings(Some("wkhtmltopdf, chrome"), Some("5000"))
        .unwrap();
    assert_eq!(
        config.pdf_engines,
        vec![EngineKind::Wkhtmltopdf, EngineKind::Chrome]
    );
    assert_eq!(config.default_timeout_ms, 5000);

    let unchanged = Config::default().with_pdf_settings(Some("  "), None).unwrap();
    assert_eq!(unchanged.pdf_engines, EngineKind::default_order());

    assert!(matches!(
        Config::default().with_pdf_settings(None, Some("soon")),
        Err(SlidesError::Config(_))
    ));
}

#[test]
fn test_browser_error_keeps_source() {
    let err = pdf::browser_error("Failed to launch browser", anyhow::anyhow!("no chrome"));
    assert_eq!(
        err.to_string(),
        "Headless browser error: Failed to launch browser: no chrome"
    );

    let source = std::error::Error::source(&err).expect("Browser error should carry its source");
    assert_eq!(source.to_string(), "no chrome");
}

#[test]
#[ignore] // Requires Chrome/Chromium to be installed
fn test_chrome_engine_prints_pdf() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let renderer = PdfRenderer::new(vec![Box::new(pdf::ChromeEngine::new(None, 30000))]);
    let output = temp.path().join("doc.pdf");
    renderer
        .render_html(
            &build_html_document("t", "en", resources::DEFAULT_DOCS_CSS, "<h1>Hi</h1>"),
            &output,
            Some(temp.path()),
        )
        .unwrap();

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}
