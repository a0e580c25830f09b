//! End-to-end tests against the live Mathpix OCR API.
//!
//! These upload a real PDF and are billed per page. They are gated behind
//! the `E2E_ENABLED` environment variable so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 MATHPIX_OCR_API_KEY=... OCRPDF_E2E_PDF=paper.pdf \
//!     cargo test --test e2e -- --nocapture

use ocrpdf::{convert, page_count, ClientConfig, ErrorKind, OutputFormat};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn output_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp output dir")
}

/// Skip this test unless E2E_ENABLED, an API key and a sample PDF are set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let key = match std::env::var("MATHPIX_OCR_API_KEY") {
            Ok(k) if !k.trim().is_empty() => k,
            _ => {
                println!("SKIP — MATHPIX_OCR_API_KEY not set");
                return;
            }
        };
        let pdf = match std::env::var_os("OCRPDF_E2E_PDF").map(PathBuf::from) {
            Some(p) if p.exists() => p,
            _ => {
                println!("SKIP — set OCRPDF_E2E_PDF to an existing PDF file");
                return;
            }
        };
        (key, pdf)
    }};
}

fn live_config(api_key: String) -> ClientConfig {
    let mut builder = ClientConfig::builder()
        .api_key(api_key)
        .poll_timeout_secs(600);
    if let Ok(url) = std::env::var("MATHPIX_OCR_BASE_URL") {
        builder = builder.base_url(url);
    }
    builder.build().expect("valid config")
}

// ── Conversions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_convert_to_mmd() {
    let (key, pdf) = e2e_skip_unless_ready!();
    let out = output_dir();
    let dest = out.path().join("paper.mmd");

    let report = convert(&pdf, &dest, &live_config(key)).await.unwrap();
    println!(
        "job {} → {} ({} pages, {} bytes, {}ms)",
        report.job_id,
        report.output_path.display(),
        report.total_pages,
        report.bytes_written,
        report.total_duration_ms
    );

    assert_eq!(report.format, OutputFormat::Mmd);
    assert_eq!(report.output_path, dest);
    let text = std::fs::read_to_string(&dest).unwrap();
    assert!(!text.trim().is_empty(), "Mathpix Markdown output is empty");
}

#[tokio::test]
async fn e2e_convert_tex_is_saved_as_zip() {
    let (key, pdf) = e2e_skip_unless_ready!();
    let out = output_dir();
    let dest = out.path().join("paper.tex");

    let report = convert(&pdf, &dest, &live_config(key)).await.unwrap();

    assert_eq!(report.output_path, out.path().join("paper.tex.zip"));
    assert!(!dest.exists());
    let bytes = std::fs::read(&report.output_path).unwrap();
    assert!(bytes.starts_with(b"PK"), "LaTeX output is not a zip archive");
}

#[tokio::test]
async fn e2e_bad_key_is_rejected() {
    let (_key, pdf) = e2e_skip_unless_ready!();
    let out = output_dir();

    let config = ClientConfig::builder()
        .api_key("definitely-not-a-valid-key")
        .build()
        .unwrap();
    let err = convert(&pdf, out.path().join("paper.mmd"), &config)
        .await
        .unwrap_err();

    println!("rejected as expected: {err}");
    assert!(
        matches!(err.kind(), ErrorKind::Remote | ErrorKind::Protocol),
        "unexpected error: {err:?}"
    );
    assert!(!out.path().join("paper.mmd").exists());
}

// ── Inspection ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_page_count() {
    let (_key, pdf) = e2e_skip_unless_ready!();

    match page_count(&pdf).await {
        Ok(pages) => {
            println!("{} has {} pages", pdf.display(), pages);
            assert!(pages > 0);
        }
        Err(e) if e.kind() == ErrorKind::Pdf => {
            println!("SKIP — pdfium not available: {e}");
        }
        Err(e) => panic!("page count failed: {e}"),
    }
}
