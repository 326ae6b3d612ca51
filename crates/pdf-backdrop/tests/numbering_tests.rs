mod common;

use common::*;
use pdf_backdrop::fonts::{NumberingFont, StandardFont};
use pdf_backdrop::layout::compute_numbering_rect;
use pdf_backdrop::*;
use rstest::rstest;
use tempfile::tempdir;

/// Last `Td` on the page, flipped to top-left coordinates
fn number_origin(doc: &lopdf::Document, page: lopdf::ObjectId, page_height: f32) -> Point {
    let (x, y) = *td_operands(&page_content(doc, page)).last().unwrap();
    Point {
        x,
        y: page_height - y,
    }
}

#[test]
fn test_numbers_every_page() {
    let dir = tempdir().unwrap();
    let path = write_test_pdf(&dir.path().join("doc.pdf"), "Page", 2, LETTER);

    let config = NumberingConfig::default();
    number_pages(&path, &config).unwrap();

    let doc = load(&path);
    let pages = page_ids(&doc);
    assert_eq!(pages.len(), 2);

    let page_rect = Rectangle::new(0.0, 0.0, LETTER.0, LETTER.1);
    let number_rect = compute_numbering_rect(&page_rect, &config).unwrap();
    let font = NumberingFont::Standard(StandardFont::Helvetica);

    for (index, &page) in pages.iter().enumerate() {
        let label = (index + 1).to_string();
        let content = page_content(&doc, page);
        assert!(content.contains(&format!("({}) Tj", label)));
        assert!(content.contains("/Helvetica 11 Tf"));
        // Original content is kept
        assert!(content.contains(&format!("(Page {})", index + 1)));

        let origin = number_origin(&doc, page, LETTER.1);
        let width = font.measure_text(&label, config.font_size_pt());
        assert!(origin.x >= number_rect.x0 - 1e-3);
        assert!(origin.x + width <= number_rect.x1 + 1e-3);
        assert!(origin.y >= number_rect.y0 && origin.y <= number_rect.y1);
    }
}

#[test]
fn test_working_copy_removed() {
    let dir = tempdir().unwrap();
    let path = write_test_pdf(&dir.path().join("doc.pdf"), "Page", 3, A4);

    number_pages(&path, &NumberingConfig::default()).unwrap();

    assert_eq!(file_names(dir.path()), vec!["doc.pdf"]);
    assert_eq!(page_count(&path), 3);
}

#[test]
fn test_margin_error_leaves_document_untouched() {
    let dir = tempdir().unwrap();
    let path = write_test_pdf(&dir.path().join("doc.pdf"), "Page", 2, A4);
    let before = std::fs::read(&path).unwrap();

    let margins = NumberMargins {
        left_mm: 150.0,
        right_mm: 150.0,
        ..NumberMargins::default()
    };
    let config =
        NumberingConfig::new(NumberPosition::BottomCenter, "Helvetica", None, 11.0, margins)
            .unwrap();

    let result = number_pages(&path, &config);
    assert!(matches!(result, Err(MergeError::Margin(_))));
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(file_names(dir.path()), vec!["doc.pdf"]);
}

#[test]
fn test_text_overflow_leaves_document_untouched() {
    let dir = tempdir().unwrap();
    let path = write_test_pdf(&dir.path().join("doc.pdf"), "Page", 1, A4);
    let before = std::fs::read(&path).unwrap();

    // 207mm of horizontal margins leave about 8pt of a 595pt page
    let margins = NumberMargins {
        left_mm: 104.0,
        right_mm: 103.0,
        ..NumberMargins::default()
    };
    let config = NumberingConfig::new(NumberPosition::TopLeft, "Courier", None, 20.0, margins)
        .unwrap();

    let result = number_pages(&path, &config);
    assert!(matches!(result, Err(MergeError::TextOverflow(_))));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[rstest]
#[case(NumberPosition::TopLeft)]
#[case(NumberPosition::TopCenter)]
#[case(NumberPosition::TopRight)]
#[case(NumberPosition::BottomLeft)]
#[case(NumberPosition::BottomCenter)]
#[case(NumberPosition::BottomRight)]
fn test_number_lands_inside_box(#[case] position: NumberPosition) {
    let dir = tempdir().unwrap();
    let path = write_test_pdf(&dir.path().join("doc.pdf"), "Page", 1, A4);

    let config =
        NumberingConfig::new(position, "Times-Roman", None, 14.0, NumberMargins::uniform(15.0))
            .unwrap();
    number_pages(&path, &config).unwrap();

    let doc = load(&path);
    let page = page_ids(&doc)[0];
    let page_rect = Rectangle::new(0.0, 0.0, A4.0, A4.1);
    let number_rect = compute_numbering_rect(&page_rect, &config).unwrap();
    let origin = number_origin(&doc, page, A4.1);

    assert!(number_rect.contains(&Rectangle::new(origin.x, origin.y, origin.x, origin.y)));
    assert!(page_content(&doc, page).contains("/TimesRoman 14 Tf"));
}

#[test]
fn test_merge_with_numbering() {
    let dir = tempdir().unwrap();
    let background = write_test_pdf(&dir.path().join("template.pdf"), "Template", 1, A4);
    let content = write_test_pdf(&dir.path().join("content.pdf"), "Content", 4, LETTER);
    let output = dir.path().join("out.pdf");

    let mut request = MergeRequest::new(&background, &content, &output);
    request.numbering = Some(
        NumberingConfig::parse("top-right", "cour", None, 9.0, NumberMargins::uniform(5.0))
            .unwrap(),
    );
    merge_documents(&request).unwrap();

    let doc = load(&output);
    let pages = page_ids(&doc);
    assert_eq!(pages.len(), 3);
    for (index, &page) in pages.iter().enumerate() {
        let content = page_content(&doc, page);
        assert!(content.contains(&format!("({}) Tj", index + 1)));
        assert!(content.contains("/Courier 9 Tf"));
    }
}

#[test]
fn test_rotated_page_number_reads_upright() {
    let dir = tempdir().unwrap();
    let path = write_test_pdf(&dir.path().join("doc.pdf"), "Page", 1, LETTER);
    set_on_every_page(&path, "Rotate", lopdf::Object::Integer(90));

    let config = NumberingConfig::default();
    number_pages(&path, &config).unwrap();

    let doc = load(&path);
    let page = page_ids(&doc)[0];
    let content = page_content(&doc, page);
    assert!(content.contains("(1) Tj"));

    let [a, b, c, d, e, f] = *tm_operands(&content).last().unwrap();
    assert_eq!([a, b, c, d], [0.0, 1.0, -1.0, 0.0]);

    // Displayed as landscape; user space (e, f) shows at (f, e) from the top-left
    let displayed = Rectangle::new(0.0, 0.0, LETTER.1, LETTER.0);
    let number_rect = compute_numbering_rect(&displayed, &config).unwrap();
    let width = NumberingFont::Standard(StandardFont::Helvetica)
        .measure_text("1", config.font_size_pt());
    assert!(f >= number_rect.x0 - 1e-3);
    assert!(f + width <= number_rect.x1 + 1e-3);
    assert!(e >= number_rect.y0 && e <= number_rect.y1);
}

#[test]
fn test_truetype_font_embedded() {
    let dir = tempdir().unwrap();
    let path = write_test_pdf(&dir.path().join("doc.pdf"), "Page", 2, A4);

    let config = NumberingConfig::new(
        NumberPosition::BottomRight,
        "DejaVu Sans!",
        Some(dejavu_sans()),
        11.0,
        NumberMargins::default(),
    )
    .unwrap();
    number_pages(&path, &config).unwrap();

    let doc = load(&path);
    let pages = page_ids(&doc);
    let page_rect = Rectangle::new(0.0, 0.0, A4.0, A4.1);
    let number_rect = compute_numbering_rect(&page_rect, &config).unwrap();
    let font = NumberingFont::load(&config).unwrap();

    for (index, &page) in pages.iter().enumerate() {
        let label = (index + 1).to_string();
        let content = page_content(&doc, page);
        assert!(content.contains("/DejaVuSans 11 Tf"));
        assert!(content.contains(&format!("({}) Tj", label)));

        let font_dict = page_font(&doc, page, "DejaVuSans");
        assert_eq!(
            font_dict.get(b"Subtype").unwrap().as_name().unwrap(),
            b"TrueType"
        );
        let descriptor = dict_entry(&doc, &font_dict, "FontDescriptor")
            .as_dict()
            .unwrap();
        assert!(descriptor.get(b"FontFile2").is_ok());

        let origin = number_origin(&doc, page, A4.1);
        let width = font.measure_text(&label, config.font_size_pt());
        assert!(origin.x >= number_rect.x0 - 1e-3);
        assert!(origin.x + width <= number_rect.x1 + 1e-3);
        assert!(origin.y >= number_rect.y0 && origin.y <= number_rect.y1);
    }
}

#[cfg(unix)]
#[test]
fn test_numbered_file_replaced_whole() {
    use std::os::unix::fs::MetadataExt;

    let dir = tempdir().unwrap();
    let path = write_test_pdf(&dir.path().join("doc.pdf"), "Page", 2, A4);
    let before = std::fs::metadata(&path).unwrap().ino();

    number_pages(&path, &NumberingConfig::default()).unwrap();

    // A rename swaps in a new inode; an in-place rewrite would keep the old one
    assert_ne!(std::fs::metadata(&path).unwrap().ino(), before);
    assert_eq!(file_names(dir.path()), vec!["doc.pdf"]);
    assert_eq!(page_count(&path), 2);
}
