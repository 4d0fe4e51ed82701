// End-to-end behaviour of the editor core, driven through the public API the
// way a surface would: external value in, commands, stored document out.

use gridmail_editor_core::{
    ChangeLog, EditorCommand, EditorConfig, Fragment, HtmlEditor, InlineStyles, MemoryClipboard,
    PlaceholderEntry, Popover, Range, Reconcile, ViewMode, display_fragment, display_pass,
    ensure_not_empty, storage_pass, unwrap_document, wrap_document, wrap_orphans,
};

fn plain_config() -> EditorConfig {
    EditorConfig {
        inline_styles: InlineStyles::empty(),
        ..EditorConfig::default()
    }
}

fn plain_editor() -> HtmlEditor<ChangeLog> {
    HtmlEditor::new(plain_config(), ChangeLog::default())
}

fn body(value: &str) -> &str {
    unwrap_document(value)
}

// === Scenarios ===

#[test]
fn scenario_a_typing_into_empty_value() {
    let mut editor = HtmlEditor::new(EditorConfig::default(), ChangeLog::default());
    editor.set_value("");
    assert_eq!(editor.surface_html(), "<p></p>");

    editor.type_text("Hello");
    let p_style = InlineStyles::default().get("p").unwrap().to_string();
    assert_eq!(
        editor.listener().last(),
        Some(format!("<!DOCTYPE html><html><body><p style=\"{p_style}\">Hello</p></body></html>").as_str())
    );
    // Styling never reaches the live surface.
    assert_eq!(editor.surface_html(), "<p>Hello</p>");
}

#[test]
fn scenario_b_chip_deleted_by_one_backspace() {
    let mut editor = plain_editor();
    editor.set_value("<!DOCTYPE html><html><body><p>Hi [[CUSTOMER_ID]]</p></body></html>");

    let surface = editor.surface_html();
    assert!(surface.starts_with("<p>Hi <span class=\"placeholder-chip\" contenteditable=\"false\""));
    assert!(surface.ends_with(">[[CUSTOMER_ID]]</span></p>"));
    assert_eq!(editor.document().len(), 4);

    assert!(editor.execute(EditorCommand::DeleteBackward {
        range: Range::caret(4),
    }));
    assert_eq!(body(editor.value()), "<p>Hi </p>");
    assert!(!editor.value().contains('['));
    assert!(!editor.value().contains(']'));
}

#[test]
fn scenario_c_link_replaces_selection_once() {
    let mut editor = plain_editor();
    editor.set_value("<p>Hello world</p>");
    editor.execute(EditorCommand::MoveCursor { offset: 6 });
    editor.execute(EditorCommand::ExtendSelection { offset: 11 });

    editor.execute(EditorCommand::OpenPopover(Popover::Link));
    assert!(editor.toolbar().is_open(Popover::Link));
    editor.toolbar_mut().link_form.url = "https://example.com".into();
    assert!(editor.confirm_link());

    assert_eq!(
        body(editor.value()),
        "<p>Hello <a href=\"https://example.com\">world</a></p>"
    );
    assert_eq!(editor.value().matches("world").count(), 1);
    assert_eq!(editor.toolbar().popover(), None);
}

#[test]
fn scenario_d_source_edit_reconciles_on_return() {
    let mut editor = plain_editor();
    editor.set_value("<!DOCTYPE html><html><body><p>A</p></body></html>");

    editor.set_view_mode(ViewMode::Html);
    insta::assert_snapshot!(editor.view().source_string(), @r"
    <!DOCTYPE html>
    <html>
      <body>
        <p>A</p>
      </body>
    </html>
    ");

    let edited = editor.view().source_string().replace("<p>A</p>", "<p>B</p>");
    editor.set_source(&edited);
    assert_eq!(editor.listener().last(), Some(edited.as_str()));

    editor.set_view_mode(ViewMode::Edit);
    assert_eq!(editor.surface_html(), "<p>B</p>");
    assert_eq!(editor.document().text_content(), "B");
}

#[test]
fn scenario_e_paste_is_plain_text() {
    let mut editor = plain_editor().with_clipboard(MemoryClipboard::with_html_only("<b>bold text</b>"));
    assert!(editor.execute(EditorCommand::Paste {
        range: Range::caret(0),
    }));
    assert_eq!(body(editor.value()), "<p>bold text</p>");
    assert!(!editor.format_state().bold);
}

#[test]
fn paste_line_breaks_become_br() {
    let mut editor = plain_editor().with_clipboard(MemoryClipboard::with_text("one\ntwo"));
    editor.execute(EditorCommand::Paste {
        range: Range::caret(0),
    });
    assert_eq!(body(editor.value()), "<p>one<br>two</p>");
}

// === Properties ===

#[test]
fn shell_round_trip() {
    for fragment in [
        "",
        "<p>A</p>",
        "<h1>T</h1><p>Hi [[NAME]]</p>",
        "<ul><li>one</li><li>two</li></ul>",
    ] {
        assert_eq!(unwrap_document(&wrap_document(fragment)), fragment);
    }
}

#[test]
fn wrap_is_noop_with_html_tag() {
    for doc in [
        "<!DOCTYPE html><html><body><p>x</p></body></html>",
        "<HTML>anything",
        "<p>a</p><HtMl lang=\"en\"></html>",
    ] {
        assert_eq!(wrap_document(doc), doc);
    }
}

#[test]
fn placeholder_passes_are_inverse() {
    for text in [
        "Hi [[A]] and [[B_C]]!",
        "[[X]][[Y]]",
        "no tokens here",
        "[[unterminated and ]] stray",
        "[[]] is not a token",
    ] {
        let source = format!("<p>{text}</p>");
        let mut fragment = Fragment::parse(&source);
        display_pass(&mut fragment.children, "x");
        storage_pass(&mut fragment.children);
        assert_eq!(fragment.to_html(), source);
    }
}

#[test]
fn inserted_chip_stores_bare_token() {
    let mut editor = plain_editor().with_catalog(vec![PlaceholderEntry::new("Rate", "[[RATE_PLAN]]")]);
    editor.insert_placeholder("[[RATE_PLAN]]");
    assert_eq!(body(editor.value()), "<p>[[RATE_PLAN]]</p>");

    editor.insert_placeholder("FIRST_NAME");
    assert_eq!(body(editor.value()), "<p>[[RATE_PLAN]][[FIRST_NAME]]</p>");
}

#[test]
fn display_pass_leaves_attributes_alone() {
    let mut fragment = Fragment::parse("<p><a href=\"https://x.io/?id=[[ID]]\" title=\"[[T]]\">[[ID]]</a></p>");
    let created = display_pass(&mut fragment.children, "x");
    assert_eq!(created, 1);
    let html = fragment.to_html();
    assert!(html.starts_with("<p><a href=\"https://x.io/?id=[[ID]]\" title=\"[[T]]\"><span"));
    assert_eq!(html.matches("placeholder-chip").count(), 1);
}

#[test]
fn orphans_are_wrapped() {
    let mut fragment = Fragment::parse("Hello<br><p>x</p>\n  <h1>T</h1>tail");
    wrap_orphans(&mut fragment.children);
    assert_eq!(fragment.to_html(), "<p>Hello<br></p><p>x</p>\n  <h1>T</h1><p>tail</p>");

    let mut whitespace = Fragment::parse("<p>a</p>   <p>b</p>");
    assert_eq!(wrap_orphans(&mut whitespace.children), 0);
    assert_eq!(whitespace.to_html(), "<p>a</p>   <p>b</p>");
}

#[test]
fn blank_values_become_one_paragraph() {
    for value in ["", "<br>", "<!DOCTYPE html><html><body></body></html>", "<p><br></p>"] {
        assert_eq!(display_fragment(value, "x").to_html(), "<p></p>", "value {value:?}");
    }
    let mut fragment = Fragment::parse("<br>");
    assert!(ensure_not_empty(&mut fragment));
    assert!(!ensure_not_empty(&mut fragment));
}

#[test]
fn focused_surface_ignores_external_value() {
    let mut editor = plain_editor();
    editor.set_value("<p>original</p>");
    editor.focus();
    assert_eq!(editor.set_value("<p>replacement</p>"), Reconcile::SkippedFocused);
    assert_eq!(editor.surface_html(), "<p>original</p>");
}

#[test]
fn inline_styles_are_injected_once() {
    let mut styles = InlineStyles::empty();
    styles.set("p", "margin: 0;");
    let mut fragment = Fragment::parse("<p style=\"color: red;\">x</p><p>y</p>");
    assert_eq!(styles.inject(&mut fragment), 2);
    assert_eq!(styles.inject(&mut fragment), 0);
    assert_eq!(
        fragment.to_html(),
        "<p style=\"margin: 0; color: red;\">x</p><p style=\"margin: 0;\">y</p>"
    );
}

#[test]
fn stored_documents_hold_the_wire_shape() {
    let mut editor = HtmlEditor::new(EditorConfig::default(), ChangeLog::default());
    editor.set_value("loose text [[NAME]]<h2>Title</h2>");
    editor.execute(EditorCommand::MoveCursor { offset: 5 });
    editor.type_text("!");

    let value = editor.value();
    assert!(value.starts_with("<!DOCTYPE html><html><body><p style="));
    assert!(value.ends_with("</body></html>"));
    assert!(value.contains("loose! text [[NAME]]</p>"));
    assert!(value.contains("<h2 style="));
    assert!(!value.contains("placeholder-chip"));
}
