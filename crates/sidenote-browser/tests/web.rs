//! WASM browser tests for sidenote-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use sidenote_browser::{
    DomHost, Host, MutationGuard, NUMBER_ATTR, RENDERED_ATTR, Selectors, SidenoteConfig,
    SidenoteTree, Sidenotes, render_links,
};
use web_sys::{Element, HtmlElement};

const VIEW: &str = r#"
<div class="markdown-source-view mod-cm6">
  <div class="cm-scroller">
    <div class="cm-content">
      <p>First line <span class="sidenote-number"><small class="sidenote" style="display:block;height:40px">see [docs](https://x.y) here</small></span></p>
      <p>Second line <small class="sidenote" style="display:block;height:20px">[notes](note.md)</small></p>
    </div>
  </div>
</div>
"#;

fn mount(html: &str) -> Element {
    let document = gloo_utils::document();
    let view = document.create_element("div").unwrap();
    view.set_inner_html(html);
    document.body().unwrap().append_child(&view).unwrap();
    view
}

fn notes(view: &Element) -> Vec<Element> {
    let list = view.query_selector_all("small.sidenote").unwrap();
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|n| n.dyn_into::<Element>().unwrap())
        .collect()
}

// === Region lookup ===

#[wasm_bindgen_test]
fn test_finds_regions() {
    let view = mount(VIEW);
    let host = DomHost::new(Selectors::default());
    host.set_active_view(Some(view.clone()));

    let active = host.active_view().unwrap();
    let root = host.editor_root(&active).unwrap();
    assert!(host.scroller(&root).is_some());
    assert!(host.content(&root).is_some());
    assert_eq!(host.tree(&root).annotations().len(), 2);
}

#[wasm_bindgen_test]
fn test_missing_root() {
    let view = mount("<div class=\"reading-view\"></div>");
    let host = DomHost::new(Selectors::default());
    assert!(host.editor_root(&view).is_none());
}

// === Link rendering ===

#[wasm_bindgen_test]
fn test_renders_safe_links_only() {
    let view = mount(VIEW);
    let host = DomHost::new(Selectors::default());
    let root = host.editor_root(&view).unwrap();
    let mut tree = host.tree(&root);
    let found = tree.annotations();

    let created = render_links(
        &mut tree,
        &found,
        &SidenoteConfig::default().allowed_protocols,
        &MutationGuard::new(),
        || {},
    );
    assert_eq!(created, 1);

    let first = &found[0];
    let anchor = first.query_selector("a").unwrap().unwrap();
    assert_eq!(anchor.text_content().as_deref(), Some("docs"));
    assert_eq!(anchor.get_attribute("href").as_deref(), Some("https://x.y"));
    assert_eq!(
        anchor.get_attribute("rel").as_deref(),
        Some("noopener noreferrer")
    );
    assert_eq!(anchor.get_attribute("target").as_deref(), Some("_blank"));
    assert_eq!(first.text_content().as_deref(), Some("see docs here"));
    assert_eq!(first.get_attribute(RENDERED_ATTR).as_deref(), Some("1"));

    let second = &found[1];
    assert!(second.query_selector("a").unwrap().is_none());
    assert_eq!(second.text_content().as_deref(), Some("[notes](note.md)"));
    assert!(second.get_attribute(RENDERED_ATTR).is_none());
}

#[wasm_bindgen_test]
fn test_rendering_twice_is_idempotent() {
    let view = mount(VIEW);
    let host = DomHost::new(Selectors::default());
    let root = host.editor_root(&view).unwrap();
    let allowed = SidenoteConfig::default().allowed_protocols;
    let guard = MutationGuard::new();

    let mut tree = host.tree(&root);
    let found = tree.annotations();
    render_links(&mut tree, &found, &allowed, &guard, || {});

    // Even with the flag cleared, converted links are not re-wrapped.
    tree.set_rendered(&found[0], false).unwrap();
    let once = root.inner_html();
    assert_eq!(render_links(&mut tree, &found, &allowed, &guard, || {}), 0);
    assert_eq!(root.inner_html(), once);
}

// === Layout ===

#[wasm_bindgen_test]
fn test_pass_numbers_and_shifts() {
    let view = mount(VIEW);
    let host = DomHost::new(Selectors::default());
    host.set_active_view(Some(view.clone()));
    let sidenotes = Sidenotes::new(host, SidenoteConfig::default());

    let report = sidenotes.run_pass();
    assert_eq!(report.links_rendered, 1);
    assert_eq!(report.numbered, 2);

    let found = notes(&view);
    assert_eq!(found[0].get_attribute(NUMBER_ATTR).as_deref(), Some("1"));
    assert_eq!(found[1].get_attribute(NUMBER_ATTR).as_deref(), Some("2"));

    let marker = view.query_selector(".sidenote-number").unwrap().unwrap();
    assert_eq!(marker.get_attribute(NUMBER_ATTR).as_deref(), Some("1"));

    for note in &found {
        let shift = note
            .dyn_ref::<HtmlElement>()
            .unwrap()
            .style()
            .get_property_value("--sidenote-shift")
            .unwrap();
        assert!(shift.ends_with("px"), "unexpected shift {shift:?}");
    }
}

#[wasm_bindgen_test]
fn test_load_and_unload() {
    let view = mount(VIEW);
    let host = DomHost::new(Selectors::default());
    host.set_active_view(Some(view));
    let sidenotes = Sidenotes::new(host, SidenoteConfig::default());

    sidenotes.load();
    assert_eq!(sidenotes.bindings().len(), 2);
    assert!(sidenotes.is_pending());

    sidenotes.unload();
    assert!(sidenotes.bindings().is_empty());
    assert!(!sidenotes.is_pending());
}
