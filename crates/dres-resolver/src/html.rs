//! Propagated return types of `querySelector` and `query` in `dart:html`.

use dres_element::{ElementId, ElementModel};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

pub const HTML_LIBRARY_URI: &str = "dart:html";

/// Tag name to the `dart:html` class of elements with that tag.
static TAG_CLASSES: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("a", "AnchorElement"),
        ("area", "AreaElement"),
        ("br", "BRElement"),
        ("base", "BaseElement"),
        ("body", "BodyElement"),
        ("button", "ButtonElement"),
        ("canvas", "CanvasElement"),
        ("content", "ContentElement"),
        ("dl", "DListElement"),
        ("datalist", "DataListElement"),
        ("details", "DetailsElement"),
        ("dialog", "DialogElement"),
        ("div", "DivElement"),
        ("embed", "EmbedElement"),
        ("fieldset", "FieldSetElement"),
        ("form", "FormElement"),
        ("hr", "HRElement"),
        ("head", "HeadElement"),
        ("h1", "HeadingElement"),
        ("h2", "HeadingElement"),
        ("h3", "HeadingElement"),
        ("h4", "HeadingElement"),
        ("h5", "HeadingElement"),
        ("h6", "HeadingElement"),
        ("html", "HtmlElement"),
        ("iframe", "IFrameElement"),
        ("img", "ImageElement"),
        ("input", "InputElement"),
        ("keygen", "KeygenElement"),
        ("li", "LIElement"),
        ("label", "LabelElement"),
        ("legend", "LegendElement"),
        ("link", "LinkElement"),
        ("map", "MapElement"),
        ("menu", "MenuElement"),
        ("meter", "MeterElement"),
        ("ol", "OListElement"),
        ("object", "ObjectElement"),
        ("optgroup", "OptGroupElement"),
        ("output", "OutputElement"),
        ("p", "ParagraphElement"),
        ("param", "ParamElement"),
        ("pre", "PreElement"),
        ("progress", "ProgressElement"),
        ("script", "ScriptElement"),
        ("select", "SelectElement"),
        ("source", "SourceElement"),
        ("span", "SpanElement"),
        ("style", "StyleElement"),
        ("caption", "TableCaptionElement"),
        ("td", "TableCellElement"),
        ("col", "TableColElement"),
        ("table", "TableElement"),
        ("tr", "TableRowElement"),
        ("textarea", "TextAreaElement"),
        ("title", "TitleElement"),
        ("track", "TrackElement"),
        ("ul", "UListElement"),
        ("video", "VideoElement"),
    ]
    .into_iter()
    .collect()
});

/// Class name for the element a selector starts with, if it starts with a
/// known tag name. Id and class selectors (`#x`, `.x`) have no tag.
pub fn element_class_for_selector(selector: &str) -> Option<&'static str> {
    let tag: String = selector
        .trim_start()
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect();
    if tag.is_empty() {
        return None;
    }
    TAG_CLASSES.get(tag.to_ascii_lowercase().as_str()).copied()
}

/// True when `callee` is a `querySelector`/`query` member declared by
/// `dart:html`.
pub fn is_html_query(model: &ElementModel, callee: ElementId) -> bool {
    if !matches!(model.name(callee), "querySelector" | "query") {
        return false;
    }
    let library = model.elements.library_of(callee);
    model
        .library_source(library)
        .is_some_and(|s| s.uri() == HTML_LIBRARY_URI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_tag_lookup() {
        assert_eq!(element_class_for_selector("div"), Some("DivElement"));
        assert_eq!(element_class_for_selector("a.link"), Some("AnchorElement"));
        assert_eq!(element_class_for_selector("INPUT[type=text]"), Some("InputElement"));
        assert_eq!(element_class_for_selector("#main"), None);
        assert_eq!(element_class_for_selector(".item"), None);
        assert_eq!(element_class_for_selector("blink"), None);
    }
}
