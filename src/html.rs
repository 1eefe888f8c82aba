use scraper::{ElementRef, Html, Selector};

/// Value of `attribute` on the first `element` in document order that carries it.
///
/// With `container_class`, only elements that have that class themselves or
/// sit inside an ancestor that has it are considered.
pub fn first_attribute(html: &str, element: &str, attribute: &str, container_class: Option<&str>) -> Option<String> {
    let selector = match Selector::parse(&format!("{}[{}]", element, attribute)) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(element, attribute, error = ?e, "bad attribute selector");
            return None;
        }
    };

    let document = Html::parse_document(html);
    let found = document
        .select(&selector)
        .find(|el| container_class.map_or(true, |class| within_class(el, class)));
    found.and_then(|el| el.value().attr(attribute)).map(str::to_string)
}

fn within_class(el: &ElementRef<'_>, class: &str) -> bool {
    let has = |e: &ElementRef<'_>| e.value().classes().any(|c| c == class);
    has(el) || el.ancestors().filter_map(ElementRef::wrap).any(|a| has(&a))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div data-api-endpoints='{"outside":{}}'></div>
        <section class="react-component wide">
          <div><div data-api-endpoints='{"inside":{}}'></div></div>
        </section>
        <div class="react-component" data-api-endpoints='{"later":{}}'></div>
    </body></html>"#;

    #[test]
    fn first_match_without_gating() {
        let v = first_attribute(PAGE, "div", "data-api-endpoints", None).unwrap();
        assert_eq!(v, r#"{"outside":{}}"#);
    }

    #[test]
    fn gated_by_container_class() {
        let v = first_attribute(PAGE, "div", "data-api-endpoints", Some("react-component")).unwrap();
        assert_eq!(v, r#"{"inside":{}}"#);
    }

    #[test]
    fn element_with_class_itself_counts() {
        let html = r#"<div class="brief" data-x="1"></div>"#;
        assert_eq!(first_attribute(html, "div", "data-x", Some("brief")).as_deref(), Some("1"));
    }

    #[test]
    fn missing_attribute() {
        assert!(first_attribute("<div id=a></div>", "div", "data-api-endpoints", None).is_none());
        assert!(first_attribute(PAGE, "div", "data-api-endpoints", Some("nope")).is_none());
        assert!(first_attribute(PAGE, "span", "data-api-endpoints", None).is_none());
    }
}
