use super::Element;

/// A single compound selector: `tag`, `#id`, `.class` and `[attr]` parts,
/// e.g. `ul.embedded.blog-posts` or `time[datetime]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<String>,
}

impl Selector {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn class(class: &str) -> Self {
        Self {
            classes: vec![class.to_string()],
            ..Self::default()
        }
    }

    pub fn parse(input: &str) -> Self {
        let mut selector = Self::default();
        let mut rest = input.trim();

        let tag_end = rest.find(['.', '#', '[']).unwrap_or(rest.len());
        if tag_end > 0 {
            selector.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            match marker {
                '[' => {
                    let end = body.find(']').unwrap_or(body.len());
                    selector.attrs.push(body[..end].trim().to_string());
                    rest = body.get(end + 1..).unwrap_or("");
                }
                '.' | '#' => {
                    let end = body.find(['.', '#', '[']).unwrap_or(body.len());
                    let name = body[..end].to_string();
                    if marker == '.' {
                        selector.classes.push(name);
                    } else {
                        selector.id = Some(name);
                    }
                    rest = &body[end..];
                }
                _ => break,
            }
        }
        selector
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|class| element.has_class(class))
            && self.attrs.iter().all(|attr| element.attrs.contains_key(attr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_selectors() {
        let selector = Selector::parse("ul.embedded.blog-posts");
        assert_eq!(selector.tag.as_deref(), Some("ul"));
        assert_eq!(selector.classes, vec!["embedded", "blog-posts"]);

        let selector = Selector::parse("time[datetime]");
        assert_eq!(selector.tag.as_deref(), Some("time"));
        assert_eq!(selector.attrs, vec!["datetime"]);

        let selector = Selector::parse("#tags");
        assert!(selector.tag.is_none());
        assert_eq!(selector.id.as_deref(), Some("tags"));
    }

    #[test]
    fn matching_requires_every_part() {
        let mut element = Element::new("ul");
        element.classes = vec!["blog-posts".into()];
        assert!(Selector::parse("ul.blog-posts").matches(&element));
        assert!(!Selector::parse("ul.embedded.blog-posts").matches(&element));
        assert!(!Selector::parse("ol.blog-posts").matches(&element));
    }
}
