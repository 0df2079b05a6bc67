//! Foreign content support for SVG and MathML.
//!
//! [§ 13.2.6.3 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#creating-and-inserting-nodes)
//! [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)

pub mod mathml;
pub mod svg;

pub use mathml::adjust_mathml_attributes;
pub use svg::{adjust_svg_attributes, adjust_svg_tag_name};

use quire_dom::{AttrNamespace, Attribute};

/// [§ 13.2.6.3 Adjust foreign attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-foreign-attributes)
///
/// "if any of the attributes on the token match the strings in the first
/// column of the following table, let the attribute be a namespaced
/// attribute, with the prefix being the string in the second column, the
/// local name being the string in the third column, and the namespace being
/// the namespace in the fourth column."
///
/// Format: (`attribute_name`, `local_name`, namespace). The prefix is implied
/// by the namespace.
const FOREIGN_ATTRIBUTE_ADJUSTMENTS: &[(&str, &str, AttrNamespace)] = &[
    ("xlink:actuate", "actuate", AttrNamespace::XLink),
    ("xlink:arcrole", "arcrole", AttrNamespace::XLink),
    ("xlink:href", "href", AttrNamespace::XLink),
    ("xlink:role", "role", AttrNamespace::XLink),
    ("xlink:show", "show", AttrNamespace::XLink),
    ("xlink:title", "title", AttrNamespace::XLink),
    ("xlink:type", "type", AttrNamespace::XLink),
    ("xml:lang", "lang", AttrNamespace::Xml),
    ("xml:space", "space", AttrNamespace::Xml),
    ("xmlns", "xmlns", AttrNamespace::Xmlns),
    ("xmlns:xlink", "xlink", AttrNamespace::Xmlns),
];

/// [§ 13.2.6.3 Adjust foreign attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-foreign-attributes)
///
/// Move `xlink:*`, `xml:*` and `xmlns*` attributes into their namespaces.
pub fn adjust_foreign_attributes(attributes: &mut [Attribute]) {
    for attr in attributes.iter_mut() {
        if let Some(&(_, local_name, namespace)) = FOREIGN_ATTRIBUTE_ADJUSTMENTS
            .iter()
            .find(|(from, _, _)| attr.namespace.is_none() && attr.name == *from)
        {
            attr.name = local_name.to_string();
            attr.namespace = Some(namespace);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlink_href_is_namespaced() {
        let mut attrs = vec![Attribute::new("xlink:href", "#a"), Attribute::new("x", "1")];
        adjust_foreign_attributes(&mut attrs);
        assert_eq!(attrs[0].name, "href");
        assert_eq!(attrs[0].namespace, Some(AttrNamespace::XLink));
        assert_eq!(attrs[0].qualified_name(), "xlink:href");
        assert_eq!(attrs[1].namespace, None);
    }

    #[test]
    fn test_bare_xmlns_keeps_its_name() {
        let mut attrs = vec![Attribute::new("xmlns", "http://www.w3.org/2000/svg")];
        adjust_foreign_attributes(&mut attrs);
        assert_eq!(attrs[0].qualified_name(), "xmlns");
        assert_eq!(attrs[0].namespace, Some(AttrNamespace::Xmlns));
    }
}
