//! Example: build a document by hand through a factory and print it
//!
//! Usage: cargo run --example dom_builder_demo

use xml_arbor::{
    AttributeType, DefaultNodeFactory, Format, Namespace, NodeFactory, NodeInner, XmlOutputter,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let factory = DefaultNodeFactory;
    let doc = factory.document()?;

    let catalog_ns = Namespace::new("", "urn:example:catalog")?;
    let catalog = factory.element("catalog", catalog_ns.clone())?;
    factory.add_content(&doc, factory.comment(" generated ")?)?;
    factory.add_content(&doc, catalog.clone())?;

    for (id, title) in [("b1", "Trees & Forests"), ("b2", "Roots <and> Shoots")] {
        let book = factory.element("book", catalog_ns.clone())?;
        let attr = factory.attribute("id", Namespace::none(), id, AttributeType::Id)?;
        factory.add_attribute(&book, attr)?;

        let title_el = factory.element("title", catalog_ns.clone())?;
        factory.add_content(&title_el, factory.text(title)?)?;
        factory.add_content(&book, title_el)?;
        factory.add_content(&catalog, book)?;
    }

    // Rejected: a second root element.
    let extra = factory.element("extra", Namespace::none())?;
    if let Err(e) = factory.add_content(&doc, extra) {
        eprintln!("rejected: {}", e);
    }

    let pretty = XmlOutputter::new(Format::pretty());
    print!("{}", pretty.output_to_string(&doc)?);

    let first = NodeInner::child_elements(&catalog).remove(0);
    eprintln!("first book at {}: {}", NodeInner::path(&first), NodeInner::text_content(&first));
    Ok(())
}
