//! Example: read one document with every adapter and compare the results
//!
//! Usage: cargo run --example compare_builders [file.xml]

use std::env;

use xml_arbor::{AdapterKind, DefaultNodeFactory, Format, XmlBuilder, XmlOutputter};

const SAMPLE: &str = r#"<?xml version="1.0"?>
<order xmlns="urn:shop" xmlns:p="urn:pricing" id="42">
  <!-- two lines -->
  <line sku="A-1" p:price="9.50">Pencils</line>
  <line sku="B-7" p:price="3.25">Erasers &amp; sharpeners</line>
  <?audit checked?>
</order>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let source = match env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };

    let builder = XmlBuilder::new(DefaultNodeFactory);
    let reference = builder.build_str_with(AdapterKind::Push, &source)?;

    for kind in AdapterKind::ALL {
        let document = builder.build_str_with(kind, &source)?;
        let same = document.structurally_equal(&reference);
        println!("{:<8} {}", kind.name(), if same { "identical" } else { "differs" });
    }

    let outputter = XmlOutputter::new(Format::compact().with_omit_declaration(true));
    print!("{}", outputter.document_to_string(&reference)?);
    Ok(())
}
