//! Example generator run over a small in-memory schema.
//!
//! Run with: `RUST_LOG=debug cargo run --example generate -- <output-dir>`

use protojs::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn shop_schema() -> Result<SchemaSet, SchemaError> {
    let item = SchemaFile::new("shop/item.proto", "shop")
        .with_syntax(Syntax::Proto3)
        .with_message(
            SchemaMessage::new("Item")
                .with_field(SchemaField::new("sku", 1, FieldType::String))
                .with_field(SchemaField::new("price_cents", 2, FieldType::Int64))
                .with_field(SchemaField::new("thumbnail", 3, FieldType::Bytes)),
        );
    let order = SchemaFile::new("shop/order.proto", "shop")
        .with_syntax(Syntax::Proto3)
        .with_dependency("shop/item.proto")
        .with_enum(
            SchemaEnum::new("Status")
                .with_value("PENDING", 0)
                .with_value("SHIPPED", 1),
        )
        .with_message(
            SchemaMessage::new("Order")
                .with_oneof("payment")
                .with_field(SchemaField::new("id", 1, FieldType::String))
                .with_field(
                    SchemaField::new("items", 2, FieldType::Message("shop.Item".to_string()))
                        .repeated(),
                )
                .with_field(SchemaField::new("status", 3, FieldType::Enum("shop.Status".to_string())))
                .with_field(SchemaField::new("card", 4, FieldType::String).in_oneof(0))
                .with_field(SchemaField::new("voucher", 5, FieldType::String).in_oneof(0)),
        );
    SchemaSet::new(vec![item, order])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let output_dir = std::env::args()
        .nth(1)
        .map_or_else(|| std::env::temp_dir().join("protojs"), PathBuf::from);

    let set = shop_schema()?;
    for style in [ImportStyle::Closure, ImportStyle::CommonJs, ImportStyle::Es6] {
        let options = GenerationOptions::default()
            .with_import_style(style)
            .with_binary(true)
            .with_output_dir(output_dir.join(style.to_string()));
        let generator = Generator::new(&set, options)?;
        let units = generator.generate_all()?;
        let written = generator.write(&units)?;
        for path in &written {
            tracing::info!("[{}] wrote {}", style, path.display());
        }
    }
    Ok(())
}
