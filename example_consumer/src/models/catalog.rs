use autoadmin::{register_entity, register_type, ColumnDef, ColumnKind, Entity, MappedDef, Schema, TableDef};

pub struct Author;

impl Entity for Author {
    fn schema() -> Schema {
        Schema::Table(TableDef {
            name: "authors",
            columns: vec![
                ColumnDef::new("id", ColumnKind::Integer).primary_key(),
                ColumnDef::new("name", ColumnKind::Text),
                ColumnDef::new("email", ColumnKind::Text).nullable().unique(),
            ],
        })
    }
}

register_entity!(Author);

/// Table name falls back to `book`.
pub struct Book;

impl Entity for Book {
    fn schema() -> Schema {
        Schema::Mapped(MappedDef {
            table_name: None,
            columns: vec![
                ColumnDef::new("id", ColumnKind::Integer).primary_key(),
                ColumnDef::new("title", ColumnKind::Text),
                ColumnDef::new("author_id", ColumnKind::Integer).nullable(),
                ColumnDef::new("price", ColumnKind::Float).nullable(),
                ColumnDef::new("in_print", ColumnKind::Boolean).default_value(true),
                ColumnDef::new("published_at", ColumnKind::Timestamp).nullable(),
            ],
        })
    }
}

register_entity!(Book);

/// Lives next to the entities but is not one; discovery skips it.
pub struct PriceFormatter;

register_type!(PriceFormatter);
