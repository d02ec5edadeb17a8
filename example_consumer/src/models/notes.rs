use autoadmin::{register_entity, ColumnDef, ColumnKind, Entity, MappedDef, Schema};

pub struct Note;

impl Entity for Note {
    fn schema() -> Schema {
        Schema::Mapped(MappedDef {
            table_name: Some("notes"),
            columns: vec![
                ColumnDef::new("id", ColumnKind::Integer).primary_key(),
                ColumnDef::new("body", ColumnKind::Text),
                ColumnDef::new("external_ref", ColumnKind::Uuid).nullable(),
                ColumnDef::new("created_at", ColumnKind::Timestamp).default_now(),
            ],
        })
    }
}

register_entity!(Note);
