pub mod entity_table;
pub mod status_bar;
