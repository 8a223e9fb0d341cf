//! Columns command: show the effective field → column mapping

use anyhow::Result;

use crate::config::Profile;
use crate::sync::value::EditableField;

pub fn run(profile: &Profile) -> Result<()> {
    let map = profile.column_map()?;
    for field in EditableField::ALL {
        match map.column(field) {
            Some(column) => println!("{:<12} column {}", field.to_string(), column),
            None => println!("{:<12} (unsupported: no column mapping)", field.to_string()),
        }
    }
    Ok(())
}
