//! Creates the application's SQLite schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, category::create_category_table, item::create_item_table, label::create_label_table,
};

/// Create the tables for the domain models if they do not already exist.
///
/// Also enables foreign key enforcement on `connection`, so items can only
/// reference categories and labels that exist.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_label_table(&transaction)?;
    create_item_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
