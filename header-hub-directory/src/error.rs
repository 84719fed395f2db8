//! Directory error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Directory bind failed: {0}")]
    Bind(String),

    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),
}
