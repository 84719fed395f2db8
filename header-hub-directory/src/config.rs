//! Directory connection settings

/// Connection and search settings for a directory server. Built from the
/// currently enabled LDAP configuration document.
#[derive(Debug, Clone)]
pub struct DirectorySettings {
    /// Server URL, e.g. `ldap://directory:389`.
    pub url: String,
    /// Root naming context all searches are relative to.
    pub base: String,
    /// Service-account bind DN.
    pub user_dn: String,
    /// Service-account password.
    pub password: String,
    /// User subtree, relative to `base`. Empty means `base` itself.
    pub user_search_base: String,
    /// Attribute a username is matched against, e.g. `uid`.
    pub user_attribute: String,
}
