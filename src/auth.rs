//! Authorization for privileged operations.

/// Key accepted by [`AdminKey::default`].
pub const DEFAULT_ADMIN_KEY: &str = "admin123";

/// Decides whether a supplied key unlocks a privileged operation
/// (removing a punched item, editing stock, the admin menu).
pub trait Authorizer {
    fn authorize(&self, key: &str) -> bool;
}

/// A single shared secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminKey(String);

impl AdminKey {
    pub fn new(key: impl Into<String>) -> Self {
        AdminKey(key.into())
    }
}

impl Default for AdminKey {
    fn default() -> Self {
        AdminKey::new(DEFAULT_ADMIN_KEY)
    }
}

impl Authorizer for AdminKey {
    fn authorize(&self, key: &str) -> bool {
        self.0 == key
    }
}

impl<F> Authorizer for F
where
    F: Fn(&str) -> bool,
{
    fn authorize(&self, key: &str) -> bool {
        self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_key() {
        let auth = AdminKey::default();
        assert!(auth.authorize("admin123"));
        assert!(!auth.authorize("admin"));
        assert!(!auth.authorize(""));
    }

    #[test]
    fn test_closure_policy() {
        let deny_all = |_: &str| false;
        assert!(!deny_all.authorize("admin123"));
    }
}
