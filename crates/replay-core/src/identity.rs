//! Row identity resolution for UPDATE and DELETE predicates.

use crate::error::{ReplayError, Result};
use crate::schema::{FieldClassification, SchemaRegistry};

/// Columns that identify a row of `classification`'s table.
///
/// A declared row identifier is returned verbatim and its order is the
/// predicate order. Without one, every column of the before image is used, in
/// the order given.
pub fn resolve_identity<S: AsRef<str>>(
    classification: &FieldClassification,
    before_keys: &[S],
) -> Result<Vec<String>> {
    if let Some(declared) = classification.row_identifier() {
        return Ok(declared.to_vec());
    }
    if before_keys.is_empty() {
        return Err(ReplayError::NoIdentityAvailable {
            table: classification.table().to_string(),
        });
    }
    Ok(before_keys.iter().map(|k| k.as_ref().to_string()).collect())
}

impl SchemaRegistry {
    /// Resolve the identity columns of `table`, see [`resolve_identity`].
    pub fn resolve_identity<S: AsRef<str>>(
        &self,
        table: &str,
        before_keys: &[S],
    ) -> Result<Vec<String>> {
        resolve_identity(self.classification_for(table)?, before_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_yaml(
            "accounts:\n  row_identifier: [tenant_id, account_id]\nnotes: {}\nusers:\n  row_identifier: [id]\n",
        )
        .unwrap()
    }

    #[test]
    fn test_declared_identifier_wins() {
        let registry = registry();
        let empty: [&str; 0] = [];
        assert_eq!(registry.resolve_identity("users", &["a", "b"]).unwrap(), vec!["id"]);
        assert_eq!(registry.resolve_identity("users", &empty).unwrap(), vec!["id"]);
    }

    #[test]
    fn test_declared_order_is_kept() {
        let registry = registry();
        assert_eq!(
            registry
                .resolve_identity("accounts", &["account_id", "tenant_id", "name"])
                .unwrap(),
            vec!["tenant_id", "account_id"]
        );
    }

    #[test]
    fn test_falls_back_to_before_keys() {
        let registry = registry();
        assert_eq!(
            registry.resolve_identity("notes", &["b", "a"]).unwrap(),
            vec!["b", "a"]
        );
    }

    #[test]
    fn test_no_identity_available() {
        let registry = registry();
        let empty: Vec<String> = Vec::new();
        let err = registry.resolve_identity("notes", &empty).unwrap_err();
        assert!(matches!(err, ReplayError::NoIdentityAvailable { ref table } if table == "notes"));
    }

    #[test]
    fn test_unknown_table() {
        let registry = registry();
        assert!(matches!(
            registry.resolve_identity("missing", &["id"]),
            Err(ReplayError::UnknownTable { .. })
        ));
    }
}
