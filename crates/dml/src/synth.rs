//! Statement synthesis from column classification and row identity.

use crate::dialect::{Predicate, SqlDialect};
use crate::statement::{Binding, BoundStatement, Statement};
use replay_core::{
    resolve_identity, ChangeKind, ChangeRecord, ReplayError, Result, RowImage, SchemaRegistry,
    ValueCaster,
};
use serde_json::Value;
use tracing::debug;

/// Builds parameterized INSERT/UPDATE/DELETE statements for one target schema.
///
/// The synthesizer owns column selection and ordering; the dialect owns the
/// text. Every returned [`Statement`] has exactly one binding per placeholder.
#[derive(Clone, Copy)]
pub struct DmlSynthesizer<'a> {
    registry: &'a SchemaRegistry,
    dialect: &'a dyn SqlDialect,
    target_schema: &'a str,
}

impl<'a> DmlSynthesizer<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        dialect: &'a dyn SqlDialect,
        target_schema: &'a str,
    ) -> Self {
        Self {
            registry,
            dialect,
            target_schema,
        }
    }

    pub fn dialect(&self) -> &'a dyn SqlDialect {
        self.dialect
    }

    pub fn target_schema(&self) -> &'a str {
        self.target_schema
    }

    /// `INSERT INTO schema.table (after_keys...) VALUES (...)`.
    pub fn build_insert<S: AsRef<str>>(
        &self,
        schema: &str,
        table: &str,
        after_keys: &[S],
    ) -> Result<Statement> {
        self.registry.classification_for(table)?;
        let columns = owned(after_keys);
        if columns.is_empty() {
            return Err(empty_mutation(table, ChangeKind::Insert));
        }

        let sql = self
            .dialect
            .insert_sql(schema, table, &columns)
            .map_err(|message| ReplayError::Sql {
                table: table.to_string(),
                message,
            })?;
        debug!(
            "Built INSERT for {}.{} with {} columns",
            schema,
            table,
            columns.len()
        );

        Ok(Statement {
            kind: ChangeKind::Insert,
            schema: schema.to_string(),
            table: table.to_string(),
            sql,
            bindings: columns.into_iter().map(Binding::After).collect(),
        })
    }

    /// `UPDATE schema.table SET after_keys... WHERE identity...`.
    ///
    /// Values bind after-columns first, then identity columns from the before
    /// image.
    pub fn build_update<B: AsRef<str>, A: AsRef<str>>(
        &self,
        schema: &str,
        table: &str,
        before_keys: &[B],
        after_keys: &[A],
    ) -> Result<Statement> {
        self.update_statement(schema, table, before_keys, after_keys, None)
    }

    /// `DELETE FROM schema.table WHERE identity...`.
    ///
    /// Fails instead of producing an unqualified DELETE.
    pub fn build_delete<S: AsRef<str>>(
        &self,
        schema: &str,
        table: &str,
        before_keys: &[S],
    ) -> Result<Statement> {
        self.delete_statement(schema, table, before_keys, None)
    }

    /// Build the statement for `record` in the target schema and bind its
    /// values in placeholder order.
    ///
    /// Identity columns that are null in the before image are matched with
    /// `IS NULL` and take no placeholder.
    pub fn synthesize(&self, record: &ChangeRecord) -> Result<BoundStatement> {
        let schema = self.target_schema;
        let table = record.table.as_str();
        let before = Some(&record.before);
        let statement = match record.kind()? {
            ChangeKind::Insert => {
                self.build_insert(schema, table, record.after_keys().as_slice())?
            }
            ChangeKind::Update => self.update_statement(
                schema,
                table,
                record.before_keys().as_slice(),
                record.after_keys().as_slice(),
                before,
            )?,
            ChangeKind::Delete => {
                self.delete_statement(schema, table, record.before_keys().as_slice(), before)?
            }
        };

        statement.bind(record, &ValueCaster::new(self.registry))
    }

    fn update_statement<B: AsRef<str>, A: AsRef<str>>(
        &self,
        schema: &str,
        table: &str,
        before_keys: &[B],
        after_keys: &[A],
        before: Option<&RowImage>,
    ) -> Result<Statement> {
        let classification = self.registry.classification_for(table)?;
        let set_columns = owned(after_keys);
        if set_columns.is_empty() {
            return Err(empty_mutation(table, ChangeKind::Update));
        }
        let predicates = identity_predicates(resolve_identity(classification, before_keys)?, before);

        let sql = self
            .dialect
            .update_sql(schema, table, &set_columns, &predicates);
        debug!(
            "Built UPDATE for {}.{} setting {:?} where {:?}",
            schema, table, set_columns, predicates
        );

        let bindings = set_columns
            .into_iter()
            .map(Binding::After)
            .chain(predicate_bindings(&predicates))
            .collect();
        Ok(Statement {
            kind: ChangeKind::Update,
            schema: schema.to_string(),
            table: table.to_string(),
            sql,
            bindings,
        })
    }

    fn delete_statement<S: AsRef<str>>(
        &self,
        schema: &str,
        table: &str,
        before_keys: &[S],
        before: Option<&RowImage>,
    ) -> Result<Statement> {
        let classification = self.registry.classification_for(table)?;
        let identity = resolve_identity(classification, before_keys)?;
        if identity.is_empty() {
            return Err(empty_mutation(table, ChangeKind::Delete));
        }
        let predicates = identity_predicates(identity, before);

        let sql = self.dialect.delete_sql(schema, table, &predicates);
        debug!("Built DELETE for {}.{} where {:?}", schema, table, predicates);

        Ok(Statement {
            kind: ChangeKind::Delete,
            schema: schema.to_string(),
            table: table.to_string(),
            sql,
            bindings: predicate_bindings(&predicates).collect(),
        })
    }
}

/// `= NULL` never matches, so a null identity value becomes `IS NULL`.
fn identity_predicates(identity: Vec<String>, before: Option<&RowImage>) -> Vec<Predicate> {
    identity
        .into_iter()
        .map(|column| {
            let is_null = before
                .and_then(|image| image.get(&column))
                .is_some_and(Value::is_null);
            if is_null {
                Predicate::IsNull(column)
            } else {
                Predicate::Eq(column)
            }
        })
        .collect()
}

fn predicate_bindings(predicates: &[Predicate]) -> impl Iterator<Item = Binding> + '_ {
    predicates
        .iter()
        .filter(|predicate| predicate.is_bound())
        .map(|predicate| Binding::Before(predicate.column().to_string()))
}

fn owned<S: AsRef<str>>(keys: &[S]) -> Vec<String> {
    keys.iter().map(|k| k.as_ref().to_string()).collect()
}

fn empty_mutation(table: &str, kind: ChangeKind) -> ReplayError {
    ReplayError::EmptyMutation {
        table: table.to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};
    use replay_core::CastValue;
    use serde_json::{json, Value};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_yaml(
            "users:\n  row_identifier: [id]\n  datetime_milli_fields: [updated_at]\nnotes: {}\n",
        )
        .unwrap()
    }

    fn image(value: Value) -> replay_core::RowImage {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_update_binds_after_then_identity() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");

        let stmt = synth
            .build_update("public", "users", &["id", "name"], &["name", "age"])
            .unwrap();
        assert_eq!(stmt.bound_columns(), vec!["name", "age", "id"]);
        assert_eq!(stmt.placeholder_count(), 3);
        assert_eq!(
            stmt.sql,
            r#"UPDATE "public"."users" SET "name" = $1, "age" = $2 WHERE "id" = ($3)"#
        );
    }

    #[test]
    fn test_delete_without_identity_fails() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");
        let empty: [&str; 0] = [];

        let err = synth.build_delete("public", "notes", &empty).unwrap_err();
        assert!(matches!(err, ReplayError::NoIdentityAvailable { .. }));
    }

    #[test]
    fn test_delete_uses_declared_identifier() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");

        let stmt = synth
            .build_delete("public", "users", &["id", "email"])
            .unwrap();
        assert_eq!(stmt.sql, r#"DELETE FROM "public"."users" WHERE "id" = ($1)"#);
        assert_eq!(stmt.bindings, vec![Binding::Before("id".to_string())]);
    }

    #[test]
    fn test_empty_insert_and_update_rejected() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");
        let empty: [&str; 0] = [];

        assert!(matches!(
            synth.build_insert("public", "users", &empty),
            Err(ReplayError::EmptyMutation {
                kind: ChangeKind::Insert,
                ..
            })
        ));
        assert!(matches!(
            synth.build_update("public", "users", &["id"], &empty),
            Err(ReplayError::EmptyMutation {
                kind: ChangeKind::Update,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_table() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");
        assert!(matches!(
            synth.build_insert("public", "ghosts", &["id"]),
            Err(ReplayError::UnknownTable { .. })
        ));
    }

    #[test]
    fn test_synthesize_update_record() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &MySqlDialect, "shop");
        let record = ChangeRecord::update(
            "users",
            image(json!({"id": 1, "name": "old"})),
            image(json!({"name": "new", "updated_at": 86_400_000})),
        );

        let bound = synth.synthesize(&record).unwrap();
        assert!(bound.sql().starts_with("UPDATE `shop`.`users` SET"));
        assert_eq!(bound.sql().matches('?').count(), 3);
        assert_eq!(bound.params[0], CastValue::Text("new".to_string()));
        assert_eq!(
            bound.params[1].as_datetime().unwrap().to_string(),
            "1970-01-02 00:00:00"
        );
        assert_eq!(bound.params[2], CastValue::Int(1));
    }

    #[test]
    fn test_synthesize_infers_insert() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");
        let record = ChangeRecord {
            table: "notes".to_string(),
            op: None,
            before: Default::default(),
            after: image(json!({"body": "hi"})),
        };

        let bound = synth.synthesize(&record).unwrap();
        assert_eq!(bound.statement.kind, ChangeKind::Insert);
        assert_eq!(
            bound.sql(),
            r#"INSERT INTO "public"."notes" ("body") VALUES ($1)"#
        );
        assert_eq!(bound.params, vec![CastValue::Text("hi".to_string())]);
    }

    #[test]
    fn test_synthesize_declared_identifier_missing_from_before() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");
        let record = ChangeRecord::delete("users", image(json!({"email": "x@y"})));

        assert!(matches!(
            synth.synthesize(&record),
            Err(ReplayError::MissingColumnValue { image: "before", .. })
        ));
    }

    #[test]
    fn test_fallback_identity_matches_null_with_is_null() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");
        let record = ChangeRecord::delete("notes", image(json!({"id": 7, "note": null})));

        let bound = synth.synthesize(&record).unwrap();
        assert_eq!(
            bound.sql(),
            r#"DELETE FROM "public"."notes" WHERE "id" = ($1) AND "note" IS NULL"#
        );
        assert_eq!(bound.statement.bound_columns(), vec!["id"]);
        assert_eq!(bound.params, vec![CastValue::Int(7)]);
    }

    #[test]
    fn test_update_null_identity_keeps_set_numbering() {
        let registry = registry();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");
        let record = ChangeRecord::update(
            "notes",
            image(json!({"owner": null, "id": 3})),
            image(json!({"body": "hi"})),
        );

        let bound = synth.synthesize(&record).unwrap();
        assert_eq!(
            bound.sql(),
            r#"UPDATE "public"."notes" SET "body" = $1 WHERE "owner" IS NULL AND "id" = ($2)"#
        );
        assert_eq!(
            bound.params,
            vec![CastValue::Text("hi".to_string()), CastValue::Int(3)]
        );
    }

    #[test]
    fn test_blank_row_identifier_falls_back_to_before_keys() {
        let registry = SchemaRegistry::from_yaml("events:\n  row_identifier: \"\"\n").unwrap();
        let synth = DmlSynthesizer::new(&registry, &PostgresDialect, "public");

        let stmt = synth.build_delete("public", "events", &["id"]).unwrap();
        assert_eq!(stmt.sql, r#"DELETE FROM "public"."events" WHERE "id" = ($1)"#);
        assert_eq!(stmt.bound_columns(), vec!["id"]);
    }
}
