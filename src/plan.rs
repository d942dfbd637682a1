//! Ordered operation plans for registering and removing scripts.
//!
//! A replace plan is cleanup-then-recreate so re-applying it is idempotent;
//! the removal plan is the same cleanup plus the loosely-coupled reference
//! tables this tool never writes. Dependent rows are always deleted before
//! the parent script row, and inserts create the parent before any child
//! that references it by name.

use crate::error::Error;
use crate::events::{access_flag, event_code};
use crate::schema::{LaunchKind, LaunchPoint, ScriptConfig, ScriptVar};
use crate::sql::{quote, Operation, RelationalExecutor, SqlValue};

/// Fixed identity recorded as owner, creator and changer on script records.
pub const SYSTEM_USER: &str = "MAXADMIN";

/// Dispatcher class bound into action records for ACTION launch points.
pub const SCRIPT_ACTION_CLASS: &str = "com.ibm.tivoli.maximo.script.ScriptAction";

/// Script name prefixes reserved for integration scripts. A match marks the
/// script record as an interface script.
const INTERFACE_PREFIXES: &[&str] = &[
    "OSOUT.", "OSIN.", "OSQUERY.", "OSACTION.", "PUBLISH.", "SYNC.", "INVOKE.",
];

/// Placeholder held by the bulk insert until the two-phase text write runs.
const SOURCE_PLACEHOLDER: &str = "1=1";

/// Full replace sequence for a validated configuration: cleanup of any prior
/// registration under the same name, then recreation from `config`.
pub fn replace_plan(config: &ScriptConfig, source: &str, language: Option<&str>) -> Vec<Operation> {
    let script = config.name.to_uppercase();
    let mut ops = cleanup_ops(&script);

    let interface = INTERFACE_PREFIXES
        .iter()
        .any(|prefix| script.starts_with(prefix))
        || config.allow_invoking_functions;

    let mut columns = vec![("autoscript", SqlValue::Text(script.clone()))];
    push_text(&mut columns, "description", config.description.as_deref());
    columns.push(("version", SqlValue::Text(config.version.clone())));
    columns.push(("loglevel", SqlValue::Text(config.log_level.clone())));
    columns.push(("status", SqlValue::Text("Active".to_string())));
    columns.push(("active", SqlValue::Bool(config.active)));
    columns.push(("source", SqlValue::Text(SOURCE_PLACEHOLDER.to_string())));
    columns.push(("createddate", SqlValue::Now));
    columns.push(("statusdate", SqlValue::Now));
    columns.push(("changedate", SqlValue::Now));
    columns.push(("owner", SqlValue::Text(SYSTEM_USER.to_string())));
    columns.push(("createdby", SqlValue::Text(SYSTEM_USER.to_string())));
    columns.push(("changeby", SqlValue::Text(SYSTEM_USER.to_string())));
    push_text(&mut columns, "scriptlanguage", language);
    columns.push(("userdefined", SqlValue::Bool(true)));
    columns.push(("hasld", SqlValue::Bool(false)));
    columns.push(("langcode", SqlValue::Text("EN".to_string())));
    columns.push(("interface", SqlValue::Bool(interface)));
    ops.push(Operation::Insert {
        table: "autoscript",
        columns,
    });

    ops.push(Operation::Insert {
        table: "autoscriptstate",
        columns: vec![
            ("autoscript", SqlValue::Text(script.clone())),
            ("changeby", SqlValue::Text(SYSTEM_USER.to_string())),
            ("changedate", SqlValue::Now),
            ("status", SqlValue::Text("Active".to_string())),
        ],
    });

    // The store's bulk insert path rejects large text inline.
    ops.push(Operation::StoreText {
        table: "autoscript",
        column: "source",
        key_column: "autoscript",
        key: script.clone(),
        value: source.to_string(),
    });

    if let Some(vars) = &config.script_vars {
        for var in vars {
            ops.push(script_var_insert(&script, var));
        }
    }
    if let Some(points) = &config.launch_points {
        for point in points {
            launch_point_ops(&mut ops, &script, point);
        }
    }

    tracing::debug!(script = %script, operations = ops.len(), "built replace plan");
    ops
}

/// Delete-only sequence for a script name. Covers the add path's cleanup set
/// plus the reference tables that may point at scripts but are never created
/// here.
pub fn removal_plan(script_name: &str) -> Vec<Operation> {
    let script = script_name.to_uppercase();
    let mut ops = cleanup_ops(&script);

    let script_where = format!("upper(autoscript) = {}", quote(&script));
    let name_where = format!("upper(scriptname) = {}", quote(&script));
    ops.push(Operation::Delete {
        table: "inspformscript",
        predicate: script_where,
    });
    ops.push(Operation::Delete {
        table: "oslcquery",
        predicate: name_where.clone(),
    });
    ops.push(Operation::Delete {
        table: "ososlcaction",
        predicate: name_where.clone(),
    });
    ops.push(Operation::Delete {
        table: "jsonmapping",
        predicate: name_where,
    });

    tracing::debug!(script = %script, operations = ops.len(), "built removal plan");
    ops
}

/// Dispatches a plan in order. The first data error aborts the remaining
/// operations; already-applied statements stay applied.
pub fn apply(ops: &[Operation], executor: &mut dyn RelationalExecutor) -> Result<(), Error> {
    for op in ops {
        tracing::debug!(sql = %op.to_sql(), "executing");
        executor.execute(op)?;
    }
    Ok(())
}

/// Deletes every record kind a prior registration of `script` could have
/// created. The action delete runs first because its predicate still reads
/// the launch point rows; the parent script row goes last.
fn cleanup_ops(script: &str) -> Vec<Operation> {
    let script_where = format!("upper(autoscript) = {}", quote(script));
    let action_where = format!(
        "upper(action) in (select launchpointname from scriptlaunchpoint \
         where autoscript = {}) and value = {}",
        quote(script),
        quote(SCRIPT_ACTION_CLASS)
    );
    vec![
        Operation::Delete {
            table: "action",
            predicate: action_where,
        },
        Operation::Delete {
            table: "launchpointvars",
            predicate: script_where.clone(),
        },
        Operation::Delete {
            table: "scriptlaunchpoint",
            predicate: script_where.clone(),
        },
        Operation::Delete {
            table: "autoscriptvars",
            predicate: script_where.clone(),
        },
        Operation::Delete {
            table: "autoscriptstate",
            predicate: script_where.clone(),
        },
        Operation::Delete {
            table: "autoscript",
            predicate: script_where,
        },
    ]
}

fn script_var_insert(script: &str, var: &ScriptVar) -> Operation {
    let mut columns = vec![
        ("autoscript", SqlValue::Text(script.to_string())),
        ("varname", SqlValue::Text(var.name.clone())),
    ];
    push_text(&mut columns, "varbindingvalue", var.binding_value.as_deref());
    columns.push(("varbindingtype", SqlValue::Text(var.binding_type.clone())));
    columns.push(("vartype", SqlValue::Text(var.var_type.clone())));
    push_text(&mut columns, "description", var.description.as_deref());
    columns.push(("allowoverride", SqlValue::Bool(var.allow_override)));
    push_text(
        &mut columns,
        "literaldatatype",
        var.literal_data_type.as_deref(),
    );
    columns.push(("accessflag", SqlValue::Int(access_flag(var))));
    Operation::Insert {
        table: "autoscriptvars",
        columns,
    }
}

fn launch_point_ops(ops: &mut Vec<Operation>, script: &str, point: &LaunchPoint) {
    let mut columns = vec![
        ("launchpointname", SqlValue::Text(point.name.clone())),
        ("autoscript", SqlValue::Text(script.to_string())),
    ];
    push_text(&mut columns, "description", point.description.as_deref());
    columns.push(("launchpointtype", SqlValue::Text(point.launch_type.clone())));
    push_text(&mut columns, "objectname", point.object_name.as_deref());
    push_text(&mut columns, "attributename", point.attribute_name.as_deref());
    push_text(&mut columns, "condition", point.condition.as_deref());
    columns.push(("active", SqlValue::Bool(point.active)));
    if let Some(code) = event_code(point) {
        columns.push(("objectevent", SqlValue::Int(code)));
    }
    ops.push(Operation::Insert {
        table: "scriptlaunchpoint",
        columns,
    });

    if point.kind() == Some(LaunchKind::Action) {
        let action_name = point.action_name.as_deref().unwrap_or_default();
        let mut columns = vec![("action", SqlValue::Text(point.name.clone()))];
        push_text(&mut columns, "objectname", point.object_name.as_deref());
        columns.push(("type", SqlValue::Text("CUSTOM".to_string())));
        columns.push(("value", SqlValue::Text(SCRIPT_ACTION_CLASS.to_string())));
        columns.push((
            "parameter",
            SqlValue::Text(format!("{script},{},{action_name}", point.name)),
        ));
        columns.push(("langcode", SqlValue::Text("EN".to_string())));
        columns.push(("usewith", SqlValue::Text("ALL".to_string())));
        columns.push(("hasld", SqlValue::Bool(false)));
        ops.push(Operation::Insert {
            table: "action",
            columns,
        });
    }

    if let Some(vars) = &point.launch_point_vars {
        for var in vars {
            let mut columns = vec![
                ("launchpointname", SqlValue::Text(point.name.clone())),
                ("autoscript", SqlValue::Text(script.to_string())),
                ("varname", SqlValue::Text(var.name.clone())),
            ];
            push_text(&mut columns, "varbindingvalue", var.binding_value.as_deref());
            ops.push(Operation::Insert {
                table: "launchpointvars",
                columns,
            });
        }
    }
}

/// Adds a text column only when the value is present; absent attributes fall
/// back to the store's column default.
fn push_text(
    columns: &mut Vec<(&'static str, SqlValue)>,
    name: &'static str,
    value: Option<&str>,
) {
    if let Some(value) = value {
        columns.push((name, SqlValue::Text(value.to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::schema::decode_config;
    use std::collections::BTreeSet;

    fn config(json: &str) -> ScriptConfig {
        decode_config(json).expect("fixture decodes")
    }

    fn full_config() -> ScriptConfig {
        config(
            r#"{
                "name": "dispatch.notify",
                "description": "Dispatch notifications",
                "scriptVars": [
                    { "name": "threshold", "type": "IN", "bindingType": "LITERAL",
                      "bindingValue": "5", "literalDataType": "INTEGER",
                      "noValidation": true }
                ],
                "launchPoints": [
                    { "name": "ONSAVE", "type": "OBJECT", "objectName": "WORKORDER",
                      "save": true, "add": true, "update": true, "beforeSave": true,
                      "launchPointVars": [
                        { "name": "threshold", "bindingValue": "10" }
                      ] },
                    { "name": "NOTIFYACT", "type": "ACTION", "actionName": "NOTIFY" }
                ]
            }"#,
        )
    }

    fn delete_tables(ops: &[Operation]) -> Vec<&'static str> {
        ops.iter()
            .filter_map(|op| match op {
                Operation::Delete { table, .. } => Some(*table),
                _ => None,
            })
            .collect()
    }

    fn insert_for<'a>(ops: &'a [Operation], wanted: &str) -> &'a [(&'static str, SqlValue)] {
        ops.iter()
            .find_map(|op| match op {
                Operation::Insert { table, columns } if *table == wanted => {
                    Some(columns.as_slice())
                }
                _ => None,
            })
            .unwrap_or_else(|| panic!("no insert into {wanted}"))
    }

    fn column<'a>(columns: &'a [(&'static str, SqlValue)], name: &str) -> &'a SqlValue {
        columns
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
            .unwrap_or_else(|| panic!("no column {name}"))
    }

    #[test]
    fn cleanup_deletes_dependents_before_the_parent() {
        let ops = replace_plan(&full_config(), "src", None);
        assert_eq!(
            delete_tables(&ops),
            vec![
                "action",
                "launchpointvars",
                "scriptlaunchpoint",
                "autoscriptvars",
                "autoscriptstate",
                "autoscript",
            ]
        );
    }

    #[test]
    fn replace_plan_is_idempotent_by_construction() {
        // Every table the plan inserts into is also covered by its own
        // cleanup deletes, so re-applying the plan cannot leave stale rows.
        let ops = replace_plan(&full_config(), "src", None);
        let deleted: BTreeSet<_> = delete_tables(&ops).into_iter().collect();
        for op in &ops {
            if let Operation::Insert { table, .. } = op {
                assert!(deleted.contains(table), "insert into {table} not cleaned up");
            }
        }
    }

    #[test]
    fn script_name_is_uppercased_throughout() {
        let ops = replace_plan(&full_config(), "src", None);
        let columns = insert_for(&ops, "autoscript");
        assert_eq!(
            column(columns, "autoscript"),
            &SqlValue::Text("DISPATCH.NOTIFY".to_string())
        );
        match &ops[5] {
            Operation::Delete { predicate, .. } => {
                assert_eq!(predicate, "upper(autoscript) = 'DISPATCH.NOTIFY'");
            }
            other => panic!("unexpected op: {other:?}"),
        }
    }

    #[test]
    fn parent_insert_precedes_child_inserts() {
        let ops = replace_plan(&full_config(), "src", None);
        let position = |wanted: &str| {
            ops.iter()
                .position(|op| matches!(op, Operation::Insert { table, .. } if *table == wanted))
                .unwrap_or_else(|| panic!("no insert into {wanted}"))
        };
        let parent = position("autoscript");
        assert!(parent < position("autoscriptstate"));
        assert!(parent < position("autoscriptvars"));
        assert!(position("scriptlaunchpoint") < position("launchpointvars"));
    }

    #[test]
    fn source_body_is_written_in_a_second_phase() {
        let ops = replace_plan(&full_config(), "var x = 1;", None);
        let store = ops
            .iter()
            .position(|op| matches!(op, Operation::StoreText { .. }))
            .expect("store text present");
        let insert = ops
            .iter()
            .position(|op| matches!(op, Operation::Insert { table, .. } if *table == "autoscript"))
            .expect("autoscript insert present");
        assert!(insert < store);
        match &ops[store] {
            Operation::StoreText { key, value, .. } => {
                assert_eq!(key, "DISPATCH.NOTIFY");
                assert_eq!(value, "var x = 1;");
            }
            other => panic!("unexpected op: {other:?}"),
        }
        let columns = insert_for(&ops, "autoscript");
        assert_eq!(
            column(columns, "source"),
            &SqlValue::Text(SOURCE_PLACEHOLDER.to_string())
        );
    }

    #[test]
    fn script_var_carries_the_access_flag() {
        let ops = replace_plan(&full_config(), "src", None);
        let columns = insert_for(&ops, "autoscriptvars");
        assert_eq!(column(columns, "accessflag"), &SqlValue::Int(1));
    }

    #[test]
    fn object_launch_point_carries_the_event_code() {
        let ops = replace_plan(&full_config(), "src", None);
        let columns = insert_for(&ops, "scriptlaunchpoint");
        assert_eq!(column(columns, "objectevent"), &SqlValue::Int(6));
    }

    #[test]
    fn action_launch_point_emits_an_action_record() {
        let ops = replace_plan(&full_config(), "src", None);
        let columns = insert_for(&ops, "action");
        assert_eq!(column(columns, "type"), &SqlValue::Text("CUSTOM".to_string()));
        assert_eq!(
            column(columns, "value"),
            &SqlValue::Text(SCRIPT_ACTION_CLASS.to_string())
        );
        assert_eq!(
            column(columns, "parameter"),
            &SqlValue::Text("DISPATCH.NOTIFY,NOTIFYACT,NOTIFY".to_string())
        );
    }

    #[test]
    fn action_launch_point_has_no_event_column() {
        let ops = replace_plan(&full_config(), "src", None);
        let columns = ops
            .iter()
            .filter_map(|op| match op {
                Operation::Insert { table, columns } if *table == "scriptlaunchpoint" => {
                    Some(columns)
                }
                _ => None,
            })
            .nth(1)
            .expect("second launch point insert");
        assert!(!columns.iter().any(|(name, _)| *name == "objectevent"));
    }

    #[test]
    fn language_is_passed_through_verbatim() {
        let ops = replace_plan(&full_config(), "src", Some("nashorn"));
        let columns = insert_for(&ops, "autoscript");
        assert_eq!(
            column(columns, "scriptlanguage"),
            &SqlValue::Text("nashorn".to_string())
        );
    }

    #[test]
    fn absent_language_omits_the_column() {
        let ops = replace_plan(&full_config(), "src", None);
        let columns = insert_for(&ops, "autoscript");
        assert!(!columns.iter().any(|(name, _)| *name == "scriptlanguage"));
    }

    #[test]
    fn reserved_prefix_marks_interface_scripts() {
        let cfg = config(r#"{ "name": "osin.receive" }"#);
        let ops = replace_plan(&cfg, "src", None);
        let columns = insert_for(&ops, "autoscript");
        assert_eq!(column(columns, "interface"), &SqlValue::Bool(true));
    }

    #[test]
    fn allow_invoking_functions_marks_interface_scripts() {
        let cfg = config(r#"{ "name": "plain", "allowInvokingFunctions": true }"#);
        let ops = replace_plan(&cfg, "src", None);
        let columns = insert_for(&ops, "autoscript");
        assert_eq!(column(columns, "interface"), &SqlValue::Bool(true));
    }

    #[test]
    fn ordinary_names_are_not_interface_scripts() {
        let cfg = config(r#"{ "name": "plain" }"#);
        let ops = replace_plan(&cfg, "src", None);
        let columns = insert_for(&ops, "autoscript");
        assert_eq!(column(columns, "interface"), &SqlValue::Bool(false));
    }

    #[test]
    fn absent_launch_point_vars_emit_nothing() {
        let cfg = config(
            r#"{ "name": "x", "launchPoints": [
                { "name": "lp", "type": "OBJECT", "objectName": "ASSET",
                  "initializeValue": true } ] }"#,
        );
        let ops = replace_plan(&cfg, "src", None);
        assert!(!ops
            .iter()
            .any(|op| matches!(op, Operation::Insert { table, .. } if *table == "launchpointvars")));
    }

    #[test]
    fn removal_plan_is_a_superset_of_the_cleanup_set() {
        let cleanup = cleanup_ops("DISPATCH.NOTIFY");
        let removal = removal_plan("dispatch.notify");
        for op in &cleanup {
            assert!(removal.contains(op), "removal plan missing {op}");
        }
        assert!(removal.len() > cleanup.len());
    }

    #[test]
    fn removal_plan_covers_the_reference_tables() {
        let removal = removal_plan("demo");
        let tables = delete_tables(&removal);
        for table in ["inspformscript", "oslcquery", "ososlcaction", "jsonmapping"] {
            assert!(tables.contains(&table), "missing {table}");
        }
        let by_name: Vec<_> = removal
            .iter()
            .filter_map(|op| match op {
                Operation::Delete { table, predicate } if *table == "oslcquery" => {
                    Some(predicate.as_str())
                }
                _ => None,
            })
            .collect();
        assert_eq!(by_name, vec!["upper(scriptname) = 'DEMO'"]);
    }

    struct FailingExecutor {
        applied: usize,
        fail_at: usize,
    }

    impl RelationalExecutor for FailingExecutor {
        fn execute(&mut self, _op: &Operation) -> Result<(), DataError> {
            if self.applied == self.fail_at {
                return Err(DataError("constraint violated".to_string()));
            }
            self.applied += 1;
            Ok(())
        }
    }

    #[test]
    fn apply_stops_at_the_first_data_error() {
        let ops = removal_plan("demo");
        let mut executor = FailingExecutor {
            applied: 0,
            fail_at: 3,
        };
        let err = apply(&ops, &mut executor).expect_err("must fail");
        assert!(matches!(err, Error::Data(_)));
        assert_eq!(executor.applied, 3);
    }
}
