use crate::error::{EntityKind, ValidationError};
use crate::schema::{LaunchKind, LaunchPoint, LaunchPointVar, ScriptConfig, ScriptVar};

/// Binding types that require a `bindingValue`.
const VALUE_BINDINGS: &[&str] = &["LITERAL", "MAXVAR", "SYSPROP"];

/// Depth-first, all-or-nothing validation of a decoded configuration.
///
/// The first violated rule aborts the walk with the entity kind, entity name
/// and attribute; nothing downstream runs until the whole configuration is
/// known-good. Discriminator values are compared case-insensitively.
pub fn validate_config(config: &ScriptConfig) -> Result<(), ValidationError> {
    require(
        !config.name.is_empty(),
        EntityKind::Script,
        &config.name,
        "name",
    )?;
    if let Some(vars) = &config.script_vars {
        for var in vars {
            validate_script_var(var)?;
        }
    }
    if let Some(points) = &config.launch_points {
        for point in points {
            validate_launch_point(point)?;
        }
    }
    Ok(())
}

fn validate_script_var(var: &ScriptVar) -> Result<(), ValidationError> {
    let entity = EntityKind::ScriptVar;
    require(!var.name.is_empty(), entity, &var.name, "name")?;
    require(!var.var_type.is_empty(), entity, &var.name, "type")?;
    require(!var.binding_type.is_empty(), entity, &var.name, "bindingType")?;

    if var.binding_type.eq_ignore_ascii_case("LITERAL") {
        require(
            present(&var.literal_data_type),
            entity,
            &var.name,
            "literalDataType",
        )?;
    }
    let needs_value = VALUE_BINDINGS
        .iter()
        .any(|binding| var.binding_type.eq_ignore_ascii_case(binding));
    if needs_value {
        require(
            present(&var.binding_value),
            entity,
            &var.name,
            "bindingValue",
        )?;
    }
    Ok(())
}

fn validate_launch_point(point: &LaunchPoint) -> Result<(), ValidationError> {
    let entity = EntityKind::LaunchPoint;
    require(!point.name.is_empty(), entity, &point.name, "name")?;
    require(!point.launch_type.is_empty(), entity, &point.name, "type")?;

    let Some(kind) = point.kind() else {
        return Err(rule(
            entity,
            &point.name,
            format!(
                "launch point type {:?} is not one of OBJECT, ATTRIBUTE or ACTION",
                point.launch_type
            ),
        ));
    };

    if matches!(kind, LaunchKind::Object | LaunchKind::Attribute) {
        require(present(&point.object_name), entity, &point.name, "objectName")?;
    }
    if kind == LaunchKind::Attribute {
        require(
            present(&point.attribute_name),
            entity,
            &point.name,
            "attributeName",
        )?;
    }
    if kind == LaunchKind::Action {
        require(present(&point.action_name), entity, &point.name, "actionName")?;
    }

    if kind == LaunchKind::Object {
        let triggered = point.initialize_value
            || point.validate_application
            || point.allow_object_creation
            || point.allow_object_deletion
            || point.save;
        if !triggered {
            return Err(rule(
                entity,
                &point.name,
                "an object launch point must set one of initializeValue, \
                 validateApplication, allowObjectCreation, allowObjectDeletion or save"
                    .to_string(),
            ));
        }
        if point.save {
            if !point.add && !point.update && !point.delete {
                return Err(rule(
                    entity,
                    &point.name,
                    "a save launch point must set one of add, update or delete".to_string(),
                ));
            }
            if !point.before_save && !point.after_save && !point.after_commit {
                return Err(rule(
                    entity,
                    &point.name,
                    "a save launch point must set one of beforeSave, afterSave or afterCommit"
                        .to_string(),
                ));
            }
        }
    }

    if kind == LaunchKind::Attribute {
        let triggered = point.initialize_access_restriction
            || point.initialize_value
            || point.validate
            || point.retrieve_list
            || point.run_action;
        if !triggered {
            return Err(rule(
                entity,
                &point.name,
                "an attribute launch point must set one of initializeAccessRestriction, \
                 initializeValue, validate, retrieveList or runAction"
                    .to_string(),
            ));
        }
    }

    if let Some(vars) = &point.launch_point_vars {
        for var in vars {
            validate_launch_point_var(var)?;
        }
    }
    Ok(())
}

fn validate_launch_point_var(var: &LaunchPointVar) -> Result<(), ValidationError> {
    let entity = EntityKind::LaunchPointVar;
    require(!var.name.is_empty(), entity, &var.name, "name")?;
    require(
        present(&var.binding_value),
        entity,
        &var.name,
        "bindingValue",
    )?;
    Ok(())
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn require(
    satisfied: bool,
    entity: EntityKind,
    name: &str,
    field: &'static str,
) -> Result<(), ValidationError> {
    if satisfied {
        Ok(())
    } else {
        Err(ValidationError::MissingField {
            entity,
            name: name.to_string(),
            field,
        })
    }
}

fn rule(entity: EntityKind, name: &str, rule: String) -> ValidationError {
    ValidationError::Rule {
        entity,
        name: name.to_string(),
        rule,
    }
}
