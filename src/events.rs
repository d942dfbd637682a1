//! Event code tables for launch points and access flags for script variables.
//!
//! The flag vocabulary script authors write is intentionally redundant, so
//! every table here is evaluated in a fixed row order and the first matching
//! row wins. Keeping the rows as data keeps the priority order and the gaps
//! auditable per row.

use crate::schema::{LaunchKind, LaunchPoint, ScriptVar};

type Crud = (bool, bool, bool);

/// (add, update, delete) -> event code for save before the record is written.
const BEFORE_SAVE: &[(Crud, i64)] = &[
    ((true, false, false), 2),
    ((true, true, false), 6),
    ((true, true, true), 14),
    ((false, true, true), 12),
    ((false, false, true), 8),
    ((false, true, false), 4),
    ((true, false, true), 10),
];

/// Same triples, disjoint code range, for save after the record is written.
const AFTER_SAVE: &[(Crud, i64)] = &[
    ((true, false, false), 16),
    ((true, true, false), 48),
    ((true, true, true), 112),
    ((false, true, true), 96),
    ((false, false, true), 64),
    ((false, true, false), 32),
    ((true, false, true), 80),
];

/// Same triples for save after the transaction commits.
const AFTER_COMMIT: &[(Crud, i64)] = &[
    ((true, false, false), 128),
    ((true, true, false), 384),
    ((true, true, true), 896),
    ((false, true, true), 768),
    ((false, false, true), 512),
    ((false, true, false), 256),
    ((true, false, true), 640),
];

/// Object launch point rows checked ahead of the save dispatch.
const OBJECT_ROWS: &[(fn(&LaunchPoint) -> bool, i64)] = &[
    (|point| point.initialize_value, 1),
    (|point| point.validate_application, 1024),
    (|point| point.allow_object_creation, 2048),
    (|point| point.allow_object_deletion, 4096),
];

/// Attribute launch point rows. Note that validate maps to the legitimate
/// code 0, not to "no match".
const ATTRIBUTE_ROWS: &[(fn(&LaunchPoint) -> bool, i64)] = &[
    (|point| point.initialize_access_restriction, 8),
    (|point| point.initialize_value, 2),
    (|point| point.validate, 0),
    (|point| point.retrieve_list, 64),
    (|point| point.run_action, 1),
];

/// Event code for the launch point, or `None` when the type records no code:
/// ACTION launch points never carry one, and a save triple no table row
/// covers encodes nothing.
pub fn event_code(point: &LaunchPoint) -> Option<i64> {
    match point.kind()? {
        LaunchKind::Object => object_event(point),
        LaunchKind::Attribute => first_match(ATTRIBUTE_ROWS, point),
        LaunchKind::Action => None,
    }
}

fn object_event(point: &LaunchPoint) -> Option<i64> {
    if let Some(code) = first_match(OBJECT_ROWS, point) {
        return Some(code);
    }
    if point.save {
        save_event(point)
    } else {
        None
    }
}

fn save_event(point: &LaunchPoint) -> Option<i64> {
    let stages: [(bool, &[(Crud, i64)]); 3] = [
        (point.before_save, BEFORE_SAVE),
        (point.after_save, AFTER_SAVE),
        (point.after_commit, AFTER_COMMIT),
    ];
    let crud = (point.add, point.update, point.delete);
    for (selected, table) in stages {
        if !selected {
            continue;
        }
        // The first selected stage decides; later stages never apply.
        let code = table
            .iter()
            .find(|(bits, _)| *bits == crud)
            .map(|(_, code)| *code);
        if code.is_none() {
            tracing::warn!(
                launch_point = %point.name,
                "save launch point selects no add/update/delete event"
            );
        }
        return code;
    }
    None
}

fn first_match(rows: &[(fn(&LaunchPoint) -> bool, i64)], point: &LaunchPoint) -> Option<i64> {
    rows.iter()
        .find(|(matches, _)| matches(point))
        .map(|(_, code)| *code)
}

/// Access flag encoding the three independent suppression flags on a script
/// variable.
pub fn access_flag(var: &ScriptVar) -> i64 {
    match (var.no_validation, var.no_access_check, var.no_action) {
        (false, false, false) => 0,
        (true, false, false) => 1,
        (false, true, false) => 2,
        (true, true, false) => 3,
        (false, false, true) => 8,
        (true, false, true) => 9,
        (false, true, true) => 10,
        (true, true, true) => 11,
    }
}
