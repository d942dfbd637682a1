//! Change statements and the command registry the host installer drives.
//!
//! The host framework hands each statement a bag of descriptor attributes
//! and an executor, then calls validate and run. Command lookup is an
//! explicit registry value the caller builds and passes in, never
//! process-wide shared state.

use crate::error::Error;
use crate::extract::extract_config;
use crate::plan::{apply, removal_plan, replace_plan};
use crate::schema::decode_config;
use crate::sql::RelationalExecutor;
use crate::validate::validate_config;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Attributes supplied by the host descriptor for one statement.
pub type Attributes = BTreeMap<String, String>;

/// Shared construction context for statements.
#[derive(Debug, Clone)]
pub struct StatementContext {
    /// Fallback root for script paths that do not resolve as given.
    pub base_dir: PathBuf,
}

/// One named command in the host's change pipeline.
pub trait ChangeStatement: std::fmt::Debug {
    /// Command name the statement is registered under.
    fn name(&self) -> &'static str;

    /// Checks required attributes and resolves external inputs. Nothing is
    /// written until the whole configuration is known-good.
    fn validate(&mut self) -> Result<(), Error>;

    /// Validates, then applies the full operation sequence for this script.
    fn run(&mut self, executor: &mut dyn RelationalExecutor) -> Result<(), Error>;
}

/// Registers (or replaces) the script named by the embedded configuration of
/// the file at the `path` attribute.
#[derive(Debug)]
pub struct AddUpdateScriptStatement {
    attributes: Attributes,
    base_dir: PathBuf,
    script_file: Option<PathBuf>,
}

impl AddUpdateScriptStatement {
    pub fn new(attributes: Attributes, context: &StatementContext) -> Self {
        Self {
            attributes,
            base_dir: context.base_dir.clone(),
            script_file: None,
        }
    }
}

impl ChangeStatement for AddUpdateScriptStatement {
    fn name(&self) -> &'static str {
        "add_update_script"
    }

    fn validate(&mut self) -> Result<(), Error> {
        let path = required_attribute(&self.attributes, "path")?;
        self.script_file = Some(resolve_script_path(path, &self.base_dir)?);
        Ok(())
    }

    fn run(&mut self, executor: &mut dyn RelationalExecutor) -> Result<(), Error> {
        self.validate()?;
        let Some(path) = self.script_file.clone() else {
            return Err(Error::MissingInput("path"));
        };
        let source = fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let object = extract_config(&source)?;
        let config = decode_config(object)?;
        validate_config(&config)?;
        tracing::info!(script = %config.name, "parsed embedded script configuration");

        let language = self.attributes.get("language").map(String::as_str);
        let ops = replace_plan(&config, &source, language);
        apply(&ops, executor)
    }
}

/// Removes every registration record for the script named by the `script`
/// attribute; no source text is required.
#[derive(Debug)]
pub struct RemoveScriptStatement {
    attributes: Attributes,
}

impl RemoveScriptStatement {
    pub fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }
}

impl ChangeStatement for RemoveScriptStatement {
    fn name(&self) -> &'static str {
        "remove_script"
    }

    fn validate(&mut self) -> Result<(), Error> {
        required_attribute(&self.attributes, "script")?;
        Ok(())
    }

    fn run(&mut self, executor: &mut dyn RelationalExecutor) -> Result<(), Error> {
        self.validate()?;
        let script = required_attribute(&self.attributes, "script")?;
        tracing::info!(script, "removing script registration");
        let ops = removal_plan(script);
        apply(&ops, executor)
    }
}

/// Resolves a script path as given, falling back to the base directory.
pub fn resolve_script_path(path: &str, base_dir: &Path) -> Result<PathBuf, Error> {
    let direct = PathBuf::from(path);
    if direct.exists() {
        return Ok(direct);
    }
    let fallback = base_dir.join(path);
    if fallback.exists() {
        return Ok(fallback);
    }
    Err(Error::FileNotFound(direct))
}

fn required_attribute<'a>(attributes: &'a Attributes, name: &'static str) -> Result<&'a str, Error> {
    match attributes.get(name).map(String::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::MissingInput(name)),
    }
}

/// Factory invoked when the host encounters a command by name.
pub type StatementFactory = fn(Attributes, &StatementContext) -> Box<dyn ChangeStatement>;

/// Named-command lookup, seeded with the built-in script statements and open
/// to host extensions.
pub struct StatementRegistry {
    commands: BTreeMap<&'static str, StatementFactory>,
}

impl StatementRegistry {
    pub fn with_builtin_statements() -> Self {
        let mut registry = Self {
            commands: BTreeMap::new(),
        };
        registry.register("add_update_script", |attributes, context| {
            Box::new(AddUpdateScriptStatement::new(attributes, context))
        });
        registry.register("remove_script", |attributes, _context| {
            Box::new(RemoveScriptStatement::new(attributes))
        });
        registry
    }

    pub fn register(&mut self, command: &'static str, factory: StatementFactory) {
        self.commands.insert(command, factory);
    }

    pub fn create(
        &self,
        command: &str,
        attributes: Attributes,
        context: &StatementContext,
    ) -> Result<Box<dyn ChangeStatement>, Error> {
        let factory = self
            .commands
            .get(command)
            .ok_or_else(|| Error::UnknownStatement(command.to_string()))?;
        Ok(factory(attributes, context))
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }
}
