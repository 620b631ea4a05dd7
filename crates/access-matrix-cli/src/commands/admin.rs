//! Administrator commands

use crate::error::{CliError, CliResult};
use crate::output::{self, print_error, print_info, print_success, print_warning, OutputFormat};
use access_matrix::{
    parse_objects, parse_subjects, AdminConsole, CommandOutcome, JsonFileStorage, MatrixCommand,
    MatrixError, MatrixStorage, Object, SubjectName,
};
use clap::Subcommand;
use std::path::PathBuf;

/// Admin subcommands
#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create subjects with an initial set of objects (grants if they exist)
    Create {
        /// Subject names, separated by spaces or commas
        subjects: String,

        /// Object letters, e.g. "ABc"
        #[arg(short, long, default_value = "")]
        objects: String,
    },

    /// Grant objects to existing subjects
    Grant {
        /// Subject names, separated by spaces or commas
        subjects: String,
        /// Object letters, e.g. "ABc"
        objects: String,
    },

    /// Withdraw objects from existing subjects
    Remove {
        /// Subject names, separated by spaces or commas
        subjects: String,
        /// Object letters, e.g. "ABc"
        objects: String,
    },

    /// Grant every known object to subjects
    GrantAll {
        /// Subject names, separated by spaces or commas
        subjects: String,
    },

    /// Withdraw every object from subjects
    RemoveAll {
        /// Subject names, separated by spaces or commas
        subjects: String,
    },

    /// Add a subject with no rights
    AddSubject {
        /// Subject name
        name: String,
    },

    /// Delete a subject and its rights
    DeleteSubject {
        /// Subject name
        name: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Rename a subject, keeping its rights
    RenameSubject {
        /// Current name
        from: String,
        /// New name
        to: String,
    },

    /// Add an object
    AddObject {
        /// Object letter
        object: String,
    },

    /// Delete an object and every right to it
    DeleteObject {
        /// Object letter
        object: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Rename an object everywhere
    RenameObject {
        /// Current letter
        from: String,
        /// New letter
        to: String,
    },

    /// Show the matrix
    Show,

    /// Write the matrix to another file
    Export {
        /// Destination path
        path: PathBuf,
    },

    /// Replace the matrix with the contents of another file
    Import {
        /// Source path
        path: PathBuf,
    },
}

impl AdminCommands {
    /// Whether the command builds on the matrix currently in the file.
    fn needs_loaded_matrix(&self) -> bool {
        !matches!(
            self,
            AdminCommands::Show | AdminCommands::Export { .. } | AdminCommands::Import { .. }
        )
    }
}

fn subjects_from(text: &str) -> CliResult<Vec<String>> {
    let subjects = parse_subjects(text);
    if subjects.is_empty() {
        return Err(CliError::InvalidInput("no subjects given".into()));
    }
    Ok(subjects)
}

fn object_from(text: &str) -> CliResult<Object> {
    Ok(text.trim().parse::<Object>()?)
}

/// Ask before a destructive change. Fails when no answer can be read, e.g.
/// without a terminal.
fn confirm(prompt: String, yes: bool) -> CliResult<bool> {
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| {
            CliError::InvalidInput(format!(
                "cannot ask for confirmation ({}); pass -y to proceed",
                e
            ))
        })
}

/// Translate a subcommand into matrix commands.
///
/// Every input is validated here, so a batch either applies in full or not
/// at all.
fn plan(command: &AdminCommands) -> CliResult<Vec<MatrixCommand>> {
    let planned = match command {
        AdminCommands::Create { subjects, objects } => {
            let subjects = subjects_from(subjects)?;
            for name in &subjects {
                SubjectName::new(name.as_str())?;
            }
            let objects = parse_objects(objects)?;
            subjects
                .into_iter()
                .map(|subject| MatrixCommand::Create {
                    subject,
                    objects: objects.clone(),
                })
                .collect()
        }
        AdminCommands::Grant { subjects, objects } => vec![MatrixCommand::Grant {
            subjects: subjects_from(subjects)?,
            objects: parse_objects(objects)?,
        }],
        AdminCommands::Remove { subjects, objects } => vec![MatrixCommand::Remove {
            subjects: subjects_from(subjects)?,
            objects: parse_objects(objects)?,
        }],
        AdminCommands::GrantAll { subjects } => vec![MatrixCommand::GrantAll {
            subjects: subjects_from(subjects)?,
        }],
        AdminCommands::RemoveAll { subjects } => vec![MatrixCommand::RemoveAll {
            subjects: subjects_from(subjects)?,
        }],
        AdminCommands::AddSubject { name } => vec![MatrixCommand::AddSubject {
            subject: name.trim().to_string(),
        }],
        AdminCommands::DeleteSubject { name, .. } => vec![MatrixCommand::DeleteSubject {
            subject: name.trim().to_string(),
        }],
        AdminCommands::RenameSubject { from, to } => vec![MatrixCommand::RenameSubject {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        }],
        AdminCommands::AddObject { object } => vec![MatrixCommand::AddObject {
            object: object_from(object)?,
        }],
        AdminCommands::DeleteObject { object, .. } => vec![MatrixCommand::DeleteObject {
            object: object_from(object)?,
        }],
        AdminCommands::RenameObject { from, to } => vec![MatrixCommand::RenameObject {
            from: object_from(from)?,
            to: object_from(to)?,
        }],
        AdminCommands::Show | AdminCommands::Export { .. } | AdminCommands::Import { .. } => {
            Vec::new()
        }
    };
    Ok(planned)
}

/// Execute an admin command
pub fn execute(
    command: AdminCommands,
    console: &mut AdminConsole<JsonFileStorage>,
    format: OutputFormat,
) -> CliResult<()> {
    match &command {
        AdminCommands::DeleteSubject { name, yes } => {
            if !confirm(format!("Delete subject '{}'?", name.trim()), *yes)? {
                print_error("Aborted");
                return Ok(());
            }
        }
        AdminCommands::DeleteObject { object, yes } => {
            if !confirm(
                format!("Delete object '{}' and all rights to it?", object.trim()),
                *yes,
            )? {
                print_error("Aborted");
                return Ok(());
            }
        }
        AdminCommands::Show => {
            output::print_matrix(console.matrix(), format)?;
            return Ok(());
        }
        AdminCommands::Export { path } => {
            console.export_to(path)?;
            print_success(&format!("Exported matrix to {}", path.display()));
            return Ok(());
        }
        AdminCommands::Import { path } => {
            console.import_from(path)?;
            console.save()?;
            print_success(&format!(
                "Imported matrix from {} ({} subjects, {} objects)",
                path.display(),
                console.matrix().subject_count(),
                console.matrix().object_count()
            ));
            return Ok(());
        }
        _ => {}
    }

    for cmd in plan(&command)? {
        let label = cmd.to_string();
        match console.execute(cmd)? {
            CommandOutcome::Created => print_success(&format!("{} (created)", label)),
            CommandOutcome::Existing => print_success(&format!("{} (existing)", label)),
            CommandOutcome::Unchanged => print_info(&format!("{}: nothing to change", label)),
            CommandOutcome::Applied => print_success(&label),
        }
    }

    if console.is_dirty() {
        console.save()?;
        print_info(&format!("Saved to {}", console.storage().describe()));
    }
    Ok(())
}

/// Refuse to build on (and then overwrite) a matrix file that could not be
/// read. Import replaces the matrix outright and may proceed.
pub fn guard_load_error(
    command: &AdminCommands,
    load_error: Option<MatrixError>,
) -> CliResult<()> {
    match load_error {
        Some(e) if command.needs_loaded_matrix() => Err(e.into()),
        Some(e) => {
            print_warning(&format!("Could not load matrix: {}", e));
            Ok(())
        }
        None => Ok(()),
    }
}
