//! CLI command implementations.
//!
//! Each command loads its inputs, runs one engine entry point, and
//! reports the outcome. Exit codes: 0 success, 1 validation failure,
//! 2 and above for everything else (mapped in main from the error
//! kind).

use std::path::Path;

use crate::codegen;
use crate::error::{ScribeError, ScribeResult};
use crate::io::{read_file, validate_file, write_file};
use crate::logging::Logger;
use crate::schema::{guess_schema, Schema};

use super::args::Command;

/// Dispatch a parsed command.
pub fn run_command(command: Command) -> ScribeResult<()> {
    match command {
        Command::Validate {
            schema,
            data,
            verbose,
        } => run_validate(&schema, &data, verbose),
        Command::Convert {
            input,
            output,
            schema,
        } => run_convert(&input, &output, schema.as_deref()),
        Command::Codegen { schema } => run_codegen(&schema),
        Command::GuessSchema { data, schema_out } => run_guess(&data, schema_out.as_deref()),
    }
}

/// Verbose-gated progress reporting. Events reach the structured
/// logger only when the user asked for them; the emitted sequence is
/// kept so tests can inspect it without capturing stdout.
struct Progress {
    verbose: bool,
    events: Vec<String>,
}

impl Progress {
    fn new(verbose: bool) -> Self {
        Self {
            verbose,
            events: Vec::new(),
        }
    }

    fn event(&mut self, event: &str, fields: &[(&str, &str)]) {
        if !self.verbose {
            return;
        }
        Logger::info(event, fields);
        self.events.push(event.to_string());
    }
}

fn run_validate(schema_path: &Path, data_path: &Path, verbose: bool) -> ScribeResult<()> {
    let mut progress = Progress::new(verbose);
    run_validate_with(schema_path, data_path, &mut progress)
}

fn run_validate_with(
    schema_path: &Path,
    data_path: &Path,
    progress: &mut Progress,
) -> ScribeResult<()> {
    let schema = Schema::from_file(schema_path)?;
    progress.event(
        "SCHEMA_LOADED",
        &[
            ("file", &schema_path.display().to_string()),
            ("type", schema.type_name()),
        ],
    );

    progress.event("FILE_OPENED", &[("file", &data_path.display().to_string())]);
    match validate_file(data_path, &schema) {
        Ok(()) => {
            progress.event("VALIDATE_OK", &[("file", &data_path.display().to_string())]);
            println!("validation OK");
            Ok(())
        }
        Err(e @ ScribeError::Validation(_)) => {
            progress.event("VALIDATE_FAILED", &[("error", &e.to_string())]);
            // the CLI adds the brief prefix; the path label is already
            // part of the message
            println!("validation FAILED: {}", e);
            Err(e)
        }
        Err(other) => Err(other),
    }
}

fn run_convert(input: &Path, output: &Path, schema_path: Option<&Path>) -> ScribeResult<()> {
    let schema = match schema_path {
        Some(path) => Schema::from_file(path)?,
        None => Schema::any(),
    };
    let tome = read_file(input, &schema)?;
    write_file(output, &tome, &schema)
}

fn run_codegen(schema_path: &Path) -> ScribeResult<()> {
    let schema = Schema::from_file(schema_path)?;
    let source = codegen::generate_rust(&schema)?;
    println!("{}", source);
    Ok(())
}

fn run_guess(data_path: &Path, schema_out: Option<&Path>) -> ScribeResult<()> {
    let tome = read_file(data_path, &Schema::any())?;
    let guessed = guess_schema(&tome);
    let text = guessed.to_json_string();
    match schema_out {
        Some(path) => std::fs::write(path, text + "\n")
            .map_err(|e| ScribeError::write(format!("cannot write '{}': {}", path.display(), e))),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_schema(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("schema.json");
        let schema = json!({
            "type": "record",
            "items": [
                {"key": "name", "type": "string"},
                {"key": "xs", "type": "array", "shape": [-1],
                 "elements": {"type": "int32"}}
            ]
        });
        std::fs::write(&path, serde_json::to_string_pretty(&schema).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_validate_command_ok() {
        let dir = TempDir::new().unwrap();
        let schema = write_schema(&dir);
        let data = dir.path().join("data.json");
        std::fs::write(&data, r#"{"name": "x", "xs": [1, 2]}"#).unwrap();

        run_command(Command::Validate {
            schema,
            data,
            verbose: false,
        })
        .unwrap();
    }

    #[test]
    fn test_validate_command_fails_with_validation_kind() {
        let dir = TempDir::new().unwrap();
        let schema = write_schema(&dir);
        let data = dir.path().join("data.json");
        std::fs::write(&data, r#"{"name": 5, "xs": []}"#).unwrap();

        let err = run_command(Command::Validate {
            schema,
            data,
            verbose: false,
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_verbose_validate_reports_three_events() {
        let dir = TempDir::new().unwrap();
        let schema = write_schema(&dir);
        let data = dir.path().join("data.json");
        std::fs::write(&data, r#"{"name": "x", "xs": [1, 2]}"#).unwrap();

        let mut progress = Progress::new(true);
        run_validate_with(&schema, &data, &mut progress).unwrap();
        assert_eq!(
            progress.events,
            vec!["SCHEMA_LOADED", "FILE_OPENED", "VALIDATE_OK"]
        );
    }

    #[test]
    fn test_events_silent_without_verbose() {
        let dir = TempDir::new().unwrap();
        let schema = write_schema(&dir);
        let data = dir.path().join("data.json");
        std::fs::write(&data, r#"{"name": "x", "xs": [1, 2]}"#).unwrap();

        let mut progress = Progress::new(false);
        run_validate_with(&schema, &data, &mut progress).unwrap();
        assert!(progress.events.is_empty());
    }

    #[test]
    fn test_verbose_validate_reports_failure_outcome() {
        let dir = TempDir::new().unwrap();
        let schema = write_schema(&dir);
        let data = dir.path().join("data.json");
        std::fs::write(&data, r#"{"name": 5, "xs": []}"#).unwrap();

        let mut progress = Progress::new(true);
        let err = run_validate_with(&schema, &data, &mut progress).unwrap_err();
        assert!(matches!(err, ScribeError::Validation(_)));
        assert_eq!(
            progress.events,
            vec!["SCHEMA_LOADED", "FILE_OPENED", "VALIDATE_FAILED"]
        );
    }

    #[test]
    fn test_convert_json_to_container() {
        let dir = TempDir::new().unwrap();
        let schema_path = write_schema(&dir);
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.h5");
        std::fs::write(&input, r#"{"name": "x", "xs": [1, 2, 3]}"#).unwrap();

        run_command(Command::Convert {
            input,
            output: output.clone(),
            schema: Some(schema_path),
        })
        .unwrap();

        let schema = Schema::from_file(dir.path().join("schema.json")).unwrap();
        let tome = read_file(&output, &schema).unwrap();
        assert_eq!(tome["name"], crate::tome::Tome::string("x"));
    }

    #[test]
    fn test_convert_unknown_suffix_exits_above_one() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.json");
        std::fs::write(&input, "{}").unwrap();
        let err = run_command(Command::Convert {
            input,
            output: dir.path().join("out.xml"),
            schema: None,
        })
        .unwrap_err();
        assert!(err.exit_code() >= 2);
    }

    #[test]
    fn test_guess_schema_roundtrip() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data.json");
        std::fs::write(&data, r#"{"n": 3, "s": "hi"}"#).unwrap();
        let out = dir.path().join("guessed.json");

        run_command(Command::GuessSchema {
            data: data.clone(),
            schema_out: Some(out.clone()),
        })
        .unwrap();

        // the guessed schema accepts the data it was guessed from
        let guessed = Schema::from_file(&out).unwrap();
        let text = std::fs::read_to_string(&data).unwrap();
        json::validate_str(&text, &guessed).unwrap();
    }
}
