//! Driving user record types through the engine: a native struct with
//! a hand-written serializer impl (the same shape codegen emits) moves
//! through schema-directed reads and writes without the driver knowing
//! anything beyond the two trait operations.

use scribe::{json, NdArray, Record, Schema, ScribeError, ScribeResult, Tome, TomeSerializer};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
struct SolverConfig {
    max_iterations: u32,
    tolerance: f64,
    preconditioner: Option<String>,
    deflation_modes: NdArray<f64>,
}

impl TomeSerializer for SolverConfig {
    fn to_tome(&self) -> Tome {
        let mut record = Record::new();
        record.insert("max_iterations", self.max_iterations.to_tome());
        record.insert("tolerance", self.tolerance.to_tome());
        if let Some(value) = &self.preconditioner {
            record.insert("preconditioner", value.to_tome());
        }
        record.insert("deflation_modes", self.deflation_modes.to_tome());
        Tome::Record(record)
    }

    fn from_tome(tome: &Tome) -> ScribeResult<Self> {
        let record = tome.as_record()?;
        let required = |key: &str| {
            record
                .get(key)
                .ok_or_else(|| ScribeError::type_error(format!("missing field '{}'", key)))
        };
        Ok(Self {
            max_iterations: TomeSerializer::from_tome(required("max_iterations")?)?,
            tolerance: TomeSerializer::from_tome(required("tolerance")?)?,
            preconditioner: match record.get("preconditioner") {
                Some(value) => Some(TomeSerializer::from_tome(value)?),
                None => None,
            },
            deflation_modes: TomeSerializer::from_tome(required("deflation_modes")?)?,
        })
    }
}

fn solver_schema() -> Schema {
    Schema::from_value(&json!({
        "schema_name": "solver_config",
        "type": "record",
        "items": [
            {"key": "max_iterations", "type": "uint32"},
            {"key": "tolerance", "type": "float64"},
            {"key": "preconditioner", "optional": true, "type": "string"},
            {"key": "deflation_modes", "type": "array", "shape": [-1],
             "elements": {"type": "float64"}}
        ]
    }))
    .unwrap()
}

#[test]
fn document_to_native_struct() {
    let doc = json!({
        "max_iterations": 5000,
        "tolerance": 1e-10,
        "preconditioner": "multigrid",
        "deflation_modes": [0.5, 0.25, 0.125]
    });

    let mut tome = Tome::default();
    json::read(Some(&mut tome), &doc, &solver_schema()).unwrap();

    let config = SolverConfig::from_tome(&tome).unwrap();
    assert_eq!(config.max_iterations, 5000);
    assert_eq!(config.preconditioner.as_deref(), Some("multigrid"));
    assert_eq!(config.deflation_modes.flat(), &[0.5, 0.25, 0.125]);
}

#[test]
fn optional_field_absent() {
    let doc = json!({
        "max_iterations": 100,
        "tolerance": 1e-6,
        "deflation_modes": []
    });

    let mut tome = Tome::default();
    json::read(Some(&mut tome), &doc, &solver_schema()).unwrap();

    let config = SolverConfig::from_tome(&tome).unwrap();
    assert_eq!(config.preconditioner, None);
    assert!(config.deflation_modes.is_empty());
}

#[test]
fn native_struct_to_validated_document() {
    let config = SolverConfig {
        max_iterations: 64,
        tolerance: 1e-8,
        preconditioner: None,
        deflation_modes: NdArray::from_vec(vec![1.0, 0.5]),
    };

    let emitted = json::write(&config.to_tome(), &solver_schema()).unwrap();
    assert_eq!(
        emitted,
        json!({
            "max_iterations": 64,
            "tolerance": 1e-8,
            "deflation_modes": [1.0, 0.5]
        })
    );

    // and it reads back to the same struct
    let mut tome = Tome::default();
    json::read(Some(&mut tome), &emitted, &solver_schema()).unwrap();
    assert_eq!(SolverConfig::from_tome(&tome).unwrap(), config);
}

#[test]
fn kind_mismatch_is_type_error() {
    let err = SolverConfig::from_tome(&Tome::Bool(true)).unwrap_err();
    assert!(matches!(err, ScribeError::Type(_)));
}
