//! Framed JSON request dispatch.
//!
//! One JSON object per line on the input stream, one JSON value per line
//! on the output stream. Malformed requests and unknown ops answer
//! `null`; nothing here terminates the loop short of end-of-input.
//! Diagnostics go to the error stream only — the output stream carries
//! nothing but responses.

use std::io::{BufRead, Write};

use rand::RngCore;
use serde::Deserialize;
use serde_json::Value as Json;

use ravel_core::Value;
use ravel_engine::{check, generate_examples, run_routine, validate_input, Registry, Routine};

/// One protocol request.
#[derive(Debug, Deserialize)]
pub struct Request {
    pub op: String,
    pub routine: String,
    #[serde(default = "default_input")]
    pub input: Json,
    #[serde(default)]
    pub params: serde_json::Map<String, Json>,
}

fn default_input() -> Json {
    Json::Array(Vec::new())
}

impl Request {
    fn count(&self) -> usize {
        self.params
            .get("count")
            .and_then(Json::as_u64)
            .unwrap_or(1) as usize
    }
}

/// Resolve one request against the registry. Every failure degrades to
/// `false` (for `validate`) or `null` rather than an error response.
pub fn handle_request(registry: &Registry, request: &Request, rng: &mut dyn RngCore) -> Json {
    match request.op.as_str() {
        "validate" => {
            let valid = parse_routine(registry, &request.routine)
                .zip(Value::from_json(&request.input).ok())
                .map(|(routine, input)| {
                    validate_input(registry, &routine, &input).unwrap_or(false)
                })
                .unwrap_or(false);
            Json::Bool(valid)
        }
        "evaluate" => match Value::from_json(&request.input) {
            Ok(input) => run_routine(registry, &request.routine, &input)
                .map(|value| value.to_json())
                .unwrap_or(Json::Null),
            Err(_) => Json::Null,
        },
        "examples" => {
            let examples = parse_routine(registry, &request.routine).and_then(|routine| {
                let types = check(registry, &routine).ok()?;
                let first = routine.nodes.first()?;
                let sub = registry.get(&first.name)?;
                Some(
                    sub.examples
                        .iter()
                        .filter(|example| types[0].inhabits(example))
                        .map(Value::to_json)
                        .collect::<Vec<_>>(),
                )
            });
            match examples {
                Some(values) => Json::Array(values),
                None => Json::Null,
            }
        }
        "generate" => {
            let pairs = parse_routine(registry, &request.routine).and_then(|routine| {
                generate_examples(registry, &routine, request.count(), rng).ok()
            });
            match pairs {
                Some(pairs) => Json::Array(
                    pairs
                        .iter()
                        .map(|(input, output)| {
                            Json::Array(vec![input.to_json(), output.to_json()])
                        })
                        .collect(),
                ),
                None => Json::Null,
            }
        }
        _ => Json::Null,
    }
}

fn parse_routine(registry: &Registry, text: &str) -> Option<Routine> {
    Routine::parse(text, registry).ok()
}

/// The request/response loop: read a line, answer a line, until
/// end-of-input.
pub fn serve(
    registry: &Registry,
    rng: &mut dyn RngCore,
    reader: impl BufRead,
    mut writer: impl Write,
) -> std::io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(registry, &request, rng),
            Err(_) => Json::Null,
        };
        writeln!(writer, "{}", response)?;
        writer.flush()?;
    }
    Ok(())
}
