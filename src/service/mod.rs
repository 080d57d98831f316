// src/service/mod.rs

//! JSON-lines session boundary.
//!
//! Each input line is one command, e.g.
//! `{"event": "optimize", "params": {"latitude": 40.0}}`. Each command gets
//! exactly one reply line, either `{"type": "results", "data": <report>}` or
//! `{"type": "error", "message": "..."}`.

use crate::pipeline::{Pipeline, PipelineParams, PipelineReport};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

/// An input line, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Command {
    /// Run the pipeline once.
    Optimize {
        /// Run parameters; absent fields take their defaults.
        #[serde(default)]
        params: Option<PipelineParams>,
    },
}

/// An output line, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// The report of one pipeline run, successful or not.
    Results { data: PipelineReport },
    /// The input line could not be decoded as a command.
    Error { message: String },
}

/// Decodes one command line and runs it against `pipeline`.
pub fn handle_line(pipeline: &mut Pipeline, line: &str) -> Reply {
    match serde_json::from_str::<Command>(line) {
        Ok(Command::Optimize { params }) => {
            debug!(?params, "optimize request");
            let data = pipeline.run(params);
            Reply::Results { data }
        }
        Err(e) => {
            warn!("Rejected session message: {}", e);
            Reply::Error {
                message: format!("invalid message: {}", e),
            }
        }
    }
}

/// Serves commands from `input` until EOF, writing one reply per non-blank
/// line. Returns the number of commands answered.
pub fn run_session<R, W>(pipeline: &mut Pipeline, input: R, mut output: W) -> std::io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    info!("Session opened");
    let mut answered = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = handle_line(pipeline, &line);
        serde_json::to_writer(&mut output, &reply)?;
        output.write_all(b"\n")?;
        output.flush()?;
        answered += 1;
    }
    info!(answered, "Session closed");
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{FieldAcquisition, StaticFieldSource};
    use crate::measurement::MeasurementSystem;
    use crate::selection::{FieldOptimizer, FixedCountsSampler};
    use serde_json::Value;

    fn offline_pipeline() -> Pipeline {
        Pipeline::new(
            FieldAcquisition::new(Box::new(StaticFieldSource::empty()), "BOU"),
            FieldOptimizer::new(4, 100, Box::new(FixedCountsSampler::from_pairs([("0110", 7)]))),
            MeasurementSystem::with_seed(0.001, 0.01, 9).unwrap(),
        )
    }

    #[test]
    fn test_command_without_params() {
        let command: Command = serde_json::from_str(r#"{"event": "optimize"}"#).unwrap();
        assert_eq!(command, Command::Optimize { params: None });
    }

    #[test]
    fn test_partial_params_take_defaults() {
        let command: Command =
            serde_json::from_str(r#"{"event": "optimize", "params": {"latitude": 40.0}}"#).unwrap();
        let Command::Optimize { params: Some(params) } = command else {
            panic!("params should be present");
        };
        assert_eq!(params.latitude, 40.0);
        assert_eq!(params.altitude, 400.0);
    }

    #[test]
    fn test_unknown_event_is_an_error_reply() {
        let mut pipeline = offline_pipeline();
        let reply = handle_line(&mut pipeline, r#"{"event": "shutdown"}"#);
        assert!(matches!(reply, Reply::Error { .. }));
        assert!(matches!(handle_line(&mut pipeline, "not json"), Reply::Error { .. }));
    }

    #[test]
    fn test_session_replies_once_per_command() {
        let mut pipeline = offline_pipeline();
        let input = "{\"event\": \"optimize\"}\n\n{\"event\": \"bogus\"}\n";
        let mut output = Vec::new();
        let answered = run_session(&mut pipeline, input.as_bytes(), &mut output).unwrap();
        assert_eq!(answered, 2);

        let text = String::from_utf8(output).unwrap();
        let replies: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["type"], "results");
        assert_eq!(replies[0]["data"]["status"], "success");
        assert_eq!(replies[0]["data"]["optimized_configuration"]["optimal_state"], "0110");
        assert_eq!(replies[1]["type"], "error");
    }
}
