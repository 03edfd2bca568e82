use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use hearts_bot::strategy::StrategyKind;
use hearts_core::model::card::Card;
use serde::Deserialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::protocol::PredictRequest;

const EXIT_POLL: Duration = Duration::from_millis(5);

/// Anything that can answer a validated request with a card.
///
/// Shared across request threads, so implementations must tolerate concurrent
/// calls. `timeout` is the caller's deadline; a model that holds resources
/// must release them once it passes. The handler checks the answer against
/// the request's valid moves.
pub trait CardModel: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, request: &PredictRequest, timeout: Duration) -> Result<Card, ModelError>;
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no command configured")]
    NoCommand,
    #[error("failed to spawn process: {0}")]
    Spawn(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("non-zero exit status: {0}")]
    Status(String),
    #[error("no answer within {0:?}")]
    Timeout(Duration),
    #[error("model worker stopped without answering")]
    Disconnected,
}

/// Runs an external program once per request: one JSON request line on stdin,
/// `{"card": ...}` on stdout.
///
/// The child is killed and reaped when it misses the deadline or the exchange
/// fails, so no request leaves a process behind.
#[derive(Debug, Clone)]
pub struct ProcessModel {
    name: String,
    command: String,
    args: Vec<String>,
}

#[derive(Deserialize)]
struct ProcessReply {
    card: Card,
}

impl ProcessModel {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        let command = command.into();
        Self {
            name: format!("process:{command}"),
            command,
            args,
        }
    }

    fn exchange(
        &self,
        child: &mut Child,
        request: &PredictRequest,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<(ExitStatus, Vec<u8>), ModelError> {
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| ModelError::Io("stdin".into()))?;
            let mut line =
                serde_json::to_vec(request).map_err(|err| ModelError::Protocol(err.to_string()))?;
            line.push(b'\n');
            stdin
                .write_all(&line)
                .map_err(|err| ModelError::Io(err.to_string()))?;
        }

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ModelError::Io("stdout".into()))?;
        let (tx, rx) = mpsc::channel();
        // Ends at EOF, which a kill guarantees.
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
        });

        let output = match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(Ok(buf)) => buf,
            Ok(Err(err)) => return Err(ModelError::Io(err.to_string())),
            Err(RecvTimeoutError::Timeout) => return Err(ModelError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => return Err(ModelError::Disconnected),
        };

        loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|err| ModelError::Io(err.to_string()))?
            {
                return Ok((status, output));
            }
            if Instant::now() >= deadline {
                return Err(ModelError::Timeout(timeout));
            }
            thread::sleep(EXIT_POLL);
        }
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl CardModel for ProcessModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, request: &PredictRequest, timeout: Duration) -> Result<Card, ModelError> {
        if self.command.trim().is_empty() {
            return Err(ModelError::NoCommand);
        }

        let mut cmd = Command::new(&self.command);
        if !self.args.is_empty() {
            cmd.args(&self.args);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let start = Instant::now();
        let deadline = start + timeout;
        let mut child = cmd
            .spawn()
            .map_err(|err| ModelError::Spawn(err.to_string()))?;

        let (status, output) = match self.exchange(&mut child, request, deadline, timeout) {
            Ok(exchanged) => exchanged,
            Err(err) => {
                reap(&mut child);
                event!(
                    target: "hearts_predict::model",
                    Level::DEBUG,
                    model = %self.name,
                    game_id = request.state.game_id,
                    error = %err,
                    "model process killed"
                );
                return Err(err);
            }
        };

        if !status.success() {
            return Err(ModelError::Status(format!("exit status {status}")));
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        event!(
            target: "hearts_predict::model",
            Level::DEBUG,
            model = %self.name,
            game_id = request.state.game_id,
            elapsed_ms,
        );

        let reply: ProcessReply =
            serde_json::from_slice(&output).map_err(|err| ModelError::Protocol(err.to_string()))?;
        Ok(reply.card)
    }
}

/// Answers with one of the built-in strategies.
///
/// A fresh strategy is built per request, so concurrent calls share nothing.
#[derive(Debug, Clone)]
pub struct StrategyModel {
    kind: StrategyKind,
    seed: u64,
    name: String,
}

impl StrategyModel {
    pub fn new(kind: StrategyKind, seed: u64) -> Self {
        Self {
            kind,
            seed,
            name: format!("strategy:{kind}"),
        }
    }
}

impl CardModel for StrategyModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, request: &PredictRequest, _timeout: Duration) -> Result<Card, ModelError> {
        let mut strategy = self.kind.spawn(self.seed ^ request.state.game_id);
        Ok(strategy.choose(&request.view(), &request.valid_moves))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CardModel, ModelError, ProcessModel, StrategyModel};
    use crate::protocol::{PredictRequest, PredictState};
    use hearts_bot::strategy::StrategyKind;
    use hearts_core::model::card::Card;
    use hearts_core::model::player::Seat;
    use hearts_core::model::trick::Trick;

    const PATIENT: Duration = Duration::from_secs(5);

    fn opening_request() -> PredictRequest {
        PredictRequest {
            version: 1,
            state: PredictState {
                game_id: 4,
                trick_number: 1,
                previous_tricks: Vec::new(),
                current_trick: Trick::new(Seat::LOOP[0]),
                current_player_index: Seat::LOOP[0],
                player_hand: vec![Card::TWO_OF_CLUBS],
                played_card: None,
            },
            valid_moves: vec![Card::TWO_OF_CLUBS],
        }
    }

    #[test]
    fn strategy_model_picks_from_valid_moves() {
        let request = opening_request();
        for kind in StrategyKind::ALL {
            let model = StrategyModel::new(kind, 9);
            assert_eq!(model.predict(&request, PATIENT).unwrap(), Card::TWO_OF_CLUBS);
            assert!(model.name().starts_with("strategy:"));
        }
    }

    #[test]
    fn missing_program_reports_spawn_failure() {
        let model = ProcessModel::new("__hearts_predict_missing__", Vec::new());
        let err = model.predict(&opening_request(), PATIENT).unwrap_err();
        assert!(matches!(err, ModelError::Spawn(_)));
    }

    #[test]
    fn empty_command_is_rejected() {
        let model = ProcessModel::new("  ", Vec::new());
        assert!(matches!(
            model.predict(&opening_request(), PATIENT),
            Err(ModelError::NoCommand)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn process_reply_is_parsed() {
        let model = ProcessModel::new(
            "sh",
            vec![
                "-c".into(),
                r#"read line; echo '{"card":{"suit":"C","rank":2}}'"#.into(),
            ],
        );
        assert_eq!(
            model.predict(&opening_request(), PATIENT).unwrap(),
            Card::TWO_OF_CLUBS
        );
    }

    #[cfg(unix)]
    fn is_running(pid: &str) -> bool {
        std::process::Command::new("kill")
            .args(["-0", pid])
            .stderr(std::process::Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    #[cfg(unix)]
    #[test]
    fn hung_process_is_killed_at_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("model.pid");
        let script = format!("echo $$ > {}; read line; exec sleep 30", pid_file.display());
        let model = ProcessModel::new("sh", vec!["-c".into(), script]);

        let started = std::time::Instant::now();
        let err = model
            .predict(&opening_request(), Duration::from_millis(400))
            .unwrap_err();
        assert!(matches!(err, ModelError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert!(!is_running(pid.trim()), "model process {} still alive", pid.trim());
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_is_an_error_not_a_hang() {
        let model = ProcessModel::new("sh", vec!["-c".into(), "exit 0".into()]);
        let started = std::time::Instant::now();
        assert!(model.predict(&opening_request(), PATIENT).is_err());
        assert!(started.elapsed() < PATIENT);
    }

    #[cfg(unix)]
    #[test]
    fn failing_exit_status_is_reported() {
        let model = ProcessModel::new("sh", vec!["-c".into(), "read line; exit 3".into()]);
        let err = model.predict(&opening_request(), PATIENT).unwrap_err();
        assert!(matches!(err, ModelError::Status(_)));
    }
}
