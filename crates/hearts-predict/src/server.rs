use std::io::{self, BufRead, Write};

use tracing::{Level, event};

use crate::handler::PredictionHandler;
use crate::protocol::{ErrorResponse, PredictRequest};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    pub requests: usize,
    pub answered: usize,
    pub degraded: usize,
    pub rejected: usize,
}

/// Reads one JSON request per line and writes one JSON reply per line until
/// `reader` is exhausted. Blank lines are skipped. Only I/O failures end the loop.
pub fn serve<R: BufRead, W: Write>(
    handler: &PredictionHandler,
    reader: R,
    mut writer: W,
) -> io::Result<ServeSummary> {
    let mut summary = ServeSummary::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        summary.requests += 1;

        let reply = match serde_json::from_str::<PredictRequest>(&line) {
            Ok(request) => match handler.handle(&request) {
                Ok(response) => {
                    summary.answered += 1;
                    if response.degraded {
                        summary.degraded += 1;
                    }
                    serde_json::to_string(&response)
                }
                Err(err) => {
                    summary.rejected += 1;
                    log_rejection(summary.requests, err.kind(), &err.to_string());
                    serde_json::to_string(&err.to_response())
                }
            },
            Err(err) => {
                summary.rejected += 1;
                let message = format!("malformed request: {err}");
                log_rejection(summary.requests, "invalid_request", &message);
                serde_json::to_string(&ErrorResponse::new("invalid_request", message))
            }
        }
        .map_err(io::Error::other)?;

        writer.write_all(reply.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    event!(
        target: "hearts_predict::server",
        Level::INFO,
        model = %handler.model_name(),
        requests = summary.requests,
        answered = summary.answered,
        degraded = summary.degraded,
        rejected = summary.rejected,
        "prediction stream closed"
    );
    Ok(summary)
}

fn log_rejection(line: usize, kind: &str, message: &str) {
    event!(
        target: "hearts_predict::server",
        Level::WARN,
        line,
        kind,
        message,
        "request rejected"
    );
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use super::serve;
    use crate::handler::PredictionHandler;
    use crate::handler::fixtures::{FixedModel, follow_request};
    use crate::protocol::{ErrorResponse, PredictResponse};
    use hearts_core::model::card::Card;
    use hearts_core::model::rank::Rank;
    use hearts_core::model::suit::Suit;

    #[test]
    fn answers_each_line_in_order() {
        let handler =
            PredictionHandler::new(Arc::new(FixedModel::new(Card::new(Rank::King, Suit::Clubs))));
        let request = serde_json::to_string(&follow_request()).unwrap();
        let mut bad = follow_request();
        bad.version = 9;
        let bad = serde_json::to_string(&bad).unwrap();
        let input = format!("{request}\n\nnot json\n{bad}\n");

        let mut output = Vec::new();
        let summary = serve(&handler, Cursor::new(input), &mut output).unwrap();
        assert_eq!(summary.requests, 3);
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.degraded, 0);

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: PredictResponse = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.card, Card::new(Rank::King, Suit::Clubs));
        for line in &lines[1..] {
            let error: ErrorResponse = serde_json::from_str(line).unwrap();
            assert_eq!(error.error.kind, "invalid_request");
        }
    }
}
