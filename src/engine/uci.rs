use super::*;
use std::process::Stdio;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

/// Drives an external engine over the UCI text protocol
pub struct UciEngine {
    name: String,
    path: String,
    timeout: Duration,
    session: Mutex<UciSession>,
}

struct UciSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl UciEngine {
    /// Start the engine binary and complete the UCI handshake
    pub async fn spawn(path: &str, timeout: Duration) -> EngineResult<Self> {
        let (session, name) = UciSession::start(path, timeout).await?;
        tracing::info!("UCI engine ready: {}", name);

        Ok(Self {
            name,
            path: path.to_string(),
            timeout,
            session: Mutex::new(session),
        })
    }
}

impl UciSession {
    async fn start(path: &str, timeout: Duration) -> EngineResult<(Self, String)> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {}", path, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("engine stdin was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("engine stdout was not captured".to_string()))?;

        let mut session = UciSession {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let name = tokio::time::timeout(timeout, session.handshake())
            .await
            .map_err(|_| EngineError::Timeout(timeout))??;
        Ok((session, name))
    }

    async fn send(&mut self, command: &str) -> EngineResult<()> {
        tracing::trace!("uci > {}", command);
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self) -> EngineResult<String> {
        match self.stdout.next_line().await? {
            Some(line) => {
                tracing::trace!("uci < {}", line);
                Ok(line)
            }
            None => Err(EngineError::Protocol(
                "engine closed its output".to_string(),
            )),
        }
    }

    async fn read_until(&mut self, prefix: &str) -> EngineResult<String> {
        loop {
            let line = self.next_line().await?;
            if line.starts_with(prefix) {
                return Ok(line);
            }
        }
    }

    /// Returns the engine's self-reported name
    async fn handshake(&mut self) -> EngineResult<String> {
        self.send("uci").await?;

        let mut name = "uci".to_string();
        loop {
            let line = self.next_line().await?;
            if let Some(reported) = line.strip_prefix("id name ") {
                name = reported.trim().to_string();
            } else if line.trim() == "uciok" {
                break;
            }
        }

        self.send("isready").await?;
        self.read_until("readyok").await?;
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.read_until("readyok").await?;
        Ok(name)
    }

    async fn search(&mut self, fen: &str, budget: Duration) -> EngineResult<String> {
        self.send(&format!("position fen {}", fen)).await?;
        self.send(&format!("go movetime {}", budget.as_millis().max(1)))
            .await?;

        let line = self.read_until("bestmove").await?;
        parse_bestmove(&line)
            .map(str::to_string)
            .ok_or_else(|| EngineError::Protocol(format!("malformed reply: {}", line)))
    }

    /// Abandon a search, draining its late `bestmove` so the next one starts clean
    async fn cancel(&mut self) {
        if self.send("stop").await.is_err() {
            return;
        }
        let drained =
            tokio::time::timeout(Duration::from_secs(1), self.read_until("bestmove")).await;
        if drained.is_err() {
            tracing::warn!("Engine did not acknowledge stop");
        }
    }
}

/// Move text out of a "bestmove e2e4 ponder e7e5" line
fn parse_bestmove(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("bestmove"), Some(mv)) => Some(mv),
        _ => None,
    }
}

#[async_trait]
impl MoveGenerator for UciEngine {
    async fn best_move(&self, request: MoveRequest) -> EngineResult<ChessMove> {
        let limit = request.budget + self.timeout;
        let mut session = self.session.lock().await;

        let text = match tokio::time::timeout(limit, session.search(&request.fen, request.budget))
            .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e @ (EngineError::Io(_) | EngineError::Protocol(_)))) => {
                // The process is gone or out of step; the next request gets a fresh one
                tracing::warn!("UCI engine failed ({}), restarting {}", e, self.path);
                match UciSession::start(&self.path, self.timeout).await {
                    Ok((fresh, _)) => *session = fresh,
                    Err(restart) => tracing::error!("UCI engine restart failed: {}", restart),
                }
                return Err(e);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                session.cancel().await;
                return Err(EngineError::Timeout(limit));
            }
        };

        if text == "(none)" || text == "0000" {
            return Err(EngineError::NoMove);
        }

        let mv = ChessMove::from_str(&text)
            .map_err(|_| EngineError::Protocol(format!("unreadable move: {}", text)))?;
        if !request.board.legal(mv) {
            return Err(EngineError::Protocol(format!(
                "engine suggested illegal move {}",
                text
            )));
        }
        Ok(mv)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
