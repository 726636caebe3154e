//! Manages the WebSocket connection lifecycle for one practice session.
//!
//! A connection owns exactly one [`PracticeSession`]. The controller waits for
//! `init`, then drives the session from a single task with `tokio::select!`
//! over client messages, the greeting timer, the one pending agent turn and a
//! one-second session clock.

use super::protocol::{ClientMessage, ServerMessage};
use crate::{
    models::{AgentView, ScenarioView},
    state::AppState,
};
use anyhow::{Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use podium_core::session::{AgentTurn, PracticeSession, SessionOptions};
use rand::{SeedableRng, rngs::StdRng};
use std::{pin::Pin, sync::Arc, time::Duration};
use tokio::time::{Instant, Sleep, interval_at, sleep};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Delay before the first agent welcomes the user.
const GREETING_DELAY: Duration = Duration::from_secs(2);
const CLOCK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndReason {
    ClientEnded,
    TimeUp,
    Disconnected,
}

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| {
        let (sink, stream) = socket.split();
        serve_connection(state, stream, sink, StdRng::from_os_rng())
    })
}

/// Runs one practice session over an already-upgraded connection.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
pub(crate) async fn serve_connection<St, Si>(
    state: Arc<AppState>,
    mut stream: St,
    mut sink: Si,
    mut rng: StdRng,
) where
    St: Stream<Item = Result<Message, axum::Error>> + Unpin,
    Si: Sink<Message> + Unpin,
    Si::Error: std::error::Error + Send + Sync + 'static,
{
    let session_id = Uuid::new_v4();
    tracing::Span::current().record("session_id", tracing::field::display(session_id));
    info!("New WebSocket connection. Awaiting initialization...");

    let (scenario_id, options) = match await_init(&mut stream).await {
        Ok(Some(init)) => init,
        Ok(None) => {
            info!("Client disconnected before sending init message.");
            return;
        }
        Err(e) => {
            warn!("Session initialization failed: {}", e);
            reject(&mut sink, e.to_string()).await;
            return;
        }
    };

    let mut session = match PracticeSession::start(&mut rng, &scenario_id, options) {
        Ok(session) => session,
        Err(e) => {
            warn!("Session initialization failed: {}", e);
            reject(&mut sink, e.to_string()).await;
            return;
        }
    };

    let initialized = ServerMessage::Initialized {
        scenario: ScenarioView::from(session.scenario()),
        agents: session.agents().iter().map(AgentView::from).collect(),
        duration: session.effective_duration(),
    };
    if send_msg(&mut sink, initialized).await.is_err() {
        warn!("Failed to send Initialized message to client.");
        return;
    }

    let started = Instant::now();
    let mut greeting: Option<Pin<Box<Sleep>>> = Some(Box::pin(sleep(GREETING_DELAY)));
    let mut pending_turn: Option<Pin<Box<Sleep>>> = None;
    let mut clock = interval_at(started + CLOCK_PERIOD, CLOCK_PERIOD);

    let reason = loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::UserMessage { text }) => {
                        if session.record_user_message(&text) {
                            let delay = session.next_delay(&mut rng);
                            debug!(delay_ms = delay.as_millis() as u64, "Scheduling agent reply");
                            pending_turn = Some(Box::pin(sleep(delay)));
                        }
                    }
                    Ok(ClientMessage::EndSession) => break EndReason::ClientEnded,
                    Ok(ClientMessage::Init { .. }) => warn!("Ignoring repeated init message."),
                    Err(e) => warn!("Ignoring malformed client message: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => break EndReason::Disconnected,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Error receiving from client WebSocket: {:?}", e);
                    break EndReason::Disconnected;
                }
            },
            () = fire(&mut greeting) => {
                greeting = None;
                if let Some(turn) = session.greeting() {
                    if send_msg(&mut sink, agent_message(turn)).await.is_err() {
                        break EndReason::Disconnected;
                    }
                }
            },
            () = fire(&mut pending_turn) => {
                pending_turn = None;
                if let Some(turn) = session.next_turn(&mut rng, &state.composer) {
                    if send_msg(&mut sink, agent_message(turn)).await.is_err() {
                        break EndReason::Disconnected;
                    }
                    pending_turn = Some(Box::pin(sleep(session.next_delay(&mut rng))));
                }
            },
            _ = clock.tick() => {
                let elapsed = started.elapsed().as_secs();
                if send_msg(&mut sink, ServerMessage::Tick { elapsed }).await.is_err() {
                    break EndReason::Disconnected;
                }
                if session.is_expired(elapsed) {
                    break EndReason::TimeUp;
                }
            },
        }
    };

    drop(pending_turn);
    drop(greeting);

    let record = session.finish(started.elapsed().as_secs());
    state.records.add(record.clone()).await;
    info!(?reason, "Practice session ended.");

    if reason != EndReason::Disconnected {
        let ended = ServerMessage::SessionEnded {
            record: record.into(),
        };
        if send_msg(&mut sink, ended).await.is_ok() {
            let _ = sink.send(Message::Close(None)).await;
        }
    }
}

/// Waits for the `init` message. `Ok(None)` means the client left first.
async fn await_init<St>(stream: &mut St) -> Result<Option<(String, SessionOptions)>>
where
    St: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(incoming) = stream.next().await {
        match incoming? {
            Message::Text(text) => {
                let msg: ClientMessage = serde_json::from_str(&text)?;
                return msg
                    .into_init()
                    .map(Some)
                    .ok_or_else(|| anyhow!("First message must be `init`"));
            }
            Message::Close(_) => return Ok(None),
            Message::Binary(_) => return Err(anyhow!("First message was not a text `init` message.")),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
    Ok(None)
}

/// Completes when the timer elapses; never completes when there is none.
async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

fn agent_message(turn: AgentTurn) -> ServerMessage {
    ServerMessage::AgentMessage {
        agent_id: turn.agent.id,
        agent_name: turn.agent.name,
        text: turn.text,
        voice_id: turn.agent.voice_id,
    }
}

async fn reject<Si>(sink: &mut Si, message: String)
where
    Si: Sink<Message> + Unpin,
    Si::Error: std::error::Error + Send + Sync + 'static,
{
    if send_msg(sink, ServerMessage::Error { message }).await.is_ok() {
        let _ = sink.send(Message::Close(None)).await;
    }
}

/// A helper function to serialize and send a `ServerMessage` to the client.
async fn send_msg<Si>(sink: &mut Si, msg: ServerMessage) -> Result<()>
where
    Si: Sink<Message> + Unpin,
    Si::Error: std::error::Error + Send + Sync + 'static,
{
    let serialized = serde_json::to_string(&msg)?;
    sink.send(Message::Text(serialized.into())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::tests::test_state;
    use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
    use tokio::task::JoinHandle;

    struct Client {
        tx: UnboundedSender<Result<Message, axum::Error>>,
        rx: UnboundedReceiver<Message>,
        handle: JoinHandle<()>,
        state: Arc<AppState>,
    }

    fn connect(seed: u64) -> Client {
        let state = Arc::new(test_state());
        let (tx, stream) = mpsc::unbounded();
        let (sink, rx) = mpsc::unbounded();
        let handle = tokio::spawn(serve_connection(
            state.clone(),
            stream,
            sink,
            StdRng::seed_from_u64(seed),
        ));
        Client {
            tx,
            rx,
            handle,
            state,
        }
    }

    impl Client {
        fn send(&self, json: &str) {
            self.tx
                .unbounded_send(Ok(Message::Text(json.to_string().into())))
                .unwrap();
        }

        /// Next server message; `None` once the server closes.
        async fn recv(&mut self) -> Option<ServerMessage> {
            loop {
                match self.rx.next().await? {
                    Message::Text(text) => return Some(serde_json::from_str(&text).unwrap()),
                    Message::Close(_) => return None,
                    _ => {}
                }
            }
        }

        async fn recv_agent_line(&mut self) -> (String, String) {
            loop {
                match self.recv().await.expect("session closed early") {
                    ServerMessage::AgentMessage { agent_id, text, .. } => return (agent_id, text),
                    ServerMessage::Tick { .. } => {}
                    other => panic!("unexpected message: {:?}", other),
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_scenario_is_rejected() {
        let mut client = connect(1);
        client.send(r#"{"type":"init","scenario_id":"karaoke"}"#);

        assert_eq!(
            client.recv().await,
            Some(ServerMessage::Error {
                message: "Scenario 'karaoke' not found".to_string()
            })
        );
        assert_eq!(client.recv().await, None);
        client.handle.await.unwrap();
        assert_eq!(client.state.records.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_message_must_be_init() {
        let mut client = connect(1);
        client.send(r#"{"type":"user_message","text":"hello?"}"#);

        assert_eq!(
            client.recv().await,
            Some(ServerMessage::Error {
                message: "First message must be `init`".to_string()
            })
        );
        client.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_greeting_then_client_ends_session() {
        let mut client = connect(7);
        client.send(r#"{"type":"init","scenario_id":"party","difficulty":"hard"}"#);

        match client.recv().await {
            Some(ServerMessage::Initialized {
                scenario,
                agents,
                duration,
            }) => {
                assert_eq!(scenario.id, "party");
                assert_eq!(agents.len(), 4);
                assert_eq!(duration, 300);
            }
            other => panic!("expected initialized, got {:?}", other),
        }

        let (agent_id, text) = client.recv_agent_line().await;
        assert_eq!(agent_id, "agent-0");
        assert!(text.contains("Welcome to the session"));

        client.send(r#"{"type":"user_message","text":"Hi everyone, I'm new here"}"#);
        let (agent_id, text) = client.recv_agent_line().await;
        assert!(agent_id.starts_with("agent-"));
        assert!(!text.trim().is_empty());

        client.send(r#"{"type":"end_session"}"#);
        let record = loop {
            match client.recv().await.expect("session closed early") {
                ServerMessage::SessionEnded { record } => break record,
                ServerMessage::Tick { .. } | ServerMessage::AgentMessage { .. } => {}
                other => panic!("unexpected message: {:?}", other),
            }
        };
        assert_eq!(record.scenario_id, "party");
        assert_eq!(record.difficulty.as_str(), "hard");
        assert_eq!(client.recv().await, None);

        client.handle.await.unwrap();
        assert_eq!(client.state.records.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_ends_when_time_is_up() {
        let mut client = connect(3);
        client.send(r#"{"type":"init","scenario_id":"classroom","duration":3}"#);

        let mut ticks = Vec::new();
        let record = loop {
            match client.recv().await.expect("session closed early") {
                ServerMessage::Tick { elapsed } => ticks.push(elapsed),
                ServerMessage::SessionEnded { record } => break record,
                _ => {}
            }
        };
        assert_eq!(ticks, vec![1, 2, 3]);
        assert_eq!(record.duration, 3);
        client.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stores_record_without_reply() {
        let mut client = connect(5);
        client.send(r#"{"type":"init","scenario_id":"presentation","duration":0}"#);
        assert!(matches!(
            client.recv().await,
            Some(ServerMessage::Initialized { duration: 0, .. })
        ));

        client.tx.close_channel();
        (&mut client.handle).await.unwrap();
        assert_eq!(client.state.records.len().await, 1);

        while let Some(msg) = client.recv().await {
            assert!(!matches!(msg, ServerMessage::SessionEnded { .. }));
        }
    }
}
