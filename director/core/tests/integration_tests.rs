//! Integration tests for the Director engine
//!
//! These tests drive the engine the way a real surface does: through
//! `SurfaceEvent`s in, `DirectorMessage`s out, with a scripted backend
//! standing in for the game server.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use director_core::{
    Command, Director, DirectorConfig, DirectorMessage, DirectorState, GameBackend, MemorySessionStore,
    MessageBody, SelectOptionBody, SessionStore, StartResponse, StreamingBody, StreamingToken,
    SurfaceEvent,
};

/// Scripted game server: pops one command per play call.
#[derive(Clone, Default)]
struct ScriptedServer {
    script: Arc<Mutex<VecDeque<Command>>>,
    plays: Arc<Mutex<Vec<String>>>,
    stream_tokens: Arc<Mutex<Vec<StreamingToken>>>,
    ended: Arc<Mutex<Vec<String>>>,
}

impl ScriptedServer {
    fn push(&self, command: Command) {
        self.script.lock().unwrap().push_back(command);
    }
}

#[async_trait]
impl GameBackend for ScriptedServer {
    async fn start(&self) -> anyhow::Result<StartResponse> {
        Ok(StartResponse {
            message: "Dusk settles over Rattlesnake Ridge.".to_string(),
            styles: None,
            game_id: "ridge-1".to_string(),
        })
    }

    async fn load(&self, _game_id: &str) -> anyhow::Result<Option<Vec<Command>>> {
        Ok(None)
    }

    async fn play(&self, _game_id: &str, input: &str) -> anyhow::Result<Command> {
        self.plays.lock().unwrap().push(input.to_string());
        Ok(self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Command::Message(MessageBody {
                message: "Tumbleweed rolls by.".to_string(),
                expects_user_input: true,
                ..Default::default()
            })
        }))
    }

    async fn end(&self, game_id: &str) -> anyhow::Result<()> {
        self.ended.lock().unwrap().push(game_id.to_string());
        Ok(())
    }

    async fn open_stream(
        &self,
        _game_id: &str,
        _stream_id: &str,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        let tokens: Vec<StreamingToken> = self.stream_tokens.lock().unwrap().drain(..).collect();
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for token in tokens {
                let _ = tx.send(token).await;
            }
        });
        Ok(rx)
    }
}

fn test_config() -> DirectorConfig {
    DirectorConfig {
        honor_delays: false,
        ..DirectorConfig::default()
    }
}

fn collect(rx: &mut mpsc::Receiver<DirectorMessage>) -> Vec<DirectorMessage> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}

#[tokio::test]
async fn full_playthrough_over_surface_events() {
    let server = ScriptedServer::default();
    server.push(Command::SelectOption(SelectOptionBody {
        message: "The saloon or the sheriff's office?".to_string(),
        options: vec![
            ("saloon".to_string(), "The saloon".to_string()),
            ("office".to_string(), "The sheriff's office".to_string()),
        ],
        expects_user_input: true,
        ..Default::default()
    }));

    let store = Arc::new(MemorySessionStore::new());
    let (tx, mut rx) = mpsc::channel(256);
    let mut director = Director::new(server.clone(), test_config(), tx)
        .with_store(Arc::clone(&store) as Arc<dyn SessionStore>);

    // Connecting an idle surface starts the session
    director.handle_event(SurfaceEvent::Connected).await.unwrap();
    assert_eq!(director.state(), DirectorState::AwaitingTurn);
    assert_eq!(store.get(), Some("ridge-1".to_string()));

    let messages = collect(&mut rx);
    let appended: Vec<&str> = messages
        .iter()
        .filter_map(|m| match m {
            DirectorMessage::LineAppended { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        appended,
        vec![
            "Dusk settles over Rattlesnake Ridge.",
            "The saloon or the sheriff's office?",
            "saloon: The saloon",
            "office: The sheriff's office",
        ]
    );

    // A wrong answer costs no request
    director
        .handle_event(SurfaceEvent::InputSubmitted {
            content: "bank".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(server.plays.lock().unwrap().len(), 1);

    // A right answer advances the story
    server.push(Command::Message(MessageBody {
        message: "You push through the swinging doors. The game is over.".to_string(),
        ..Default::default()
    }));
    director
        .handle_event(SurfaceEvent::InputSubmitted {
            content: "saloon".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(director.state(), DirectorState::GameOver);
    assert_eq!(store.get(), None);

    // End was fired at the server
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        server.ended.lock().unwrap().as_slice(),
        &["ridge-1".to_string()]
    );
}

#[tokio::test]
async fn streamed_narration_reaches_the_surface_incrementally() {
    let server = ScriptedServer::default();
    server.push(Command::StreamingMessage(StreamingBody {
        stream_id: "s1".to_string(),
        agent_name: "Bartender".to_string(),
        expects_user_input: true,
        ..Default::default()
    }));
    *server.stream_tokens.lock().unwrap() = vec![
        StreamingToken::Token("What'll ".to_string()),
        StreamingToken::Token("it be?".to_string()),
        StreamingToken::Complete {
            message: "What'll it be?".to_string(),
        },
    ];

    let (tx, mut rx) = mpsc::channel(256);
    let mut director = Director::new(server, test_config(), tx);
    director.handle_event(SurfaceEvent::Connected).await.unwrap();
    assert_eq!(director.state(), DirectorState::Streaming);

    for _ in 0..100 {
        director.poll_streaming().await;
        if !director.is_streaming() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(director.state(), DirectorState::AwaitingTurn);

    let messages = collect(&mut rx);
    let amended: Vec<&str> = messages
        .iter()
        .filter_map(|m| match m {
            DirectorMessage::LineAmended { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    // Tokens grew the line; completion settled the authoritative text
    assert!(amended.contains(&"Bartender: What'll "));
    assert_eq!(amended.last().unwrap(), &"Bartender: What'll it be?");
}

#[tokio::test]
async fn restart_and_quit_lifecycle() {
    let server = ScriptedServer::default();
    let (tx, mut rx) = mpsc::channel(256);
    let mut director = Director::new(server.clone(), test_config(), tx);

    director.handle_event(SurfaceEvent::Connected).await.unwrap();
    director
        .handle_event(SurfaceEvent::RestartRequested)
        .await
        .unwrap();
    assert_eq!(director.state(), DirectorState::AwaitingTurn);

    let messages = collect(&mut rx);
    assert!(messages
        .iter()
        .any(|m| matches!(m, DirectorMessage::TranscriptCleared)));

    // Restart abandoned the first session server-side
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(server
        .ended
        .lock()
        .unwrap()
        .contains(&"ridge-1".to_string()));

    director
        .handle_event(SurfaceEvent::QuitRequested)
        .await
        .unwrap();
    let messages = collect(&mut rx);
    assert!(messages.iter().any(|m| matches!(m, DirectorMessage::Quit)));
}
