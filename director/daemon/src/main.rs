//! teletale - terminal client for the story server
//!
//! A thin stdio surface over the Director engine: it reads player input line
//! by line, forwards it as surface events, and prints the transcript lines
//! the Director sends back. All game logic lives in `director-core`; this
//! binary only renders.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use director_core::{
    Director, DirectorConfig, DirectorMessage, FileSessionStore, HttpGameBackend, NotifyLevel,
    SessionStore, SurfaceEvent,
};

#[derive(Parser, Debug)]
#[command(name = "teletale", version, about = "Play a story from a teletale server")]
struct Args {
    /// Game server base address
    #[arg(long, env = "TELETALE_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Request timeout in seconds
    #[arg(long, env = "TELETALE_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,

    /// Start a fresh session instead of resuming the stored one
    #[arg(long)]
    fresh: bool,
}

/// Prints Director messages to stdout
///
/// Streamed lines arrive as an appended prefix followed by in-place
/// amendments, so the renderer holds the cursor on the open line and prints
/// only the new suffix each time.
struct Renderer<W: Write> {
    out: W,
    /// `(index, printed bytes)` of the line the cursor is still on
    open_line: Option<(usize, usize)>,
}

impl<W: Write> Renderer<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            open_line: None,
        }
    }

    /// Render one message; returns true when the surface should quit
    fn render(&mut self, msg: DirectorMessage) -> bool {
        match msg {
            DirectorMessage::LineAppended { index, text, .. } => {
                self.finish_open_line();
                let _ = write!(self.out, "{text}");
                let _ = self.out.flush();
                self.open_line = Some((index, text.len()));
            }

            DirectorMessage::LineAmended { index, text } => {
                // get() refuses offsets past the end or inside a multi-byte
                // character, which happens when the completed text diverges
                // from the concatenated tokens
                let suffix = match self.open_line {
                    Some((open, printed)) if open == index => text.get(printed..),
                    _ => None,
                };
                match suffix {
                    Some(suffix) => {
                        let _ = write!(self.out, "{suffix}");
                        let _ = self.out.flush();
                        self.open_line = Some((index, text.len()));
                    }
                    None => {
                        // Lost track (completion rewrote the line); reprint it
                        self.finish_open_line();
                        let _ = writeln!(self.out, "{text}");
                    }
                }
            }

            DirectorMessage::TranscriptCleared => {
                self.finish_open_line();
                let _ = writeln!(self.out, "{}", "-".repeat(40));
            }

            DirectorMessage::SessionInfo {
                session_id,
                resumed,
            } => {
                tracing::info!(session_id = %session_id, resumed, "Session ready");
            }

            DirectorMessage::State { state } => {
                tracing::debug!(state = ?state, "Director state");
            }

            DirectorMessage::Notify { level, message } => {
                self.finish_open_line();
                match level {
                    NotifyLevel::Info => eprintln!("{message}"),
                    NotifyLevel::Warning | NotifyLevel::Error => eprintln!("! {message}"),
                }
            }

            DirectorMessage::Quit => {
                self.finish_open_line();
                return true;
            }
        }

        false
    }

    fn finish_open_line(&mut self) {
        if self.open_line.take().is_some() {
            let _ = writeln!(self.out);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = DirectorConfig {
        server_url: args.server,
        timeout_secs: args.timeout_secs,
        auto_resume: !args.fresh,
        ..DirectorConfig::default()
    };
    let backend = HttpGameBackend::with_timeout(
        config.server_url.clone(),
        Duration::from_secs(config.timeout_secs),
    );

    let (tx, mut rx) = mpsc::channel(256);
    let mut director = Director::new(backend, config, tx);
    if let Some(store) = FileSessionStore::default_location() {
        director = director.with_store(Arc::new(store) as Arc<dyn SessionStore>);
    } else {
        tracing::warn!("No data directory available; sessions will not be resumable");
    }

    director.handle_event(SurfaceEvent::Connected).await?;

    let mut renderer = Renderer::new(std::io::stdout());
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_millis(25));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let event = match line? {
                    Some(input) => match input.trim() {
                        "/quit" | "/exit" => SurfaceEvent::QuitRequested,
                        "/restart" => SurfaceEvent::RestartRequested,
                        _ => SurfaceEvent::InputSubmitted { content: input },
                    },
                    // stdin closed
                    None => SurfaceEvent::QuitRequested,
                };
                director.handle_event(event).await?;
            }
            _ = tick.tick() => {
                director.poll_streaming().await;
            }
            _ = tokio::signal::ctrl_c() => {
                director.handle_event(SurfaceEvent::QuitRequested).await?;
            }
        }

        let mut quit = false;
        while let Ok(msg) = rx.try_recv() {
            quit |= renderer.render(msg);
        }
        if quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_core::TextStyle;

    fn appended(index: usize, text: &str) -> DirectorMessage {
        DirectorMessage::LineAppended {
            index,
            text: text.to_string(),
            style: TextStyle::default(),
        }
    }

    fn amended(index: usize, text: &str) -> DirectorMessage {
        DirectorMessage::LineAmended {
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn streamed_suffixes_print_incrementally() {
        let mut renderer = Renderer::new(Vec::new());
        renderer.render(appended(0, "Sheriff: "));
        renderer.render(amended(0, "Sheriff: Howdy, "));
        renderer.render(amended(0, "Sheriff: Howdy, stranger."));
        assert!(renderer.render(DirectorMessage::Quit));

        let out = String::from_utf8(renderer.out).unwrap();
        assert_eq!(out, "Sheriff: Howdy, stranger.\n");
    }

    #[test]
    fn completion_rewrite_falls_back_to_reprint() {
        // The authoritative completion diverges from the concatenated
        // tokens, so the printed byte count lands inside a multi-byte
        // character of the new text
        let mut renderer = Renderer::new(Vec::new());
        renderer.render(appended(0, "Narrator: "));
        renderer.render(amended(0, "Narrator: né"));
        renderer.render(amended(0, "Narrator: naïve"));

        let out = String::from_utf8(renderer.out).unwrap();
        assert!(out.ends_with("Narrator: naïve\n"));
    }
}
