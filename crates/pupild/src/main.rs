//! pupild - carrier daemon for the pupil learner.
//!
//! Connects the brain to an external teacher over a single paired socket:
//! one text frame "hello" at startup, then forever one reward frame and one
//! teacher-character frame in, one reply-character frame out. The terminal
//! shows the rolling conversation; nothing is persisted anywhere.

use std::io;

use pupil::learner::{Brain, BrainConfig};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

mod display;
mod wire;

use display::Conversation;
use wire::{parse_reward, parse_teacher_char, read_frame, write_frame};

/// The teacher's fixed endpoint. No files, no environment, no flags.
const TEACHER_ADDR: &str = "127.0.0.1:5556";

/// Width of the rolling conversation window.
const WINDOW_WIDTH: usize = 64;

/// How often the learner snapshot goes to the debug log.
const SNAPSHOT_EVERY: u64 = 500;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Nothing is persisted; an interrupt just ends the session.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted; session state is not persisted");
            std::process::exit(0);
        }
    });

    info!("connecting to teacher at {TEACHER_ADDR}");
    let stream = TcpStream::connect(TEACHER_ADDR).await?;
    stream.set_nodelay(true)?;
    let (mut rd, mut wr) = stream.into_split();

    write_frame(&mut wr, b"hello").await?;
    info!("handshake sent, entering tick loop");

    let mut brain = Brain::new(BrainConfig::default());
    let mut convo = Conversation::new(WINDOW_WIDTH);
    let mut first_reward = true;
    let mut ticks: u64 = 0;

    loop {
        let reward_frame = match read_frame(&mut rd).await {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                info!("teacher closed the stream after {ticks} ticks");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let reward = parse_reward(&reward_frame)?;
        let ch = parse_teacher_char(&read_frame(&mut rd).await?)?;

        if first_reward {
            // There is no prior action for the first reward to grade.
            first_reward = false;
        } else {
            brain.register_reward(reward, false);
        }
        let reply = brain.answer(ch);
        write_frame(&mut wr, reply.to_string().as_bytes()).await?;

        convo.push(reward, ch, reply);
        if let Err(e) = convo.redraw() {
            warn!("display error: {e}");
        }

        ticks += 1;
        if ticks % SNAPSHOT_EVERY == 0 {
            match serde_json::to_string(&brain.diagnostics()) {
                Ok(snapshot) => debug!(%snapshot, "learner state"),
                Err(e) => warn!("snapshot serialization failed: {e}"),
            }
        }
    }

    info!(
        "final accuracy over the session window: {:.2}",
        convo.accuracy()
    );
    Ok(())
}
