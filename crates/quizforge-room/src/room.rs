//! Room actor: an isolated Tokio task that owns one quiz session.
//!
//! Each room runs in its own task and is the only writer of its state.
//! Host and player handlers talk to it through a [`RoomHandle`], which
//! sends commands over an mpsc channel and waits for the reply on a
//! oneshot. Timed phases (countdown, prompt, answer window, settle delay,
//! final leaderboard) are a single deadline the actor's loop selects on
//! next to the command channel, so a command and a timer can never run
//! at the same time.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use quizforge_bank::Bank;
use quizforge_protocol::{
    AllAnswered, AnswerReceived, AnswerRevealed, Codec, GameFinished,
    GameStarted, HostCommand, JsonCodec, Leaderboard, PlayerId, PlayerJoined,
    PlayerLeft, PlayerScore, QuestionPrompt, QuestionShown, RoomCode,
    RoomCreated, ServerEvent,
};
use quizforge_transport::{CloseCode, Connection};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::fanout::{self, Delivery};
use crate::{Phase, RoomConfig, RoomError, RoomId, RoomRegistry, leaderboard, scoring};

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand<C> {
    Join {
        player_id: PlayerId,
        conn: Arc<C>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Answer {
        player_id: PlayerId,
        answer: String,
        reply: oneshot::Sender<Result<u32, RoomError>>,
    },
    Host {
        command: HostCommand,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    /// Close every participant and stop. Replies once they are closed.
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// A snapshot of a room.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub room_id: RoomId,
    pub phase: Phase,
    pub player_count: usize,
    /// 0-based index of the current (or last) question. `None` before
    /// the first prompt.
    pub question_index: Option<usize>,
    pub total_questions: usize,
    /// Every participant, ranked.
    pub standings: Vec<PlayerScore>,
}

/// Handle to a running room actor.
///
/// Cheap to clone. Once the actor has stopped, every method fails with
/// [`RoomError::RoomNotFound`].
pub struct RoomHandle<C> {
    code: RoomCode,
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<C>>,
}

impl<C> Clone for RoomHandle<C> {
    fn clone(&self) -> Self {
        Self {
            code: self.code.clone(),
            room_id: self.room_id,
            sender: self.sender.clone(),
        }
    }
}

impl<C> fmt::Debug for RoomHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomHandle")
            .field("code", &self.code)
            .field("room_id", &self.room_id)
            .finish_non_exhaustive()
    }
}

impl<C: Connection> RoomHandle<C> {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand<C>,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::RoomNotFound(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::RoomNotFound(self.code.clone()))
    }

    /// Adds a participant with zero points and notifies the host.
    ///
    /// # Errors
    /// [`RoomError::DuplicatePlayer`] if the id is taken,
    /// [`RoomError::InvalidPhase`] once the game has finished.
    pub async fn join(
        &self,
        player_id: PlayerId,
        conn: Arc<C>,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            player_id,
            conn,
            reply,
        })
        .await?
    }

    /// Removes a participant and notifies the host.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    /// Records an answer to the current question and returns the points
    /// it earned (0 if wrong).
    ///
    /// # Errors
    /// [`RoomError::PlayerNotFound`], [`RoomError::DuplicateAnswer`] if the
    /// player already answered this question, or
    /// [`RoomError::InvalidPhase`] outside the answer window.
    pub async fn submit_answer(
        &self,
        player_id: PlayerId,
        answer: String,
    ) -> Result<u32, RoomError> {
        self.request(|reply| RoomCommand::Answer {
            player_id,
            answer,
            reply,
        })
        .await?
    }

    /// Runs a host command.
    pub async fn host_command(
        &self,
        command: HostCommand,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Host { command, reply })
            .await?
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Closes every participant and stops the actor. Prefer
    /// [`RoomRegistry::delete`], which also deregisters the room.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Shutdown { reply }).await
    }
}

/// One-shot early end of the answer window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipSignal {
    /// No window to skip.
    Disarmed,
    /// A question is open and has not been skipped.
    Armed,
    /// Used for this question.
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Countdown,
    Prompt,
    AnswerWindow,
    Settle,
    Finish,
}

#[derive(Debug, Clone, Copy)]
struct PhaseTimer {
    kind: TimerKind,
    deadline: Instant,
}

struct Participant<C> {
    conn: Arc<C>,
    points: u32,
}

/// Per-question state. Replaced wholesale for each question.
struct QuestionCycle {
    index: usize,
    answered: HashSet<PlayerId>,
    /// Answer text → submissions, wrong answers included.
    distribution: BTreeMap<String, u32>,
    posted_at: Instant,
}

impl QuestionCycle {
    fn new(index: usize) -> Self {
        Self {
            index,
            answered: HashSet::new(),
            distribution: BTreeMap::new(),
            posted_at: Instant::now(),
        }
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<C: Connection> {
    code: RoomCode,
    room_id: RoomId,
    config: RoomConfig,
    bank: Arc<Bank>,
    host: Arc<C>,
    players: HashMap<PlayerId, Participant<C>>,
    phase: Phase,
    cycle: Option<QuestionCycle>,
    skip: SkipSignal,
    timer: Option<PhaseTimer>,
    codec: JsonCodec,
    registry: RoomRegistry<C>,
    receiver: mpsc::Receiver<RoomCommand<C>>,
}

impl<C: Connection> RoomActor<C> {
    /// Runs the actor loop until shutdown or the end of the game.
    async fn run(mut self) {
        tracing::info!(room = %self.code, room_id = %self.room_id, "room actor started");

        let created = ServerEvent::RoomCreated(RoomCreated {
            room_code: self.code.clone(),
        });
        self.send_host(&created).await;

        loop {
            let deadline = self.timer.map(|t| t.deadline);
            let flow = tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => ControlFlow::Break(()),
                },
                () = wait_until(deadline) => self.on_timer().await,
            };
            if flow.is_break() {
                break;
            }
        }

        let deregistered = self.registry.remove_instance(&self.code, self.room_id).await;
        tracing::info!(
            room = %self.code,
            room_id = %self.room_id,
            deregistered,
            "room actor stopped"
        );
    }

    async fn handle_command(&mut self, cmd: RoomCommand<C>) -> ControlFlow<()> {
        match cmd {
            RoomCommand::Join {
                player_id,
                conn,
                reply,
            } => {
                let result = self.handle_join(player_id, conn).await;
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.handle_leave(player_id).await;
                let _ = reply.send(result);
            }
            RoomCommand::Answer {
                player_id,
                answer,
                reply,
            } => {
                let result = self.handle_answer(player_id, answer).await;
                let _ = reply.send(result);
            }
            RoomCommand::Host { command, reply } => {
                let result = self.handle_host(command).await;
                if let Err(e) = &result {
                    tracing::debug!(
                        room = %self.code,
                        command = command.name(),
                        error = %e,
                        "host command rejected"
                    );
                }
                let _ = reply.send(result);
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown { reply } => {
                tracing::info!(room = %self.code, "room shutting down");
                self.timer = None;
                let players = self.players.values().map(|p| p.conn.as_ref());
                self.close_all(players, "room closed").await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn on_timer(&mut self) -> ControlFlow<()> {
        let Some(timer) = self.timer.take() else {
            return ControlFlow::Continue(());
        };
        match timer.kind {
            TimerKind::Countdown => self.show_prompt(0).await,
            TimerKind::Prompt => self.open_question().await,
            TimerKind::AnswerWindow => {
                tracing::debug!(room = %self.code, "answer window elapsed");
                self.reveal_answer().await;
            }
            TimerKind::Settle => self.reveal_answer().await,
            TimerKind::Finish => {
                self.close_all(self.everyone(), "game finished").await;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    // -----------------------------------------------------------------------
    // Participants
    // -----------------------------------------------------------------------

    async fn handle_join(
        &mut self,
        player_id: PlayerId,
        conn: Arc<C>,
    ) -> Result<(), RoomError> {
        if !self.phase.is_joinable() {
            return Err(RoomError::InvalidPhase {
                action: "join",
                phase: self.phase,
            });
        }
        if self.players.contains_key(&player_id) {
            return Err(RoomError::DuplicatePlayer(player_id));
        }

        self.players
            .insert(player_id.clone(), Participant { conn, points: 0 });
        tracing::info!(
            room = %self.code,
            %player_id,
            players = self.players.len(),
            "player joined"
        );

        self.send_host(&ServerEvent::PlayerJoin(PlayerJoined { player_id }))
            .await;
        Ok(())
    }

    async fn handle_leave(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if self.players.remove(&player_id).is_none() {
            return Err(RoomError::PlayerNotFound(player_id));
        }
        tracing::info!(
            room = %self.code,
            %player_id,
            players = self.players.len(),
            "player left"
        );

        self.send_host(&ServerEvent::PlayerDisconnect(PlayerLeft { id: player_id }))
            .await;
        // The one holdout may just have left.
        self.check_all_answered().await;
        Ok(())
    }

    async fn handle_answer(
        &mut self,
        player_id: PlayerId,
        answer: String,
    ) -> Result<u32, RoomError> {
        let Some(conn) = self.players.get(&player_id).map(|p| Arc::clone(&p.conn)) else {
            return Err(RoomError::PlayerNotFound(player_id));
        };
        if self
            .cycle
            .as_ref()
            .is_some_and(|c| c.answered.contains(&player_id))
        {
            return Err(RoomError::DuplicateAnswer(player_id));
        }
        let phase = self.phase;
        let window_open = self.answer_window_open();
        let cycle = match self.cycle.as_mut() {
            Some(cycle) if window_open => cycle,
            _ => {
                return Err(RoomError::InvalidPhase {
                    action: "answer",
                    phase,
                });
            }
        };

        let points = match self.bank.get(cycle.index) {
            Some(question) if question.is_correct(&answer) => {
                scoring::score(cycle.posted_at.elapsed())
            }
            _ => 0,
        };
        cycle.answered.insert(player_id.clone());
        *cycle.distribution.entry(answer).or_insert(0) += 1;
        let answered = cycle.answered.len();
        if let Some(participant) = self.players.get_mut(&player_id) {
            participant.points = participant.points.saturating_add(points);
        }
        tracing::debug!(room = %self.code, %player_id, points, answered, "answer recorded");

        let ack = ServerEvent::Answer(AnswerReceived {
            id: player_id,
            points: self.config.ack_includes_points.then_some(points),
        });
        self.deliver(&ack, [self.host.as_ref(), conn.as_ref()]).await;

        self.check_all_answered().await;
        Ok(points)
    }

    // -----------------------------------------------------------------------
    // Host commands
    // -----------------------------------------------------------------------

    async fn handle_host(&mut self, command: HostCommand) -> Result<(), RoomError> {
        match (command, self.phase) {
            (HostCommand::Start, Phase::AwaitingStart) => {
                self.start().await;
                Ok(())
            }
            (HostCommand::SkipQuestion, _) => self.skip_question().await,
            (HostCommand::Reveal | HostCommand::Next, Phase::RevealAnswer) => {
                self.reveal_leaderboard().await;
                Ok(())
            }
            (HostCommand::Next, Phase::RevealLeaderboard) => {
                let next = self.cycle.as_ref().map_or(0, |c| c.index + 1);
                self.show_prompt(next).await;
                Ok(())
            }
            (command, phase) => Err(RoomError::InvalidPhase {
                action: command.name(),
                phase,
            }),
        }
    }

    async fn start(&mut self) {
        self.transition(Phase::Countdown);
        self.arm(TimerKind::Countdown, self.config.countdown);
        tracing::info!(
            room = %self.code,
            players = self.players.len(),
            questions = self.bank.len(),
            "game started"
        );
        let event = ServerEvent::Start(GameStarted {
            sleep: millis(self.config.countdown),
            total_questions: self.bank.len(),
        });
        self.broadcast(&event).await;
    }

    async fn skip_question(&mut self) -> Result<(), RoomError> {
        match self.skip {
            SkipSignal::Consumed => Err(RoomError::SkipConsumed),
            SkipSignal::Armed if self.answer_window_open() => {
                self.skip = SkipSignal::Consumed;
                tracing::info!(room = %self.code, "question skipped");
                self.reveal_answer().await;
                Ok(())
            }
            SkipSignal::Armed | SkipSignal::Disarmed => Err(RoomError::InvalidPhase {
                action: "skip_question",
                phase: self.phase,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Question flow
    // -----------------------------------------------------------------------

    /// Shows the prompt of question `index`, or finishes the game if the
    /// bank is exhausted.
    async fn show_prompt(&mut self, index: usize) {
        let Some(prompt) = self.bank.get(index).map(|q| q.prompt.clone()) else {
            self.finish().await;
            return;
        };
        self.transition(Phase::QuestionPrompt);
        self.cycle = Some(QuestionCycle::new(index));
        self.skip = SkipSignal::Disarmed;
        self.arm(TimerKind::Prompt, self.config.prompt_display);

        let event = ServerEvent::QuestionPrompt(QuestionPrompt {
            prompt,
            sleep: millis(self.config.prompt_display),
        });
        self.broadcast(&event).await;
    }

    async fn open_question(&mut self) {
        let bank = Arc::clone(&self.bank);
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };
        let Some(question) = bank.get(cycle.index) else {
            return;
        };
        cycle.answered.clear();
        cycle.distribution.clear();
        cycle.posted_at = Instant::now();
        let index = cycle.index;

        self.transition(Phase::QuestionOpen);
        self.skip = SkipSignal::Armed;
        self.arm(TimerKind::AnswerWindow, self.config.answer_window);
        tracing::info!(
            room = %self.code,
            question = index + 1,
            total = bank.len(),
            "question opened"
        );

        let event = ServerEvent::Question(QuestionShown {
            prompt: question.prompt.clone(),
            answer_bank: question.answers.clone(),
            sleep: millis(self.config.answer_window),
        });
        self.broadcast(&event).await;
        // An empty room has nobody to wait for.
        self.check_all_answered().await;
    }

    /// Starts the settle delay once every current participant has
    /// answered. No-op outside the answer window.
    async fn check_all_answered(&mut self) {
        if !self.answer_window_open() {
            return;
        }
        let Some(cycle) = &self.cycle else {
            return;
        };
        if !self.players.keys().all(|id| cycle.answered.contains(id)) {
            return;
        }
        tracing::info!(
            room = %self.code,
            question = cycle.index + 1,
            "all players answered"
        );

        self.arm(TimerKind::Settle, self.config.settle_delay);
        let event = ServerEvent::AllAnswered(AllAnswered {
            sleep: millis(self.config.settle_delay),
        });
        self.broadcast(&event).await;
    }

    async fn reveal_answer(&mut self) {
        self.timer = None;
        self.transition(Phase::RevealAnswer);
        if self.skip == SkipSignal::Armed {
            self.skip = SkipSignal::Disarmed;
        }

        let Some(cycle) = &self.cycle else {
            return;
        };
        let Some(question) = self.bank.get(cycle.index) else {
            return;
        };
        tracing::info!(
            room = %self.code,
            question = cycle.index + 1,
            answers = cycle.answered.len(),
            "answer revealed"
        );
        let event = ServerEvent::Reveal(AnswerRevealed {
            correct_answer: question.correct_answer.clone(),
            answer_distribution: cycle.distribution.clone(),
        });
        self.broadcast(&event).await;
    }

    async fn reveal_leaderboard(&mut self) {
        self.transition(Phase::RevealLeaderboard);
        let event = ServerEvent::RevealScore(Leaderboard {
            scores: self.standings(self.config.leaderboard_size),
        });
        self.send_host(&event).await;
    }

    async fn finish(&mut self) {
        self.transition(Phase::Finished);
        self.arm(TimerKind::Finish, self.config.finish_display);
        tracing::info!(room = %self.code, players = self.players.len(), "game finished");

        let event = ServerEvent::Finish(GameFinished {
            scores: self.standings(self.config.leaderboard_size),
            sleep: millis(self.config.finish_display),
        });
        self.broadcast(&event).await;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: Phase) {
        if !self.phase.can_transition_to(next) {
            tracing::error!(
                room = %self.code,
                from = %self.phase,
                to = %next,
                "unexpected phase transition"
            );
        }
        tracing::debug!(room = %self.code, from = %self.phase, to = %next, "phase");
        self.phase = next;
    }

    fn arm(&mut self, kind: TimerKind, after: Duration) {
        self.timer = Some(PhaseTimer {
            kind,
            deadline: Instant::now() + after,
        });
    }

    fn answer_window_open(&self) -> bool {
        self.phase == Phase::QuestionOpen
            && matches!(
                self.timer,
                Some(PhaseTimer {
                    kind: TimerKind::AnswerWindow,
                    ..
                })
            )
    }

    fn standings(&self, limit: usize) -> Vec<PlayerScore> {
        leaderboard::rank(
            self.players.iter().map(|(id, p)| PlayerScore {
                id: id.clone(),
                points: p.points,
            }),
            limit,
        )
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            room_id: self.room_id,
            phase: self.phase,
            player_count: self.players.len(),
            question_index: self.cycle.as_ref().map(|c| c.index),
            total_questions: self.bank.len(),
            standings: self.standings(usize::MAX),
        }
    }

    /// The host followed by every participant present right now.
    fn everyone(&self) -> impl Iterator<Item = &C> {
        std::iter::once(self.host.as_ref())
            .chain(self.players.values().map(|p| p.conn.as_ref()))
    }

    async fn broadcast(&self, event: &ServerEvent) -> Vec<Delivery> {
        self.deliver(event, self.everyone()).await
    }

    async fn send_host(&self, event: &ServerEvent) {
        self.deliver(event, [self.host.as_ref()]).await;
    }

    /// Encodes `event` once and fans it out to `targets`.
    async fn deliver<'a>(
        &self,
        event: &ServerEvent,
        targets: impl IntoIterator<Item = &'a C>,
    ) -> Vec<Delivery> {
        let payload = match self.codec.encode(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(room = %self.code, event = event.name(), error = %e, "encode failed");
                return Vec::new();
            }
        };
        let deliveries = fanout::send_many(targets, &payload).await;
        let failed = deliveries.iter().filter(|d| !d.is_ok()).count();
        tracing::debug!(
            room = %self.code,
            event = event.name(),
            recipients = deliveries.len(),
            failed,
            "event sent"
        );
        deliveries
    }

    async fn close_all<'a>(&self, conns: impl IntoIterator<Item = &'a C>, reason: &str) {
        let room = &self.code;
        let closes = conns.into_iter().map(|conn| async move {
            if let Err(e) = conn.close(CloseCode::Normal, reason).await {
                tracing::warn!(%room, conn_id = %conn.id(), error = %e, "close failed");
            }
        });
        join_all(closes).await;
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
pub(crate) fn spawn_room<C: Connection>(
    code: RoomCode,
    room_id: RoomId,
    config: RoomConfig,
    bank: Arc<Bank>,
    host: Arc<C>,
    registry: RoomRegistry<C>,
) -> RoomHandle<C> {
    let (tx, rx) = mpsc::channel(config.command_buffer);

    let actor = RoomActor {
        code: code.clone(),
        room_id,
        config,
        bank,
        host,
        players: HashMap::new(),
        phase: Phase::AwaitingStart,
        cycle: None,
        skip: SkipSignal::Disarmed,
        timer: None,
        codec: JsonCodec,
        registry,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        code,
        room_id,
        sender: tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis() {
        assert_eq!(millis(Duration::from_secs(30)), 30_000);
        assert_eq!(millis(Duration::from_millis(3)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_none_never_fires() {
        let fired = tokio::time::timeout(Duration::from_secs(3600), wait_until(None)).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_fires_at_deadline() {
        let start = Instant::now();
        wait_until(Some(start + Duration::from_secs(5))).await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
