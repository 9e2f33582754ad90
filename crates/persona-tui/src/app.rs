use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use ratatui::layout::Rect;
use persona_core::{ChatController, ChatEntry, CompletionClient, Config, ParticleEngine, QuickAsk};

/// Braille cells hold a 2x4 dot grid; particle coordinates use dots.
pub const DOTS_PER_COL: f64 = 2.0;
pub const DOTS_PER_ROW: f64 = 4.0;

/// Milliseconds per step of the "typing..." animation.
const TYPING_STEP_MS: u128 = 300;

/// Map a terminal cell to the dot at its centre.
pub fn cell_to_dots(col: u16, row: u16) -> (f64, f64) {
    (
        col as f64 * DOTS_PER_COL + DOTS_PER_COL / 2.0,
        row as f64 * DOTS_PER_ROW + DOTS_PER_ROW / 2.0,
    )
}

pub struct App {
    pub should_quit: bool,
    pub chat: ChatController,
    pub particles: ParticleEngine,
    clock: Instant,

    // Transcript scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    transcript_lines: u16, // Wrapped transcript height, measured on render
    follow_tail: bool,

    // Clickable areas, refreshed on every render
    pub quick_ask_areas: Vec<(QuickAsk, Rect)>,
    pub cv_area: Option<Rect>,
    pub back_area: Option<Rect>,

    pub status: Option<String>,
    cv_path: PathBuf,
}

impl App {
    pub fn new(client: Arc<dyn CompletionClient>, config: &Config, cols: u16, rows: u16) -> Self {
        let chat = ChatController::new(client, config.persona_text(), config.request_timeout());
        let particles = ParticleEngine::new(
            cols as f64 * DOTS_PER_COL,
            rows as f64 * DOTS_PER_ROW,
        );

        Self {
            should_quit: false,
            chat,
            particles,
            clock: Instant::now(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            transcript_lines: 0,
            follow_tail: true,

            quick_ask_areas: Vec::new(),
            cv_area: None,
            back_area: None,

            status: None,
            cv_path: config.cv_path(),
        }
    }

    /// Milliseconds since start-up.
    pub fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    pub fn has_started(&self) -> bool {
        self.chat.conversation().has_started()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        self.chat.conversation().entries()
    }

    /// Number of dots after "typing", cycling 1..=3.
    pub fn typing_dots(&self) -> usize {
        (self.clock.elapsed().as_millis() / TYPING_STEP_MS % 3) as usize + 1
    }

    pub async fn on_frame(&mut self) {
        let now = self.now_ms();
        self.particles.frame(now);

        if self.chat.poll().await && self.follow_tail {
            self.scroll_to_bottom();
        }
    }

    pub fn on_pointer(&mut self, col: u16, row: u16) {
        let (x, y) = cell_to_dots(col, row);
        self.particles.on_pointer_move(x, y);
    }

    pub fn on_resize(&mut self, cols: u16, rows: u16) {
        self.particles
            .on_resize(cols as f64 * DOTS_PER_COL, rows as f64 * DOTS_PER_ROW);
    }

    pub fn submit_input(&mut self) {
        if self.chat.submit_input() {
            self.after_submit();
        }
    }

    pub fn quick_ask(&mut self, ask: QuickAsk) {
        if self.chat.quick_ask(ask) {
            self.after_submit();
        }
    }

    fn after_submit(&mut self) {
        self.status = None;
        self.follow_tail = true;
        self.scroll_to_bottom();
    }

    /// Leave the conversation and return to the landing view.
    pub fn back(&mut self) {
        self.chat.reset();
        self.chat_scroll = 0;
        self.follow_tail = true;
        self.status = None;
    }

    pub fn save_cv(&mut self) {
        let result = persona_core::cv::download_dir()
            .and_then(|dir| persona_core::cv::export(&self.cv_path, &dir));

        self.status = Some(match result {
            Ok(dest) => format!("CV saved to {}", dest.display()),
            Err(err) => {
                tracing::error!(error = %err, "CV export failed");
                "Could not save the CV".to_string()
            }
        });
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_tail = self.chat_scroll >= max;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        self.transcript_lines.saturating_sub(self.chat_height)
    }

    /// Record the wrapped transcript height from the last render and keep
    /// the scroll offset inside it.
    pub fn set_transcript_lines(&mut self, lines: usize) {
        self.transcript_lines = u16::try_from(lines).unwrap_or(u16::MAX);
        if self.follow_tail {
            self.scroll_to_bottom();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }
}
