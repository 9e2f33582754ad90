use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        canvas::{Canvas, Context, Points},
        Block, Borders, Paragraph, Wrap,
    },
};
use persona_core::{
    particles::Surface,
    persona::{DISPLAY_NAME, GREETING, TITLE},
    ChatEntry, QuickAsk,
};
use crate::app::App;

const LANDING_WIDTH: u16 = 72;
const CHAT_WIDTH: u16 = 100;
const PLACEHOLDER: &str = "Ask me anything...";

/// Draws particles onto a braille canvas, flipping `y` so it grows downward.
struct CanvasSurface<'a, 'b> {
    ctx: &'a mut Context<'b>,
    height: f64,
    // Reused for every circle drawn this frame
    points: Vec<(f64, f64)>,
}

impl Surface for CanvasSurface<'_, '_> {
    // The terminal buffer is rebuilt every frame.
    fn clear(&mut self) {}

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, alpha: f64) {
        let level = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        circle_points(&mut self.points, x, self.height - y, radius);

        self.ctx.draw(&Points {
            coords: &self.points,
            color: Color::Rgb(level, level, level),
        });
    }
}

/// Fill `points` with the dots of a disc centred on `(x, y)`, replacing
/// whatever it held before.
fn circle_points(points: &mut Vec<(f64, f64)>, x: f64, y: f64, radius: f64) {
    points.clear();
    let r = radius.max(0.5);
    let reach = r.ceil() as i32;

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let (fx, fy) = (dx as f64, dy as f64);
            if fx * fx + fy * fy <= r * r {
                points.push((x + fx, y + fy));
            }
        }
    }
}

/// Render a line of reply text, turning `**bold**` into styled spans and
/// leading `* ` / `- ` into bullets.
fn markdown_line(text: &str) -> Line<'static> {
    let trimmed = text.trim_start();
    let (bullet, body) = match trimmed
        .strip_prefix("* ")
        .or_else(|| trimmed.strip_prefix("- "))
    {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut parts: Vec<String> = body.split("**").map(str::to_string).collect();
    // An unmatched ** stays literal
    if parts.len() % 2 == 0 {
        if let Some(tail) = parts.pop() {
            if let Some(last) = parts.last_mut() {
                last.push_str("**");
                last.push_str(&tail);
            }
        }
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    if bullet {
        spans.push(Span::raw("  • "));
    }
    for (i, part) in parts.into_iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i % 2 == 1 {
            spans.push(Span::styled(part, Style::default().add_modifier(Modifier::BOLD)));
        } else {
            spans.push(Span::raw(part));
        }
    }

    Line::from(spans)
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    render_particles(app, frame, area);

    let [top_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_top_bar(app, frame, top_area);

    if app.has_started() {
        app.quick_ask_areas.clear();
        render_chat(app, frame, body_area);
    } else {
        render_landing(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_particles(app: &App, frame: &mut Frame, area: Rect) {
    let particles = &app.particles;
    let viewport = particles.viewport();

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, viewport.width])
        .y_bounds([0.0, viewport.height])
        .paint(|ctx| {
            let mut surface = CanvasSurface {
                ctx,
                height: viewport.height,
                points: Vec::new(),
            };
            particles.render(&mut surface);
        });

    frame.render_widget(canvas, area);
}

fn render_top_bar(app: &mut App, frame: &mut Frame, area: Rect) {
    let link_style = Style::default().fg(Color::White).bg(Color::DarkGray).bold();

    let cv_label = " ⤓ CV ";
    let cv_width = cv_label.chars().count() as u16;
    let cv_area = Rect {
        x: area.x + area.width.saturating_sub(cv_width + 1),
        width: cv_width.min(area.width),
        ..area
    };
    frame.render_widget(Paragraph::new(Span::styled(cv_label, link_style)), cv_area);
    app.cv_area = Some(cv_area);

    if app.has_started() {
        let back_label = " ← Back ";
        let back_area = Rect {
            x: area.x + 1,
            width: (back_label.chars().count() as u16).min(area.width.saturating_sub(1)),
            ..area
        };
        frame.render_widget(Paragraph::new(Span::styled(back_label, link_style)), back_area);
        app.back_area = Some(back_area);
    } else {
        app.back_area = None;
    }
}

fn render_landing(app: &mut App, frame: &mut Frame, area: Rect) {
    let column = centered(area, LANDING_WIDTH);

    let [_, greeting_area, title_area, _, input_area, _, buttons_area, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(column);

    let greeting = Paragraph::new(Line::from(Span::styled(
        GREETING,
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(greeting, greeting_area);

    let title = Paragraph::new(Line::from(Span::styled(TITLE, Style::default().fg(Color::Gray))))
        .alignment(Alignment::Center);
    frame.render_widget(title, title_area);

    render_input(app, frame, input_area);
    render_quick_asks(app, frame, buttons_area);
}

fn render_quick_asks(app: &mut App, frame: &mut Frame, area: Rect) {
    let button_style = Style::default().fg(Color::White).bg(Color::DarkGray);
    let key_style = Style::default().fg(Color::Yellow).bg(Color::DarkGray).bold();
    let gap = 2u16;

    let labels: Vec<(QuickAsk, String)> = QuickAsk::all()
        .iter()
        .enumerate()
        .map(|(i, ask)| (*ask, format!(" {} {} ", i + 1, ask.label())))
        .collect();
    let total: u16 = labels
        .iter()
        .map(|(_, label)| label.chars().count() as u16)
        .sum::<u16>()
        + gap * (labels.len() as u16 - 1);

    let mut x = area.x + area.width.saturating_sub(total) / 2;
    app.quick_ask_areas.clear();

    for (ask, label) in labels {
        let width = label.chars().count() as u16;
        if x + width > area.x + area.width {
            break;
        }
        let button_area = Rect { x, width, ..area };

        let (key, rest) = label.split_at(2);
        let line = Line::from(vec![
            Span::styled(key.to_string(), key_style),
            Span::styled(rest.to_string(), button_style),
        ]);
        frame.render_widget(Paragraph::new(line), button_area);
        app.quick_ask_areas.push((ask, button_area));

        x += width + gap;
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let column = centered(area, CHAT_WIDTH);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(column);

    let chat_area = Rect {
        x: chat_area.x + 1,
        width: chat_area.width.saturating_sub(2),
        ..chat_area
    };

    // Store chat area dimensions for scroll calculations
    app.chat_height = chat_area.height;
    app.chat_width = chat_area.width;

    let user_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let assistant_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    for entry in app.entries() {
        match entry {
            ChatEntry::User { text } => {
                lines.push(Line::from(Span::styled("You", user_style)).alignment(Alignment::Right));
                for line in text.lines() {
                    lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                }
            }
            ChatEntry::Assistant { pending: true, .. } => {
                lines.push(Line::from(Span::styled(DISPLAY_NAME, assistant_style)));
                lines.push(Line::from(Span::styled(
                    format!("typing{}", ".".repeat(app.typing_dots())),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
            ChatEntry::Assistant { text, .. } => {
                lines.push(Line::from(Span::styled(DISPLAY_NAME, assistant_style)));
                for line in text.lines() {
                    lines.push(markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    app.set_transcript_lines(chat.line_count(chat_area.width));
    let chat = chat.scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.chat.is_busy();
    let border_color = if busy { Color::DarkGray } else { Color::Yellow };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.chat.model()));
    let inner = block.inner(area);

    let input = app.chat.conversation().input();
    let visible = inner.width.saturating_sub(1) as usize;
    let skip = input.cursor().saturating_sub(visible);

    let content = if input.is_empty() {
        Line::from(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(input.as_str().chars().skip(skip).collect::<String>())
    };

    frame.render_widget(Paragraph::new(content).block(block), area);

    if !busy && inner.width > 0 && inner.height > 0 {
        let cursor_x = inner.x + (input.cursor() - skip) as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
    ];
    if app.has_started() {
        hints.extend(vec![
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" back ", label_style),
        ]);
    } else {
        hints.extend(vec![
            Span::styled(" 1-5 ", key_style),
            Span::styled(" quick ask ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" ^S ", key_style),
        Span::styled(" save CV ", label_style),
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    if let Some(status) = &app.status {
        hints.push(Span::styled(
            format!("  {}", status),
            Style::default().fg(Color::Green),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use async_trait::async_trait;
    use persona_core::{CompletionClient, CompletionError, Config};
    use ratatui::{backend::TestBackend, Terminal};

    struct FixedClient;

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Ok("I build **WordPress** sites".to_string())
        }

        fn model(&self) -> &str {
            "gemini-1.5-flash"
        }
    }

    struct LongClient;

    #[async_trait]
    impl CompletionClient for LongClient {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            let mut words: Vec<String> = (0..39)
                .map(|i| format!("{}{}", (b'a' + (i % 26) as u8) as char, "x".repeat(59)))
                .collect();
            words.push("ENDMARK".to_string());
            Ok(format!("* {}", words.join(" ")))
        }

        fn model(&self) -> &str {
            "long"
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn draw(app: &mut App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
    }

    #[test]
    fn test_markdown_bold_spans() {
        let line = markdown_line("I know **Laravel** and **React**");
        let bold: Vec<&str> = line
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(bold, vec!["Laravel", "React"]);
    }

    #[test]
    fn test_markdown_unclosed_bold_is_literal() {
        let line = markdown_line("price **10");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "price **10");
        assert!(line.spans.iter().all(|s| !s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn test_markdown_bullets() {
        let line = markdown_line("* **Skills:** PHP");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "  • Skills: PHP");
    }

    #[test]
    fn test_landing_shows_persona_and_buttons() {
        let mut app = App::new(Arc::new(FixedClient), &Config::new(), 100, 30);
        let terminal = draw(&mut app);
        let screen = screen_text(&terminal);

        assert!(screen.contains("Hey, I'm Owais"));
        assert!(screen.contains("Full Stack Web Developer"));
        assert!(screen.contains("Ask me anything..."));
        assert!(screen.contains("CV"));
        assert!(!screen.contains("Back"));
        assert_eq!(app.quick_ask_areas.len(), 5);
        assert!(app.cv_area.is_some());
    }

    #[tokio::test]
    async fn test_chat_view_shows_transcript() {
        let mut app = App::new(Arc::new(FixedClient), &Config::new(), 100, 30);
        app.quick_ask(QuickAsk::Skills);

        let screen = screen_text(&draw(&mut app));
        assert!(screen.contains("What are your skills?"));
        assert!(screen.contains("typing"));
        assert!(!screen.contains("Hey, I'm Owais"));

        app.chat.wait().await;
        let screen = screen_text(&draw(&mut app));
        assert!(screen.contains("I build WordPress sites"));
        assert!(screen.contains("Back"));
        assert!(app.quick_ask_areas.is_empty());
    }

    #[tokio::test]
    async fn test_end_of_long_reply_is_reachable() {
        let mut app = App::new(Arc::new(LongClient), &Config::new(), 100, 30);
        app.quick_ask(QuickAsk::Experience);
        app.chat.wait().await;
        draw(&mut app);

        app.scroll_up(u16::MAX);
        let screen = screen_text(&draw(&mut app));
        assert!(!screen.contains("ENDMARK"));

        app.scroll_down(u16::MAX);
        let screen = screen_text(&draw(&mut app));
        assert!(screen.contains("ENDMARK"));
        assert!(app.chat_scroll > 0);
    }

    #[tokio::test]
    async fn test_new_reply_follows_tail() {
        let mut app = App::new(Arc::new(LongClient), &Config::new(), 100, 30);
        app.quick_ask(QuickAsk::Experience);
        draw(&mut app);
        app.on_frame().await;
        app.chat.wait().await;

        let screen = screen_text(&draw(&mut app));
        assert!(screen.contains("ENDMARK"));
    }

    #[test]
    fn test_circle_points_reuses_buffer() {
        let mut points = Vec::new();
        circle_points(&mut points, 10.0, 10.0, 3.0);
        let big = points.len();
        let capacity = points.capacity();

        circle_points(&mut points, 0.0, 0.0, 0.5);
        assert!(points.len() < big);
        assert_eq!(points.capacity(), capacity);
        assert!(points.contains(&(0.0, 0.0)));
        assert!(points.iter().all(|(x, y)| x.abs() <= 1.0 && y.abs() <= 1.0));
    }

    #[test]
    fn test_particles_drawn_on_canvas() {
        let mut app = App::new(Arc::new(FixedClient), &Config::new(), 100, 30);
        app.on_pointer(50, 2);

        let screen = screen_text(&draw(&mut app));
        assert!(screen.chars().any(|c| ('\u{2801}'..='\u{28FF}').contains(&c)));
    }
}
