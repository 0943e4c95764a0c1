// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the region for the current mode and a status bar listing the
//! controls the mode offers. Images are drawn with Unicode half-block
//! characters for improved vertical resolution.

use crate::app::{Control, Controller, Driver, Layout, Message, Mode, Pending, Region};
use crate::backends::camera::{self, CameraFrame};
use crate::config::Config;
use crate::constants::{camera_timing, file_formats};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::processing::sample_pixel_rgb;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Paragraph, Widget},
};
use std::io::{self, stdout};
use tracing::{info, warn};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Run the interactive terminal UI
pub fn run(config: Config) -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let controller = Controller::from_config(&config, camera::get_backend(&config, None))
        .map_err(AppError::Config)?;
    let mut driver = Driver::new(controller);
    info!(endpoint = %config.endpoint, "Starting terminal UI");

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut driver);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// What a key press asks for
#[derive(Debug)]
enum Action {
    Send(Message),
    PickFile,
    ToggleHelp,
    Quit,
}

fn action_for_key(code: KeyCode, modifiers: KeyModifiers, layout: &Layout) -> Option<Action> {
    // Ctrl+C to quit, checked before the plain 'c' binding
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    let offered = |control| layout.offers(control);
    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('h') => Some(Action::ToggleHelp),
        KeyCode::Char('c') if offered(Control::UseCamera) => Some(Action::Send(Message::UseCamera)),
        KeyCode::Char('u') if offered(Control::Upload) => Some(Action::PickFile),
        KeyCode::Char(' ') | KeyCode::Char('p') if offered(Control::Capture) => {
            Some(Action::Send(Message::Capture))
        }
        KeyCode::Char('a') | KeyCode::Enter if offered(Control::Analyze) => {
            Some(Action::Send(Message::Analyze))
        }
        KeyCode::Char('r') if offered(Control::StartOver) => Some(Action::Send(Message::StartOver)),
        _ => None,
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    driver: &mut Driver,
) -> AppResult<()> {
    let mut show_help = false;
    let mut notice: Option<String> = None;
    let mut tick: usize = 0;

    loop {
        // Apply finished camera/upload/analysis work
        driver.drain();
        tick = tick.wrapping_add(1);

        let controller = driver.controller();
        let layout = controller.layout();
        let status_message = if show_help {
            build_help_message()
        } else {
            build_status_message(controller, notice.as_deref())
        };

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let main_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            render_region(controller, tick, main_area, f.buffer_mut());

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            let status = StatusBar {
                message: &status_message,
            };
            f.render_widget(status, status_area);
        })?;

        // Handle input with timeout for frame updates
        if event::poll(camera_timing::FRAME_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let Some(action) = action_for_key(key.code, key.modifiers, &layout) else {
                continue;
            };
            if !matches!(action, Action::ToggleHelp) {
                show_help = false;
            }

            match action {
                Action::Quit => break,
                Action::ToggleHelp => show_help = !show_help,
                Action::PickFile => match pick_image() {
                    Some(path) => {
                        notice = None;
                        driver.dispatch(Message::Upload(path));
                    }
                    None => notice = Some("No file selected".to_string()),
                },
                Action::Send(message) => {
                    notice = None;
                    driver.dispatch(message);
                }
            }
        }
    }

    Ok(())
}

/// Ask the user for an image file
fn pick_image() -> Option<std::path::PathBuf> {
    let picked = rfd::FileDialog::new()
        .set_title("Select an image")
        .add_filter("Images", file_formats::IMAGE_EXTENSIONS)
        .pick_file();
    if picked.is_none() {
        warn!("File dialog closed without a selection");
    }
    picked
}

fn control_hint(control: Control) -> &'static str {
    match control {
        Control::UseCamera => "'c' use camera",
        Control::Upload => "'u' upload",
        Control::Capture => "'space' capture",
        Control::Analyze => "'a' analyze",
        Control::StartOver => "'r' start over",
    }
}

fn build_status_message(controller: &Controller, notice: Option<&str>) -> String {
    let mut msg = controller.mode().label().to_string();
    if let Some(image) = controller.selected()
        && controller.mode() == Mode::PreviewReady
    {
        msg.push_str(&format!(" {}x{}", image.width, image.height));
    }
    if let Some(notice) = notice {
        msg.push_str(&format!(" ({})", notice));
    }
    for control in controller.layout().controls {
        msg.push_str(" | ");
        msg.push_str(control_hint(*control));
    }
    msg.push_str(" | 'h' help | 'q' quit");
    msg
}

fn build_help_message() -> String {
    String::from(
        "c: Use camera | u: Upload image | space/p: Capture | a/Enter: Analyze | \
         r: Start over | h: Toggle help | q/Ctrl+C: Quit",
    )
}

/// Draw the one region the current mode shows
fn render_region(controller: &Controller, tick: usize, area: Rect, buf: &mut Buffer) {
    match controller.layout().region {
        Region::Choice => {
            let pending = match controller.pending() {
                Some(Pending::OpeningCamera) => "Opening camera...",
                Some(Pending::LoadingImage) => "Loading image...",
                None => "",
            };
            let lines = vec![
                Line::from("Snapsight"),
                Line::from(""),
                Line::from("[c] Use camera    [u] Upload image"),
                Line::from(""),
                Line::from(pending),
            ];
            render_centered_text(lines, Style::default(), area, buf);
        }
        Region::CameraView => {
            let frame = controller.live_frame();
            let widget = HalfBlockImage {
                pixels: frame.as_ref(),
                placeholder: "Waiting for camera...",
            };
            widget.render(area, buf);
        }
        Region::Preview => {
            let widget = HalfBlockImage {
                pixels: controller.selected().map(|image| &*image.preview),
                placeholder: "No image",
            };
            widget.render(area, buf);
        }
        Region::Loader => {
            let spinner = SPINNER[tick / 4 % SPINNER.len()];
            let lines = vec![Line::from(format!("{} Analyzing...", spinner))];
            render_centered_text(lines, Style::default(), area, buf);
        }
        Region::Result | Region::Error => {
            let style = if controller.mode() == Mode::ErrorShown {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            let display = controller.display();
            let lines = display
                .lines()
                .into_iter()
                .map(|line| Line::from(line.to_string()))
                .collect();
            render_centered_text(lines, style, area, buf);
        }
    }
}

fn render_centered_text(lines: Vec<Line<'_>>, style: Style, area: Rect, buf: &mut Buffer) {
    let height = (lines.len() as u16).min(area.height);
    let text_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: area.width,
        height,
    };
    let lines: Vec<Line<'_>> = lines.into_iter().map(Line::centered).collect();
    Paragraph::new(lines).style(style).render(text_area, buf);
}

/// Anything that can be sampled as an RGB grid
trait PixelSource {
    fn dimensions(&self) -> (u32, u32);
    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8);
}

impl PixelSource for CameraFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        sample_pixel_rgb(self, x, y)
    }
}

impl PixelSource for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let (width, height) = RgbaImage::dimensions(self);
        let pixel = self.get_pixel(x.min(width - 1), y.min(height - 1));
        (pixel[0], pixel[1], pixel[2])
    }
}

/// Widget that renders an image using half-block characters
struct HalfBlockImage<'a, P: PixelSource> {
    pixels: Option<&'a P>,
    placeholder: &'a str,
}

impl<P: PixelSource> Widget for HalfBlockImage<'_, P> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let pixels = match self.pixels {
            Some(pixels) if pixels.dimensions().0 > 0 && pixels.dimensions().1 > 0 => pixels,
            _ => {
                let msg = self.placeholder;
                let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
                let y = area.y + area.height / 2;
                if y < area.y + area.height && x < area.x + area.width {
                    buf.set_string(x, y, msg, Style::default());
                }
                return;
            }
        };
        let (width, height) = pixels.dimensions();

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = pixels.rgb_at(src_x, src_y_top);
                let top_color = Color::Rgb(r, g, b);
                let (r, g, b) = pixels.rgb_at(src_x, src_y_bottom);
                let bottom_color = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
