use std::fmt::Write;

use deck_core::Track;
use deck_session::SessionView;

pub fn track_line(index: usize, track: &Track) -> String {
    let mut line = format!("{:>3}. {}", index + 1, track.title);
    let artists = track.artist_line();
    if !artists.is_empty() {
        let _ = write!(line, " - {artists}");
    }
    if let Some(ms) = track.duration_ms {
        let secs = ms / 1000;
        let _ = write!(line, " ({}:{:02})", secs / 60, secs % 60);
    }
    if !track.has_preview() {
        line.push_str(" [no preview]");
    }
    line
}

pub fn render(view: &SessionView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", view.heading);
    if view.tracks.is_empty() {
        out.push_str("  (nothing to show)\n");
    }
    for (index, track) in view.tracks.iter().enumerate() {
        out.push_str(&track_line(index, track));
        out.push('\n');
    }
    if let Some(pages) = view.pagination {
        let _ = writeln!(
            out,
            "page {}{}{}",
            pages.page,
            if pages.has_prev { "  [p]rev" } else { "" },
            if pages.has_next { "  [n]ext" } else { "" },
        );
    }
    if let Some(bar) = view.player {
        let state = if bar.is_playing { "playing" } else { "stopped" };
        let _ = writeln!(out, "{state}: {}", bar.track.title);
    }
    if view.loading {
        out.push_str("loading...\n");
    }
    if let Some(error) = view.error {
        let _ = writeln!(out, "error: {error}");
    }
    out
}
