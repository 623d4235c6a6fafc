//! View renderer.
//!
//! Snapshot replies for view requests.

use crate::core::Watchlist;

/// Render a watchlist snapshot.
///
/// Lists every code in sorted order with a count. An empty list gets an
/// explicit message rather than no reply.
pub fn render_snapshot(watchlist: &Watchlist) -> String {
    if watchlist.is_empty() {
        return String::from("<b>Watchlist is empty.</b>");
    }

    let mut output = format!("<b>Watchlist ({}):</b>", watchlist.len());
    for code in watchlist {
        output.push_str(&format!("\n• <code>{}</code>", code));
    }
    output
}

/// Render the snapshot only when one was requested.
pub fn render_view(watchlist: &Watchlist, view_requested: bool) -> Option<String> {
    view_requested.then(|| render_snapshot(watchlist))
}
