//! Terminal graphics detection for the image picker.
//!
//! ratatui-image can query stdio for the protocol a terminal speaks, but the
//! query stalls startup on terminals that never answer. The hints here decide
//! when querying is worth it and pin kitty when the terminal clearly supports
//! it.

use std::time::Duration;

use ratatui_image::picker::{Capability, Picker, ProtocolType};

/// Terminal emulator family, as far as the environment gives it away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Kitty,
    Iterm,
    Unknown,
}

/// One-shot snapshot of the graphics-related environment. Query decisions
/// and protocol choice key off the same snapshot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TerminalHints {
    family: Family,
    in_tmux: bool,
    /// `KITTY_WINDOW_ID` names a live kitty window. `TERM` alone is weaker;
    /// it survives an SSH hop into a different terminal.
    kitty_window: bool,
}

impl TerminalHints {
    pub(crate) fn from_env() -> Self {
        Self::detect(|key| std::env::var(key).ok())
    }

    fn detect(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |key: &str| lookup(key).is_some_and(|v| !v.trim().is_empty());
        let contains = |key: &str, needle: &str| lookup(key).is_some_and(|v| v.contains(needle));

        let kitty_window = set("KITTY_WINDOW_ID");
        let family = if set("ITERM_SESSION_ID")
            || contains("TERM_PROGRAM", "iTerm")
            || contains("LC_TERMINAL", "iTerm")
        {
            Family::Iterm
        } else if kitty_window
            || lookup("TERM").is_some_and(|term| term.trim().starts_with("xterm-kitty"))
        {
            Family::Kitty
        } else {
            Family::Unknown
        };

        Self {
            family,
            in_tmux: set("TMUX"),
            kitty_window,
        }
    }

    /// Whether probing stdio for the protocol is worth the potential stall.
    pub(crate) fn should_query_stdio(&self) -> bool {
        // Inside tmux the outer terminal is invisible; only a query tells.
        self.family != Family::Unknown || self.in_tmux
    }

    pub(crate) fn query_timeout(&self) -> Duration {
        match self.family {
            // Generous deadline when the family is known, SSH included.
            Family::Kitty | Family::Iterm => Duration::from_millis(1500),
            // Without passthrough the probe never answers; keep it short.
            Family::Unknown if self.in_tmux => Duration::from_millis(300),
            Family::Unknown => Duration::ZERO,
        }
    }

    fn kitty_supported(&self, picker: &Picker) -> bool {
        if self.family == Family::Iterm {
            return false;
        }
        if self.kitty_window {
            return true;
        }
        picker
            .capabilities()
            .iter()
            .any(|cap| matches!(cap, Capability::Kitty))
    }

    /// Pins the kitty protocol when the terminal speaks it; a queried picker
    /// behind tmux can land on a weaker default.
    pub(crate) fn prefer_kitty(&self, picker: &mut Picker) -> bool {
        if !self.kitty_supported(picker) {
            return false;
        }
        picker.set_protocol_type(ProtocolType::Kitty);
        true
    }

    /// False means every frame falls back to halfblock cells.
    pub(crate) fn image_supported(&self, picker: &Picker) -> bool {
        self.kitty_supported(picker) || !matches!(picker.protocol_type(), ProtocolType::Halfblocks)
    }
}

/// Kitty graphics inside tmux need passthrough enabled. Failures are
/// ignored (old tmux, restricted environment).
pub(crate) fn ensure_tmux_allow_passthrough() {
    if std::env::var_os("TMUX").is_none() {
        return;
    }
    let _ = std::process::Command::new("tmux")
        .args(["set-option", "-g", "allow-passthrough", "on"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
}

pub(crate) fn protocol_label(picker: &Picker) -> &'static str {
    match picker.protocol_type() {
        ProtocolType::Halfblocks => "halfblocks",
        ProtocolType::Sixel => "sixel",
        ProtocolType::Kitty => "kitty",
        ProtocolType::Iterm2 => "iterm2",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(vars: &[(&str, &str)]) -> TerminalHints {
        TerminalHints::detect(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        })
    }

    #[test]
    fn kitty_window_id_pins_the_protocol() {
        let hints = hints(&[("KITTY_WINDOW_ID", "1")]);
        let mut picker = Picker::halfblocks();
        assert!(hints.prefer_kitty(&mut picker));
        assert!(matches!(picker.protocol_type(), ProtocolType::Kitty));
    }

    #[test]
    fn a_stray_protocol_setting_alone_is_not_trusted() {
        let hints = hints(&[("TERM", "xterm-256color")]);
        let mut picker = Picker::halfblocks();
        picker.set_protocol_type(ProtocolType::Kitty);
        assert!(!hints.prefer_kitty(&mut picker));
    }

    #[test]
    fn iterm_wins_over_kitty_hints() {
        let hints = hints(&[("KITTY_WINDOW_ID", "1"), ("TERM_PROGRAM", "iTerm.app")]);
        let mut picker = Picker::halfblocks();
        assert!(!hints.prefer_kitty(&mut picker));
    }

    #[test]
    fn kitty_term_over_ssh_still_queries() {
        let hints = hints(&[("TERM", "xterm-kitty")]);
        assert!(hints.should_query_stdio());
        assert_eq!(hints.query_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn plain_terminal_skips_the_query() {
        let hints = hints(&[("TERM", "xterm-256color")]);
        assert!(!hints.should_query_stdio());
        assert_eq!(hints.query_timeout(), Duration::ZERO);
    }

    #[test]
    fn tmux_queries_with_a_short_deadline() {
        let hints = hints(&[("TERM", "screen"), ("TMUX", "/tmp/tmux-1000/default,42,0")]);
        assert!(hints.should_query_stdio());
        assert_eq!(hints.query_timeout(), Duration::from_millis(300));
    }

    #[test]
    fn halfblocks_without_kitty_means_no_images() {
        let hints = hints(&[("TERM", "xterm-256color")]);
        assert!(!hints.image_supported(&Picker::halfblocks()));
    }
}
