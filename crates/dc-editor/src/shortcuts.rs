//! Key bindings for the canvas.
//!
//! `ShortcutMap` only turns a key + modifier chord into a `ShortcutAction`.
//! What an action means right now (Delete removing vertices or territories,
//! the order Escape unwinds modes in) is the engine's business.
//!
//! | Chord        | Keys                                                  |
//! |--------------|-------------------------------------------------------|
//! | **Ctrl/Cmd** | `A` `C` `V` `D` `=`/`+` `-` `0`                       |
//! | **Shift**    | `G`                                                   |
//! | bare         | `V` `D` `H` `G` `S` Delete Backspace Escape Enter Space |
//! | **Alt**      | ignored: it suspends snapping instead (see the engine) |

/// Semantic keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    ToolSelect,
    ToolPen,
    ToolPan,

    SelectAll,
    Copy,
    Paste,
    /// Duplicate the selection in place.
    Duplicate,
    Delete,
    /// Leave the innermost mode.
    Cancel,
    /// Commit vertex editing or finish the pen path.
    Commit,
    /// Flip bezier handles on the selected vertices.
    ToggleBezier,

    ToggleGrid,
    ToggleGridType,
    ToggleSnapping,
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

/// Which modifier a binding requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chord {
    /// Ctrl on Windows/Linux, ⌘ on macOS.
    Cmd,
    Shift,
    Bare,
}

/// Keys compare case-insensitively, so `"a"` also matches `"A"`.
const BINDINGS: &[(Chord, &str, ShortcutAction)] = &[
    (Chord::Cmd, "a", ShortcutAction::SelectAll),
    (Chord::Cmd, "c", ShortcutAction::Copy),
    (Chord::Cmd, "v", ShortcutAction::Paste),
    (Chord::Cmd, "d", ShortcutAction::Duplicate),
    (Chord::Cmd, "=", ShortcutAction::ZoomIn),
    (Chord::Cmd, "+", ShortcutAction::ZoomIn),
    (Chord::Cmd, "-", ShortcutAction::ZoomOut),
    (Chord::Cmd, "0", ShortcutAction::ZoomReset),
    (Chord::Shift, "g", ShortcutAction::ToggleGridType),
    (Chord::Bare, "v", ShortcutAction::ToolSelect),
    (Chord::Bare, "d", ShortcutAction::ToolPen),
    (Chord::Bare, "h", ShortcutAction::ToolPan),
    (Chord::Bare, "g", ShortcutAction::ToggleGrid),
    (Chord::Bare, "s", ShortcutAction::ToggleSnapping),
    (Chord::Bare, "delete", ShortcutAction::Delete),
    (Chord::Bare, "backspace", ShortcutAction::Delete),
    (Chord::Bare, "escape", ShortcutAction::Cancel),
    (Chord::Bare, "enter", ShortcutAction::Commit),
    (Chord::Bare, " ", ShortcutAction::ToggleBezier),
];

pub struct ShortcutMap;

impl ShortcutMap {
    /// Look up the action bound to `key` (a `KeyboardEvent.key` value).
    ///
    /// Cmd wins over Shift, Shift over a bare key: `Ctrl+V` pastes rather
    /// than switching to the select tool. Alt never changes the binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        // Alt-independent; accepted so callers can forward the full modifier state.
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let chord = if ctrl || meta {
            Chord::Cmd
        } else if shift {
            Chord::Shift
        } else {
            Chord::Bare
        };
        BINDINGS
            .iter()
            .find(|(c, k, _)| *c == chord && k.eq_ignore_ascii_case(key))
            .map(|&(_, _, action)| action)
    }
}
