//! Interactive operator console
//!
//! Reads stdin while a discussion runs. Lines starting with `/` are
//! commands; anything else becomes a human intervention.
//!
//! | Command | Aliases | Description |
//! |---------|---------|-------------|
//! | `/pause` | `/p` | Stop scheduling turns |
//! | `/resume` | `/r` | Continue with the pending participant |
//! | `/conclude` | `/c`, `/end` | Stop and write the summary |
//! | `/status` | `/s` | Show round and turn progress |
//! | `/impact <level>` | `/i` | Weight of later notes: low, medium, high |
//! | `/help` | `/h`, `/?` | Show commands |
//! | `/quit` | `/q`, `/exit` | Leave without a summary |

mod console;

pub use console::{ConsoleCommand, ConsoleExit, InteractiveConsole};
